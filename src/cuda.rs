//! CUDA intrinsic lowering rules.
//!
//! Maps canonical math and warp operations to the callee names the CUDA
//! toolchain links against. Math intrinsics are a pure rename driven by the
//! result type's bit width; warp intrinsics additionally reshape the
//! argument list to the native form.
//!
//! # Name policy
//!
//! | Width   | Plain math | Fast math   |
//! |---------|------------|-------------|
//! | float64 | `name`     | `name`      |
//! | float32 | `name` + f | `__name` + f|
//! | float16 | h + `name` | h + `name`  |
//!
//! The fast (approximate) instruction forms exist only at single precision;
//! every other width falls back to the accurate path. Tangent is the one
//! exception: its approximate form deviates too far from reference values,
//! so float32 keeps the plain suffixed name, and float16 tangent is
//! rejected outright.

use crate::ir::{ops, Call, ScalarType};
use crate::registry::{PrimitiveDecl, RegistryResult, RuleRegistry, NEED_WARP_SHUFFLE};
use crate::rules::{LowerError, LowerResult, LoweringRule};
use once_cell::sync::Lazy;

/// Low-level warp primitive keys. Not registered as lookup keys in the
/// canonical table, so lowering already-lowered calls is a no-op.
pub const SHFL_SYNC: &str = "cuda.__shfl_sync";
pub const SHFL_UP_SYNC: &str = "cuda.__shfl_up_sync";
pub const SHFL_DOWN_SYNC: &str = "cuda.__shfl_down_sync";
pub const ACTIVEMASK: &str = "cuda.__activemask";

/// Add the CUDA precision marker to a math intrinsic name.
///
/// float64 entry points already match the canonical names; float32 appends
/// the `f` suffix; float16 prepends `h`. Any other width, and any
/// non-float type, has no rule.
pub fn math_suffix(ty: ScalarType, name: &str) -> LowerResult<Option<String>> {
    if !ty.is_float() {
        return Ok(None);
    }
    Ok(match ty.bits {
        64 => Some(name.to_string()),
        32 => Some(format!("{}f", name)),
        16 => Some(format!("h{}", name)),
        _ => None,
    })
}

/// Fast-math variant: the approximate `__namef` form at single precision,
/// the plain suffix policy everywhere else.
pub fn fast_math(ty: ScalarType, name: &str) -> LowerResult<Option<String>> {
    if ty.is_float() && ty.bits == 32 {
        Ok(Some(format!("__{}f", name)))
    } else {
        math_suffix(ty, name)
    }
}

/// Tangent-specific fast-math variant.
///
/// `__tanf` produces values too deviant from the reference math library,
/// so float32 stays on the plain `tanf`. CUDA has no half-precision
/// tangent at all; resolving one is a configuration error, not a silent
/// fallback to lower precision.
pub fn fast_math_tan(ty: ScalarType, name: &str) -> LowerResult<Option<String>> {
    if !ty.is_float() {
        return Ok(None);
    }
    match ty.bits {
        64 => Ok(Some(name.to_string())),
        32 => Ok(Some(format!("{}f", name))),
        16 => Err(LowerError::UnsupportedType {
            name: name.to_string(),
            ty,
        }),
        _ => Ok(None),
    }
}

/// Population count: fixed callee per unsigned width.
pub fn popcount(ty: ScalarType, _name: &str) -> LowerResult<Option<String>> {
    if !ty.is_uint() {
        return Ok(None);
    }
    Ok(match ty.bits {
        32 => Some("__popc".to_string()),
        64 => Some("__popcll".to_string()),
        _ => None,
    })
}

/// Map a canonical warp shuffle key to its low-level primitive key.
///
/// Total over exactly the three shuffle identities; anything else is an
/// upstream IR-construction error.
fn shuffle_target(key: &str) -> LowerResult<&'static str> {
    match key {
        ops::WARP_SHUFFLE => Ok(SHFL_SYNC),
        ops::WARP_SHUFFLE_UP => Ok(SHFL_UP_SYNC),
        ops::WARP_SHUFFLE_DOWN => Ok(SHFL_DOWN_SYNC),
        other => Err(LowerError::NotAWarpShuffle(other.to_string())),
    }
}

/// Cross-check a rebuilt call against the declared primitive arity.
fn check_primitive_arity(
    registry: &RuleRegistry,
    name: &str,
    target: &str,
    got: usize,
) -> LowerResult<()> {
    let decl = registry
        .primitive(target)
        .ok_or_else(|| LowerError::MissingPrimitive(target.to_string()))?;
    if got != decl.arity {
        return Err(LowerError::PrimitiveArity {
            name: name.to_string(),
            primitive: target.to_string(),
            expected: decl.arity,
            got,
        });
    }
    Ok(())
}

/// Rewrite a canonical warp shuffle to the `_sync` primitive form.
///
/// Canonical layout is `{mask, value, selector, width, warp_size}`. The
/// native form drops the trailing `warp_size` (implied by the execution
/// model) and keeps the first four arguments in order.
pub fn rewrite_shuffle(registry: &RuleRegistry, call: &Call) -> LowerResult<Call> {
    if call.args.len() != 5 {
        return Err(LowerError::ArityMismatch {
            name: call.callee.clone(),
            expected: 5,
            got: call.args.len(),
        });
    }
    let target = shuffle_target(&call.callee)?;
    let args = call.args[..4].to_vec();
    check_primitive_arity(registry, &call.callee, target, args.len())?;
    Ok(Call::new(call.dtype, target, args))
}

/// Rewrite the active-lane-mask query. A pure rename: the canonical call
/// is already zero-argument, matching the primitive.
pub fn rewrite_activemask(registry: &RuleRegistry, call: &Call) -> LowerResult<Call> {
    if !call.args.is_empty() {
        return Err(LowerError::ArityMismatch {
            name: call.callee.clone(),
            expected: 0,
            got: call.args.len(),
        });
    }
    check_primitive_arity(registry, &call.callee, ACTIVEMASK, 0)?;
    Ok(Call::new(call.dtype, ACTIVEMASK, Vec::new()))
}

/// Math intrinsics lowered with the plain suffix policy.
const PLAIN_MATH: &[&str] = &[
    "floor", "ceil", "trunc", "fabs", "round", "exp2", "erf", "cosh", "sinh", "atan", "tanh",
    "sqrt", "pow", "fmod",
];

/// Math intrinsics with a usable single-precision approximate form.
const FAST_MATH: &[&str] = &["exp", "exp10", "log", "log2", "log10", "sin", "cos"];

/// Populate a registry with the full CUDA rule set and declare the warp
/// primitives the rewrites target.
pub fn register_intrinsics(registry: &mut RuleRegistry) -> RegistryResult<()> {
    for key in PLAIN_MATH {
        registry.register(*key, LoweringRule::Extern(math_suffix))?;
    }
    for key in FAST_MATH {
        registry.register(*key, LoweringRule::Extern(fast_math))?;
    }
    registry.register("tan", LoweringRule::Extern(fast_math_tan))?;
    registry.register("popcount", LoweringRule::Extern(popcount))?;

    for key in [ops::WARP_SHUFFLE, ops::WARP_SHUFFLE_UP, ops::WARP_SHUFFLE_DOWN] {
        registry.register(key, LoweringRule::Rewrite(rewrite_shuffle))?;
    }
    registry.register(ops::WARP_ACTIVEMASK, LoweringRule::Rewrite(rewrite_activemask))?;

    registry.declare_primitive(
        SHFL_SYNC,
        PrimitiveDecl::new("__shfl_sync", 4).with_flag(NEED_WARP_SHUFFLE, true),
    )?;
    registry.declare_primitive(
        SHFL_UP_SYNC,
        PrimitiveDecl::new("__shfl_up_sync", 4).with_flag(NEED_WARP_SHUFFLE, true),
    )?;
    registry.declare_primitive(
        SHFL_DOWN_SYNC,
        PrimitiveDecl::new("__shfl_down_sync", 4).with_flag(NEED_WARP_SHUFFLE, true),
    )?;
    registry.declare_primitive(
        ACTIVEMASK,
        PrimitiveDecl::new("__activemask", 0).with_flag(NEED_WARP_SHUFFLE, true),
    )?;

    log::debug!("registered {} CUDA lowering rules", registry.len());
    Ok(())
}

/// The process-wide CUDA rule table, built on first use and read-only
/// afterwards.
pub fn rules() -> &'static RuleRegistry {
    static RULES: Lazy<RuleRegistry> = Lazy::new(|| {
        let mut registry = RuleRegistry::new();
        register_intrinsics(&mut registry).expect("CUDA rule table keys are unique");
        registry
    });
    &RULES
}
