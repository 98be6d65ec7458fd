//! Polymorphic lowering rules and the single lowering entry point.
//!
//! A rule has one of two shapes:
//!
//! - **Extern** (name-only): a pure function from the call's result type and
//!   operation key to a concrete callee name. `Ok(None)` means no rule
//!   applies at that type/width and the call is left untouched.
//! - **Rewrite** (shape rewrite): a pure function from the whole call to a
//!   new call, for primitives that need argument-list transformation in
//!   addition to renaming.
//!
//! ```text
//! ┌──────────────┐  lookup   ┌──────────────────┐
//! │ Call (IR)    │──────────▶│ RuleRegistry     │
//! └──────┬───────┘           └────────┬─────────┘
//!        │                            │ LoweringRule
//!        ▼                            ▼
//! ┌─────────────────────────────────────────────┐
//! │ lower_call                                  │
//! │   Extern  → rename callee, args untouched   │
//! │   Rewrite → rebuild call (rename + reshape) │
//! └──────┬──────────────────────────────────────┘
//!        ▼
//!  Lowered::Call | Lowered::NotApplicable | LowerError
//! ```

use crate::ir::{Call, ScalarType};
use crate::registry::RuleRegistry;
use thiserror::Error;

/// Errors that abort compilation during lowering.
///
/// These are the fatal tier: either an operation declared unsupported at a
/// given width by design, or a malformed call shape that indicates an
/// upstream IR-construction bug. The recoverable "no rule applies" outcome
/// is [`Lowered::NotApplicable`], not an error.
#[derive(Debug, Error)]
pub enum LowerError {
    #[error("intrinsic `{name}` is unsupported for {ty}")]
    UnsupportedType { name: String, ty: ScalarType },

    #[error("`{name}` expects {expected} arguments, got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("`{0}` is not a warp shuffle operation")]
    NotAWarpShuffle(String),

    #[error("rewrite targets undeclared primitive `{0}`")]
    MissingPrimitive(String),

    #[error("rewrite of `{name}` produced {got} arguments but primitive `{primitive}` declares arity {expected}")]
    PrimitiveArity {
        name: String,
        primitive: String,
        expected: usize,
        got: usize,
    },
}

/// Result type for lowering operations.
pub type LowerResult<T> = Result<T, LowerError>;

/// Name-only rule: resolve a concrete callee name from the result type and
/// operation key, or `None` when no rule applies at that type/width.
pub type NameFn = fn(ScalarType, &str) -> LowerResult<Option<String>>;

/// Shape-rewrite rule: rebuild the whole call against the registry's
/// primitive declarations.
pub type RewriteFn = fn(&RuleRegistry, &Call) -> LowerResult<Call>;

/// A lowering rule, polymorphic over the two capability shapes.
#[derive(Clone, Copy)]
pub enum LoweringRule {
    /// Rename the callee per result type; argument list is untouched.
    Extern(NameFn),
    /// Structural rewrite of the whole call.
    Rewrite(RewriteFn),
}

/// Outcome of lowering one call site.
#[derive(Debug, Clone, PartialEq)]
pub enum Lowered {
    /// The call rewritten against the target's low-level callee.
    Call(Call),
    /// No rule applies; the caller leaves the call unlowered, which
    /// surfaces as an unresolved-symbol diagnostic at emission time.
    NotApplicable,
}

impl Lowered {
    /// The rewritten call, if lowering applied.
    pub fn into_call(self) -> Option<Call> {
        match self {
            Lowered::Call(call) => Some(call),
            Lowered::NotApplicable => None,
        }
    }
}

/// Lower one call site against a rule table.
///
/// Pure and deterministic: the same registry and call always produce the
/// same outcome, so independent call sites may be lowered in any order or
/// in parallel by the caller.
pub fn lower_call(registry: &RuleRegistry, call: &Call) -> LowerResult<Lowered> {
    let Some(rule) = registry.lookup(&call.callee) else {
        // Unregistered keys include already-lowered low-level callees, so
        // re-running lowering on lowered output is a no-op.
        return Ok(Lowered::NotApplicable);
    };

    match rule {
        LoweringRule::Extern(resolve) => match resolve(call.dtype, &call.callee)? {
            Some(name) => {
                log::trace!("lowering `{}` at {} -> `{}`", call.callee, call.dtype, name);
                Ok(Lowered::Call(Call::new(call.dtype, name, call.args.clone())))
            }
            None => Ok(Lowered::NotApplicable),
        },
        LoweringRule::Rewrite(rewrite) => {
            let lowered = rewrite(registry, call)?;
            log::trace!("rewriting `{}` -> `{}`", call.callee, lowered.callee);
            Ok(Lowered::Call(lowered))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Expr;

    fn suffix_rule(ty: ScalarType, name: &str) -> LowerResult<Option<String>> {
        if ty.is_float() && ty.bits == 32 {
            Ok(Some(format!("{}f", name)))
        } else {
            Ok(None)
        }
    }

    #[test]
    fn test_lookup_miss_is_not_applicable() {
        let reg = RuleRegistry::new();
        let call = Call::new(ScalarType::float(32), "exp", vec![]);
        let out = lower_call(&reg, &call).unwrap();
        assert_eq!(out, Lowered::NotApplicable);
    }

    #[test]
    fn test_extern_rule_renames_and_keeps_args() {
        let mut reg = RuleRegistry::new();
        reg.register("exp", LoweringRule::Extern(suffix_rule)).unwrap();

        let arg = Expr::var("x", ScalarType::float(32));
        let call = Call::new(ScalarType::float(32), "exp", vec![arg.clone()]);
        let out = lower_call(&reg, &call).unwrap().into_call().unwrap();
        assert_eq!(out.callee, "expf");
        assert_eq!(out.dtype, ScalarType::float(32));
        assert_eq!(out.args, vec![arg]);
    }

    #[test]
    fn test_extern_rule_none_is_not_applicable() {
        let mut reg = RuleRegistry::new();
        reg.register("exp", LoweringRule::Extern(suffix_rule)).unwrap();

        let call = Call::new(ScalarType::int(32), "exp", vec![]);
        assert_eq!(lower_call(&reg, &call).unwrap(), Lowered::NotApplicable);
    }
}
