//! IR boundary types consumed by the lowering rules.
//!
//! The surrounding compiler owns the full intermediate representation; the
//! lowering core only sees the slice of it reproduced here: the numeric type
//! of a call's result, the call's operation key, and its ordered argument
//! list. Everything is read-only from the rules' point of view: a rule
//! never mutates an input call, it builds a fresh one.
//!
//! Canonical warp operation keys live here because the IR layer owns
//! canonical operation identities; the target-specific low-level keys they
//! lower to live with the target rule set.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical (architecture-neutral) operation keys for the warp family.
///
/// These are the lookup keys the code generator uses before lowering;
/// the lowered counterparts are declared by the target rule set.
pub mod ops {
    /// Cross-lane data exchange by absolute lane selector.
    pub const WARP_SHUFFLE: &str = "warp_shuffle";
    /// Cross-lane data exchange from a lower lane (selector is an offset).
    pub const WARP_SHUFFLE_UP: &str = "warp_shuffle_up";
    /// Cross-lane data exchange from a higher lane (selector is an offset).
    pub const WARP_SHUFFLE_DOWN: &str = "warp_shuffle_down";
    /// Bitmask of lanes currently executing.
    pub const WARP_ACTIVEMASK: &str = "warp_activemask";
}

/// Numeric domain of a scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    /// Signed integer
    Int,
    /// Unsigned integer
    UInt,
    /// IEEE floating point
    Float,
}

/// Scalar numeric type of a call result or operand.
///
/// Immutable and supplied by the caller for each lowering request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScalarType {
    /// Numeric domain
    pub kind: ScalarKind,
    /// Bit width (16/32/64 for the widths this target cares about)
    pub bits: u8,
}

impl ScalarType {
    pub const fn new(kind: ScalarKind, bits: u8) -> Self {
        Self { kind, bits }
    }

    pub const fn int(bits: u8) -> Self {
        Self::new(ScalarKind::Int, bits)
    }

    pub const fn uint(bits: u8) -> Self {
        Self::new(ScalarKind::UInt, bits)
    }

    pub const fn float(bits: u8) -> Self {
        Self::new(ScalarKind::Float, bits)
    }

    pub fn is_int(&self) -> bool {
        self.kind == ScalarKind::Int
    }

    pub fn is_uint(&self) -> bool {
        self.kind == ScalarKind::UInt
    }

    pub fn is_float(&self) -> bool {
        self.kind == ScalarKind::Float
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            ScalarKind::Int => "int",
            ScalarKind::UInt => "uint",
            ScalarKind::Float => "float",
        };
        write!(f, "{}{}", prefix, self.bits)
    }
}

/// An argument expression, opaque to the lowering rules.
///
/// Rules reorder and drop arguments but never look inside them, so only
/// enough structure is modeled to carry real programs through tests.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Named value (register, loop variable, parameter)
    Var { name: String, ty: ScalarType },
    /// Integer immediate
    IntImm { ty: ScalarType, value: i64 },
    /// Floating-point immediate
    FloatImm { ty: ScalarType, value: f64 },
    /// Nested call
    Call(Box<Call>),
}

impl Expr {
    /// Convenience constructor for a named value.
    pub fn var(name: impl Into<String>, ty: ScalarType) -> Self {
        Expr::Var {
            name: name.into(),
            ty,
        }
    }

    /// Convenience constructor for an integer immediate.
    pub fn imm(ty: ScalarType, value: i64) -> Self {
        Expr::IntImm { ty, value }
    }
}

/// A call expression: result type, callee operation key, ordered arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// Numeric type of the call's result
    pub dtype: ScalarType,
    /// Operation key naming the callee
    pub callee: String,
    /// Ordered argument list
    pub args: Vec<Expr>,
}

impl Call {
    pub fn new(dtype: ScalarType, callee: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            dtype,
            callee: callee.into(),
            args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_type_predicates() {
        assert!(ScalarType::float(32).is_float());
        assert!(ScalarType::uint(64).is_uint());
        assert!(ScalarType::int(32).is_int());
        assert!(!ScalarType::int(32).is_uint());
    }

    #[test]
    fn test_scalar_type_display() {
        assert_eq!(ScalarType::float(16).to_string(), "float16");
        assert_eq!(ScalarType::float(64).to_string(), "float64");
        assert_eq!(ScalarType::uint(32).to_string(), "uint32");
        assert_eq!(ScalarType::int(8).to_string(), "int8");
    }

    #[test]
    fn test_call_construction() {
        let call = Call::new(
            ScalarType::float(32),
            "exp",
            vec![Expr::var("x", ScalarType::float(32))],
        );
        assert_eq!(call.callee, "exp");
        assert_eq!(call.args.len(), 1);
    }
}
