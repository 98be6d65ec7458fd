//! Accelgen - Intrinsic Lowering Rules for Accelerator Code Generation
//!
//! A compiler back-end component that rewrites architecture-neutral
//! operations (transcendental math, bit counting, cross-lane warp data
//! movement) into the concrete low-level callees a CUDA-class target
//! understands. It runs during code generation, after the IR is built and
//! before final emission, and chooses callee names only: it never
//! implements the math or validates hardware support at runtime.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  Code generator      │  per call site
//! └──────────┬───────────┘
//!            │ Call {dtype, callee, args}
//!            ▼
//! ┌──────────────────────┐     ┌───────────────────────────┐
//! │  lower_call          │────▶│ RuleRegistry              │
//! │                      │     │  key → LoweringRule       │
//! │  Extern: rename      │     │  key → PrimitiveDecl      │
//! │  Rewrite: reshape    │     └───────────────────────────┘
//! └──────────┬───────────┘
//!            │ Lowered::Call | Lowered::NotApplicable
//!            ▼
//! ┌──────────────────────┐
//! │  Emitter             │  serializes the rewritten call
//! └──────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use accelgen::cuda;
//! use accelgen::ir::{Call, Expr, ScalarType};
//! use accelgen::rules::{lower_call, Lowered};
//!
//! let f32t = ScalarType::float(32);
//! let call = Call::new(f32t, "exp", vec![Expr::var("x", f32t)]);
//!
//! match lower_call(cuda::rules(), &call).unwrap() {
//!     Lowered::Call(lowered) => assert_eq!(lowered.callee, "__expf"),
//!     Lowered::NotApplicable => unreachable!(),
//! }
//! ```
//!
//! The rule table is built once at process start and only read afterwards;
//! lowering is pure and deterministic, so call sites may be processed in
//! any order or in parallel.

#![warn(clippy::all)]

pub mod cuda;
pub mod ir;
pub mod registry;
pub mod rules;

// Re-export commonly used types
pub use ir::{ops, Call, Expr, ScalarKind, ScalarType};
pub use registry::{
    PrimitiveDecl, RegistryError, RegistryResult, RuleRegistry, NEED_WARP_SHUFFLE,
};
pub use rules::{lower_call, LowerError, LowerResult, Lowered, LoweringRule};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_populated() {
        let registry = cuda::rules();
        assert!(!registry.is_empty());
        assert!(registry.lookup("exp").is_some());
        assert!(registry.lookup("warp_shuffle").is_some());
    }

    #[test]
    fn test_exp_differs_by_width() {
        let registry = cuda::rules();
        let f32c = Call::new(ScalarType::float(32), "exp", vec![]);
        let f64c = Call::new(ScalarType::float(64), "exp", vec![]);

        let lowered32 = lower_call(registry, &f32c).unwrap().into_call().unwrap();
        let lowered64 = lower_call(registry, &f64c).unwrap().into_call().unwrap();
        assert_eq!(lowered32.callee, "__expf");
        assert_eq!(lowered64.callee, "exp");
    }
}
