//! Rule registration table and low-level primitive declarations.
//!
//! A [`RuleRegistry`] is built once during process-wide initialization and
//! only read afterwards. It is an explicit value passed by reference into
//! the lowering pass, not a mutable singleton, so tests can construct
//! isolated tables. A process-wide default for the CUDA target is exposed
//! from [`crate::cuda::rules`].

use crate::rules::LoweringRule;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// Attribute flag marking a primitive as requiring warp-synchronization
/// hardware support. Consumed by the emitter to gate capability checks.
pub const NEED_WARP_SHUFFLE: &str = "cuda.need_warp_shuffle";

/// Errors that can occur while populating a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("lowering rule for `{0}` registered twice")]
    DuplicateRule(String),

    #[error("low-level primitive `{0}` declared twice")]
    DuplicatePrimitive(String),
}

/// Result type for registry population.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Declaration of a target low-level primitive: the externally linked
/// symbol the emitter resolves, its expected arity, and target feature
/// flags. Declared once per primitive, alongside the rewrite rule that
/// targets it.
#[derive(Debug, Clone, Serialize)]
pub struct PrimitiveDecl {
    /// Exported symbol name used for linkage
    pub symbol: String,
    /// Number of arguments the primitive takes
    pub arity: usize,
    /// Target feature flags, e.g. [`NEED_WARP_SHUFFLE`]
    pub flags: HashMap<String, bool>,
}

impl PrimitiveDecl {
    pub fn new(symbol: impl Into<String>, arity: usize) -> Self {
        Self {
            symbol: symbol.into(),
            arity,
            flags: HashMap::new(),
        }
    }

    /// Set a target feature flag, builder style.
    pub fn with_flag(mut self, key: impl Into<String>, value: bool) -> Self {
        self.flags.insert(key.into(), value);
        self
    }

    /// Query a feature flag; unset flags read as false.
    pub fn flag(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }
}

/// String-keyed table binding each supported operation key to exactly one
/// lowering rule, plus the low-level primitive declarations referenced by
/// shape-rewrite rules.
#[derive(Default)]
pub struct RuleRegistry {
    rules: HashMap<String, LoweringRule>,
    primitives: HashMap<String, PrimitiveDecl>,
}

impl RuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an operation key to a lowering rule.
    ///
    /// Every key is registered exactly once; a second registration for the
    /// same key is a configuration error.
    pub fn register(&mut self, key: impl Into<String>, rule: LoweringRule) -> RegistryResult<()> {
        let key = key.into();
        if self.rules.contains_key(&key) {
            return Err(RegistryError::DuplicateRule(key));
        }
        log::trace!("registering lowering rule for `{}`", key);
        self.rules.insert(key, rule);
        Ok(())
    }

    /// Declare a low-level primitive that rewrite rules may target.
    pub fn declare_primitive(
        &mut self,
        key: impl Into<String>,
        decl: PrimitiveDecl,
    ) -> RegistryResult<()> {
        let key = key.into();
        if self.primitives.contains_key(&key) {
            return Err(RegistryError::DuplicatePrimitive(key));
        }
        log::trace!("declaring primitive `{}` (arity {})", key, decl.arity);
        self.primitives.insert(key, decl);
        Ok(())
    }

    /// Look up the rule bound to an operation key.
    pub fn lookup(&self, key: &str) -> Option<&LoweringRule> {
        self.rules.get(key)
    }

    /// Look up a declared low-level primitive.
    pub fn primitive(&self, key: &str) -> Option<&PrimitiveDecl> {
        self.primitives.get(key)
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over declared primitives (emitter consumes these for symbol
    /// linkage and capability checks).
    pub fn primitives(&self) -> impl Iterator<Item = (&str, &PrimitiveDecl)> {
        self.primitives.iter().map(|(k, v)| (k.as_str(), v))
    }
}
