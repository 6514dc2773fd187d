use ccgen_front::{
    Mode,
    Register,
};
use tracing::debug;

use crate::{
    DelegationGraph,
    FxIndexMap,
    RegisterUsage,
    ResolveError,
    ResolvedUsage,
};

/// State accumulated while synthesizing the calling conventions of one rule set.
///
/// Collects the registers every convention claims directly and the delegations between
/// conventions. [`Context::resolve`] consumes it once all conventions are synthesized.
#[derive(Debug, Clone, Default)]
pub struct Context {
    usage: FxIndexMap<String, RegisterUsage>,
    delegations: DelegationGraph,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `convention` known, with empty usage.
    ///
    /// Conventions are resolved and listed in the order they are declared.
    pub fn declare(&mut self, convention: &str) {
        self.delegations.add_convention(convention);
        self.usage.entry(convention.to_string()).or_default();
    }

    pub fn record_register(&mut self, convention: &str, mode: Mode, register: Register) {
        self.declare(convention);
        if let Some(usage) = self.usage.get_mut(convention) {
            usage.insert(mode, register);
        }
    }

    pub fn record_delegation(&mut self, convention: &str, target: &str) {
        if self.delegations.add_delegation(convention, target) {
            debug!("{} delegates to {}", convention, target);
        }
    }

    pub fn direct_usage(&self, convention: &str) -> Option<&RegisterUsage> {
        self.usage.get(convention)
    }

    pub fn delegations(&self) -> &DelegationGraph {
        &self.delegations
    }

    /// Closes the usage of every convention under delegation.
    pub fn resolve(self) -> Result<ResolvedUsage, ResolveError> {
        self.delegations.resolve(&self.usage)
    }
}
