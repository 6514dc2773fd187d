use ccgen_front::{
    Action,
    RuleSet,
};
use rustc_hash::FxHashSet;

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum VerifyError {
    #[error("Calling convention #{0} has no name")]
    UnnamedConvention(usize),
    #[error("Calling convention {0} is declared more than once")]
    DuplicateConvention(String),
    #[error("{convention} delegates to {target}, which is not a declared calling convention")]
    UnknownDelegate { convention: String, target: String },
}

/// Checks the relations between the calling conventions of a rule set.
///
/// Constraints that concern a single action are checked while synthesizing it instead.
#[derive(Debug, Clone)]
pub struct Verifier<'rules> {
    rules: &'rules RuleSet,
}

impl<'rules> Verifier<'rules> {
    pub fn new(rules: &'rules RuleSet) -> Self {
        Self { rules }
    }

    pub fn verify(self) -> Vec<VerifyError> {
        let mut errors = vec![];
        let mut declared = FxHashSet::default();
        for (index, convention) in self.rules.conventions.iter().enumerate() {
            if convention.name.is_empty() {
                errors.push(VerifyError::UnnamedConvention(index));
            } else if !declared.insert(convention.name.as_str()) {
                errors.push(VerifyError::DuplicateConvention(convention.name.clone()));
            }
        }
        for convention in &self.rules.conventions {
            for action in convention.all_actions() {
                let Action::Delegate { target } = action else {
                    continue;
                };
                if !declared.contains(target.as_str()) {
                    errors.push(VerifyError::UnknownDelegate {
                        convention: convention.name.clone(),
                        target: target.clone(),
                    });
                }
            }
        }
        errors
    }
}
