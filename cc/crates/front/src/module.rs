use serde::{
    Deserialize,
    Serialize,
};

use crate::Action;

pub type ParseError = serde_json::Error;

/// Parses a rule set from its JSON representation.
pub fn parse(input: &str) -> Result<RuleSet, ParseError> {
    serde_json::from_str(input)
}

/// All calling conventions of a target, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub conventions: Vec<ConventionRule>,
}

impl RuleSet {
    pub fn new(conventions: impl IntoIterator<Item = ConventionRule>) -> Self {
        Self {
            conventions: conventions.into_iter().collect(),
        }
    }

    /// Conventions whose procedure is generated, i.e. all but the externally implemented ones.
    pub fn synthesized(&self) -> impl Iterator<Item = &ConventionRule> {
        self.conventions
            .iter()
            .filter(|convention| !convention.external)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConventionRule {
    pub name: String,
    /// Entry points are callable from outside the generated fragment.
    #[serde(default)]
    pub entry_point: bool,
    /// Externally implemented conventions only exist as delegation targets; no procedure is
    /// generated for them.
    #[serde(default)]
    pub external: bool,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl ConventionRule {
    pub fn new(name: impl Into<String>, actions: impl IntoIterator<Item = Action>) -> Self {
        Self {
            name: name.into(),
            entry_point: false,
            external: false,
            actions: actions.into_iter().collect(),
        }
    }

    pub fn external(name: impl Into<String>) -> Self {
        Self {
            external: true,
            ..Self::new(name, [])
        }
    }

    #[must_use]
    pub fn entry_point(self) -> Self {
        Self {
            entry_point: true,
            ..self
        }
    }

    /// Iterates over every action of this convention, including the ones nested in predicates.
    pub fn all_actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter().flat_map(Action::walk)
    }
}
