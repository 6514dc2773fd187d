use derive_more::{
    Display,
    From,
};
use serde::{
    Deserialize,
    Serialize,
};

/// A target register, referred to by its qualified name (e.g. `X86::EAX`).
///
/// Registers order lexicographically by name, which is the canonical order of every
/// register table the back end writes.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize,
)]
#[display(fmt = "{}", _0)]
#[serde(transparent)]
pub struct Register(String);

impl Register {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Register {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
