use std::collections::BTreeSet;

use ccgen_front::{
    Mode,
    Register,
};

/// The registers a calling convention may claim, split by mode.
///
/// Both sets iterate in lexicographic order of the register names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterUsage {
    primary: BTreeSet<Register>,
    auxiliary: BTreeSet<Register>,
}

impl RegisterUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mode: Mode, register: Register) -> bool {
        self.get_mut(mode).insert(register)
    }

    pub fn get(&self, mode: Mode) -> &BTreeSet<Register> {
        match mode {
            Mode::Primary => &self.primary,
            Mode::Auxiliary => &self.auxiliary,
        }
    }

    fn get_mut(&mut self, mode: Mode) -> &mut BTreeSet<Register> {
        match mode {
            Mode::Primary => &mut self.primary,
            Mode::Auxiliary => &mut self.auxiliary,
        }
    }

    pub fn primary(&self) -> &BTreeSet<Register> {
        &self.primary
    }

    pub fn auxiliary(&self) -> &BTreeSet<Register> {
        &self.auxiliary
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.auxiliary.is_empty()
    }

    /// Merges `other` into `self`, keeping the modes apart.
    ///
    /// Returns true if any register was added.
    pub fn join(&mut self, other: &Self) -> bool {
        let len_before = self.primary.len() + self.auxiliary.len();
        self.primary.extend(other.primary.iter().cloned());
        self.auxiliary.extend(other.auxiliary.iter().cloned());
        self.primary.len() + self.auxiliary.len() != len_before
    }
}
