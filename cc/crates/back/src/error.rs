use ccgen_front::ValueType;
use ccgen_middle::{
    ResolveError,
    VerifyError,
};
use itertools::Itertools;

/// A rule that cannot be turned into a classification procedure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    #[error("{convention}: invalid length of list of shadowed registers (expected {expected}, found {found})")]
    ShadowLengthMismatch {
        convention: String,
        expected: usize,
        found: usize,
    },
    #[error("{convention}: cannot assign to an empty list of registers")]
    EmptyRegisterList { convention: String },
    #[error("{convention}: predicate tests an empty list of value types")]
    EmptyValueTypeList { convention: String },
    #[error("{convention}: cannot promote to the upper bits of floating point type {dest_type}")]
    FloatingPointUpperBits {
        convention: String,
        dest_type: ValueType,
    },
    #[error("{convention}: alignment {align} is not a power of two")]
    InvalidAlignment { convention: String, align: u32 },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Rule set is invalid:\n{}", .0.iter().join("\n"))]
    Verify(Vec<VerifyError>),
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("Failed to write generated code")]
    Format(#[from] std::fmt::Error),
}
