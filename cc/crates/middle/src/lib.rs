use std::hash::BuildHasherDefault;

pub use context::Context;
pub use delegation::{
    DelegationGraph,
    ResolveError,
    ResolvedUsage,
};
use indexmap::IndexMap;
use rustc_hash::FxHasher;
pub use usage::RegisterUsage;
pub use verifier::{
    Verifier,
    VerifyError,
};

pub mod context;
pub mod delegation;
pub mod usage;
pub mod verifier;

pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;
