#![deny(clippy::enum_glob_use)]
#![warn(clippy::pedantic, clippy::nursery)]
#![forbid(unsafe_code)]
#![allow(clippy::too_many_lines, clippy::module_name_repetitions)]

pub use config::EmitterConfig;
pub use emitter::Emitter;
pub use error::{
    Error,
    SynthesisError,
};

pub mod codegen;
pub mod config;
pub mod emitter;
#[cfg(test)]
mod emu;
pub mod error;
