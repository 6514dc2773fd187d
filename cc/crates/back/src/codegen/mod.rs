pub use procedure::{
    Extent,
    Guard,
    LocInfo,
    Outcome,
    Procedure,
    RegListKind,
    RegOperand,
    Stmt,
};
pub use synthesizer::Synthesizer;
pub use writer::CxxWriter;

pub mod procedure;
pub mod synthesizer;
pub mod writer;
