pub use action::{
    Action,
    Condition,
    Mode,
    StackSlot,
    Transform,
};
pub use module::{
    parse,
    ConventionRule,
    ParseError,
    RuleSet,
};
pub use reg::Register;
pub use ty::ValueType;

pub mod action;
pub mod module;
mod reg;
mod ty;
