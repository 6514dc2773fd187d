use serde::{
    Deserialize,
    Serialize,
};
use strum::Display;

use crate::{
    Register,
    ValueType,
};

/// One node of a convention's decision tree.
///
/// The set of node kinds is closed: a rule file naming any other `kind` is rejected when it
/// is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Runs `action` only if `condition` holds.
    Predicate {
        condition: Condition,
        action: Box<Action>,
        #[serde(default)]
        mode: Mode,
    },
    /// Claims the first free register of `registers`.
    ///
    /// On success, the parallel shadow register is reserved as well (if any are given) and
    /// a stack slot is reserved if `stack` is set.
    RegisterAssign {
        registers: Vec<Register>,
        #[serde(default)]
        shadow_registers: Vec<Register>,
        #[serde(default)]
        stack: Option<StackSlot>,
    },
    /// Claims the first free register of `registers` while reserving the shadow register at
    /// the same position.
    RegisterAssignWithShadow {
        registers: Vec<Register>,
        #[serde(default)]
        shadow_registers: Vec<Register>,
    },
    StackAssign {
        #[serde(default)]
        size: Option<u32>,
        #[serde(default)]
        align: Option<u32>,
    },
    StackAssignWithShadow {
        size: u32,
        align: u32,
        shadow_registers: Vec<Register>,
    },
    /// Rewrites the location type and extension mode seen by the following actions.
    TypeTransform {
        transform: Transform,
        dest_type: ValueType,
    },
    PassByValue {
        size: u32,
        align: u32,
    },
    CustomHandler {
        handler: String,
    },
    Delegate {
        target: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Holds if the location type equals any of the given types.
    ValueTypes(Vec<ValueType>),
    /// An opaque boolean expression, copied verbatim into the generated procedure.
    Expr(String),
}

/// The classification discipline an action belongs to.
///
/// Registers claimed by auxiliary actions are accounted for separately from the primary
/// ones. The mode never changes control flow.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Mode {
    #[default]
    Primary,
    Auxiliary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Transform {
    Promote,
    PromoteUpperBits,
    BitConvert,
    Truncate,
    PassIndirect,
}

/// Size and alignment of a stack reservation. A missing or zero value is derived from the
/// location type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackSlot {
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub align: Option<u32>,
}

impl StackSlot {
    pub const fn new(size: u32, align: u32) -> Self {
        Self {
            size: Some(size),
            align: Some(align),
        }
    }

    /// The explicit size, treating zero as "derived".
    pub fn explicit_size(&self) -> Option<u32> {
        self.size.filter(|size| *size != 0)
    }

    /// The explicit alignment, treating zero as "derived".
    pub fn explicit_align(&self) -> Option<u32> {
        self.align.filter(|align| *align != 0)
    }
}

impl Action {
    pub fn if_type<T: Into<ValueType>>(
        value_types: impl IntoIterator<Item = T>,
        action: Self,
    ) -> Self {
        Self::Predicate {
            condition: Condition::ValueTypes(value_types.into_iter().map(Into::into).collect()),
            action: Box::new(action),
            mode: Mode::Primary,
        }
    }

    pub fn if_expr(expr: impl Into<String>, action: Self) -> Self {
        Self::Predicate {
            condition: Condition::Expr(expr.into()),
            action: Box::new(action),
            mode: Mode::Primary,
        }
    }

    /// Marks a predicate as belonging to the auxiliary mode. Other actions are returned as is.
    #[must_use]
    pub fn auxiliary(mut self) -> Self {
        if let Self::Predicate { mode, .. } = &mut self {
            *mode = Mode::Auxiliary;
        }
        self
    }

    pub fn assign_to_reg<R: Into<Register>>(registers: impl IntoIterator<Item = R>) -> Self {
        Self::RegisterAssign {
            registers: registers.into_iter().map(Into::into).collect(),
            shadow_registers: Vec::new(),
            stack: None,
        }
    }

    pub fn assign_to_reg_with_shadow<R: Into<Register>, S: Into<Register>>(
        registers: impl IntoIterator<Item = R>,
        shadow_registers: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::RegisterAssignWithShadow {
            registers: registers.into_iter().map(Into::into).collect(),
            shadow_registers: shadow_registers.into_iter().map(Into::into).collect(),
        }
    }

    pub const fn assign_to_stack(size: u32, align: u32) -> Self {
        Self::StackAssign {
            size: Some(size),
            align: Some(align),
        }
    }

    pub fn transform(transform: Transform, dest_type: impl Into<ValueType>) -> Self {
        Self::TypeTransform {
            transform,
            dest_type: dest_type.into(),
        }
    }

    pub fn delegate(target: impl Into<String>) -> Self {
        Self::Delegate {
            target: target.into(),
        }
    }

    pub fn custom(handler: impl Into<String>) -> Self {
        Self::CustomHandler {
            handler: handler.into(),
        }
    }

    /// The mode declared by this action itself.
    pub const fn mode(&self) -> Mode {
        match self {
            Self::Predicate { mode, .. } => *mode,
            _ => Mode::Primary,
        }
    }

    /// The action guarded by a predicate.
    pub fn nested(&self) -> Option<&Self> {
        match self {
            Self::Predicate { action, .. } => Some(action.as_ref()),
            _ => None,
        }
    }

    /// Iterates over this action and every action nested in it, outermost first.
    pub fn walk(&self) -> impl Iterator<Item = &Self> {
        std::iter::successors(Some(self), |action| action.nested())
    }
}
