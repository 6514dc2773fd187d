use ccgen_front::{
    Register,
    ValueType,
};
use strum::Display;

/// Number of an anonymous constant (register list or stack offset) within one procedure.
pub type ConstantId = u32;

/// A synthesized classification procedure.
///
/// Every procedure takes `(ValNo, ValVT, LocVT, LocInfo, ArgFlags, State)` and returns an
/// [`Outcome`]. `LocVT` and `LocInfo` are local to one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Procedure {
    pub name: String,
    pub entry_point: bool,
    /// One block per top-level action of the convention, in order.
    pub actions: Vec<Vec<Stmt>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// Declares the constant register list `<kind><id>`.
    RegList {
        id: ConstantId,
        kind: RegListKind,
        registers: Vec<Register>,
    },
    If {
        guard: Guard,
        body: Vec<Stmt>,
    },
    /// Calls another procedure and returns [`Outcome::Handled`] if it did.
    Delegate {
        target: String,
    },
    /// Claims the first free register of `registers`, reserving the shadow register at the same
    /// position, and runs `body` if one was free.
    AllocateReg {
        registers: RegOperand,
        shadows: Option<RegOperand>,
        body: Vec<Stmt>,
    },
    /// Reserves a stack slot. The offset is bound to `Offset<id>` if `offset` is set and
    /// discarded otherwise.
    AllocateStack {
        offset: Option<ConstantId>,
        size: Extent,
        align: Extent,
        shadows: Option<ConstantId>,
    },
    /// Assigns the register claimed by the enclosing [`Stmt::AllocateReg`].
    AddRegLoc,
    AddMemLoc {
        offset: ConstantId,
    },
    SetLocVT(ValueType),
    SetLocInfo(LocInfo),
    /// Picks the sign, zero or any extension requested by the argument flags.
    ExtendFromFlags {
        upper: bool,
    },
    HandleByVal {
        size: u32,
        align: u32,
    },
    /// Calls an externally implemented handler and returns [`Outcome::Handled`] if it did.
    Custom {
        handler: String,
    },
    Return(Outcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum RegListKind {
    RegList,
    ShadowRegList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegOperand {
    Reg(Register),
    /// A list declared by a preceding [`Stmt::RegList`].
    List(ConstantId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// Holds if `LocVT` is any of the types.
    ValueTypes(Vec<ValueType>),
    Expr(String),
}

/// A stack slot size or alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    Explicit(u32),
    /// Taken from the data layout for the current `LocVT`.
    Derived,
}

/// How the value is transformed on its way into its location.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum LocInfo {
    #[default]
    Full,
    SExt,
    ZExt,
    AExt,
    SExtUpper,
    ZExtUpper,
    AExtUpper,
    BCvt,
    Trunc,
    FPExt,
    Indirect,
}

impl LocInfo {
    /// The sign, zero and any extension, in that order.
    pub const fn extensions(upper: bool) -> [Self; 3] {
        if upper {
            [Self::SExtUpper, Self::ZExtUpper, Self::AExtUpper]
        } else {
            [Self::SExt, Self::ZExt, Self::AExt]
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// A location was assigned; no further action runs.
    Handled,
    Unhandled,
}

impl Outcome {
    /// The value returned by a generated procedure. Procedures return `false` once they handled
    /// the argument.
    pub const fn as_cxx(self) -> &'static str {
        match self {
            Self::Handled => "false",
            Self::Unhandled => "true",
        }
    }
}
