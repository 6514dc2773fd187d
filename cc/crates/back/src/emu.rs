//! Runs synthesized procedures against a simulated allocation state.

use std::ops::ControlFlow;

use ccgen_front::{
    Register,
    ValueType,
};
use rustc_hash::{
    FxHashMap,
    FxHashSet,
};
use tracing::debug;

use crate::codegen::{
    procedure::ConstantId,
    Extent,
    Guard,
    LocInfo,
    Outcome,
    Procedure,
    RegOperand,
    Stmt,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub val_no: u32,
    pub val_vt: ValueType,
    pub sext: bool,
    pub zext: bool,
}

impl Argument {
    pub fn new(val_no: u32, val_vt: &str) -> Self {
        Self {
            val_no,
            val_vt: ValueType::from(val_vt),
            sext: false,
            zext: false,
        }
    }

    pub fn sign_extended(self) -> Self {
        Self { sext: true, ..self }
    }

    pub fn zero_extended(self) -> Self {
        Self { zext: true, ..self }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Reg {
        val_no: u32,
        register: Register,
        loc_vt: ValueType,
        loc_info: LocInfo,
    },
    Mem {
        val_no: u32,
        offset: u64,
        loc_vt: ValueType,
        loc_info: LocInfo,
    },
    ByVal {
        val_no: u32,
        size: u32,
        align: u32,
    },
}

/// Allocation state shared by all arguments of one call.
#[derive(Debug, Default)]
pub struct State {
    allocated: FxHashSet<Register>,
    stack_size: u64,
    locations: Vec<Location>,
    predicates: FxHashSet<String>,
    handlers: FxHashSet<String>,
}

impl State {
    /// Makes the opaque predicate `expr` hold.
    pub fn with_predicate(mut self, expr: &str) -> Self {
        self.predicates.insert(expr.to_string());
        self
    }

    /// Makes the external handler `name` handle every argument.
    pub fn with_handler(mut self, name: &str) -> Self {
        self.handlers.insert(name.to_string());
        self
    }

    pub fn claim(&mut self, register: &str) {
        self.allocated.insert(Register::from(register));
    }

    pub fn is_allocated(&self, register: &str) -> bool {
        self.allocated.contains(&Register::from(register))
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub const fn stack_size(&self) -> u64 {
        self.stack_size
    }

    pub fn allocate_reg(&mut self, registers: &[Register], shadows: &[Register]) -> Option<Register> {
        let index = registers
            .iter()
            .position(|register| !self.allocated.contains(register))?;
        self.allocated.insert(registers[index].clone());
        if let Some(shadow) = shadows.get(index) {
            self.allocated.insert(shadow.clone());
        }
        Some(registers[index].clone())
    }

    pub fn allocate_stack(&mut self, size: u32, align: u32, shadows: &[Register]) -> u64 {
        let align = u64::from(align.max(1));
        let offset = self.stack_size.div_ceil(align) * align;
        self.stack_size = offset + u64::from(size);
        self.allocated.extend(shadows.iter().cloned());
        offset
    }
}

/// Interprets procedures the way the generated code would run them.
pub struct Emulator<'p> {
    procedures: FxHashMap<&'p str, &'p Procedure>,
}

struct Frame<'a> {
    argument: &'a Argument,
    loc_vt: ValueType,
    loc_info: LocInfo,
    lists: FxHashMap<ConstantId, Vec<Register>>,
    offsets: FxHashMap<ConstantId, u64>,
    register: Option<Register>,
}

impl<'p> Emulator<'p> {
    pub fn new(procedures: &'p [Procedure]) -> Self {
        Self {
            procedures: procedures
                .iter()
                .map(|procedure| (procedure.name.as_str(), procedure))
                .collect(),
        }
    }

    pub fn run(&self, name: &str, argument: &Argument, state: &mut State) -> Outcome {
        self.call(name, argument, argument.val_vt.clone(), LocInfo::Full, state)
    }

    fn call(
        &self,
        name: &str,
        argument: &Argument,
        loc_vt: ValueType,
        loc_info: LocInfo,
        state: &mut State,
    ) -> Outcome {
        let Some(procedure) = self.procedures.get(name) else {
            debug!("Calling external procedure {}", name);
            return if state.handlers.contains(name) {
                Outcome::Handled
            } else {
                Outcome::Unhandled
            };
        };
        let mut frame = Frame {
            argument,
            loc_vt,
            loc_info,
            lists: FxHashMap::default(),
            offsets: FxHashMap::default(),
            register: None,
        };
        for block in &procedure.actions {
            if let ControlFlow::Break(outcome) = self.exec(block, &mut frame, state) {
                return outcome;
            }
        }
        Outcome::Unhandled
    }

    fn exec(&self, stmts: &[Stmt], frame: &mut Frame, state: &mut State) -> ControlFlow<Outcome> {
        for stmt in stmts {
            match stmt {
                Stmt::RegList { id, registers, .. } => {
                    frame.lists.insert(*id, registers.clone());
                }
                Stmt::If { guard, body } => {
                    let holds = match guard {
                        Guard::ValueTypes(value_types) => value_types.contains(&frame.loc_vt),
                        Guard::Expr(expr) => state.predicates.contains(expr),
                    };
                    if holds {
                        self.exec(body, frame, state)?;
                    }
                }
                Stmt::Delegate { target } => {
                    let outcome = self.call(
                        target,
                        frame.argument,
                        frame.loc_vt.clone(),
                        frame.loc_info,
                        state,
                    );
                    if outcome == Outcome::Handled {
                        return ControlFlow::Break(Outcome::Handled);
                    }
                }
                Stmt::AllocateReg {
                    registers,
                    shadows,
                    body,
                } => {
                    let registers = frame.operand(registers);
                    let shadows = shadows
                        .as_ref()
                        .map(|shadows| frame.operand(shadows))
                        .unwrap_or_default();
                    if let Some(register) = state.allocate_reg(&registers, &shadows) {
                        frame.register = Some(register);
                        self.exec(body, frame, state)?;
                    }
                }
                Stmt::AllocateStack {
                    offset,
                    size,
                    align,
                    shadows,
                } => {
                    let natural = natural_size(&frame.loc_vt);
                    let size = match size {
                        Extent::Explicit(size) => *size,
                        Extent::Derived => natural,
                    };
                    let align = match align {
                        Extent::Explicit(align) => *align,
                        Extent::Derived => natural,
                    };
                    let shadows = shadows
                        .and_then(|id| frame.lists.get(&id).cloned())
                        .unwrap_or_default();
                    let allocated = state.allocate_stack(size, align, &shadows);
                    if let Some(offset) = offset {
                        frame.offsets.insert(*offset, allocated);
                    }
                }
                Stmt::AddRegLoc => {
                    let register = frame
                        .register
                        .clone()
                        .expect("register location outside of register allocation");
                    state.locations.push(Location::Reg {
                        val_no: frame.argument.val_no,
                        register,
                        loc_vt: frame.loc_vt.clone(),
                        loc_info: frame.loc_info,
                    });
                }
                Stmt::AddMemLoc { offset } => state.locations.push(Location::Mem {
                    val_no: frame.argument.val_no,
                    offset: frame.offsets[offset],
                    loc_vt: frame.loc_vt.clone(),
                    loc_info: frame.loc_info,
                }),
                Stmt::SetLocVT(value_type) => frame.loc_vt = value_type.clone(),
                Stmt::SetLocInfo(loc_info) => frame.loc_info = *loc_info,
                Stmt::ExtendFromFlags { upper } => {
                    let [sext, zext, aext] = LocInfo::extensions(*upper);
                    frame.loc_info = if frame.argument.sext {
                        sext
                    } else if frame.argument.zext {
                        zext
                    } else {
                        aext
                    };
                }
                Stmt::HandleByVal { size, align } => state.locations.push(Location::ByVal {
                    val_no: frame.argument.val_no,
                    size: *size,
                    align: *align,
                }),
                Stmt::Custom { handler } => {
                    if state.handlers.contains(handler) {
                        return ControlFlow::Break(Outcome::Handled);
                    }
                }
                Stmt::Return(outcome) => return ControlFlow::Break(*outcome),
            }
        }
        ControlFlow::Continue(())
    }
}

impl Frame<'_> {
    fn operand(&self, operand: &RegOperand) -> Vec<Register> {
        match operand {
            RegOperand::Reg(register) => vec![register.clone()],
            RegOperand::List(id) => self.lists[id].clone(),
        }
    }
}

/// Allocation size in bytes of a value type, which also serves as its alignment.
fn natural_size(value_type: &ValueType) -> u32 {
    let name = value_type.name().strip_prefix("nx").unwrap_or(value_type.name());
    let lanes = name
        .strip_prefix('v')
        .map(|rest| {
            rest.chars()
                .take_while(char::is_ascii_digit)
                .collect::<String>()
        })
        .and_then(|lanes| lanes.parse::<u32>().ok())
        .unwrap_or(1);
    let bits = value_type
        .element_name()
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .parse::<u32>()
        .unwrap_or(8);
    (lanes * bits).div_ceil(8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_derive_natural_sizes_from_type_names() {
        assert_eq!(natural_size(&ValueType::from("i1")), 1);
        assert_eq!(natural_size(&ValueType::from("i32")), 4);
        assert_eq!(natural_size(&ValueType::from("f64")), 8);
        assert_eq!(natural_size(&ValueType::from("v4f32")), 16);
    }

    #[test]
    fn should_align_stack_offsets() {
        let mut state = State::default();
        assert_eq!(state.allocate_stack(1, 1, &[]), 0);
        assert_eq!(state.allocate_stack(8, 8, &[]), 8);
        assert_eq!(state.stack_size(), 16);
    }
}
