use ccgen_front::{
    Action,
    Condition,
    ConventionRule,
    Mode,
    Register,
    StackSlot,
    Transform,
    ValueType,
};
use ccgen_middle::Context;
use tracing::{
    debug,
    trace,
};

use crate::{
    codegen::procedure::{
        ConstantId,
        Extent,
        Guard,
        LocInfo,
        Outcome,
        Procedure,
        RegListKind,
        RegOperand,
        Stmt,
    },
    SynthesisError,
};

/// Lowers calling convention rules to procedures.
///
/// Every register a rule names is recorded in the [`Context`] under the convention and the mode
/// of the action naming it, as is every delegation.
pub struct Synthesizer<'ctx> {
    ctx: &'ctx mut Context,
    convention: String,
    next_constant: ConstantId,
}

impl<'ctx> Synthesizer<'ctx> {
    pub fn new(ctx: &'ctx mut Context) -> Self {
        Self {
            ctx,
            convention: String::new(),
            next_constant: 0,
        }
    }

    pub fn synthesize(&mut self, rule: &ConventionRule) -> Result<Procedure, SynthesisError> {
        debug!("Synthesizing {}", rule.name);
        self.convention.clone_from(&rule.name);
        self.next_constant = 0;
        self.ctx.declare(&rule.name);
        let actions = rule
            .actions
            .iter()
            .map(|action| {
                let mut block = Vec::new();
                self.lower(action, action.mode(), &mut block)?;
                Ok(block)
            })
            .collect::<Result<Vec<_>, SynthesisError>>()?;
        Ok(Procedure {
            name: rule.name.clone(),
            entry_point: rule.entry_point,
            actions,
        })
    }

    fn lower(
        &mut self,
        action: &Action,
        mode: Mode,
        out: &mut Vec<Stmt>,
    ) -> Result<(), SynthesisError> {
        trace!("Lowering {:?} in {} mode", action, mode);
        match action {
            Action::Predicate {
                condition,
                action,
                mode: nested_mode,
            } => {
                let guard = match condition {
                    Condition::ValueTypes(value_types) if value_types.is_empty() => {
                        return Err(SynthesisError::EmptyValueTypeList {
                            convention: self.convention.clone(),
                        });
                    }
                    Condition::ValueTypes(value_types) => Guard::ValueTypes(value_types.clone()),
                    Condition::Expr(expr) => Guard::Expr(expr.clone()),
                };
                let mut body = Vec::new();
                self.lower(action, mode.max(*nested_mode), &mut body)?;
                out.push(Stmt::If { guard, body });
            }
            Action::Delegate { target } => {
                self.ctx.record_delegation(&self.convention, target);
                out.push(Stmt::Delegate {
                    target: target.clone(),
                });
            }
            Action::RegisterAssign {
                registers,
                shadow_registers,
                stack,
            } => self.lower_register_assign(registers, shadow_registers, *stack, mode, out)?,
            Action::RegisterAssignWithShadow {
                registers,
                shadow_registers,
            } => self.lower_register_assign(registers, shadow_registers, None, mode, out)?,
            Action::StackAssign { size, align } => {
                let slot = StackSlot {
                    size: *size,
                    align: *align,
                };
                self.lower_stack_assign(slot, &[], mode, out)?;
            }
            Action::StackAssignWithShadow {
                size,
                align,
                shadow_registers,
            } => self.lower_stack_assign(
                StackSlot::new(*size, *align),
                shadow_registers,
                mode,
                out,
            )?,
            Action::TypeTransform {
                transform,
                dest_type,
            } => self.lower_transform(*transform, dest_type, out)?,
            Action::PassByValue { size, align } => {
                self.check_alignment(*align)?;
                out.push(Stmt::HandleByVal {
                    size: *size,
                    align: *align,
                });
                out.push(Stmt::Return(Outcome::Handled));
            }
            Action::CustomHandler { handler } => out.push(Stmt::Custom {
                handler: handler.clone(),
            }),
        }
        Ok(())
    }

    fn lower_register_assign(
        &mut self,
        registers: &[Register],
        shadows: &[Register],
        stack: Option<StackSlot>,
        mode: Mode,
        out: &mut Vec<Stmt>,
    ) -> Result<(), SynthesisError> {
        if registers.is_empty() {
            return Err(SynthesisError::EmptyRegisterList {
                convention: self.convention.clone(),
            });
        }
        if !shadows.is_empty() && shadows.len() != registers.len() {
            return Err(SynthesisError::ShadowLengthMismatch {
                convention: self.convention.clone(),
                expected: registers.len(),
                found: shadows.len(),
            });
        }
        let stack = stack.map(|slot| self.extents(slot)).transpose()?;
        self.claim(mode, registers);
        self.claim(mode, shadows);
        let (registers, shadows) = match (registers, shadows) {
            ([register], []) => (RegOperand::Reg(register.clone()), None),
            ([register], [shadow]) => (
                RegOperand::Reg(register.clone()),
                Some(RegOperand::Reg(shadow.clone())),
            ),
            _ => {
                let registers = self.declare_list(RegListKind::RegList, registers, out);
                let shadows = (!shadows.is_empty())
                    .then(|| self.declare_list(RegListKind::RegList, shadows, out));
                (
                    RegOperand::List(registers),
                    shadows.map(RegOperand::List),
                )
            }
        };
        let mut body = vec![Stmt::AddRegLoc];
        if let Some((size, align)) = stack {
            body.push(Stmt::AllocateStack {
                offset: None,
                size,
                align,
                shadows: None,
            });
        }
        body.push(Stmt::Return(Outcome::Handled));
        out.push(Stmt::AllocateReg {
            registers,
            shadows,
            body,
        });
        Ok(())
    }

    fn lower_stack_assign(
        &mut self,
        slot: StackSlot,
        shadows: &[Register],
        mode: Mode,
        out: &mut Vec<Stmt>,
    ) -> Result<(), SynthesisError> {
        let (size, align) = self.extents(slot)?;
        self.claim(mode, shadows);
        let shadows = (!shadows.is_empty())
            .then(|| self.declare_list(RegListKind::ShadowRegList, shadows, out));
        let offset = self.next_constant();
        out.push(Stmt::AllocateStack {
            offset: Some(offset),
            size,
            align,
            shadows,
        });
        out.push(Stmt::AddMemLoc { offset });
        out.push(Stmt::Return(Outcome::Handled));
        Ok(())
    }

    fn lower_transform(
        &self,
        transform: Transform,
        dest_type: &ValueType,
        out: &mut Vec<Stmt>,
    ) -> Result<(), SynthesisError> {
        let floating_point = dest_type.is_floating_point();
        if transform == Transform::PromoteUpperBits && floating_point {
            return Err(SynthesisError::FloatingPointUpperBits {
                convention: self.convention.clone(),
                dest_type: dest_type.clone(),
            });
        }
        out.push(Stmt::SetLocVT(dest_type.clone()));
        out.push(match transform {
            Transform::Promote if floating_point => Stmt::SetLocInfo(LocInfo::FPExt),
            Transform::Promote => Stmt::ExtendFromFlags { upper: false },
            Transform::PromoteUpperBits => Stmt::ExtendFromFlags { upper: true },
            Transform::BitConvert => Stmt::SetLocInfo(LocInfo::BCvt),
            Transform::Truncate => Stmt::SetLocInfo(LocInfo::Trunc),
            Transform::PassIndirect => Stmt::SetLocInfo(LocInfo::Indirect),
        });
        Ok(())
    }

    fn declare_list(
        &mut self,
        kind: RegListKind,
        registers: &[Register],
        out: &mut Vec<Stmt>,
    ) -> ConstantId {
        let id = self.next_constant();
        out.push(Stmt::RegList {
            id,
            kind,
            registers: registers.to_vec(),
        });
        id
    }

    fn extents(&self, slot: StackSlot) -> Result<(Extent, Extent), SynthesisError> {
        let size = slot.explicit_size().map_or(Extent::Derived, Extent::Explicit);
        let align = match slot.explicit_align() {
            Some(align) => {
                self.check_alignment(align)?;
                Extent::Explicit(align)
            }
            None => Extent::Derived,
        };
        Ok((size, align))
    }

    fn check_alignment(&self, align: u32) -> Result<(), SynthesisError> {
        if align.is_power_of_two() {
            Ok(())
        } else {
            Err(SynthesisError::InvalidAlignment {
                convention: self.convention.clone(),
                align,
            })
        }
    }

    fn claim(&mut self, mode: Mode, registers: &[Register]) {
        for register in registers {
            self.ctx
                .record_register(&self.convention, mode, register.clone());
        }
    }

    fn next_constant(&mut self) -> ConstantId {
        self.next_constant += 1;
        self.next_constant
    }
}
