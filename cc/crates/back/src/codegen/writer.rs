use itertools::Itertools;

use crate::codegen::procedure::{
    Extent,
    Guard,
    LocInfo,
    Outcome,
    Procedure,
    RegOperand,
    Stmt,
};

const PARAMETERS: [&str; 3] = [
    "unsigned ValNo, MVT ValVT,",
    "MVT LocVT, CCValAssign::LocInfo LocInfo,",
    "ISD::ArgFlagsTy ArgFlags, CCState &State)",
];
const ARGUMENTS: &str = "ValNo, ValVT, LocVT, LocInfo, ArgFlags, State";
const DERIVED_SIZE: &str =
    "State.getMachineFunction().getDataLayout().getTypeAllocSize(EVT(LocVT).getTypeForEVT(State.getContext()))";
const DERIVED_ALIGN: &str =
    "State.getMachineFunction().getDataLayout().getABITypeAlign(EVT(LocVT).getTypeForEVT(State.getContext()))";

/// Prints procedures as C++ against the LLVM `CCState` interface.
pub struct CxxWriter {
    indent: usize,
    entry_point_prefix: String,
    code: String,
}

impl CxxWriter {
    /// `entry_point_prefix` precedes the names of entry point procedures, e.g. `bool llvm::`.
    pub fn new(entry_point_prefix: impl Into<String>) -> Self {
        Self {
            indent: 0,
            entry_point_prefix: entry_point_prefix.into(),
            code: String::new(),
        }
    }

    pub fn finish(self) -> String {
        self.code
    }

    pub fn write(&mut self, text: &str) {
        self.code.push_str(text);
    }

    pub fn write_line(&mut self, line: &str) {
        self.write(line);
        self.write("\n");
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.write("  ");
        }
    }

    fn indentation(&self) -> String {
        "  ".repeat(self.indent)
    }

    pub fn write_prototype(&mut self, procedure: &Procedure) {
        self.write_signature(procedure);
        self.write(";\n");
    }

    pub fn write_procedure(&mut self, procedure: &Procedure) {
        self.write_signature(procedure);
        self.write(" {\n");
        self.indent += 1;
        for action in &procedure.actions {
            self.write("\n");
            self.write_block(action);
        }
        self.write("\n");
        self.write_indent();
        self.write(&format!(
            "return {}; // CC didn't match.\n",
            Outcome::Unhandled.as_cxx()
        ));
        self.indent -= 1;
        self.write("}\n");
    }

    fn write_signature(&mut self, procedure: &Procedure) {
        let prefix = if procedure.entry_point {
            self.entry_point_prefix.clone()
        } else {
            "static bool ".to_string()
        };
        let pad = " ".repeat(prefix.len() + procedure.name.len() + 1);
        self.write(&format!("{prefix}{}(", procedure.name));
        let separator = format!("\n{pad}");
        self.write(&PARAMETERS.join(separator.as_str()));
    }

    fn write_block(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.write_stmt(stmt);
        }
    }

    fn write_nested(&mut self, stmts: &[Stmt]) {
        self.indent += 1;
        self.write_block(stmts);
        self.indent -= 1;
    }

    fn write_stmt(&mut self, stmt: &Stmt) {
        let indent = self.indentation();
        self.write_indent();
        match stmt {
            Stmt::RegList {
                id,
                kind,
                registers,
            } => {
                self.write(&format!("static const MCPhysReg {kind}{id}[] = {{\n"));
                self.write(&format!("{indent}  {}\n", registers.iter().join(", ")));
                self.write(&format!("{indent}}};\n"));
            }
            Stmt::If { guard, body } => {
                let condition = match guard {
                    Guard::ValueTypes(value_types) => value_types
                        .iter()
                        .map(|value_type| format!("LocVT == MVT::{value_type}"))
                        .join(&format!(" ||\n    {indent}")),
                    Guard::Expr(expr) => expr.clone(),
                };
                self.write(&format!("if ({condition}) {{\n"));
                self.write_nested(body);
                self.write(&format!("{indent}}}\n"));
            }
            Stmt::Delegate { target } => {
                self.write(&format!("if (!{target}({ARGUMENTS}))\n"));
                self.write_return(&indent, Outcome::Handled);
            }
            Stmt::AllocateReg {
                registers,
                shadows,
                body,
            } => {
                let mut operands = Self::operand(registers);
                if let Some(shadows) = shadows {
                    operands.push_str(", ");
                    operands.push_str(&Self::operand(shadows));
                }
                self.write(&format!(
                    "if (MCRegister Reg = State.AllocateReg({operands})) {{\n"
                ));
                self.write_nested(body);
                self.write(&format!("{indent}}}\n"));
            }
            Stmt::AllocateStack {
                offset,
                size,
                align,
                shadows,
            } => {
                // A discarded reservation follows its register assignment, whose column the
                // continuation lines keep.
                let continuation = match offset {
                    Some(offset) => {
                        self.write(&format!("int64_t Offset{offset} = "));
                        format!("{indent}  ")
                    }
                    None => {
                        self.write("(void)");
                        indent.clone()
                    }
                };
                self.write("State.AllocateStack(");
                match size {
                    Extent::Explicit(size) => self.write(&format!("{size}, ")),
                    Extent::Derived => {
                        self.write(&format!("\n{continuation}{DERIVED_SIZE}, "));
                    }
                }
                match align {
                    Extent::Explicit(align) => self.write(&format!("Align({align})")),
                    Extent::Derived => self.write(&format!("\n{continuation}{DERIVED_ALIGN}")),
                }
                if let Some(shadows) = shadows {
                    self.write(&format!(", ShadowRegList{shadows}"));
                }
                self.write(");\n");
            }
            Stmt::AddRegLoc => self.write(
                "State.addLoc(CCValAssign::getReg(ValNo, ValVT, Reg, LocVT, LocInfo));\n",
            ),
            Stmt::AddMemLoc { offset } => self.write(&format!(
                "State.addLoc(CCValAssign::getMem(ValNo, ValVT, Offset{offset}, LocVT, LocInfo));\n"
            )),
            Stmt::SetLocVT(value_type) => self.write(&format!("LocVT = MVT::{value_type};\n")),
            Stmt::SetLocInfo(loc_info) => {
                self.write(&format!("LocInfo = CCValAssign::{loc_info};\n"));
            }
            Stmt::ExtendFromFlags { upper } => {
                let [sext, zext, aext] = LocInfo::extensions(*upper);
                self.write("if (ArgFlags.isSExt())\n");
                self.write(&format!("{indent}  LocInfo = CCValAssign::{sext};\n"));
                self.write(&format!("{indent}else if (ArgFlags.isZExt())\n"));
                self.write(&format!("{indent}  LocInfo = CCValAssign::{zext};\n"));
                self.write(&format!("{indent}else\n"));
                self.write(&format!("{indent}  LocInfo = CCValAssign::{aext};\n"));
            }
            Stmt::HandleByVal { size, align } => self.write(&format!(
                "State.HandleByVal(ValNo, ValVT, LocVT, LocInfo, {size}, Align({align}), ArgFlags);\n"
            )),
            Stmt::Custom { handler } => {
                self.write(&format!("if ({handler}({ARGUMENTS}))\n"));
                self.write_return(&indent, Outcome::Handled);
            }
            Stmt::Return(outcome) => self.write(&format!("return {};\n", outcome.as_cxx())),
        }
    }

    fn write_return(&mut self, indent: &str, outcome: Outcome) {
        self.write(&format!("{indent}  return {};\n", outcome.as_cxx()));
    }

    fn operand(operand: &RegOperand) -> String {
        match operand {
            RegOperand::Reg(register) => register.to_string(),
            RegOperand::List(id) => format!("RegList{id}"),
        }
    }
}
