use std::fmt;
use std::io;

use super::{Instruction, IrProgram, OpCode, Operand};
use crate::frontend::symbol_table::Symbols;

/// Human-readable rendering of one instruction, e.g. `tmp.2 = a + tmp.1`
/// or `if a >= b goto L3`. Missing operands print as `?`.
pub struct InstructionDisplay<'a> {
    instr: &'a Instruction,
    symbols: Symbols<'a>,
}

impl<'a> InstructionDisplay<'a> {
    pub fn new(instr: &'a Instruction, symbols: Symbols<'a>) -> Self {
        Self { instr, symbols }
    }

    fn operand(&self, operand: Option<Operand>) -> OperandDisplay<'a> {
        OperandDisplay {
            operand,
            symbols: self.symbols,
        }
    }
}

struct OperandDisplay<'a> {
    operand: Option<Operand>,
    symbols: Symbols<'a>,
}

impl fmt::Display for OperandDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand {
            Some(Operand::Int(value)) => write!(f, "{}", value),
            Some(Operand::Symbol(id)) => match self.symbols.get(id) {
                Some(entry) => f.write_str(&entry.name),
                None => write!(f, "<{:?}>", id),
            },
            Some(Operand::Label(label)) => write!(f, "{}", label),
            None => f.write_str("?"),
        }
    }
}

fn operator(op: OpCode) -> &'static str {
    match op {
        OpCode::Add => "+",
        OpCode::Sub | OpCode::Neg => "-",
        OpCode::Mul => "*",
        OpCode::Div => "/",
        OpCode::Eq => "==",
        OpCode::Ne => "!=",
        OpCode::Lt => "<",
        OpCode::Le => "<=",
        OpCode::Gt => ">",
        OpCode::Ge => ">=",
        other => other.name(),
    }
}

impl fmt::Display for InstructionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let instr = self.instr;
        let src1 = self.operand(instr.src1);
        let src2 = self.operand(instr.src2);
        let dest = self.operand(instr.dest);
        match instr.op {
            OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div => {
                write!(f, "{} = {} {} {}", dest, src1, operator(instr.op), src2)
            }
            OpCode::Neg => write!(f, "{} = -{}", dest, src1),
            OpCode::Assign => write!(f, "{} = {}", dest, src1),
            OpCode::Goto => write!(f, "goto {}", dest),
            OpCode::Eq | OpCode::Ne | OpCode::Lt | OpCode::Le | OpCode::Gt | OpCode::Ge => {
                write!(
                    f,
                    "if {} {} {} goto {}",
                    src1,
                    operator(instr.op),
                    src2,
                    dest
                )
            }
            OpCode::Label => write!(f, "label {}", dest),
            OpCode::Enter => write!(f, "enter {}", dest),
            OpCode::Leave => write!(f, "leave {}", dest),
            OpCode::Param => write!(f, "param {}", src1),
            OpCode::Call => write!(f, "call {}, {}", src1, src2),
            OpCode::Return => f.write_str("return"),
            OpCode::SetRetVal => write!(f, "set_retval {}", src1),
            OpCode::GetRetVal => write!(f, "{} = get_retval", dest),
        }
    }
}

/// Writes the IR listing of every function, one instruction per line.
pub fn write_program(program: &IrProgram, mut out: impl io::Write) -> io::Result<()> {
    for func in &program.functions {
        let symbols = program.symbols_of(func);
        writeln!(out, "# function {}", func.name)?;
        for instr in &func.code {
            writeln!(out, "{}", instr.display(symbols))?;
        }
        writeln!(out)?;
    }
    Ok(())
}
