use std::io::Write;

use log::{info, trace};

use crate::backend::asm_writer::AsmWriter;
use crate::backend::runtime;
use crate::backend::stack_frame::{StackFrame, global_label};
use crate::error::{CompileError, CompileResult};
use crate::frontend::symbol_table::{SymbolId, WORD_SIZE};
use crate::ir::{FunctionIr, Instruction, IrProgram, Label, OpCode, Operand};

// Scratch registers. Nothing is kept in a register across IR instructions.
const T0: &str = "$t0";
const T1: &str = "$t1";
const V0: &str = "$v0";

pub struct MipsGenerator<'a, W: Write> {
    program: &'a IrProgram,
    writer: AsmWriter<W>,
}

impl<'a, W: Write> MipsGenerator<'a, W> {
    pub fn new(program: &'a IrProgram, writer: W) -> Self {
        Self {
            program,
            writer: AsmWriter::new(writer),
        }
    }

    pub fn generate_program(&mut self) -> CompileResult<()> {
        runtime::write_preamble(&mut self.writer)?;

        let program = self.program;
        for func in &program.functions {
            let mut func_gen = FunctionGenerator::new(self, func);
            func_gen.generate_function()?;
        }

        self.generate_globals()?;
        self.writer.flush()?;
        Ok(())
    }

    /// One word of zero-initialised storage per global variable
    fn generate_globals(&mut self) -> CompileResult<()> {
        let mut vars = self
            .program
            .globals
            .iter()
            .filter(|entry| !entry.is_function())
            .peekable();
        if vars.peek().is_none() {
            return Ok(());
        }

        self.writer.write_comment("global variables")?;
        self.writer.write_directive("data", &[])?;
        self.writer.write_directive("align", &["2"])?;
        for var in vars {
            let size = WORD_SIZE.to_string();
            self.writer.write_data(&global_label(&var.name), "space", &[&size])?;
        }
        self.writer.write_blank_line()?;
        Ok(())
    }
}

struct FunctionGenerator<'a, 'b, W: Write> {
    generator: &'a mut MipsGenerator<'b, W>,
    func: &'b FunctionIr,
    stack_frame: StackFrame<'b>,
}

impl<'a, 'b, W: Write> FunctionGenerator<'a, 'b, W> {
    fn new(mips_gen: &'a mut MipsGenerator<'b, W>, func: &'b FunctionIr) -> Self {
        let stack_frame = StackFrame::new(mips_gen.program.symbols_of(func));
        Self {
            generator: mips_gen,
            func,
            stack_frame,
        }
    }

    fn generate_function(&mut self) -> CompileResult<()> {
        info!(
            "translating `{}` ({} instructions)",
            self.func.name,
            self.func.code.len()
        );
        let func = self.func;
        for instr in &func.code {
            self.generate_block(instr)?;
        }
        Ok(())
    }

    /// The IR line as a comment, its translation, then a blank line
    fn generate_block(&mut self, instr: &Instruction) -> CompileResult<()> {
        let text = instr.display(self.stack_frame.symbols()).to_string();
        trace!("{}", text);
        self.generator.writer.write_comment(&text)?;
        self.generate_instruction(instr)?;
        self.generator.writer.write_blank_line()?;
        Ok(())
    }

    fn generate_instruction(&mut self, instr: &Instruction) -> CompileResult<()> {
        let op = instr.op;
        match op {
            OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div => {
                self.load_operand(instr.src1, T0, op)?;
                self.load_operand(instr.src2, T1, op)?;
                self.inst(map_arith_op(op), &[T0, T0, T1])?;
                self.store_dest(instr.dest, T0, op)?;
            }

            OpCode::Neg => {
                self.load_operand(instr.src1, T0, op)?;
                self.inst("subu", &[T0, "$zero", T0])?;
                self.store_dest(instr.dest, T0, op)?;
            }

            OpCode::Assign => {
                self.load_operand(instr.src1, T0, op)?;
                self.store_dest(instr.dest, T0, op)?;
            }

            OpCode::Goto => {
                let target = jump_target(instr)?;
                self.inst("j", &[&target.to_string()])?;
            }

            OpCode::Eq | OpCode::Ne | OpCode::Lt | OpCode::Le | OpCode::Gt | OpCode::Ge => {
                let target = jump_target(instr)?;
                self.load_operand(instr.src1, T0, op)?;
                self.load_operand(instr.src2, T1, op)?;
                self.inst(map_branch_op(op), &[T0, T1, &target.to_string()])?;
            }

            OpCode::Label => {
                let label = instr
                    .dest
                    .and_then(Operand::as_label)
                    .ok_or(CompileError::malformed(op, "label needs a label operand"))?;
                self.generator.writer.write_label(&label.to_string())?;
            }

            OpCode::Enter => self.generate_prologue(instr)?,

            OpCode::Leave => self.generate_epilogue()?,

            OpCode::Return => self.inst("jr", &["$ra"])?,

            OpCode::Param => {
                self.load_operand(instr.src1, T0, op)?;
                let push = format!("{}($sp)", -WORD_SIZE);
                self.inst("la", &["$sp", &push])?;
                self.inst("sw", &[T0, "0($sp)"])?;
            }

            OpCode::Call => {
                let callee = instr
                    .src1
                    .and_then(Operand::as_symbol)
                    .ok_or(CompileError::malformed(op, "callee must be a symbol"))?;
                let num_args = instr
                    .src2
                    .and_then(Operand::as_int)
                    .ok_or(CompileError::malformed(op, "argument count must be an integer"))?;
                let name = self.function_name(callee)?;
                self.inst("jal", &[&global_label(name)])?;

                // Caller pops its own arguments
                let pop = format!("{}($sp)", num_args * WORD_SIZE);
                self.inst("la", &["$sp", &pop])?;
            }

            OpCode::SetRetVal => self.load_operand(instr.src1, V0, op)?,

            OpCode::GetRetVal => self.store_dest(instr.dest, V0, op)?,
        }
        Ok(())
    }

    fn generate_prologue(&mut self, instr: &Instruction) -> CompileResult<()> {
        let func = instr
            .dest
            .and_then(Operand::as_symbol)
            .ok_or(CompileError::malformed(OpCode::Enter, "operand must be the function"))?;
        let name = self.function_name(func)?;
        let locals = format!("{}($sp)", -self.stack_frame.locals_size());

        self.generator.writer.write_directive("text", &[])?;
        self.generator.writer.write_label(&global_label(name))?;
        self.inst("la", &["$sp", "-8($sp)"])?;
        self.inst("sw", &["$fp", "4($sp)"])?;
        self.inst("sw", &["$ra", "0($sp)"])?;
        self.inst("la", &["$fp", "0($sp)"])?;
        self.inst("la", &["$sp", &locals])?;
        Ok(())
    }

    /// Undoes the prologue. The `jr` comes from the following `return`.
    fn generate_epilogue(&mut self) -> CompileResult<()> {
        self.inst("la", &["$sp", "0($fp)"])?;
        self.inst("lw", &["$ra", "0($sp)"])?;
        self.inst("lw", &["$fp", "4($sp)"])?;
        self.inst("la", &["$sp", "8($sp)"])?;
        Ok(())
    }

    fn function_name(&self, id: SymbolId) -> CompileResult<&'b str> {
        let entry = self
            .stack_frame
            .symbols()
            .get(id)
            .ok_or(CompileError::StaleSymbol(id))?;
        if entry.is_function() {
            Ok(&entry.name)
        } else {
            Err(CompileError::NotAFunction(entry.name.clone()))
        }
    }

    fn load_operand(&mut self, operand: Option<Operand>, reg: &str, op: OpCode) -> CompileResult<()> {
        match operand {
            Some(Operand::Int(value)) => self.inst("li", &[reg, &value.to_string()]),
            Some(Operand::Symbol(id)) => {
                let addr = self.stack_frame.address(id)?;
                self.inst("lw", &[reg, &addr])
            }
            Some(Operand::Label(_)) => Err(CompileError::malformed(op, "cannot load a label")),
            None => Err(CompileError::malformed(op, "missing source operand")),
        }
    }

    fn store_dest(&mut self, dest: Option<Operand>, reg: &str, op: OpCode) -> CompileResult<()> {
        let id = dest
            .and_then(Operand::as_symbol)
            .ok_or(CompileError::malformed(op, "destination must be a variable"))?;
        let addr = self.stack_frame.address(id)?;
        self.inst("sw", &[reg, &addr])
    }

    fn inst(&mut self, inst: &str, args: &[&str]) -> CompileResult<()> {
        self.generator.writer.write_inst(inst, args)?;
        Ok(())
    }
}

fn jump_target(instr: &Instruction) -> CompileResult<Label> {
    instr
        .dest
        .and_then(Operand::as_label)
        .ok_or(CompileError::malformed(instr.op, "jump target must be a label"))
}

fn map_arith_op(op: OpCode) -> &'static str {
    match op {
        OpCode::Add => "addu",
        OpCode::Sub => "subu",
        OpCode::Mul => "mul",
        _ => "div",
    }
}

fn map_branch_op(op: OpCode) -> &'static str {
    match op {
        OpCode::Eq => "beq",
        OpCode::Ne => "bne",
        OpCode::Lt => "blt",
        OpCode::Le => "ble",
        OpCode::Gt => "bgt",
        _ => "bge",
    }
}
