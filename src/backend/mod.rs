mod asm_writer;
mod mips_generator;
mod runtime;
mod stack_frame;

use std::io;

use mips_generator::MipsGenerator;

use crate::error::CompileResult;
use crate::ir::IrProgram;

pub use runtime::ENTRY_LABEL;

/// Writes SPIM assembly for `program`: the runtime preamble, every function
/// in order, then storage for the global variables.
pub fn emit_mips(program: &IrProgram, writer: impl io::Write) -> CompileResult<()> {
    let mut generator = MipsGenerator::new(program, writer);
    generator.generate_program()
}
