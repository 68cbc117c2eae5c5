//! Code generator for the g2 language.
//!
//! Takes a checked syntax tree, lowers each function to three-address code
//! and translates that to SPIM assembly:
//!
//! ```text
//! JSON tree -> binder -> IR generator -> frame layout -> MIPS translator
//! ```

pub mod ast;
pub mod backend;
pub mod config;
pub mod driver;
pub mod error;
pub mod frontend;
pub mod ir;

use std::io;

pub use backend::emit_mips;
pub use driver::Driver;
pub use error::{CompileError, CompileResult};
pub use ir::IrProgram;

/// Reads a syntax tree from its JSON form
pub fn parse_program(json: &str) -> CompileResult<ast::Program> {
    Ok(serde_json::from_str(json)?)
}

/// Lowers a whole program to three-address code with a fresh driver
pub fn compile(program: &mut ast::Program) -> CompileResult<IrProgram> {
    Driver::new().compile_program(program)
}

pub fn compile_json(json: &str) -> CompileResult<IrProgram> {
    let mut program = parse_program(json)?;
    compile(&mut program)
}

pub fn emit_ir(program: &IrProgram, output: impl io::Write) -> CompileResult<()> {
    ir::write_program(program, output)?;
    Ok(())
}
