use std::io;

use thiserror::Error;

use crate::frontend::symbol_table::SymbolId;
use crate::ir::OpCode;

pub type CompileResult<T> = Result<T, CompileError>;

/// Failures raised while lowering a function or emitting assembly.
///
/// The syntax tree is assumed to have passed semantic checking, so none of
/// these describe user mistakes in the usual sense: they mean the tree (or an
/// instruction built from it) broke a precondition of the code generator.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("identifier `{0}` has no symbol-table entry but its storage is required")]
    UnresolvedIdentifier(String),

    #[error("call to `{0}` has no symbol-table entry")]
    UnresolvedCallee(String),

    #[error("`{0}` is called but is not a function")]
    NotAFunction(String),

    #[error("`{0}` is used as storage but is a function")]
    NotAVariable(String),

    #[error("`{0}` is the name of a runtime routine and cannot be redeclared")]
    ReservedName(String),

    #[error("return statement outside of a function body")]
    ReturnOutsideFunction,

    #[error("malformed `{op}` instruction: {reason}")]
    MalformedInstruction { op: OpCode, reason: &'static str },

    #[error("variable `{0}` has no frame offset; offsets must be assigned before translation")]
    MissingFrameOffset(String),

    #[error("symbol handle {0:?} does not belong to the function being translated")]
    StaleSymbol(SymbolId),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid syntax tree: {0}")]
    Json(#[from] serde_json::Error),
}

impl CompileError {
    pub fn malformed(op: OpCode, reason: &'static str) -> Self {
        CompileError::MalformedInstruction { op, reason }
    }
}
