use log::debug;

use crate::error::{CompileError, CompileResult};
use crate::frontend::symbol_table::{Scope, SymbolId, Symbols, WORD_SIZE};

/// Storage locations of one function's variables.
///
/// Stack frame layout, growing downwards:
///
/// ```text
///   ...          caller's frame
///   arg n        4n+4($fp)
///   ...
///   arg 1        8($fp)
///   saved $fp    4($fp)
///   saved $ra    0($fp)   <- $fp
///   local 1     -4($fp)
///   ...
///   local k     -4k($fp)  <- $sp
/// ```
///
/// Offsets come from the symbol table; this only renders them.
pub struct StackFrame<'a> {
    symbols: Symbols<'a>,
    locals_size: i32,
}

impl<'a> StackFrame<'a> {
    pub fn new(symbols: Symbols<'a>) -> Self {
        let locals_size = symbols.locals_count() as i32 * WORD_SIZE;
        debug!(
            "frame: {} locals, {} bytes below $fp",
            symbols.locals_count(),
            locals_size
        );
        Self {
            symbols,
            locals_size,
        }
    }

    /// Bytes reserved below the frame pointer for locals and temporaries
    pub fn locals_size(&self) -> i32 {
        self.locals_size
    }

    pub fn symbols(&self) -> Symbols<'a> {
        self.symbols
    }

    /// Memory operand for a variable: `_name` for globals, `N($fp)` for
    /// parameters, locals and temporaries.
    pub fn address(&self, id: SymbolId) -> CompileResult<String> {
        let entry = self.symbols.get(id).ok_or(CompileError::StaleSymbol(id))?;
        if entry.is_function() {
            return Err(CompileError::NotAVariable(entry.name.clone()));
        }
        match id.scope() {
            Scope::Global => Ok(global_label(&entry.name)),
            Scope::Local => entry
                .frame_offset()
                .map(|offset| format!("{}($fp)", offset))
                .ok_or_else(|| CompileError::MissingFrameOffset(entry.name.clone())),
        }
    }
}

/// Assembly label of a global variable or function
pub fn global_label(name: &str) -> String {
    format!("_{}", name)
}
