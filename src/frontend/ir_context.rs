use log::trace;

use crate::frontend::symbol_table::{Scope, SymbolId, SymbolTable};
use crate::ir::Label;

/// Context for IR generation
///
/// Owns the symbol table and the two name counters. The counters follow
/// different reset rules: temporaries are numbered per function
/// ([`IrContext::reset_temporaries`]), labels are numbered per program and
/// never reset so that they stay unique in the emitted assembly.
pub struct IrContext {
    pub symbols: SymbolTable,
    current_func: Option<SymbolId>,
    temp_count: usize,
    label_count: u32,
}

impl Default for IrContext {
    fn default() -> Self {
        Self::new(SymbolTable::with_builtins())
    }
}

impl IrContext {
    pub fn new(symbols: SymbolTable) -> Self {
        IrContext {
            symbols,
            current_func: None,
            temp_count: 0,
            label_count: 0,
        }
    }

    /// Creates a fresh LOCAL variable for an intermediate result
    pub fn allocate_temporary(&mut self) -> SymbolId {
        // `.` cannot appear in a source identifier
        let name = format!("tmp.{}", self.temp_count);
        self.temp_count += 1;
        trace!("allocated temporary {}", name);
        self.symbols.declare_variable(Scope::Local, &name, false)
    }

    pub fn new_label(&mut self) -> Label {
        let label = Label(self.label_count);
        self.label_count += 1;
        label
    }

    pub fn reset_temporaries(&mut self) {
        self.temp_count = 0;
    }

    pub fn current_func(&self) -> Option<SymbolId> {
        self.current_func
    }

    pub fn set_current_func(&mut self, func: Option<SymbolId>) {
        self.current_func = func;
    }
}
