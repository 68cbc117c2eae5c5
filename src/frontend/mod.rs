pub mod binder;
pub mod ir_context;
pub mod ir_generator;
pub mod symbol_table;

pub use ir_context::IrContext;
pub use ir_generator::{GenerateIr, GenerateJumps};
pub use symbol_table::{Scope, SymbolId, SymbolTable, Symbols};
