use log::{debug, info};

use crate::ast::{FuncDef, GlobalItem, Program};
use crate::error::{CompileError, CompileResult};
use crate::frontend::binder;
use crate::frontend::ir_context::IrContext;
use crate::frontend::ir_generator::GenerateIr;
use crate::frontend::symbol_table::PRINTLN;
use crate::ir::{FunctionIr, IrProgram};

/// Runs the code generator over a program one function at a time.
///
/// The driver owns the only [`IrContext`], so GLOBAL declarations and the
/// label counter carry over from one function to the next while the LOCAL
/// scope is rebuilt for each.
#[derive(Default)]
pub struct Driver {
    ctx: IrContext,
}

impl Driver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> &IrContext {
        &self.ctx
    }

    pub fn declare_globals(&mut self, names: &[String]) -> CompileResult<()> {
        if let Some(name) = names.iter().find(|name| is_reserved(name)) {
            return Err(CompileError::ReservedName(name.clone()));
        }
        binder::declare_globals(&mut self.ctx.symbols, names);
        Ok(())
    }

    /// Binds, lowers and lays out one function.
    ///
    /// On return the LOCAL scope is empty again, whether or not lowering
    /// succeeded.
    pub fn compile_function(&mut self, func: &mut FuncDef) -> CompileResult<FunctionIr> {
        if is_reserved(&func.name) {
            return Err(CompileError::ReservedName(func.name.clone()));
        }
        let symbol = binder::bind_function(&mut self.ctx.symbols, func);
        let lowered = func.generate(&mut self.ctx);
        let code = match lowered {
            Ok(code) => code,
            Err(err) => {
                self.ctx.symbols.clear_local();
                self.ctx.reset_temporaries();
                self.ctx.set_current_func(None);
                return Err(err);
            }
        };

        self.ctx.symbols.assign_frame_offsets();
        debug!(
            "`{}`: {} locals and temporaries",
            func.name,
            self.ctx.symbols.locals_count()
        );
        let frame = self.ctx.symbols.take_local();

        Ok(FunctionIr {
            name: func.name.clone(),
            symbol,
            code,
            frame,
        })
    }

    /// Compiles every item in source order
    pub fn compile_program(&mut self, program: &mut Program) -> CompileResult<IrProgram> {
        let mut functions = Vec::new();
        for item in &mut program.items {
            match item {
                GlobalItem::Var { names } => self.declare_globals(names)?,
                GlobalItem::Func(func) => functions.push(self.compile_function(func)?),
            }
        }
        info!("compiled {} functions", functions.len());

        Ok(IrProgram {
            globals: self.ctx.symbols.globals().to_vec(),
            functions,
        })
    }
}

/// Globals and functions share the label namespace with the runtime's `_println`
fn is_reserved(name: &str) -> bool {
    name == PRINTLN
}
