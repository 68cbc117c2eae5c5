use log::debug;

use crate::ast::{ArithOp, BoolExpr, Expr, FuncCall, FuncDef, Ident, RelOp, Stmt};
use crate::error::{CompileError, CompileResult};
use crate::frontend::ir_context::IrContext;
use crate::frontend::symbol_table::SymbolId;
use crate::ir::{CodeList, Fragment, Instruction, Label, ListFragment, OpCode, Operand};

/// Trait for lowering syntax-tree nodes to three-address code
pub trait GenerateIr {
    type Output;

    fn generate(&self, ctx: &mut IrContext) -> CompileResult<Self::Output>;
}

/// Trait for lowering conditions to jump code.
///
/// Control reaches `on_true` when the condition holds and `on_false`
/// otherwise; no truth value is ever stored.
pub trait GenerateJumps {
    fn generate_jumps(
        &self,
        ctx: &mut IrContext,
        on_true: Label,
        on_false: Label,
    ) -> CompileResult<CodeList>;
}

impl GenerateIr for FuncDef {
    type Output = CodeList;

    fn generate(&self, ctx: &mut IrContext) -> CompileResult<CodeList> {
        let func = self
            .symbol
            .ok_or_else(|| CompileError::UnresolvedIdentifier(self.name.clone()))?;
        ctx.set_current_func(Some(func));

        // Declarations were entered into the symbol table already;
        // only the statements produce code.
        let body = self.body[..].generate(ctx)?;

        let mut code = CodeList::new();
        code.push(Instruction::enter(func));
        code.append(body);
        // Reached only when control falls off the end of the body
        code.push(Instruction::leave(func));
        code.push(Instruction::ret());

        ctx.reset_temporaries();
        ctx.set_current_func(None);
        debug!("lowered `{}` into {} instructions", self.name, code.len());
        Ok(code)
    }
}

impl GenerateIr for [Stmt] {
    type Output = CodeList;

    fn generate(&self, ctx: &mut IrContext) -> CompileResult<CodeList> {
        let mut code = CodeList::new();
        for stmt in self {
            code.append(stmt.generate(ctx)?);
        }
        Ok(code)
    }
}

impl GenerateIr for Stmt {
    type Output = CodeList;

    fn generate(&self, ctx: &mut IrContext) -> CompileResult<CodeList> {
        match self {
            Stmt::Assign { lhs, rhs } => {
                let value = rhs.generate(ctx)?;
                let dest = storage(lhs)?;
                let mut code = value.code;
                code.push(Instruction::assign(Operand::Symbol(value.place), dest));
                Ok(code)
            }

            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let then_label = ctx.new_label();
                let else_label = ctx.new_label();
                let after_label = ctx.new_label();

                let cond_code = cond.generate_jumps(ctx, then_label, else_label)?;
                let then_code = then_branch.generate(ctx)?;
                let else_code = match else_branch {
                    Some(stmt) => stmt.generate(ctx)?,
                    None => CodeList::new(),
                };

                let mut code = cond_code;
                code.push(Instruction::label(then_label));
                code.append(then_code);
                code.push(Instruction::goto(after_label));
                code.push(Instruction::label(else_label));
                code.append(else_code);
                code.push(Instruction::label(after_label));
                Ok(code)
            }

            Stmt::While { cond, body } => {
                let top_label = ctx.new_label();
                let body_label = ctx.new_label();
                let after_label = ctx.new_label();

                let mut code = CodeList::new();
                code.push(Instruction::label(top_label));
                code.append(cond.generate_jumps(ctx, body_label, after_label)?);
                code.push(Instruction::label(body_label));
                code.append(body.generate(ctx)?);
                code.push(Instruction::goto(top_label));
                code.push(Instruction::label(after_label));
                Ok(code)
            }

            Stmt::Return(expr) => {
                let mut code = CodeList::new();
                if let Some(expr) = expr {
                    let value = expr.generate(ctx)?;
                    code.append(value.code);
                    code.push(Instruction::set_retval(value.place));
                }
                let func = ctx
                    .current_func()
                    .ok_or(CompileError::ReturnOutsideFunction)?;
                code.push(Instruction::leave(func));
                code.push(Instruction::ret());
                Ok(code)
            }

            // The return value lands in a temporary nobody reads
            Stmt::Call(call) => Ok(call.generate(ctx)?.code),

            Stmt::Block(stmts) => stmts[..].generate(ctx),
        }
    }
}

impl GenerateIr for Expr {
    type Output = Fragment;

    fn generate(&self, ctx: &mut IrContext) -> CompileResult<Fragment> {
        match self {
            // Reads alias the variable's own storage, no copy is made
            Expr::Ident(ident) => Ok(Fragment {
                code: CodeList::new(),
                place: storage(ident)?,
            }),

            Expr::Int(value) => {
                let place = ctx.allocate_temporary();
                let mut code = CodeList::new();
                code.push(Instruction::assign(Operand::Int(*value), place));
                Ok(Fragment { code, place })
            }

            Expr::Binary { op, lhs, rhs } => {
                let lhs = lhs.generate(ctx)?;
                let rhs = rhs.generate(ctx)?;
                let place = ctx.allocate_temporary();

                let mut code = lhs.code;
                code.append(rhs.code);
                code.push(Instruction::binary(
                    map_arith_op(*op),
                    lhs.place,
                    rhs.place,
                    place,
                ));
                Ok(Fragment { code, place })
            }

            Expr::Neg(operand) => {
                let operand = operand.generate(ctx)?;
                let place = ctx.allocate_temporary();
                let mut code = operand.code;
                code.push(Instruction::neg(operand.place, place));
                Ok(Fragment { code, place })
            }

            Expr::Call(call) => call.generate(ctx),
        }
    }
}

impl GenerateIr for [Expr] {
    type Output = ListFragment;

    fn generate(&self, ctx: &mut IrContext) -> CompileResult<ListFragment> {
        let mut list = ListFragment::default();
        for expr in self {
            let value = expr.generate(ctx)?;
            list.code.append(value.code);
            list.places.push(value.place);
        }
        Ok(list)
    }
}

impl GenerateIr for FuncCall {
    type Output = Fragment;

    fn generate(&self, ctx: &mut IrContext) -> CompileResult<Fragment> {
        let name = &self.callee.name;
        let callee = self
            .callee
            .symbol
            .ok_or_else(|| CompileError::UnresolvedCallee(name.clone()))?;
        let num_params = ctx
            .symbols
            .get(callee)
            .ok_or(CompileError::StaleSymbol(callee))?
            .num_params()
            .ok_or_else(|| CompileError::NotAFunction(name.clone()))?;

        let args = self.args[..].generate(ctx)?;
        debug!(
            "call `{}`: {} of {} arguments, first in {:?}",
            name,
            args.places.len(),
            num_params,
            args.place()
        );
        let mut code = args.code;

        // Last argument first, so the first one ends up nearest the
        // callee's frame pointer.
        for &place in args.places.iter().rev() {
            code.push(Instruction::param(place));
        }
        code.push(Instruction::call(callee, num_params));

        let place = ctx.allocate_temporary();
        code.push(Instruction::get_retval(place));
        Ok(Fragment { code, place })
    }
}

impl GenerateJumps for BoolExpr {
    fn generate_jumps(
        &self,
        ctx: &mut IrContext,
        on_true: Label,
        on_false: Label,
    ) -> CompileResult<CodeList> {
        match self {
            // Branch to the false label on the negated comparison, then
            // jump to the true label unconditionally.
            BoolExpr::Compare { op, lhs, rhs } => {
                let lhs = lhs.generate(ctx)?;
                let rhs = rhs.generate(ctx)?;

                let mut code = lhs.code;
                code.append(rhs.code);
                code.push(Instruction::cond_jump(
                    map_rel_op(op.negate()),
                    lhs.place,
                    rhs.place,
                    on_false,
                ));
                code.push(Instruction::goto(on_true));
                Ok(code)
            }

            BoolExpr::And(lhs, rhs) => {
                let rhs_label = ctx.new_label();
                let mut code = lhs.generate_jumps(ctx, rhs_label, on_false)?;
                let rhs_code = rhs.generate_jumps(ctx, on_true, on_false)?;
                code.push(Instruction::label(rhs_label));
                code.append(rhs_code);
                Ok(code)
            }

            BoolExpr::Or(lhs, rhs) => {
                let rhs_label = ctx.new_label();
                let mut code = lhs.generate_jumps(ctx, on_true, rhs_label)?;
                let rhs_code = rhs.generate_jumps(ctx, on_true, on_false)?;
                code.push(Instruction::label(rhs_label));
                code.append(rhs_code);
                Ok(code)
            }
        }
    }
}

/// Storage of an identifier. A missing symbol is only an error once a
/// location is actually needed.
fn storage(ident: &Ident) -> CompileResult<SymbolId> {
    ident
        .symbol
        .ok_or_else(|| CompileError::UnresolvedIdentifier(ident.name.clone()))
}

fn map_arith_op(op: ArithOp) -> OpCode {
    match op {
        ArithOp::Add => OpCode::Add,
        ArithOp::Sub => OpCode::Sub,
        ArithOp::Mul => OpCode::Mul,
        ArithOp::Div => OpCode::Div,
    }
}

fn map_rel_op(op: RelOp) -> OpCode {
    match op {
        RelOp::Eq => OpCode::Eq,
        RelOp::Ne => OpCode::Ne,
        RelOp::Lt => OpCode::Lt,
        RelOp::Le => OpCode::Le,
        RelOp::Gt => OpCode::Gt,
        RelOp::Ge => OpCode::Ge,
    }
}
