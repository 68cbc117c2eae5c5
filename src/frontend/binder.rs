//! Attaches symbol-table handles to a tree that arrived without them.
//!
//! A tree read from JSON carries names only. Binding declares what a parser
//! would have declared at the same point and resolves every identifier
//! against the scopes as they stand. Names that do not resolve stay `None`.

use log::trace;

use crate::ast::{BoolExpr, Expr, FuncCall, FuncDef, Ident, Stmt};
use crate::frontend::symbol_table::{Scope, SymbolId, SymbolTable};

pub trait Bind {
    fn bind(&mut self, symbols: &SymbolTable);
}

/// Declares file-scope variables in GLOBAL scope
pub fn declare_globals(symbols: &mut SymbolTable, names: &[String]) {
    for name in names {
        symbols.declare_variable(Scope::Global, name, false);
    }
}

/// Declares `func` and its LOCAL scope, then binds its body.
///
/// The function itself is visible inside its own body. The LOCAL scope is
/// expected to be empty on entry.
pub fn bind_function(symbols: &mut SymbolTable, func: &mut FuncDef) -> SymbolId {
    let id = symbols.declare_function(&func.name, func.params.len());
    func.symbol = Some(id);

    for param in &func.params {
        symbols.declare_variable(Scope::Local, param, true);
    }
    for local in &func.locals {
        symbols.declare_variable(Scope::Local, local, false);
    }

    for stmt in &mut func.body {
        stmt.bind(symbols);
    }
    trace!(
        "bound `{}` with {} params and {} locals",
        func.name,
        func.params.len(),
        func.locals.len()
    );
    id
}

impl Bind for Ident {
    fn bind(&mut self, symbols: &SymbolTable) {
        self.symbol = symbols.lookup(&self.name);
        if self.symbol.is_none() {
            trace!("`{}` is not declared", self.name);
        }
    }
}

impl Bind for FuncCall {
    fn bind(&mut self, symbols: &SymbolTable) {
        self.callee.bind(symbols);
        for arg in &mut self.args {
            arg.bind(symbols);
        }
    }
}

impl Bind for Stmt {
    fn bind(&mut self, symbols: &SymbolTable) {
        match self {
            Stmt::Assign { lhs, rhs } => {
                lhs.bind(symbols);
                rhs.bind(symbols);
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                cond.bind(symbols);
                then_branch.bind(symbols);
                if let Some(stmt) = else_branch {
                    stmt.bind(symbols);
                }
            }
            Stmt::While { cond, body } => {
                cond.bind(symbols);
                body.bind(symbols);
            }
            Stmt::Return(expr) => {
                if let Some(expr) = expr {
                    expr.bind(symbols);
                }
            }
            Stmt::Call(call) => call.bind(symbols),
            Stmt::Block(stmts) => {
                for stmt in stmts {
                    stmt.bind(symbols);
                }
            }
        }
    }
}

impl Bind for Expr {
    fn bind(&mut self, symbols: &SymbolTable) {
        match self {
            Expr::Ident(ident) => ident.bind(symbols),
            Expr::Int(_) => {}
            Expr::Binary { lhs, rhs, .. } => {
                lhs.bind(symbols);
                rhs.bind(symbols);
            }
            Expr::Neg(operand) => operand.bind(symbols),
            Expr::Call(call) => call.bind(symbols),
        }
    }
}

impl Bind for BoolExpr {
    fn bind(&mut self, symbols: &SymbolTable) {
        match self {
            BoolExpr::Compare { lhs, rhs, .. } => {
                lhs.bind(symbols);
                rhs.bind(symbols);
            }
            BoolExpr::And(lhs, rhs) | BoolExpr::Or(lhs, rhs) => {
                lhs.bind(symbols);
                rhs.bind(symbols);
            }
        }
    }
}
