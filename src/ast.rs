//! Syntax tree for the g2 language as handed over by the parser.
//!
//! Identifier nodes carry an optional symbol-table handle which the binder
//! fills in; the handle is not part of the serialized form.

use serde::{Deserialize, Serialize};

use crate::frontend::symbol_table::SymbolId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub items: Vec<GlobalItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalItem {
    /// `int a, b, c;` at file scope
    Var { names: Vec<String> },
    Func(FuncDef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDef {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    /// Variables declared at the top of the body
    #[serde(default)]
    pub locals: Vec<String>,
    pub body: Vec<Stmt>,
    #[serde(skip)]
    pub symbol: Option<SymbolId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    #[serde(skip)]
    pub symbol: Option<SymbolId>,
}

impl Ident {
    pub fn new(name: &str) -> Self {
        Ident {
            name: name.to_string(),
            symbol: None,
        }
    }

    pub fn resolved(name: &str, symbol: SymbolId) -> Self {
        Ident {
            name: name.to_string(),
            symbol: Some(symbol),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncCall {
    pub callee: Ident,
    #[serde(default)]
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    Assign {
        lhs: Ident,
        rhs: Expr,
    },
    If {
        cond: BoolExpr,
        then_branch: Box<Stmt>,
        #[serde(default)]
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: BoolExpr,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    Call(FuncCall),
    Block(Vec<Stmt>),
}

/// Integer-valued expression. Lowering one always yields a place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Ident(Ident),
    Int(i32),
    Binary {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Neg(Box<Expr>),
    Call(FuncCall),
}

/// Condition of an `if` or `while`. Lowered to jumps only, never to a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolExpr {
    Compare {
        op: RelOp,
        lhs: Expr,
        rhs: Expr,
    },
    And(Box<BoolExpr>, Box<BoolExpr>),
    Or(Box<BoolExpr>, Box<BoolExpr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl RelOp {
    /// The comparison that holds exactly when `self` does not
    pub fn negate(self) -> RelOp {
        match self {
            RelOp::Eq => RelOp::Ne,
            RelOp::Ne => RelOp::Eq,
            RelOp::Lt => RelOp::Ge,
            RelOp::Le => RelOp::Gt,
            RelOp::Gt => RelOp::Le,
            RelOp::Ge => RelOp::Lt,
        }
    }

    pub fn holds(self, lhs: i32, rhs: i32) -> bool {
        match self {
            RelOp::Eq => lhs == rhs,
            RelOp::Ne => lhs != rhs,
            RelOp::Lt => lhs < rhs,
            RelOp::Le => lhs <= rhs,
            RelOp::Gt => lhs > rhs,
            RelOp::Ge => lhs >= rhs,
        }
    }
}

// Shorthands used by tests that build trees by hand.
impl Expr {
    pub fn int(value: i32) -> Expr {
        Expr::Int(value)
    }

    pub fn var(ident: Ident) -> Expr {
        Expr::Ident(ident)
    }

    pub fn binary(op: ArithOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn neg(operand: Expr) -> Expr {
        Expr::Neg(Box::new(operand))
    }
}

impl BoolExpr {
    pub fn compare(op: RelOp, lhs: Expr, rhs: Expr) -> BoolExpr {
        BoolExpr::Compare { op, lhs, rhs }
    }

    pub fn and(lhs: BoolExpr, rhs: BoolExpr) -> BoolExpr {
        BoolExpr::And(Box::new(lhs), Box::new(rhs))
    }

    pub fn or(lhs: BoolExpr, rhs: BoolExpr) -> BoolExpr {
        BoolExpr::Or(Box::new(lhs), Box::new(rhs))
    }
}
