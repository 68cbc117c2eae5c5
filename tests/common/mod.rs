#![allow(dead_code)]

use g2rc::ast::{ArithOp, BoolExpr, Expr, FuncCall, FuncDef, GlobalItem, Ident, Program, RelOp, Stmt};

pub fn var(name: &str) -> Expr {
    Expr::var(Ident::new(name))
}

pub fn int(value: i32) -> Expr {
    Expr::int(value)
}

pub fn add(lhs: Expr, rhs: Expr) -> Expr {
    Expr::binary(ArithOp::Add, lhs, rhs)
}

pub fn sub(lhs: Expr, rhs: Expr) -> Expr {
    Expr::binary(ArithOp::Sub, lhs, rhs)
}

pub fn mul(lhs: Expr, rhs: Expr) -> Expr {
    Expr::binary(ArithOp::Mul, lhs, rhs)
}

pub fn div(lhs: Expr, rhs: Expr) -> Expr {
    Expr::binary(ArithOp::Div, lhs, rhs)
}

pub fn cmp(op: RelOp, lhs: Expr, rhs: Expr) -> BoolExpr {
    BoolExpr::compare(op, lhs, rhs)
}

pub fn call(name: &str, args: Vec<Expr>) -> FuncCall {
    FuncCall {
        callee: Ident::new(name),
        args,
    }
}

pub fn call_expr(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Call(call(name, args))
}

pub fn call_stmt(name: &str, args: Vec<Expr>) -> Stmt {
    Stmt::Call(call(name, args))
}

pub fn println(value: Expr) -> Stmt {
    call_stmt("println", vec![value])
}

pub fn assign(name: &str, rhs: Expr) -> Stmt {
    Stmt::Assign {
        lhs: Ident::new(name),
        rhs,
    }
}

pub fn if_else(cond: BoolExpr, then_branch: Stmt, else_branch: Option<Stmt>) -> Stmt {
    Stmt::If {
        cond,
        then_branch: Box::new(then_branch),
        else_branch: else_branch.map(Box::new),
    }
}

pub fn while_loop(cond: BoolExpr, body: Vec<Stmt>) -> Stmt {
    Stmt::While {
        cond,
        body: Box::new(Stmt::Block(body)),
    }
}

pub fn ret(value: Option<Expr>) -> Stmt {
    Stmt::Return(value)
}

pub fn func(name: &str, params: &[&str], locals: &[&str], body: Vec<Stmt>) -> GlobalItem {
    GlobalItem::Func(FuncDef {
        name: name.to_string(),
        params: params.iter().map(|p| p.to_string()).collect(),
        locals: locals.iter().map(|l| l.to_string()).collect(),
        body,
        symbol: None,
    })
}

pub fn globals(names: &[&str]) -> GlobalItem {
    GlobalItem::Var {
        names: names.iter().map(|n| n.to_string()).collect(),
    }
}

pub fn program(items: Vec<GlobalItem>) -> Program {
    Program { items }
}

/// ```text
/// int fact(n) { if (n <= 1) return 1; return n * fact(n - 1); }
/// int main() { println(fact(5)); }
/// ```
pub fn factorial() -> Program {
    program(vec![
        func(
            "fact",
            &["n"],
            &[],
            vec![
                if_else(cmp(RelOp::Le, var("n"), int(1)), ret(Some(int(1))), None),
                ret(Some(mul(
                    var("n"),
                    call_expr("fact", vec![sub(var("n"), int(1))]),
                ))),
            ],
        ),
        func("main", &[], &[], vec![println(call_expr("fact", vec![int(5)]))]),
    ])
}

pub fn ir_text(program: &g2rc::IrProgram) -> String {
    let mut out = Vec::new();
    g2rc::emit_ir(program, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

pub fn asm_text(program: &g2rc::IrProgram) -> String {
    let mut out = Vec::new();
    g2rc::emit_mips(program, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}
