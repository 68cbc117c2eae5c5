mod common;

use std::collections::HashSet;

use g2rc::ast::RelOp;
use g2rc::ir::{OpCode, Operand};
use g2rc::{CompileError, compile, compile_json};

use common::*;

#[test]
fn call_in_assignment() {
    let json = r#"{
        "items": [
            { "func": {
                "name": "f",
                "params": ["a", "b"],
                "body": [
                    { "return": { "binary": { "op": "add",
                        "lhs": { "ident": { "name": "a" } },
                        "rhs": { "ident": { "name": "b" } } } } }
                ]
            } },
            { "func": {
                "name": "main",
                "locals": ["x"],
                "body": [
                    { "assign": {
                        "lhs": { "name": "x" },
                        "rhs": { "call": { "callee": { "name": "f" },
                                           "args": [ { "int": 1 }, { "int": 2 } ] } }
                    } }
                ]
            } }
        ]
    }"#;
    let ir = compile_json(json).unwrap();

    let expected = "\
# function f
enter f
tmp.0 = a + b
set_retval tmp.0
leave f
return
leave f
return

# function main
enter main
tmp.0 = 1
tmp.1 = 2
param tmp.1
param tmp.0
call f, 2
tmp.2 = get_retval
x = tmp.2
leave main
return

";
    assert_eq!(ir_text(&ir), expected);

    let asm = asm_text(&ir);
    assert!(asm.contains("# call f, 2\n    jal _f\n    la $sp, 8($sp)\n"));
}

#[test]
fn if_else_layout() {
    let mut prog = program(vec![func(
        "g",
        &["a", "b"],
        &["x"],
        vec![if_else(
            cmp(RelOp::Lt, var("a"), var("b")),
            assign("x", int(1)),
            Some(assign("x", int(2))),
        )],
    )]);
    let ir = compile(&mut prog).unwrap();

    let expected = "\
# function g
enter g
if a >= b goto L1
goto L0
label L0
tmp.0 = 1
x = tmp.0
goto L2
label L1
tmp.1 = 2
x = tmp.1
label L2
leave g
return

";
    assert_eq!(ir_text(&ir), expected);
}

#[test]
fn labels_stay_unique_across_functions() {
    let body = || {
        vec![while_loop(
            cmp(RelOp::Gt, var("n"), int(0)),
            vec![assign("n", sub(var("n"), int(1)))],
        )]
    };
    let mut prog = program(vec![func("f", &["n"], &[], body()), func("g", &["n"], &[], body())]);
    let ir = compile(&mut prog).unwrap();

    let mut seen = HashSet::new();
    for func in &ir.functions {
        for instr in func.code.iter().filter(|i| i.op == OpCode::Label) {
            let label = instr.dest.and_then(Operand::as_label).unwrap();
            assert!(seen.insert(label), "{} defined twice", label);
        }
    }
    assert_eq!(seen.len(), 6);
}

#[test]
fn temporaries_are_fresh_within_a_function() {
    let mut prog = program(vec![func(
        "main",
        &[],
        &["x"],
        vec![
            assign("x", add(mul(int(2), int(3)), call_expr("main", vec![]))),
            println(sub(var("x"), int(1))),
        ],
    )]);
    let ir = compile(&mut prog).unwrap();
    let func = &ir.functions[0];

    let temps: Vec<&str> = func
        .frame
        .iter()
        .map(|entry| entry.name.as_str())
        .filter(|name| name.starts_with("tmp."))
        .collect();
    let unique: HashSet<&&str> = temps.iter().collect();
    assert_eq!(unique.len(), temps.len());
    assert_eq!(temps.first(), Some(&"tmp.0"));
}

#[test]
fn frame_offsets_follow_the_calling_convention() {
    let ir = compile(&mut factorial()).unwrap();
    let asm = asm_text(&ir);
    for func in &ir.functions {
        let mut offsets = HashSet::new();
        let mut next_param = 8;
        for entry in &func.frame {
            let offset = entry.frame_offset().expect("every local has an offset");
            assert!(offsets.insert(offset));
            if entry.is_param() {
                assert_eq!(offset, next_param);
                next_param += 4;
            } else {
                assert!(offset <= -4);
                assert_eq!(offset % 4, 0);
            }
        }

        let locals = func.frame.iter().filter(|e| !e.is_param()).count();
        let prologue = format!(
            "_{}:\n    la $sp, -8($sp)\n    sw $fp, 4($sp)\n    sw $ra, 0($sp)\n    la $fp, 0($sp)\n    la $sp, -{}($sp)\n",
            func.name,
            locals * 4
        );
        assert!(asm.contains(&prologue), "missing prologue for {}", func.name);
    }
}

#[test]
fn output_is_deterministic() {
    let first = compile(&mut factorial()).unwrap();
    let second = compile(&mut factorial()).unwrap();
    assert_eq!(ir_text(&first), ir_text(&second));
    assert_eq!(asm_text(&first), asm_text(&second));
}

#[test]
fn undeclared_variable_is_reported_when_stored() {
    let mut prog = program(vec![func("main", &[], &[], vec![assign("nowhere", int(1))])]);
    let err = compile(&mut prog).unwrap_err();
    assert!(matches!(err, CompileError::UnresolvedIdentifier(name) if name == "nowhere"));
}

#[test]
fn call_to_undeclared_function_is_reported() {
    let mut prog = program(vec![
        func("main", &[], &[], vec![call_stmt("later", vec![]), ret(None)]),
        func("later", &[], &[], vec![]),
    ]);
    let err = compile(&mut prog).unwrap_err();
    assert!(matches!(err, CompileError::UnresolvedCallee(name) if name == "later"));
}

#[test]
fn malformed_json_is_a_json_error() {
    let err = compile_json(r#"{ "items": [ { "func": { "name": 3 } } ] }"#).unwrap_err();
    assert!(matches!(err, CompileError::Json(_)));
}

#[test]
fn runtime_labels_do_not_clash_with_user_names() {
    let mut prog = program(vec![
        globals(&["nl", "rt"]),
        func("main", &[], &[], vec![println(var("nl"))]),
    ]);
    let asm = asm_text(&compile(&mut prog).unwrap());

    let mut defined = HashSet::new();
    for line in asm.lines().filter(|line| !line.starts_with([' ', '#'])) {
        if let Some((label, _)) = line.split_once(':') {
            assert!(defined.insert(label), "label `{}` defined twice", label);
        }
    }
    assert!(defined.contains("_nl"));
    assert!(defined.contains("_println"));
}

#[test]
fn redeclaring_println_is_rejected() {
    let mut as_function = program(vec![func("println", &["v"], &[], vec![])]);
    let err = compile(&mut as_function).unwrap_err();
    assert!(matches!(err, CompileError::ReservedName(name) if name == "println"));

    let mut as_global = program(vec![globals(&["println"])]);
    let err = compile(&mut as_global).unwrap_err();
    assert!(matches!(err, CompileError::ReservedName(name) if name == "println"));
}
