mod common;

use std::collections::HashSet;
use std::fs;
use std::process::Command;

use tempfile::tempdir;

use common::*;

const G2RC: &str = env!("CARGO_BIN_EXE_g2rc");

fn write_factorial(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("fact.json");
    fs::write(&path, serde_json::to_string(&factorial()).unwrap()).unwrap();
    path
}

#[test]
fn assembly_file_matches_library_output() {
    let dir = tempdir().unwrap();
    let input = write_factorial(dir.path());
    let output = dir.path().join("fact.s");

    let status = Command::new(G2RC)
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .status()
        .unwrap();
    assert!(status.success());

    let written = fs::read_to_string(&output).unwrap();
    let expected = asm_text(&g2rc::compile(&mut factorial()).unwrap());
    assert_eq!(written, expected);
}

#[test]
fn every_jump_target_is_defined() {
    let asm = asm_text(&g2rc::compile(&mut factorial()).unwrap());

    let defined: HashSet<&str> = asm
        .lines()
        .filter_map(|line| line.strip_suffix(':'))
        .collect();
    for line in asm.lines().map(str::trim) {
        let Some((mnemonic, args)) = line.split_once(' ') else {
            continue;
        };
        let target = match mnemonic {
            "j" | "jal" => args,
            "beq" | "bne" | "blt" | "ble" | "bgt" | "bge" => {
                args.rsplit(", ").next().unwrap()
            }
            _ => continue,
        };
        assert!(defined.contains(target), "`{}` jumps to undefined {}", line, target);
    }
    assert!(defined.contains("main"));
    assert!(defined.contains("_println"));
}

#[test]
fn emit_ir_writes_three_address_code() {
    let dir = tempdir().unwrap();
    let input = write_factorial(dir.path());

    let out = Command::new(G2RC)
        .args(["--emit", "ir"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    assert!(text.starts_with("# function fact\nenter fact\n"));
    assert!(text.contains("call fact, 1\n"));
}

#[test]
fn run_prints_println_output() {
    let dir = tempdir().unwrap();
    let input = write_factorial(dir.path());

    let out = Command::new(G2RC).arg("--run").arg(&input).output().unwrap();
    assert!(out.status.success());
    assert_eq!(String::from_utf8(out.stdout).unwrap(), "120\n");
}

#[test]
fn bad_usage_exits_with_status_2() {
    let out = Command::new(G2RC).arg("--emit").arg("wasm").output().unwrap();
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("unknown emit kind `wasm`"));
}

#[test]
fn unreadable_tree_exits_with_status_1() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("broken.json");
    fs::write(&input, "{ not json").unwrap();

    let out = Command::new(G2RC).arg(&input).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8(out.stderr).unwrap().contains("invalid syntax tree"));
}

#[test]
fn input_is_logged_before_it_is_parsed() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("broken.json");
    fs::write(&input, "{ not json").unwrap();

    let out = Command::new(G2RC)
        .env("RUST_LOG", "info")
        .arg(&input)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains(&format!("read {}", input.display())), "{}", stderr);
}

#[test]
fn runaway_recursion_exits_with_status_1() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("loop.json");
    let prog = program(vec![func("main", &[], &[], vec![call_stmt("main", vec![])])]);
    fs::write(&input, serde_json::to_string(&prog).unwrap()).unwrap();

    let out = Command::new(G2RC).arg("--run").arg(&input).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8(out.stderr).unwrap().contains("nested calls"));
}
