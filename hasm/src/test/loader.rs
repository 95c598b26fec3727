use crate::{load_file, load_source};
use hvm::Severity;
use std::fs;
use std::path::PathBuf;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("hasm-test-{}-{}", std::process::id(), name));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn load_source_produces_raw_ops() {
    let (ops, files, messages) = load_source("<mem>", "SET(R1, 3) HALT()");
    assert!(messages.is_empty());
    assert_eq!(files.len(), 1);
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[0].name, "SET");
    assert_eq!(ops[0].loc.line, 1);
    assert_eq!(ops[1].name, "HALT");
}

#[test]
fn include_resolves_relative_to_the_including_file() {
    let dir = scratch_dir("include");
    let sub = dir.join("lib");
    fs::create_dir_all(&sub).unwrap();
    fs::write(sub.join("add.hera"), "ADD(R3, R1, R2)\n").unwrap();
    fs::write(
        dir.join("main.hera"),
        "SET(R1, 1)\n#include \"lib/add.hera\"\nHALT()\n",
    )
    .unwrap();

    let (ops, files, messages) = load_file(&dir.join("main.hera"));
    assert!(messages.is_empty(), "{:?}", messages.sorted());
    assert_eq!(files.len(), 2);
    let names: Vec<&str> = ops.iter().map(|op| op.name.as_str()).collect();
    assert_eq!(names, vec!["SET", "ADD", "HALT"]);
    // The included op carries its own file id and line.
    assert_eq!(ops[1].loc.file, 1);
    assert_eq!(ops[1].loc.line, 1);
}

#[test]
fn missing_include_reports_the_include_site() {
    let dir = scratch_dir("missing");
    fs::write(dir.join("main.hera"), "NOP()\n#include \"gone.hera\"\n").unwrap();
    let (_, _, messages) = load_file(&dir.join("main.hera"));
    assert!(messages.has_errors());
    let error = messages
        .iter()
        .find(|m| m.severity == Severity::Error)
        .unwrap();
    assert_eq!(error.location.unwrap().line, 2);
    assert!(error.text.contains("gone.hera"));
}

#[test]
fn circular_includes_are_rejected() {
    let dir = scratch_dir("cycle");
    fs::write(dir.join("a.hera"), "#include \"b.hera\"\n").unwrap();
    fs::write(dir.join("b.hera"), "#include \"a.hera\"\n").unwrap();
    let (_, _, messages) = load_file(&dir.join("a.hera"));
    assert!(messages.has_errors());
    assert!(messages.iter().any(|m| m.text.contains("circular include")));
}

#[test]
fn conditional_compilation_uses_the_predefined_symbol() {
    let source = "#ifdef HERA_PY\nNOP()\n#else\nHALT()\n#endif\n#ifndef HERA_PY\nSWI(1)\n#endif\n";
    let (ops, _, messages) = load_source("<mem>", source);
    assert!(messages.is_empty());
    let names: Vec<&str> = ops.iter().map(|op| op.name.as_str()).collect();
    assert_eq!(names, vec!["NOP"]);
}

#[test]
fn else_branch_is_taken_for_unknown_symbols() {
    let source = "#ifdef NOT_A_THING\nNOP()\n#else\nHALT()\n#endif\n";
    let (ops, _, _) = load_source("<mem>", source);
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].name, "HALT");
}

#[test]
fn angle_include_is_ignored_with_a_warning() {
    let (ops, _, messages) = load_source("<mem>", "#include <HERA.h>\nHALT()\n");
    assert_eq!(ops.len(), 1);
    assert!(!messages.has_errors());
    assert_eq!(messages.len(), 1);
}

#[test]
fn guarded_c_preamble_loads_silently() {
    let source = "#ifndef HERA_PY\n#include <HERA.h>\n#endif\nHALT()\n";
    let (ops, _, messages) = load_source("<mem>", source);
    assert!(messages.is_empty());
    assert_eq!(ops.len(), 1);
}

#[test]
fn non_ascii_bytes_are_rejected() {
    let dir = scratch_dir("ascii");
    fs::write(dir.join("bad.hera"), b"NOP()\n// caf\xc3\xa9\n").unwrap();
    let (_, _, messages) = load_file(&dir.join("bad.hera"));
    assert!(messages.has_errors());
    let error = messages.iter().next().unwrap();
    assert_eq!(error.location.unwrap().line, 2);
}

#[test]
fn unknown_directive_is_an_error() {
    let (_, _, messages) = load_source("<mem>", "#define\nHALT()\n");
    assert!(messages.has_errors());
    assert!(messages.iter().any(|m| m.text.contains("unknown directive")));
}

#[test]
fn parse_errors_are_located_diagnostics() {
    let (ops, _, messages) = load_source("<mem>", "SET(R1, 3)\nSET(R1,\n");
    assert!(messages.has_errors());
    assert!(ops.is_empty());
}
