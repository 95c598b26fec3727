use super::real_program;
use crate::eval::{
    assign, eval, exec_statement, parse_expr, parse_print_list, parse_statement, render, Format,
    Lhs, Stmt,
};
use crate::messages::Messages;
use crate::ops::{RealOp, Reg};
use crate::program::Symbol;
use crate::vm::{VirtualMachine, VmOptions};

fn machine() -> (VirtualMachine, crate::program::Program) {
    let mut program = real_program(&[RealOp::Halt]);
    program
        .symbols
        .define("start", Symbol::Label(0))
        .unwrap();
    program
        .symbols
        .define("limit", Symbol::Constant(100))
        .unwrap();
    let mut vm = VirtualMachine::new(VmOptions::default());
    vm.reset(&program);
    (vm, program)
}

fn eval_str(input: &str, vm: &VirtualMachine, program: &crate::program::Program) -> u16 {
    let mut messages = Messages::new();
    let expr = parse_expr(input, &mut messages).unwrap();
    eval(&expr, vm, program).unwrap()
}

#[test]
fn precedence_and_parentheses() {
    let (vm, program) = machine();
    assert_eq!(eval_str("2 + 3 * 4", &vm, &program), 14);
    assert_eq!(eval_str("(2 + 3) * 4", &vm, &program), 20);
    assert_eq!(eval_str("20 / 2 - 3", &vm, &program), 7);
}

#[test]
fn unary_minus_may_abut_a_literal() {
    let (vm, program) = machine();
    assert_eq!(eval_str("-1", &vm, &program), 0xFFFF);
    assert_eq!(eval_str("-2 + 5", &vm, &program), 3);
}

#[test]
fn registers_symbols_and_pc() {
    let (mut vm, program) = machine();
    vm.set_reg(Reg::R3, 99);
    vm.pc = 0;
    assert_eq!(eval_str("R3 + 1", &vm, &program), 100);
    assert_eq!(eval_str("limit", &vm, &program), 100);
    assert_eq!(eval_str("start", &vm, &program), 0);
    assert_eq!(eval_str("PC", &vm, &program), 0);
    assert_eq!(eval_str("SP", &vm, &program), 0);
}

#[test]
fn memory_cells_via_at() {
    let (mut vm, program) = machine();
    vm.write_mem(0x100, 7);
    vm.set_reg(Reg::R1, 0x100);
    assert_eq!(eval_str("@0x100", &vm, &program), 7);
    assert_eq!(eval_str("@R1 + 1", &vm, &program), 8);
    assert_eq!(eval_str("@(R1 + 1)", &vm, &program), 0);
}

#[test]
fn hex_and_octal_literals() {
    let (vm, program) = machine();
    let mut messages = Messages::new();
    let expr = parse_expr("0x10 + 010", &mut messages, ).unwrap();
    assert_eq!(eval(&expr, &vm, &program).unwrap(), 24);
    // Octal warns exactly once per message bag.
    assert_eq!(messages.len(), 1);
    let expr = parse_expr("017", &mut messages).unwrap();
    assert_eq!(eval(&expr, &vm, &program).unwrap(), 15);
    assert_eq!(messages.len(), 1);
}

#[test]
fn undefined_symbol_and_division_by_zero() {
    let (vm, program) = machine();
    let mut messages = Messages::new();
    let expr = parse_expr("nope", &mut messages).unwrap();
    assert!(eval(&expr, &vm, &program).is_err());
    let expr = parse_expr("1 / R0", &mut messages).unwrap();
    assert!(eval(&expr, &vm, &program).is_err());
}

#[test]
fn statement_forms() {
    let mut messages = Messages::new();
    match parse_statement("R1 = 5", &mut messages).unwrap() {
        Stmt::Assign(Lhs::Reg(Reg::R1), _) => {}
        other => panic!("{:?}", other),
    }
    match parse_statement("@0x100 = R2 + 1", &mut messages).unwrap() {
        Stmt::Assign(Lhs::Mem(_), _) => {}
        other => panic!("{:?}", other),
    }
    match parse_statement("R1 + 1", &mut messages).unwrap() {
        Stmt::Show(_) => {}
        other => panic!("{:?}", other),
    }
    assert!(parse_statement("1 = 2", &mut messages).is_err());
}

#[test]
fn assignment_mutates_the_machine() {
    let (mut vm, program) = machine();
    let mut messages = Messages::new();
    exec_statement(&mut vm, &program, "R4 = 2 * 21", &mut messages).unwrap();
    assert_eq!(vm.reg(Reg::R4), 42);
    exec_statement(&mut vm, &program, "@0xC000 = R4", &mut messages).unwrap();
    assert_eq!(vm.read_mem(0xC000), 42);
    let lhs = Lhs::Pc;
    assign(&lhs, 3, &mut vm, &program).unwrap();
    assert_eq!(vm.pc, 3);
}

#[test]
fn print_list_with_formats() {
    let mut messages = Messages::new();
    let items = parse_print_list("R1, R2:x, 5 + 5:b", &mut messages).unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].1, Format::Default);
    assert_eq!(items[1].1, Format::Hex);
    assert_eq!(items[2].1, Format::Bin);
}

#[test]
fn rendering() {
    assert_eq!(render(7, Format::Default), "0x0007 = 7");
    assert_eq!(render(0xFFFF, Format::Default), "0xFFFF = 65535 = -1");
    assert_eq!(render(255, Format::Hex), "0x00FF");
    assert_eq!(render(5, Format::Bin), "0b0000000000000101");
    assert_eq!(render(0xFFFE, Format::Signed), "-2");
    assert_eq!(render(65, Format::Char), "'A'");
}
