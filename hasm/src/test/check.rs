use super::{compile, compile_ok, first_error};
use hvm::ops::{AluFn, Cond, DebugOp, ExecOp, FlagFn, RealOp, Reg};
use hvm::program::Symbol;
use hvm::Severity;
use matches::assert_matches;

fn real_ops(program: &hvm::Program) -> Vec<RealOp> {
    program
        .ops
        .iter()
        .filter_map(|slot| slot.op.as_real().copied())
        .collect()
}

#[test]
fn set_expands_to_two_words() {
    let program = compile_ok("SET(R1, 0xC0DE) HALT()");
    assert_eq!(
        real_ops(&program),
        vec![
            RealOp::Setlo { d: Reg::R1, v: 0xDE },
            RealOp::Sethi { d: Reg::R1, v: 0xC0 },
            RealOp::Halt,
        ]
    );
}

#[test]
fn label_after_pseudo_accounts_for_expansion() {
    let program = compile_ok("SET(R1, label2)\nLABEL(label2)\nHALT()");
    assert_eq!(program.symbols.get("label2"), Some(Symbol::Label(2)));
    assert_eq!(
        real_ops(&program)[0],
        RealOp::Setlo { d: Reg::R1, v: 2 }
    );
}

#[test]
fn branch_to_label_becomes_relative_offset() {
    let program = compile_ok("SET(R1, 0)\nBRR(skip)\nSET(R1, 1)\nLABEL(skip)\nHALT()");
    assert_eq!(
        real_ops(&program)[2],
        RealOp::BranchRel {
            cond: Cond::BR,
            offset: 3
        }
    );
}

#[test]
fn data_layout_and_symbols() {
    let program = compile_ok(
        "DLABEL(X)\nINTEGER(42)\nINTEGER(-1)\nDLABEL(S)\nLP_STRING(\"hi\")\nDSKIP(4)\nDLABEL(END)\nSET(R1, X)\nHALT()",
    );
    assert_eq!(program.symbols.get("X"), Some(Symbol::DataLabel(0xC000)));
    assert_eq!(program.symbols.get("S"), Some(Symbol::DataLabel(0xC002)));
    assert_eq!(program.symbols.get("END"), Some(Symbol::DataLabel(0xC009)));
    assert_eq!(
        program.data,
        vec![42, 0xFFFF, 2, b'h' as u16, b'i' as u16, 0, 0, 0, 0]
    );
    assert_eq!(
        real_ops(&program)[0..2],
        [
            RealOp::Setlo { d: Reg::R1, v: 0x00 },
            RealOp::Sethi { d: Reg::R1, v: 0xC0 },
        ]
    );
}

#[test]
fn constants_resolve_in_declaration_order() {
    let program = compile_ok("CONSTANT(N, 10)\nCONSTANT(M, N)\nSET(R1, M)\nHALT()");
    assert_eq!(program.symbols.get("M"), Some(Symbol::Constant(10)));
}

#[test]
fn constant_used_before_declaration_is_an_error() {
    let (_, messages) = compile("DSKIP(N)\nCONSTANT(N, 4)\nHALT()");
    assert!(first_error(&messages).contains("declared before use"));
}

#[test]
fn data_after_code_is_rejected() {
    let (_, messages) = compile("SET(R1, 1)\nINTEGER(0)");
    assert!(messages.has_errors());
    let errors: Vec<_> = messages
        .iter()
        .filter(|m| m.severity == Severity::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].location.unwrap().line, 2);
}

#[test]
fn symbols_may_start_with_a_register_prefix() {
    let program = compile_ok("CONSTANT(R1_INIT, 7)\nSET(R1, R1_INIT)\nHALT()");
    assert_eq!(
        real_ops(&program)[0],
        RealOp::Setlo { d: Reg::R1, v: 7 }
    );
}

#[test]
fn register_aliases_resolve() {
    let program = compile_ok("MOVE(SP, Rt)\nMOVE(FP_alt, PC_ret)\nMOVE(FP, r3)\nHALT()");
    assert_eq!(
        real_ops(&program)[0],
        RealOp::Alu {
            f: AluFn::OR,
            d: Reg::R15,
            a: Reg::R11,
            b: Reg::R0
        }
    );
}

#[test]
fn cmp_neg_not_flags_expansions() {
    let program = compile_ok("CMP(R1, R2)\nNEG(R3, R4)\nNOT(R5, R6)\nFLAGS(R7)\nHALT()");
    let ops = real_ops(&program);
    assert_eq!(
        &ops[0..2],
        &[
            RealOp::FlagSet { f: FlagFn::FON, mask: 8 },
            RealOp::Alu { f: AluFn::SUB, d: Reg::R0, a: Reg::R1, b: Reg::R2 },
        ]
    );
    assert_eq!(
        &ops[2..4],
        &[
            RealOp::FlagSet { f: FlagFn::FON, mask: 8 },
            RealOp::Alu { f: AluFn::SUB, d: Reg::R3, a: Reg::R0, b: Reg::R4 },
        ]
    );
    assert_eq!(
        &ops[4..7],
        &[
            RealOp::Setlo { d: Reg::R11, v: 0xFF },
            RealOp::Sethi { d: Reg::R11, v: 0xFF },
            RealOp::Alu { f: AluFn::XOR, d: Reg::R5, a: Reg::R11, b: Reg::R6 },
        ]
    );
    assert_eq!(
        &ops[7..9],
        &[
            RealOp::FlagSet { f: FlagFn::FOFF, mask: 8 },
            RealOp::Alu { f: AluFn::ADD, d: Reg::R7, a: Reg::R7, b: Reg::R0 },
        ]
    );
}

#[test]
fn not_with_r11_operand_warns_every_time() {
    let (_, messages) = compile("NOT(R1, R11)\nNOT(R2, Rt)\nHALT()");
    let warnings: Vec<_> = messages
        .iter()
        .filter(|m| m.severity == Severity::Warning)
        .collect();
    assert_eq!(warnings.len(), 2);
}

#[test]
fn octal_warns_once_per_program() {
    let (_, messages) = compile("SET(R1, 017)\nSET(R2, 017)\nHALT()");
    assert!(!messages.has_errors());
    assert_eq!(messages.len(), 1);
}

#[test]
fn atypical_call_register_warns_once() {
    let (_, messages) = compile("SET(R1, 0)\nCALL(R2, R1)\nCALL(R3, R1)\nHALT()");
    let warnings: Vec<_> = messages
        .iter()
        .filter(|m| m.severity == Severity::Warning)
        .collect();
    assert_eq!(warnings.len(), 1);
}

#[test]
fn branch_distance_advisory() {
    let mut source = String::from("LABEL(top)\n");
    for _ in 0..200 {
        source.push_str("NOP()\n");
    }
    source.push_str("BRR(top)\nHALT()");
    let (program, messages) = compile(&source);
    assert!(!messages.has_errors());
    assert_eq!(messages.len(), 1);
    assert_eq!(
        real_ops(&program)[200],
        RealOp::BranchRel {
            cond: Cond::BR,
            offset: -200
        }
    );
}

#[test]
fn branch_to_non_label_is_an_error() {
    let (_, messages) = compile("CONSTANT(K, 3)\nBRR(K)\nHALT()");
    assert!(first_error(&messages).contains("not a label"));

    let (_, messages) = compile("DLABEL(X)\nINTEGER(1)\nBZR(X)\nHALT()");
    assert!(first_error(&messages).contains("not a label"));
}

#[test]
fn undefined_symbol_is_an_error() {
    let (_, messages) = compile("SET(R1, missing)\nHALT()");
    assert!(first_error(&messages).contains("undefined symbol"));
}

#[test]
fn redefinition_is_an_error() {
    let (_, messages) = compile("LABEL(x)\nNOP()\nLABEL(x)\nHALT()");
    assert!(first_error(&messages).contains("already defined"));

    let (_, messages) = compile("CONSTANT(x, 1)\nDLABEL(x)\nHALT()");
    assert!(first_error(&messages).contains("already defined"));
}

#[test]
fn arity_and_kind_mismatches() {
    let (_, messages) = compile("ADD(R1, R2)\nHALT()");
    assert!(first_error(&messages).contains("expects 3 argument(s)"));

    let (_, messages) = compile("ADD(R1, R2, 3)\nHALT()");
    assert!(first_error(&messages).contains("expected a register"));

    let (_, messages) = compile("SET(R1, R2)\nHALT()");
    assert!(first_error(&messages).contains("found register"));

    let (_, messages) = compile("INC(R1, 64)\nHALT()");
    assert!(first_error(&messages).contains("out of range"));

    let (_, messages) = compile("LOAD(R1, 32, R2)\nHALT()");
    assert!(first_error(&messages).contains("out of range"));
}

#[test]
fn swi_and_rti_are_rejected_at_check_time() {
    let (_, messages) = compile("SWI(3)\nHALT()");
    assert!(first_error(&messages).contains("SWI"));

    let (_, messages) = compile("RTI()\nHALT()");
    assert!(first_error(&messages).contains("RTI"));
}

#[test]
fn unknown_operation() {
    let (_, messages) = compile("FROB(R1)\nHALT()");
    assert!(first_error(&messages).contains("unknown operation"));
}

#[test]
fn strip_debug_ops_removes_them_from_the_stream() {
    let source = "print_reg(R1)\nSET(R1, after)\nprint(\"x\")\nLABEL(after)\nHALT()";
    let (program, _) = compile(source);
    assert_eq!(program.ops.len(), 5);
    assert_eq!(program.symbols.get("after"), Some(Symbol::Label(4)));
    assert_matches!(program.ops[0].op, ExecOp::Debug(DebugOp::PrintReg(Reg::R1)));

    let (stripped, _) = crate::compile_source(
        "<test>",
        source,
        crate::CheckOptions {
            strip_debug_ops: true,
            ..Default::default()
        },
    );
    assert_eq!(stripped.ops.len(), 3);
    assert_eq!(stripped.symbols.get("after"), Some(Symbol::Label(2)));
}

#[test]
fn big_stack_moves_the_data_segment() {
    let (program, _) = crate::compile_source(
        "<test>",
        "DLABEL(X)\nINTEGER(1)\nHALT()",
        crate::CheckOptions {
            data_start: 0xFFC0,
            ..Default::default()
        },
    );
    assert_eq!(program.symbols.get("X"), Some(Symbol::DataLabel(0xFFC0)));
}

#[test]
fn char_literals_are_integers() {
    let program = compile_ok("SET(R1, 'A')\nSET(R2, '\\n')\nHALT()");
    let ops = real_ops(&program);
    assert_eq!(ops[0], RealOp::Setlo { d: Reg::R1, v: 65 });
    assert_eq!(ops[2], RealOp::Setlo { d: Reg::R2, v: 10 });
}

#[test]
fn opcode_inserts_a_raw_word() {
    let program = compile_ok("OPCODE(0xABCD)\nHALT()");
    assert_eq!(real_ops(&program)[0], RealOp::Word(0xABCD));
}
