use super::{compile, compile_ok};
use crate::{assemble, disassemble, listing};
use hvm::ops::{Cond, RealOp, Reg};

#[test]
fn one_word_per_real_op() {
    let program = compile_ok("SET(R1, 3)\nADD(R2, R1, R0)\nHALT()");
    let words = assemble(&program);
    assert_eq!(words.len(), 4);
    assert_eq!(
        disassemble(&words),
        vec![
            RealOp::Setlo { d: Reg::R1, v: 3 },
            RealOp::Sethi { d: Reg::R1, v: 0 },
            RealOp::Alu {
                f: hvm::AluFn::ADD,
                d: Reg::R2,
                a: Reg::R1,
                b: Reg::R0
            },
            RealOp::Halt,
        ]
    );
}

#[test]
fn debug_ops_emit_no_words() {
    let program = compile_ok("print_reg(R1)\nNOP()\nprint(\"x\")\nHALT()");
    assert_eq!(program.ops.len(), 4);
    assert_eq!(assemble(&program).len(), 2);
}

#[test]
fn branch_offsets_skip_elided_debug_ops() {
    // The stream offset from BRR to the label is 3 (print_reg occupies a
    // slot), but only 2 code words separate them in the binary.
    let program = compile_ok("BRR(end)\nprint_reg(R1)\nNOP()\nLABEL(end)\nHALT()");
    assert_eq!(
        program.ops[0].op.as_real(),
        Some(&RealOp::BranchRel {
            cond: Cond::BR,
            offset: 3
        })
    );
    let words = assemble(&program);
    assert_eq!(
        RealOp::decode(words[0]),
        Some(RealOp::BranchRel {
            cond: Cond::BR,
            offset: 2
        })
    );
}

#[test]
fn backward_branch_offsets_are_adjusted_too() {
    let program = compile_ok("LABEL(top)\nNOP()\nprint_reg(R1)\nBRR(top)\nHALT()");
    assert_eq!(
        program.ops[2].op.as_real(),
        Some(&RealOp::BranchRel {
            cond: Cond::BR,
            offset: -2
        })
    );
    let words = assemble(&program);
    assert_eq!(
        RealOp::decode(words[1]),
        Some(RealOp::BranchRel {
            cond: Cond::BR,
            offset: -1
        })
    );
}

#[test]
fn unknown_words_disassemble_as_opcode() {
    let ops = disassemble(&[0x3FFF, RealOp::Halt.encode()]);
    assert_eq!(ops[0], RealOp::Word(0x3FFF));
    assert_eq!(ops[1], RealOp::Halt);
    assert_eq!(ops[0].to_string(), "OPCODE(0x3FFF)");
}

#[test]
fn opcode_words_pass_through_verbatim() {
    let program = compile_ok("OPCODE(0x1234)\nHALT()");
    assert_eq!(assemble(&program), vec![0x1234, RealOp::Halt.encode()]);
}

#[test]
fn listing_shows_resolved_ops_and_labels() {
    let program = compile_ok("SET(R1, 3)\nLABEL(done)\nHALT()");
    let text = listing(&program);
    assert_eq!(text, "SETLO(R1, 3)\nSETHI(R1, 0)\n// done:\nHALT()\n");
}

#[test]
fn assembly_is_deterministic() {
    let source = "DLABEL(X)\nINTEGER(9)\nSET(R1, X)\nLOAD(R2, 0, R1)\nHALT()";
    let (a, _) = compile(source);
    let (b, _) = compile(source);
    assert_eq!(assemble(&a), assemble(&b));
}
