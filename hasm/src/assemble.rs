//! Binary emission and its inverse.
//!
//! Debug operations occupy stream slots but emit no words, so the offset of
//! a relative branch in the emitted code can differ from its offset in the
//! stream. The emitter therefore recomputes every relative-branch offset
//! from the emitted positions of the branch and its target.

use hvm::ops::{ExecOp, RealOp};
use hvm::program::Program;
use hvm::Word;

/// Encodes the program, one word per real operation.
pub fn assemble(program: &Program) -> Vec<Word> {
    // emitted[i] = number of code words before stream slot i.
    let mut emitted = Vec::with_capacity(program.ops.len() + 1);
    let mut count = 0usize;
    for slot in &program.ops {
        emitted.push(count);
        if slot.op.as_real().is_some() {
            count += 1;
        }
    }
    emitted.push(count);

    let mut words = Vec::with_capacity(count);
    for (index, slot) in program.ops.iter().enumerate() {
        if let ExecOp::Real(op) = &slot.op {
            let word = match *op {
                RealOp::BranchRel { cond, offset } => {
                    let target = index as i64 + i64::from(offset);
                    let offset = if target >= 0 && (target as usize) < emitted.len() {
                        (emitted[target as usize] as i64 - emitted[index] as i64) as i16
                    } else {
                        offset
                    };
                    RealOp::BranchRel { cond, offset }.encode()
                }
                op => op.encode(),
            };
            words.push(word);
        }
    }
    words
}

/// Decodes a word list back to operations; words that encode nothing come
/// back as `OPCODE(...)`.
pub fn disassemble(words: &[Word]) -> Vec<RealOp> {
    words
        .iter()
        .map(|&word| RealOp::decode(word).unwrap_or(RealOp::Word(word)))
        .collect()
}

/// The resolved program as text, one operation per line, with label names
/// restored as comments.
pub fn listing(program: &Program) -> String {
    let mut out = String::new();
    for (index, slot) in program.ops.iter().enumerate() {
        if let Some(label) = program.symbols.label_at(index as Word) {
            out.push_str(&format!("// {}:\n", label));
        }
        out.push_str(&format!("{}\n", slot.op));
    }
    out
}
