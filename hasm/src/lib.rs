//! Assembler front end for the [hvm](../hvm/index.html) virtual machine.
//!
//! The entry points are [`compile_file`] and [`compile_source`], which take
//! HERA source text through loading (includes, conditional compilation),
//! parsing, checking (symbols, types, pseudo expansion, data layout) and
//! return a resolved [`Program`](../hvm/program/struct.Program.html)
//! together with the accumulated diagnostics. [`assemble`](fn.assemble.html)
//! then encodes a checked program to machine words and
//! [`disassemble`](fn.disassemble.html) inverts that encoding.
//!
//! Parsing is implemented with [pest]; parse errors are converted into the
//! same located diagnostics every other pass produces.
//!
//! # The HERA language
//!
//! A program is a sequence of operation invocations, written like calls:
//! `SET(R1, 3)`. Arguments are registers, integers, characters, strings or
//! symbol names; a trailing semicolon is accepted. Comments are `//` to end
//! of line or `/* ... */`. Integer literals are decimal, hex (`0x`) or
//! octal (leading `0`, warned about once); character literals support the
//! escape set `\n \t \r \\ \' \" \0 \xHH \o...`.
//!
//! Registers are `R0`..`R15`; `R0` always reads zero. Aliases: `Rt` (R11),
//! `FP` (R12), `PC_ret` (R13), `FP_alt` (R14), `SP` (R15).
//!
//! ## Operations
//!
//! Mnemonic | Syntax | Description
//! ---------|--------|------------
//! `SETLO`  | `SETLO(d, v)` | set `d` to a sign-extended byte
//! `SETHI`  | `SETHI(d, v)` | replace the high byte of `d`
//! `SET`    | `SET(d, value)` | load a 16-bit value or symbol (two words)
//! `AND` `OR` `XOR` | `AND(d, a, b)` | bitwise operations
//! `ADD` `SUB` `MUL` | `ADD(d, a, b)` | carry-coupled arithmetic
//! `INC` `DEC` | `INC(d, n)` | add or subtract a constant 0..=63
//! `LSL` `LSR` | `LSL(d, s)` | shift one bit through carry
//! `LSL8` `LSR8` | `LSL8(d, s)` | shift a whole byte
//! `ASL` `ASR` | `ASR(d, s)` | arithmetic shifts
//! `SAVEF` `RSTRF` | `SAVEF(d)` | move the flags to or from a register
//! `FON` `FOFF` | `FON(mask)` | turn flags on or off
//! `FSET5` `FSET4` | `FSET5(mask)` | replace the flags
//! `LOAD` `STORE` | `LOAD(d, offset, b)` | memory access
//! `BR` `BZ` `BL` ... | `BZ(s)` | absolute branch through a register
//! `BRR` `BZR` ... | `BZR(target)` | relative branch to a label or offset
//! `CALL` `RETURN` | `CALL(ret, proc)` | procedure linkage
//! `CMP` | `CMP(a, b)` | compare (sets flags like `SUB` into `R0`)
//! `MOVE` `NEG` `NOT` | `MOVE(d, s)` | register-to-register helpers
//! `FLAGS` | `FLAGS(b)` | set sign/zero from a register
//! `HALT` `NOP` | `HALT()` | control
//! `OPCODE` | `OPCODE(word)` | insert a raw instruction word
//! `LABEL` | `LABEL(name)` | name the next operation
//! `CONSTANT` | `CONSTANT(name, value)` | named constant
//! `DLABEL` `INTEGER` `LP_STRING` `DSKIP` | `INTEGER(42)` | static data
//! `print_reg` `print` `__eval` `__dump_state` | `print_reg(R1)` | diagnostics
//!
//! ## Directives
//!
//! `#include "file"` splices another file, resolved relative to the
//! including file. `#ifdef SYM` / `#ifndef SYM` / `#else` / `#endif` gate
//! items; the only predefined symbol is `HERA_PY`, so a C-compatible
//! preamble can be guarded with `#ifndef HERA_PY`.
//!
//! [pest]: https://docs.rs/pest/

mod assemble;
mod check;
mod loader;
mod parser;

#[cfg(test)]
mod test;

pub use crate::assemble::{assemble, disassemble, listing};
pub use crate::check::{check, CheckOptions};
pub use crate::loader::{load_file, load_source};
pub use crate::parser::{HeraParser, RawArg, RawOp, RawValue, Rule};

use hvm::messages::Messages;
use hvm::program::Program;
use std::path::Path;

/// Loads, parses and checks a program from disk.
pub fn compile_file(path: &Path, options: CheckOptions) -> (Program, Messages) {
    let (ops, files, mut messages) = loader::load_file(path);
    let (program, check_messages) = check::check(ops, files, options);
    messages.merge(check_messages);
    (program, messages)
}

/// Loads, parses and checks a program from a string.
pub fn compile_source(name: &str, text: &str, options: CheckOptions) -> (Program, Messages) {
    let (ops, files, mut messages) = loader::load_source(name, text);
    let (program, check_messages) = check::check(ops, files, options);
    messages.merge(check_messages);
    (program, messages)
}
