//! Virtual machine and operation model for the HERA educational
//! architecture: sixteen 16-bit registers (`R0` wired to zero), 65 536
//! memory words, four condition flags and a small ALU/memory/branch/control
//! instruction set.
//!
//! This crate owns everything the rest of the toolchain agrees on:
//!
//! * the mnemonic registry ([`isa`]) binding each operation name to its
//!   parameter signature, class and stream length,
//! * the encodable operation model ([`ops`]) with its binary encoding,
//! * execution ([`vm`]) with the reference carry/borrow semantics,
//! * the checked [`program::Program`] container,
//! * located diagnostics ([`messages`]) that passes return instead of
//!   aborting, and
//! * the debugger expression language ([`eval`]).
//!
//! Parsing and checking source text lives in the `hasm` crate; the
//! interactive debugger lives in `hdb`.

pub mod constants;
pub mod eval;
pub mod flags;
pub mod isa;
pub mod logic;
pub mod messages;
pub mod ops;
pub mod program;
pub mod vm;

/// The machine word.
pub type Word = u16;

pub use crate::flags::Flags;
pub use crate::messages::{FileId, FileSet, Location, Message, Messages, Severity, WarnOnce};
pub use crate::ops::{AluFn, Cond, DebugOp, ExecOp, FlagFn, RealOp, Reg, ShiftFn};
pub use crate::program::{AnnotatedOp, Program, Symbol, SymbolTable};
pub use crate::vm::{CallFrame, StepResult, StopCause, VirtualMachine, VmOptions};

#[cfg(test)]
mod test;
