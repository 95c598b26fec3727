//! The mnemonic registry: one descriptor per operation the language knows.
//!
//! The registry binds each mnemonic to its parameter signature, its class
//! (real, pseudo, data or debug), how many slots it occupies in the resolved
//! operation stream, which flags its execution touches, and a one-line
//! description served by the debugger's `doc` command. Type checking,
//! pseudo-op expansion, encoding and execution all consult this table.

/// Kinds a single operation argument can have.
///
/// Integer kinds also accept symbols that resolve to an in-range value;
/// `Label` accepts only code labels (or an explicit signed offset for the
/// relative branches); `Symbol` introduces a new name.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Param {
    Register,
    U4,
    U5,
    U6,
    U8,
    U16,
    I8,
    I16,
    Label,
    Symbol,
    String,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OpClass {
    /// Directly encodable.
    Real,
    /// Expanded to real ops by the checker.
    Pseudo,
    /// Shapes the static data segment; occupies no stream slot.
    Data,
    /// Executes for diagnostics; assembles to nothing.
    Debug,
    /// `LABEL(name)`: consumed by the checker.
    Marker,
}

#[derive(Clone, Copy, Debug)]
pub struct OpInfo {
    pub name: &'static str,
    pub class: OpClass,
    pub params: &'static [Param],
    /// Slots this op occupies in the resolved stream.
    pub stream_len: usize,
    /// Flags touched by execution, for documentation.
    pub flags: &'static str,
    pub doc: &'static str,
}

use OpClass::*;
use Param::*;

const R3: &[Param] = &[Register, Register, Register];
const R2: &[Param] = &[Register, Register];
const R1: &[Param] = &[Register];
const RI8: &[Param] = &[Register, I8];
const RU6: &[Param] = &[Register, U6];
const MEM: &[Param] = &[Register, U5, Register];
const MASK5: &[Param] = &[U5];
const TARGET: &[Param] = &[Label];

macro_rules! branches {
    ($( $abs:literal $rel:literal ),*) => {
        &[$(
            OpInfo { name: $abs, class: Real, params: R1, stream_len: 1, flags: "",
                     doc: concat!("Branch to the operation index in the register (", $abs, " form).") },
            OpInfo { name: $rel, class: Real, params: TARGET, stream_len: 1, flags: "",
                     doc: concat!("Branch to a label or relative offset (", $rel, " form).") },
        )*]
    };
}

static BRANCH_OPS: &[OpInfo] = branches![
    "BR" "BRR", "BL" "BLR", "BGE" "BGER", "BLE" "BLER", "BG" "BGR",
    "BULE" "BULER", "BUG" "BUGR", "BZ" "BZR", "BNZ" "BNZR", "BC" "BCR",
    "BNC" "BNCR", "BS" "BSR", "BNS" "BNSR", "BV" "BVR", "BNV" "BNVR"
];

static BASE_OPS: &[OpInfo] = &[
    OpInfo { name: "SETLO", class: Real, params: RI8, stream_len: 1, flags: "",
             doc: "Set a register to a sign-extended byte." },
    OpInfo { name: "SETHI", class: Real, params: RI8, stream_len: 1, flags: "",
             doc: "Replace the high byte of a register." },
    OpInfo { name: "AND", class: Real, params: R3, stream_len: 1, flags: "szv",
             doc: "Bitwise and of two registers." },
    OpInfo { name: "OR", class: Real, params: R3, stream_len: 1, flags: "szv",
             doc: "Bitwise or of two registers." },
    OpInfo { name: "ADD", class: Real, params: R3, stream_len: 1, flags: "szvc",
             doc: "Add two registers plus the incoming carry." },
    OpInfo { name: "SUB", class: Real, params: R3, stream_len: 1, flags: "szvc",
             doc: "Subtract two registers minus the incoming borrow." },
    OpInfo { name: "MUL", class: Real, params: R3, stream_len: 1, flags: "szvc",
             doc: "Multiply two registers, keeping the low word." },
    OpInfo { name: "XOR", class: Real, params: R3, stream_len: 1, flags: "szv",
             doc: "Bitwise exclusive or of two registers." },
    OpInfo { name: "INC", class: Real, params: RU6, stream_len: 1, flags: "szvc",
             doc: "Add a constant 0..=63 to a register." },
    OpInfo { name: "DEC", class: Real, params: RU6, stream_len: 1, flags: "szvc",
             doc: "Subtract a constant 0..=63 from a register." },
    OpInfo { name: "LSL", class: Real, params: R2, stream_len: 1, flags: "szc",
             doc: "Shift left one bit through carry." },
    OpInfo { name: "LSR", class: Real, params: R2, stream_len: 1, flags: "szc",
             doc: "Shift right one bit through carry." },
    OpInfo { name: "LSL8", class: Real, params: R2, stream_len: 1, flags: "sz",
             doc: "Shift left eight bits." },
    OpInfo { name: "LSR8", class: Real, params: R2, stream_len: 1, flags: "sz",
             doc: "Shift right eight bits." },
    OpInfo { name: "ASL", class: Real, params: R2, stream_len: 1, flags: "szvc",
             doc: "Arithmetic shift left; overflow on sign change." },
    OpInfo { name: "ASR", class: Real, params: R2, stream_len: 1, flags: "sz",
             doc: "Arithmetic shift right, rounding toward minus infinity." },
    OpInfo { name: "SAVEF", class: Real, params: R1, stream_len: 1, flags: "",
             doc: "Copy the flags into a register." },
    OpInfo { name: "RSTRF", class: Real, params: R1, stream_len: 1, flags: "szvc",
             doc: "Restore the flags from a register." },
    OpInfo { name: "FON", class: Real, params: MASK5, stream_len: 1, flags: "szvc",
             doc: "Turn on the flags in the mask." },
    OpInfo { name: "FOFF", class: Real, params: MASK5, stream_len: 1, flags: "szvc",
             doc: "Turn off the flags in the mask." },
    OpInfo { name: "FSET5", class: Real, params: MASK5, stream_len: 1, flags: "szvc",
             doc: "Replace the flags with a five-bit mask." },
    OpInfo { name: "FSET4", class: Real, params: &[U4], stream_len: 1, flags: "szvc",
             doc: "Replace the flags with a four-bit mask." },
    OpInfo { name: "LOAD", class: Real, params: MEM, stream_len: 1, flags: "",
             doc: "Load a word from memory at base register plus offset." },
    OpInfo { name: "STORE", class: Real, params: MEM, stream_len: 1, flags: "",
             doc: "Store a word to memory at base register plus offset." },
    OpInfo { name: "CALL", class: Real, params: R2, stream_len: 1, flags: "",
             doc: "Jump to the procedure register, recording the return index." },
    OpInfo { name: "RETURN", class: Real, params: R2, stream_len: 1, flags: "",
             doc: "Jump back through the return-address register." },
    OpInfo { name: "SWI", class: Real, params: &[U8], stream_len: 1, flags: "",
             doc: "Software interrupt (not supported by this implementation)." },
    OpInfo { name: "RTI", class: Real, params: &[], stream_len: 1, flags: "",
             doc: "Return from interrupt (not supported by this implementation)." },
    OpInfo { name: "HALT", class: Real, params: &[], stream_len: 1, flags: "",
             doc: "Stop execution." },
    OpInfo { name: "NOP", class: Real, params: &[], stream_len: 1, flags: "",
             doc: "Do nothing." },
    OpInfo { name: "OPCODE", class: Real, params: &[U16], stream_len: 1, flags: "",
             doc: "Insert a raw instruction word." },
    // Pseudo-operations.
    OpInfo { name: "SET", class: Pseudo, params: &[Register, I16], stream_len: 2, flags: "",
             doc: "Set a register to a 16-bit value or symbol (SETLO + SETHI)." },
    OpInfo { name: "CMP", class: Pseudo, params: R2, stream_len: 2, flags: "szvc",
             doc: "Compare two registers (FON 8 + SUB into R0)." },
    OpInfo { name: "MOVE", class: Pseudo, params: R2, stream_len: 1, flags: "szv",
             doc: "Copy a register (OR with R0)." },
    OpInfo { name: "NEG", class: Pseudo, params: R2, stream_len: 2, flags: "szvc",
             doc: "Arithmetic negation (FON 8 + SUB from R0)." },
    OpInfo { name: "NOT", class: Pseudo, params: R2, stream_len: 3, flags: "szv",
             doc: "Bitwise complement; uses R11 as scratch." },
    OpInfo { name: "FLAGS", class: Pseudo, params: R1, stream_len: 2, flags: "szvc",
             doc: "Set sign and zero from a register (FOFF 8 + ADD with R0)." },
    // Data directives.
    OpInfo { name: "CONSTANT", class: Data, params: &[Symbol, I16], stream_len: 0, flags: "",
             doc: "Define a named 16-bit constant." },
    OpInfo { name: "DLABEL", class: Data, params: &[Symbol], stream_len: 0, flags: "",
             doc: "Name the current static data address." },
    OpInfo { name: "INTEGER", class: Data, params: &[I16], stream_len: 0, flags: "",
             doc: "Place one word in the static data segment." },
    OpInfo { name: "LP_STRING", class: Data, params: &[String], stream_len: 0, flags: "",
             doc: "Place a length-prefixed string in the data segment." },
    OpInfo { name: "DSKIP", class: Data, params: &[U16], stream_len: 0, flags: "",
             doc: "Reserve zeroed words in the data segment." },
    // Markers and diagnostics.
    OpInfo { name: "LABEL", class: Marker, params: &[Symbol], stream_len: 0, flags: "",
             doc: "Name the current operation index." },
    OpInfo { name: "print_reg", class: Debug, params: R1, stream_len: 1, flags: "",
             doc: "Print a register value." },
    OpInfo { name: "print", class: Debug, params: &[String], stream_len: 1, flags: "",
             doc: "Print a string." },
    OpInfo { name: "__eval", class: Debug, params: &[String], stream_len: 1, flags: "",
             doc: "Evaluate a debugger expression or assignment." },
    OpInfo { name: "__dump_state", class: Debug, params: &[], stream_len: 1, flags: "",
             doc: "Print the full machine state." },
];

/// Looks up the descriptor for a mnemonic. Mnemonics are case-sensitive.
pub fn lookup(name: &str) -> Option<&'static OpInfo> {
    BASE_OPS
        .iter()
        .chain(BRANCH_OPS.iter())
        .find(|info| info.name == name)
}

/// Every known descriptor, for documentation listings.
pub fn all() -> impl Iterator<Item = &'static OpInfo> {
    BASE_OPS.iter().chain(BRANCH_OPS.iter())
}
