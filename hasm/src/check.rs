//! Symbol resolution, type checking and pseudo-op expansion.
//!
//! The checker makes three passes over the raw operation list:
//!
//! 1. *Pre-resolve*: drop unknown mnemonics, reject data directives that
//!    follow code (even across files), and optionally strip debug ops.
//! 2. *Layout*: walk the survivors keeping two counters, the resolved
//!    operation index and the data address (starting at the configured data
//!    segment base). Labels bind to the current operation index, data labels
//!    to the current data address; the data image is built here.
//! 3. *Typecheck and expand*: resolve identifier arguments against the
//!    symbol table, check each argument against the registry signature, and
//!    expand every operation into its real (or debug) form.
//!
//! The resolved stream contains exactly `stream_len` slots per operation
//! even when arguments were rejected (placeholders keep label arithmetic
//! honest); a program with errors is never executed.

use crate::parser::{RawArg, RawOp, RawValue};
use hvm::isa::{self, OpClass, OpInfo, Param};
use hvm::messages::{FileSet, Messages, WarnOnce};
use hvm::ops::{AluFn, Cond, DebugOp, ExecOp, FlagFn, RealOp, Reg, ShiftFn};
use hvm::program::{AnnotatedOp, Program, Symbol};
use hvm::{constants, Word};

#[derive(Clone, Copy, Debug)]
pub struct CheckOptions {
    pub data_start: Word,
    /// Drop `print`/`print_reg`/`__eval`/`__dump_state` before layout.
    pub strip_debug_ops: bool,
}

impl Default for CheckOptions {
    fn default() -> CheckOptions {
        CheckOptions {
            data_start: constants::DATA_START,
            strip_debug_ops: false,
        }
    }
}

/// A code operation that survived pass 1, with its layout position.
struct Placed {
    raw: RawOp,
    info: &'static OpInfo,
    /// Index of this op's first slot in the resolved stream.
    pc: Word,
}

struct Checker {
    options: CheckOptions,
    messages: Messages,
    program: Program,
}

pub fn check(raw_ops: Vec<RawOp>, files: FileSet, options: CheckOptions) -> (Program, Messages) {
    let mut checker = Checker {
        options,
        messages: Messages::new(),
        program: Program {
            data_start: options.data_start,
            files,
            ..Program::default()
        },
    };
    let kept = checker.pre_resolve(raw_ops);
    let placed = checker.layout(kept);
    for item in &placed {
        checker.expand(item);
    }
    debug_assert_eq!(
        checker.program.ops.len(),
        placed.last().map_or(0, |p| p.pc as usize + p.info.stream_len)
    );
    (checker.program, checker.messages)
}

impl Checker {
    /// Pass 1. Returns the operations that take part in layout.
    fn pre_resolve(&mut self, raw_ops: Vec<RawOp>) -> Vec<(RawOp, &'static OpInfo)> {
        let mut kept = Vec::with_capacity(raw_ops.len());
        let mut seen_code = false;
        for raw in raw_ops {
            let info = match isa::lookup(&raw.name) {
                Some(info) => info,
                None => {
                    self.messages.error(
                        Some(raw.loc),
                        format!("unknown operation \"{}\"", raw.name),
                    );
                    continue;
                }
            };
            match info.class {
                OpClass::Real | OpClass::Pseudo => seen_code = true,
                OpClass::Debug => {
                    if self.options.strip_debug_ops {
                        continue;
                    }
                }
                OpClass::Data => {
                    if seen_code {
                        self.messages.error(
                            Some(raw.loc),
                            format!("data directive {} appears after code", raw.name),
                        );
                        continue;
                    }
                }
                OpClass::Marker => {}
            }
            kept.push((raw, info));
        }
        kept
    }

    /// Pass 2. Binds every symbol, builds the data image and assigns each
    /// code operation its resolved index.
    fn layout(&mut self, kept: Vec<(RawOp, &'static OpInfo)>) -> Vec<Placed> {
        let mut placed = Vec::new();
        let mut pc: usize = 0;
        let mut data_full = false;
        for (raw, info) in kept {
            match info.class {
                OpClass::Marker => {
                    if let Some(name) = self.symbol_arg(&raw) {
                        self.define(&raw, &name, Symbol::Label(pc as Word));
                    }
                }
                OpClass::Data => self.layout_data(&raw, info, &mut data_full),
                _ => {
                    let next = pc + info.stream_len;
                    if next > constants::MEMORY_WORDS {
                        self.messages
                            .error(Some(raw.loc), "program is too large to address");
                        continue;
                    }
                    placed.push(Placed {
                        raw,
                        info,
                        pc: pc as Word,
                    });
                    pc = next;
                }
            }
        }
        placed
    }

    fn layout_data(&mut self, raw: &RawOp, info: &OpInfo, full: &mut bool) {
        let data_addr = self.options.data_start as usize + self.program.data.len();
        match info.name {
            "CONSTANT" => {
                if raw.args.len() != 2 {
                    return self.arity_error(raw, info);
                }
                let name = match &raw.args[0].value {
                    RawValue::Sym(name) => name.clone(),
                    _ => {
                        return self
                            .messages
                            .error(Some(raw.args[0].loc), "CONSTANT needs a name")
                    }
                };
                if let Some(value) = self.data_value(&raw.args[1], Param::I16) {
                    self.define(raw, &name, Symbol::Constant(value));
                }
            }
            "DLABEL" => {
                if let Some(name) = self.symbol_arg(raw) {
                    self.define(raw, &name, Symbol::DataLabel(data_addr as Word));
                }
            }
            "INTEGER" => {
                if raw.args.len() != 1 {
                    return self.arity_error(raw, info);
                }
                if let Some(value) = self.data_value(&raw.args[0], Param::I16) {
                    self.grow_data(raw, vec![value], data_addr, full);
                }
            }
            "LP_STRING" => {
                if raw.args.len() != 1 {
                    return self.arity_error(raw, info);
                }
                match &raw.args[0].value {
                    RawValue::Str(text) => {
                        let mut cells = Vec::with_capacity(text.len() + 1);
                        cells.push(text.len() as Word);
                        cells.extend(text.bytes().map(Word::from));
                        self.grow_data(raw, cells, data_addr, full);
                    }
                    _ => self
                        .messages
                        .error(Some(raw.args[0].loc), "LP_STRING needs a string literal"),
                }
            }
            "DSKIP" => {
                if raw.args.len() != 1 {
                    return self.arity_error(raw, info);
                }
                if let Some(count) = self.data_value(&raw.args[0], Param::U16) {
                    self.grow_data(raw, vec![0; count as usize], data_addr, full);
                }
            }
            _ => unreachable!(),
        }
    }

    fn grow_data(&mut self, raw: &RawOp, cells: Vec<Word>, data_addr: usize, full: &mut bool) {
        if data_addr + cells.len() > constants::MEMORY_WORDS && !*full {
            *full = true;
            self.messages.error(
                Some(raw.loc),
                "static data does not fit below the end of memory",
            );
        }
        if !*full {
            self.program.data.extend(cells);
        }
    }

    /// An integer argument of a data directive: a literal, or a symbol
    /// declared earlier (declaration order is why constants must precede
    /// their first use).
    fn data_value(&mut self, arg: &RawArg, param: Param) -> Option<Word> {
        match &arg.value {
            RawValue::Int(_) => self.literal(arg, param),
            RawValue::Sym(name) => {
                if name.parse::<Reg>().is_ok() {
                    self.messages.error(
                        Some(arg.loc),
                        format!("expected an integer, found register \"{}\"", name),
                    );
                    return None;
                }
                match self.program.symbols.get(name) {
                    Some(symbol) => {
                        let value = symbol.value();
                        let (low, high) = param_range(param);
                        if i64::from(value) > high {
                            self.messages.error(
                                Some(arg.loc),
                                format!("value {} is out of range {}..={}", value, low, high),
                            );
                            None
                        } else {
                            Some(value)
                        }
                    }
                    None => {
                        self.messages.error(
                            Some(arg.loc),
                            format!(
                                "undefined symbol \"{}\" (constants must be declared before use)",
                                name
                            ),
                        );
                        None
                    }
                }
            }
            RawValue::Str(_) => {
                self.messages.error(Some(arg.loc), "expected an integer");
                None
            }
        }
    }

    /// Pass 3, one operation: typecheck the arguments and append the
    /// expansion to the stream.
    fn expand(&mut self, item: &Placed) {
        let raw = &item.raw;
        let info = item.info;
        let before = self.program.ops.len();
        if raw.args.len() != info.params.len() {
            self.arity_error(raw, info);
            self.emit_placeholders(raw, info);
            return;
        }
        let mut checked = Vec::with_capacity(raw.args.len());
        let mut ok = true;
        for (param, arg) in info.params.iter().zip(&raw.args) {
            match self.check_arg(*param, arg, item.pc) {
                Some(value) => checked.push(value),
                None => ok = false,
            }
        }
        if !ok {
            self.emit_placeholders(raw, info);
            return;
        }
        self.build(raw, info, &checked);
        debug_assert_eq!(self.program.ops.len() - before, info.stream_len);
    }

    fn check_arg(&mut self, param: Param, arg: &RawArg, pc: Word) -> Option<Checked> {
        match param {
            Param::Register => match &arg.value {
                RawValue::Sym(name) => match name.parse::<Reg>() {
                    Ok(r) => Some(Checked::R(r)),
                    Err(_) => {
                        self.messages.error(
                            Some(arg.loc),
                            format!("expected a register, found \"{}\"", name),
                        );
                        None
                    }
                },
                _ => {
                    self.messages
                        .error(Some(arg.loc), "expected a register");
                    None
                }
            },
            Param::String => match &arg.value {
                RawValue::Str(text) => Some(Checked::S(text.clone())),
                _ => {
                    self.messages
                        .error(Some(arg.loc), "expected a string literal");
                    None
                }
            },
            Param::Symbol => match &arg.value {
                RawValue::Sym(name) => Some(Checked::S(name.clone())),
                _ => {
                    self.messages.error(Some(arg.loc), "expected a name");
                    None
                }
            },
            Param::Label => match &arg.value {
                RawValue::Int(value) => {
                    if *value < -128 || *value > 127 {
                        self.messages.error(
                            Some(arg.loc),
                            format!("branch offset {} does not fit in 8 bits", value),
                        );
                        None
                    } else {
                        Some(Checked::Off(*value as i16))
                    }
                }
                RawValue::Sym(name) => {
                    if name.parse::<Reg>().is_ok() {
                        self.messages.error(
                            Some(arg.loc),
                            "relative branches take a label, not a register",
                        );
                        return None;
                    }
                    match self.program.symbols.get(name) {
                        Some(Symbol::Label(target)) => {
                            let offset = i64::from(target) - i64::from(pc);
                            if offset < -128 || offset > 127 {
                                self.messages.warn_once(
                                    WarnOnce::BranchRange,
                                    Some(arg.loc),
                                    format!(
                                        "branch to \"{}\" spans {} operations, beyond the 8-bit field",
                                        name, offset
                                    ),
                                );
                            }
                            Some(Checked::Off(offset as i16))
                        }
                        Some(symbol) => {
                            self.messages.error(
                                Some(arg.loc),
                                format!(
                                    "branch target \"{}\" is a {}, not a label",
                                    name,
                                    symbol.kind()
                                ),
                            );
                            None
                        }
                        None => {
                            self.messages.error(
                                Some(arg.loc),
                                format!("undefined symbol \"{}\"", name),
                            );
                            None
                        }
                    }
                }
                RawValue::Str(_) => {
                    self.messages
                        .error(Some(arg.loc), "expected a label or offset");
                    None
                }
            },
            _ => {
                let value = match &arg.value {
                    RawValue::Int(_) => return self.literal(arg, param).map(Checked::V),
                    RawValue::Sym(name) => {
                        if name.parse::<Reg>().is_ok() {
                            self.messages.error(
                                Some(arg.loc),
                                format!("expected an integer, found register \"{}\"", name),
                            );
                            return None;
                        }
                        match self.program.symbols.get(name) {
                            Some(symbol) => symbol.value(),
                            None => {
                                self.messages.error(
                                    Some(arg.loc),
                                    format!("undefined symbol \"{}\"", name),
                                );
                                return None;
                            }
                        }
                    }
                    RawValue::Str(_) => {
                        self.messages
                            .error(Some(arg.loc), "expected an integer");
                        return None;
                    }
                };
                let (low, high) = param_range(param);
                if i64::from(value) > high {
                    self.messages.error(
                        Some(arg.loc),
                        format!("value {} is out of range {}..={}", value, low, high),
                    );
                    None
                } else {
                    Some(Checked::V(value))
                }
            }
        }
    }

    /// Range-checks an integer literal against a parameter kind.
    fn literal(&mut self, arg: &RawArg, param: Param) -> Option<Word> {
        let value = match &arg.value {
            RawValue::Int(value) => *value,
            _ => {
                self.messages.error(Some(arg.loc), "expected an integer");
                return None;
            }
        };
        let (low, high) = param_range(param);
        if value < low || value > high {
            self.messages.error(
                Some(arg.loc),
                format!("value {} is out of range {}..={}", value, low, high),
            );
            return None;
        }
        Some(value as Word)
    }

    fn build(&mut self, raw: &RawOp, info: &'static OpInfo, args: &[Checked]) {
        let loc = raw.loc;
        match info.name {
            "SETLO" => self.real(loc, RealOp::Setlo { d: args[0].reg(), v: args[1].byte() }),
            "SETHI" => self.real(loc, RealOp::Sethi { d: args[0].reg(), v: args[1].byte() }),
            "AND" | "OR" | "ADD" | "SUB" | "MUL" | "XOR" => {
                let f: AluFn = info.name.parse().unwrap();
                self.real(
                    loc,
                    RealOp::Alu { f, d: args[0].reg(), a: args[1].reg(), b: args[2].reg() },
                );
            }
            "INC" => self.real(loc, RealOp::Inc { d: args[0].reg(), v: args[1].byte() }),
            "DEC" => self.real(loc, RealOp::Dec { d: args[0].reg(), v: args[1].byte() }),
            "LSL" | "LSR" | "LSL8" | "LSR8" | "ASL" | "ASR" => {
                let f: ShiftFn = info.name.parse().unwrap();
                self.real(loc, RealOp::Shift { f, d: args[0].reg(), s: args[1].reg() });
            }
            "SAVEF" => self.real(loc, RealOp::Savef { d: args[0].reg() }),
            "RSTRF" => self.real(loc, RealOp::Rstrf { d: args[0].reg() }),
            "FON" | "FOFF" | "FSET5" | "FSET4" => {
                let f: FlagFn = info.name.parse().unwrap();
                self.real(loc, RealOp::FlagSet { f, mask: args[0].byte() });
            }
            "LOAD" => self.real(
                loc,
                RealOp::Load { d: args[0].reg(), offset: args[1].byte(), b: args[2].reg() },
            ),
            "STORE" => self.real(
                loc,
                RealOp::Store { s: args[0].reg(), offset: args[1].byte(), b: args[2].reg() },
            ),
            "CALL" => {
                let ret = args[0].reg();
                if !matches!(ret, Reg::FP | Reg::PC_RET | Reg::FP_ALT) {
                    self.messages.warn_once(
                        WarnOnce::CallRegisters,
                        Some(loc),
                        format!("atypical return-address register {} for CALL", ret),
                    );
                }
                self.real(loc, RealOp::Call { ret, proc: args[1].reg() });
            }
            "RETURN" => {
                let proc = args[1].reg();
                if proc != Reg::PC_RET {
                    self.messages.warn_once(
                        WarnOnce::CallRegisters,
                        Some(loc),
                        format!("atypical procedure register {} for RETURN", proc),
                    );
                }
                self.real(loc, RealOp::Return { ret: args[0].reg(), proc });
            }
            "SWI" => {
                self.messages
                    .error(Some(loc), "SWI is not supported by this implementation");
                self.real(loc, RealOp::Swi { code: args[0].byte() });
            }
            "RTI" => {
                self.messages
                    .error(Some(loc), "RTI is not supported by this implementation");
                self.real(loc, RealOp::Rti);
            }
            "HALT" => self.real(loc, RealOp::Halt),
            "NOP" => self.real(loc, RealOp::Nop),
            "OPCODE" => self.real(loc, RealOp::Word(args[0].val())),
            name if name.ends_with('R') && name.len() > 2 && isa::lookup(&name[..name.len() - 1]).is_some() => {
                // Relative branch: the mnemonic is the condition plus R.
                let cond: Cond = name[..name.len() - 1].parse().unwrap();
                self.real(loc, RealOp::BranchRel { cond, offset: args[0].offset() });
            }
            name if name.parse::<Cond>().is_ok() => {
                let cond: Cond = name.parse().unwrap();
                self.real(loc, RealOp::Branch { cond, s: args[0].reg() });
            }
            "SET" => {
                let d = args[0].reg();
                let value = args[1].val();
                self.real(loc, RealOp::Setlo { d, v: (value & 0xFF) as u8 });
                self.real(loc, RealOp::Sethi { d, v: (value >> 8) as u8 });
            }
            "CMP" => {
                self.real(loc, RealOp::FlagSet { f: FlagFn::FON, mask: 8 });
                self.real(
                    loc,
                    RealOp::Alu { f: AluFn::SUB, d: Reg::R0, a: args[0].reg(), b: args[1].reg() },
                );
            }
            "MOVE" => self.real(
                loc,
                RealOp::Alu { f: AluFn::OR, d: args[0].reg(), a: args[1].reg(), b: Reg::R0 },
            ),
            "NEG" => {
                self.real(loc, RealOp::FlagSet { f: FlagFn::FON, mask: 8 });
                self.real(
                    loc,
                    RealOp::Alu { f: AluFn::SUB, d: args[0].reg(), a: Reg::R0, b: args[1].reg() },
                );
            }
            "NOT" => {
                let d = args[0].reg();
                let b = args[1].reg();
                if b == Reg::TMP {
                    self.messages.warning(
                        Some(loc),
                        "NOT overwrites R11 before reading it; the result will be 0",
                    );
                }
                self.real(loc, RealOp::Setlo { d: Reg::TMP, v: 0xFF });
                self.real(loc, RealOp::Sethi { d: Reg::TMP, v: 0xFF });
                self.real(loc, RealOp::Alu { f: AluFn::XOR, d, a: Reg::TMP, b });
            }
            "FLAGS" => {
                let b = args[0].reg();
                self.real(loc, RealOp::FlagSet { f: FlagFn::FOFF, mask: 8 });
                self.real(loc, RealOp::Alu { f: AluFn::ADD, d: b, a: b, b: Reg::R0 });
            }
            "print_reg" => self.debug(loc, DebugOp::PrintReg(args[0].reg())),
            "print" => self.debug(loc, DebugOp::Print(args[0].string())),
            "__eval" => self.debug(loc, DebugOp::Eval(args[0].string())),
            "__dump_state" => self.debug(loc, DebugOp::DumpState),
            other => unreachable!("unhandled mnemonic {}", other),
        }
    }

    fn real(&mut self, loc: hvm::Location, op: RealOp) {
        self.program.ops.push(AnnotatedOp {
            op: ExecOp::Real(op),
            loc,
        });
    }

    fn debug(&mut self, loc: hvm::Location, op: DebugOp) {
        self.program.ops.push(AnnotatedOp {
            op: ExecOp::Debug(op),
            loc,
        });
    }

    fn emit_placeholders(&mut self, raw: &RawOp, info: &OpInfo) {
        for _ in 0..info.stream_len {
            self.real(raw.loc, RealOp::Nop);
        }
    }

    fn arity_error(&mut self, raw: &RawOp, info: &OpInfo) {
        self.messages.error(
            Some(raw.loc),
            format!(
                "{} expects {} argument(s), got {}",
                info.name,
                info.params.len(),
                raw.args.len()
            ),
        );
    }

    /// The single-name argument of `LABEL`/`DLABEL`.
    fn symbol_arg(&mut self, raw: &RawOp) -> Option<String> {
        if raw.args.len() != 1 {
            self.messages.error(
                Some(raw.loc),
                format!("{} expects 1 argument, got {}", raw.name, raw.args.len()),
            );
            return None;
        }
        match &raw.args[0].value {
            RawValue::Sym(name) => Some(name.clone()),
            _ => {
                self.messages
                    .error(Some(raw.args[0].loc), format!("{} needs a name", raw.name));
                None
            }
        }
    }

    fn define(&mut self, raw: &RawOp, name: &str, symbol: Symbol) -> bool {
        match self.program.symbols.define(name, symbol) {
            Ok(()) => true,
            Err(existing) => {
                self.messages.error(
                    Some(raw.loc),
                    format!(
                        "\"{}\" is already defined as a {}",
                        name,
                        existing.kind()
                    ),
                );
                false
            }
        }
    }
}

fn param_range(param: Param) -> (i64, i64) {
    match param {
        Param::U4 => (0, 15),
        Param::U5 => (0, 31),
        Param::U6 => (0, 63),
        Param::U8 => (0, 255),
        Param::U16 => (0, 65535),
        Param::I8 => (-128, 255),
        Param::I16 => (-32768, 65535),
        _ => (0, 0),
    }
}

/// A typechecked argument.
enum Checked {
    R(Reg),
    V(Word),
    S(String),
    Off(i16),
}

impl Checked {
    fn reg(&self) -> Reg {
        match self {
            Checked::R(r) => *r,
            _ => unreachable!(),
        }
    }

    fn val(&self) -> Word {
        match self {
            Checked::V(v) => *v,
            _ => unreachable!(),
        }
    }

    fn byte(&self) -> u8 {
        (self.val() & 0xFF) as u8
    }

    fn offset(&self) -> i16 {
        match self {
            Checked::Off(offset) => *offset,
            _ => unreachable!(),
        }
    }

    fn string(&self) -> String {
        match self {
            Checked::S(s) => s.clone(),
            _ => unreachable!(),
        }
    }
}
