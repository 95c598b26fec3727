//! Execution of resolved programs.

use crate::constants::REGISTER_COUNT;
use crate::flags::Flags;
use crate::logic;
use crate::messages::{Location, Messages, WarnOnce};
use crate::ops::{AluFn, DebugOp, ExecOp, FlagFn, RealOp, Reg, ShiftFn};
use crate::program::Program;
use crate::{constants, eval, Word};

/// Why the machine stopped stepping.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StopCause {
    /// `HALT` was executed.
    Halted,
    /// The program counter left the operation stream.
    EndOfProgram,
    /// The operation throttle was exhausted.
    Throttled,
    /// The stack pointer entered the data segment.
    StackOverflow,
    /// An `OPCODE` word with no decodable instruction was executed.
    BadWord,
    /// An external halt request arrived.
    Interrupted,
}

impl StopCause {
    /// Causes that the command-line driver reports as runtime failures.
    pub fn is_error(self) -> bool {
        match self {
            StopCause::Halted | StopCause::EndOfProgram => false,
            _ => true,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StepResult {
    Ran,
    Stopped(StopCause),
}

/// One entry of the shadow call stack kept for diagnostics.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CallFrame {
    /// Stream index of the `CALL`.
    pub call_index: usize,
    /// Stream index execution returns to.
    pub return_index: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct VmOptions {
    pub throttle: Option<u64>,
    /// Warn when `RETURN` jumps outside the operation stream.
    pub warn_return: bool,
}

impl Default for VmOptions {
    fn default() -> VmOptions {
        VmOptions {
            throttle: None,
            warn_return: true,
        }
    }
}

/// The machine state. Cloning is cheap enough (128 KiB of memory) that the
/// debugger snapshots whole machines for `undo`.
#[derive(Clone, Debug)]
pub struct VirtualMachine {
    pub registers: [Word; REGISTER_COUNT],
    pub memory: Vec<Word>,
    pub flags: Flags,
    /// Index into the resolved operation stream.
    pub pc: usize,
    pub halted: bool,
    pub op_count: u64,
    /// Lines produced by diagnostic operations, drained by the driver.
    pub output: Vec<String>,
    pub call_stack: Vec<CallFrame>,
    throttle: Option<u64>,
    warn_return: bool,
    warned_interrupt: bool,
    halt_requested: bool,
}

impl VirtualMachine {
    pub fn new(options: VmOptions) -> VirtualMachine {
        VirtualMachine {
            registers: [0; REGISTER_COUNT],
            memory: vec![0; constants::MEMORY_WORDS],
            flags: Flags::default(),
            pc: 0,
            halted: false,
            op_count: 0,
            output: Vec::new(),
            call_stack: Vec::new(),
            throttle: options.throttle,
            warn_return: options.warn_return,
            warned_interrupt: false,
            halt_requested: false,
        }
    }

    /// Clears all state and loads the program's data segment.
    pub fn reset(&mut self, program: &Program) {
        self.registers = [0; REGISTER_COUNT];
        self.flags = Flags::default();
        self.pc = 0;
        self.halted = false;
        self.op_count = 0;
        self.output.clear();
        self.call_stack.clear();
        self.warned_interrupt = false;
        self.halt_requested = false;
        for cell in self.memory.iter_mut() {
            *cell = 0;
        }
        let start = program.data_start as usize;
        self.memory[start..start + program.data.len()].copy_from_slice(&program.data);
    }

    /// Restores a snapshot taken earlier with `clone`, keeping the
    /// once-per-run diagnostic latches of the current run.
    pub fn restore(&mut self, snapshot: &VirtualMachine) {
        let warned_interrupt = self.warned_interrupt || snapshot.warned_interrupt;
        *self = snapshot.clone();
        self.warned_interrupt = warned_interrupt;
    }

    /// Asks the machine to stop before the next instruction.
    pub fn request_halt(&mut self) {
        self.halt_requested = true;
    }

    pub fn reg(&self, r: Reg) -> Word {
        self.registers[r.index()]
    }

    pub fn set_reg(&mut self, r: Reg, value: Word) {
        if r != Reg::R0 {
            self.registers[r.index()] = value;
        }
    }

    pub fn read_mem(&self, address: Word) -> Word {
        self.memory[address as usize]
    }

    pub fn write_mem(&mut self, address: Word, value: Word) {
        self.memory[address as usize] = value;
    }

    /// Executes one operation. Runtime diagnostics go into `messages`.
    pub fn step(&mut self, program: &Program, messages: &mut Messages) -> StepResult {
        if self.halted {
            return StepResult::Stopped(StopCause::Halted);
        }
        if self.pc >= program.ops.len() {
            return StepResult::Stopped(StopCause::EndOfProgram);
        }
        let loc = program.ops[self.pc].loc;
        if self.halt_requested {
            self.halt_requested = false;
            self.halted = true;
            messages.error(Some(loc), "execution interrupted");
            return StepResult::Stopped(StopCause::Interrupted);
        }
        if let Some(limit) = self.throttle {
            if self.op_count >= limit {
                self.halted = true;
                messages.error(
                    Some(loc),
                    format!("operation throttle of {} exceeded", limit),
                );
                return StepResult::Stopped(StopCause::Throttled);
            }
        }
        let slot = program.ops[self.pc].op.clone();
        self.op_count += 1;
        let stopped = match &slot {
            ExecOp::Real(op) => self.exec_real(*op, loc, program, messages),
            ExecOp::Debug(op) => {
                self.exec_debug(op, loc, program, messages);
                self.pc += 1;
                None
            }
        };
        if let Some(cause) = stopped {
            return StepResult::Stopped(cause);
        }
        if self.reg(Reg::SP) >= program.data_start {
            self.halted = true;
            messages.error(
                Some(loc),
                format!(
                    "stack overflow: SP = 0x{:04X} reached the data segment at 0x{:04X}",
                    self.reg(Reg::SP),
                    program.data_start
                ),
            );
            return StepResult::Stopped(StopCause::StackOverflow);
        }
        StepResult::Ran
    }

    /// Steps until the machine stops for any reason.
    pub fn run(&mut self, program: &Program, messages: &mut Messages) -> StopCause {
        loop {
            if let StepResult::Stopped(cause) = self.step(program, messages) {
                return cause;
            }
        }
    }

    fn set_arith_flags(&mut self, result: Word, carry: bool, overflow: bool) {
        self.flags.sign = logic::sign(result);
        self.flags.zero = result == 0;
        self.flags.carry = carry;
        self.flags.overflow = overflow;
    }

    fn set_logic_flags(&mut self, result: Word) {
        self.flags.sign = logic::sign(result);
        self.flags.zero = result == 0;
        self.flags.overflow = false;
    }

    fn set_shift_flags(&mut self, result: Word) {
        self.flags.sign = logic::sign(result);
        self.flags.zero = result == 0;
    }

    fn exec_real(
        &mut self,
        op: RealOp,
        loc: Location,
        program: &Program,
        messages: &mut Messages,
    ) -> Option<StopCause> {
        let mut next = self.pc + 1;
        match op {
            RealOp::Setlo { d, v } => self.set_reg(d, v as i8 as i16 as Word),
            RealOp::Sethi { d, v } => {
                self.set_reg(d, (self.reg(d) & 0x00FF) | (Word::from(v) << 8))
            }
            RealOp::Alu { f, d, a, b } => {
                let va = self.reg(a);
                let vb = self.reg(b);
                match f {
                    AluFn::AND => {
                        let result = va & vb;
                        self.set_logic_flags(result);
                        self.set_reg(d, result);
                    }
                    AluFn::OR => {
                        let result = va | vb;
                        self.set_logic_flags(result);
                        self.set_reg(d, result);
                    }
                    AluFn::XOR => {
                        let result = va ^ vb;
                        self.set_logic_flags(result);
                        self.set_reg(d, result);
                    }
                    AluFn::ADD => {
                        let (result, carry, overflow) = logic::add(va, vb, self.flags.carry);
                        self.set_arith_flags(result, carry, overflow);
                        self.set_reg(d, result);
                    }
                    AluFn::SUB => {
                        let (result, carry, overflow) = logic::sub(va, vb, !self.flags.carry);
                        self.set_arith_flags(result, carry, overflow);
                        self.set_reg(d, result);
                    }
                    AluFn::MUL => {
                        let (result, carry, overflow) = logic::mul(va, vb);
                        self.set_arith_flags(result, carry, overflow);
                        self.set_reg(d, result);
                    }
                }
            }
            RealOp::Inc { d, v } => {
                let (result, carry, overflow) = logic::add(self.reg(d), Word::from(v), false);
                self.set_arith_flags(result, carry, overflow);
                self.set_reg(d, result);
            }
            RealOp::Dec { d, v } => {
                let (result, carry, overflow) = logic::sub(self.reg(d), Word::from(v), false);
                self.set_arith_flags(result, carry, overflow);
                self.set_reg(d, result);
            }
            RealOp::Shift { f, d, s } => {
                let v = self.reg(s);
                match f {
                    ShiftFn::LSL => {
                        let result = (v << 1) | self.flags.carry as Word;
                        self.set_shift_flags(result);
                        self.flags.carry = logic::sign(v);
                        self.set_reg(d, result);
                    }
                    ShiftFn::LSR => {
                        let result = (v >> 1) | ((self.flags.carry as Word) << 15);
                        self.set_shift_flags(result);
                        self.flags.carry = v & 1 != 0;
                        self.set_reg(d, result);
                    }
                    ShiftFn::LSL8 => {
                        let result = v << 8;
                        self.set_shift_flags(result);
                        self.set_reg(d, result);
                    }
                    ShiftFn::LSR8 => {
                        let result = v >> 8;
                        self.set_shift_flags(result);
                        self.set_reg(d, result);
                    }
                    ShiftFn::ASL => {
                        let result = v << 1;
                        self.set_shift_flags(result);
                        self.flags.carry = logic::sign(v);
                        self.flags.overflow = logic::sign(v) != logic::sign(result);
                        self.set_reg(d, result);
                    }
                    ShiftFn::ASR => {
                        let result = logic::asr(v);
                        self.set_shift_flags(result);
                        self.set_reg(d, result);
                    }
                }
            }
            RealOp::Savef { d } => {
                let bits = self.flags.bits();
                self.set_reg(d, bits);
            }
            RealOp::Rstrf { d } => self.flags = Flags::from_bits(self.reg(d)),
            RealOp::FlagSet { f, mask } => match f {
                FlagFn::FON => self.flags.set_masked(Word::from(mask)),
                FlagFn::FOFF => self.flags.clear_masked(Word::from(mask)),
                FlagFn::FSET5 | FlagFn::FSET4 => self.flags.load_masked(Word::from(mask)),
            },
            RealOp::Load { d, offset, b } => {
                let address = self.reg(b).wrapping_add(Word::from(offset));
                let value = self.read_mem(address);
                self.set_reg(d, value);
            }
            RealOp::Store { s, offset, b } => {
                let address = self.reg(b).wrapping_add(Word::from(offset));
                let value = self.reg(s);
                self.write_mem(address, value);
            }
            RealOp::Branch { cond, s } => {
                if cond.holds(self.flags) {
                    next = self.reg(s) as usize;
                }
            }
            RealOp::BranchRel { cond, offset } => {
                if cond.holds(self.flags) {
                    let target = self.pc as i64 + i64::from(offset);
                    next = if target < 0 {
                        program.ops.len()
                    } else {
                        target as usize
                    };
                }
            }
            RealOp::Call { ret, proc } => {
                let return_index = (self.pc + 1) as Word;
                let target = self.reg(proc);
                self.set_reg(proc, return_index);
                self.set_reg(ret, return_index);
                self.call_stack.push(CallFrame {
                    call_index: self.pc,
                    return_index: return_index as usize,
                });
                next = target as usize;
            }
            RealOp::Return { ret, proc } => {
                let return_index = (self.pc + 1) as Word;
                let target = self.reg(proc);
                if self.warn_return && target as usize >= program.ops.len() {
                    messages.warn_once(
                        WarnOnce::ReturnAddress,
                        Some(loc),
                        format!(
                            "RETURN target {} is outside the program (0..{})",
                            target,
                            program.ops.len()
                        ),
                    );
                }
                self.set_reg(proc, return_index);
                self.set_reg(ret, return_index);
                self.call_stack.pop();
                next = target as usize;
            }
            RealOp::Swi { .. } | RealOp::Rti => {
                if !self.warned_interrupt {
                    self.warned_interrupt = true;
                    messages.error(
                        Some(loc),
                        format!("{} is not supported by this implementation", op.name()),
                    );
                }
            }
            RealOp::Halt => {
                self.halted = true;
                return Some(StopCause::Halted);
            }
            RealOp::Nop => {}
            RealOp::Word(word) => match RealOp::decode(word) {
                Some(decoded) => return self.exec_real(decoded, loc, program, messages),
                None => {
                    self.halted = true;
                    messages.error(
                        Some(loc),
                        format!("cannot execute OPCODE(0x{:04X}): no such instruction", word),
                    );
                    return Some(StopCause::BadWord);
                }
            },
        }
        self.pc = next;
        None
    }

    fn exec_debug(
        &mut self,
        op: &DebugOp,
        loc: Location,
        program: &Program,
        messages: &mut Messages,
    ) {
        match op {
            DebugOp::PrintReg(r) => {
                let line = format_register(*r, self.reg(*r));
                self.output.push(line);
            }
            DebugOp::Print(text) => self.output.push(text.clone()),
            DebugOp::Eval(source) => match eval::exec_statement(self, program, source, messages) {
                Ok(Some(line)) => self.output.push(line),
                Ok(None) => {}
                Err(problem) => messages.error(Some(loc), format!("__eval: {}", problem)),
            },
            DebugOp::DumpState => {
                self.output.push(format!(
                    "pc = {}, executed = {}, {}",
                    self.pc, self.op_count, self.flags
                ));
                for index in 1..REGISTER_COUNT {
                    let r = Reg::from_index(index as Word).unwrap();
                    self.output.push(format_register(r, self.reg(r)));
                }
            }
        }
    }
}

/// Renders a word as hex, unsigned decimal and (when it differs) signed
/// decimal.
pub fn format_word(value: Word) -> String {
    if logic::sign(value) {
        format!("0x{:04X} = {} = {}", value, value, value as i16)
    } else {
        format!("0x{:04X} = {}", value, value)
    }
}

/// Renders a register value the way `print_reg` and `__dump_state` show it.
pub fn format_register(r: Reg, value: Word) -> String {
    format!("{} = {}", r, format_word(value))
}
