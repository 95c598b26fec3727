//! Interactive debugger for checked HERA programs.
//!
//! The debugger owns a [`VirtualMachine`] and drives it one command at a
//! time. Every mutating command (`continue`, `next`, `step`, `execute`,
//! `goto`, `assign`, `on`, `off`) first pushes a snapshot of the machine
//! onto a bounded history; `undo` pops one. An empty input line repeats the
//! previous command.

mod command;


use command::{lookup, resolve, Resolution};
use hvm::eval;
use hvm::messages::render_message;
use hvm::ops::{ExecOp, RealOp, Reg};
use hvm::program::{Program, Symbol};
use hvm::vm::{format_register, StepResult, StopCause, VirtualMachine, VmOptions};
use hvm::{isa, Messages, Word};
use std::collections::{BTreeSet, VecDeque};
use std::io::{BufRead, Write};

const HISTORY_LIMIT: usize = 100;

enum Flow {
    Continue,
    Quit,
}

pub struct Debugger {
    program: Program,
    vm: VirtualMachine,
    options: VmOptions,
    inits: Vec<(Reg, Word)>,
    breakpoints: BTreeSet<usize>,
    history: VecDeque<VirtualMachine>,
    messages: Messages,
    last_line: String,
}

impl Debugger {
    pub fn new(program: Program, options: VmOptions, inits: Vec<(Reg, Word)>) -> Debugger {
        let mut vm = VirtualMachine::new(options);
        vm.reset(&program);
        for &(r, value) in &inits {
            vm.set_reg(r, value);
        }
        Debugger {
            program,
            vm,
            options,
            inits,
            breakpoints: BTreeSet::new(),
            history: VecDeque::new(),
            messages: Messages::new(),
            last_line: String::new(),
        }
    }

    /// Runs the command loop until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> std::io::Result<()> {
        writeln!(out, "HERA debugger. Type 'help' for a list of commands.")?;
        self.print_position(&mut out)?;
        let mut lines = input.lines();
        loop {
            write!(out, ">>> ")?;
            out.flush()?;
            let line = match lines.next() {
                Some(line) => line?,
                None => break,
            };
            let line = line.trim().to_string();
            let line = if line.is_empty() {
                self.last_line.clone()
            } else {
                self.last_line = line.clone();
                line
            };
            if line.is_empty() {
                continue;
            }
            let flow = self.dispatch(&line, &mut out)?;
            self.flush_machine_output(&mut out)?;
            if let Flow::Quit = flow {
                break;
            }
        }
        Ok(())
    }

    fn dispatch<W: Write>(&mut self, line: &str, out: &mut W) -> std::io::Result<Flow> {
        let token = line.split_whitespace().next().unwrap_or("");
        let rest = line[line.find(token).unwrap() + token.len()..].trim();
        let name = match resolve(token) {
            Resolution::Match(name) => name,
            Resolution::NeedsFullName(name) => {
                writeln!(out, "type '{}' in full to {} the program", name, name)?;
                return Ok(Flow::Continue);
            }
            Resolution::Ambiguous(candidates) => {
                writeln!(out, "'{}' is ambiguous: {}", token, candidates.join(", "))?;
                return Ok(Flow::Continue);
            }
            Resolution::Unknown => {
                // The bare `<lhs> = <expr>` form of assign.
                if line.contains('=') {
                    self.cmd_assign(line, out)?;
                } else {
                    writeln!(out, "unknown command '{}'; try 'help'", token)?;
                }
                return Ok(Flow::Continue);
            }
        };
        match name {
            "asm" => self.cmd_asm(rest, out)?,
            "assign" => self.cmd_assign(rest, out)?,
            "break" => self.cmd_break(rest, out)?,
            "clear" => self.cmd_clear(rest, out)?,
            "continue" => self.cmd_continue(out)?,
            "dis" => self.cmd_dis(rest, out)?,
            "doc" => self.cmd_doc(rest, out)?,
            "execute" => self.cmd_execute(rest, out)?,
            "goto" => self.cmd_goto(rest, out)?,
            "help" => self.cmd_help(rest, out)?,
            "info" => self.cmd_info(rest, out)?,
            "list" => self.cmd_list(out, false)?,
            "ll" => self.cmd_list(out, true)?,
            "next" => self.cmd_next(rest, out)?,
            "off" => self.cmd_flags(rest, false, out)?,
            "on" => self.cmd_flags(rest, true, out)?,
            "print" => self.cmd_print(rest, out)?,
            "quit" => return Ok(Flow::Quit),
            "restart" => self.cmd_restart(out)?,
            "step" => self.cmd_step(out)?,
            "undo" => self.cmd_undo(out)?,
            _ => unreachable!(),
        }
        Ok(Flow::Continue)
    }

    fn snapshot(&mut self) {
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(self.vm.clone());
    }

    fn flush_machine_output<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        for line in self.vm.output.drain(..) {
            writeln!(out, "{}", line)?;
        }
        for message in self.messages.take() {
            writeln!(out, "{}", render_message(&message, &self.program.files))?;
        }
        Ok(())
    }

    fn print_position<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        if self.vm.halted {
            return writeln!(out, "the machine has halted; 'restart' starts over");
        }
        if self.vm.pc >= self.program.ops.len() {
            return writeln!(out, "execution has reached the end of the program");
        }
        let slot = &self.program.ops[self.vm.pc];
        writeln!(
            out,
            "pc = {} [{}:{}] {}",
            self.vm.pc,
            self.program.files.name(slot.loc.file).display(),
            slot.loc.line,
            slot.op
        )
    }

    /// Resolves a breakpoint/goto location: `.`, a line number, a
    /// `path:line` pair or a label.
    fn resolve_loc(&self, token: &str) -> Result<usize, String> {
        if token == "." {
            if self.vm.pc >= self.program.ops.len() {
                return Err("execution has already finished".to_string());
            }
            return Ok(self.vm.pc);
        }
        if token.bytes().all(|b| b.is_ascii_digit()) {
            let line: u32 = token.parse().map_err(|_| "bad line number".to_string())?;
            return self.op_at_line(0, line, token);
        }
        if let Some(colon) = token.rfind(':') {
            let (path, line) = token.split_at(colon);
            let line: u32 = line[1..]
                .parse()
                .map_err(|_| format!("bad line number in \"{}\"", token))?;
            for id in 0..self.program.files.len() {
                let name = self.program.files.name(id);
                if name.ends_with(path) || name.to_string_lossy() == path {
                    return self.op_at_line(id, line, token);
                }
            }
            return Err(format!("no source file matches \"{}\"", path));
        }
        match self.program.symbols.get(token) {
            Some(Symbol::Label(index)) => Ok(index as usize),
            Some(symbol) => Err(format!("\"{}\" is a {}, not a label", token, symbol.kind())),
            None => Err(format!("no label \"{}\"", token)),
        }
    }

    fn op_at_line(&self, file: usize, line: u32, token: &str) -> Result<usize, String> {
        self.program
            .ops
            .iter()
            .position(|slot| slot.loc.file == file && slot.loc.line == line)
            .ok_or_else(|| format!("no operation at \"{}\"", token))
    }

    fn cmd_break<W: Write>(&mut self, rest: &str, out: &mut W) -> std::io::Result<()> {
        if rest.is_empty() {
            if self.breakpoints.is_empty() {
                return writeln!(out, "no breakpoints set");
            }
            for &index in &self.breakpoints {
                let loc = self.program.ops[index].loc;
                writeln!(
                    out,
                    "breakpoint at pc {} [{}:{}]",
                    index,
                    self.program.files.name(loc.file).display(),
                    loc.line
                )?;
            }
            return Ok(());
        }
        match self.resolve_loc(rest) {
            Ok(index) => {
                self.breakpoints.insert(index);
                writeln!(out, "breakpoint set at pc {}", index)
            }
            Err(problem) => writeln!(out, "{}", problem),
        }
    }

    fn cmd_clear<W: Write>(&mut self, rest: &str, out: &mut W) -> std::io::Result<()> {
        if rest.is_empty() {
            self.breakpoints.clear();
            return writeln!(out, "all breakpoints cleared");
        }
        match self.resolve_loc(rest) {
            Ok(index) => {
                if self.breakpoints.remove(&index) {
                    writeln!(out, "breakpoint at pc {} cleared", index)
                } else {
                    writeln!(out, "no breakpoint at pc {}", index)
                }
            }
            Err(problem) => writeln!(out, "{}", problem),
        }
    }

    fn cmd_continue<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        self.snapshot();
        loop {
            match self.vm.step(&self.program, &mut self.messages) {
                StepResult::Stopped(cause) => {
                    self.report_stop(cause, out)?;
                    break;
                }
                StepResult::Ran => {
                    if self.breakpoints.contains(&self.vm.pc) {
                        writeln!(out, "hit breakpoint")?;
                        self.print_position(out)?;
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn cmd_step<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        self.snapshot();
        if let StepResult::Stopped(cause) = self.vm.step(&self.program, &mut self.messages) {
            self.report_stop(cause, out)?;
        } else {
            self.print_position(out)?;
        }
        Ok(())
    }

    fn cmd_next<W: Write>(&mut self, rest: &str, out: &mut W) -> std::io::Result<()> {
        let count: u32 = if rest.is_empty() {
            1
        } else {
            match rest.parse() {
                Ok(n) => n,
                Err(_) => return writeln!(out, "next takes a repeat count, not \"{}\"", rest),
            }
        };
        self.snapshot();
        for _ in 0..count {
            let over_call = match self.program.ops.get(self.vm.pc) {
                Some(slot) => matches!(slot.op, ExecOp::Real(RealOp::Call { .. })),
                None => false,
            };
            let return_to = self.vm.pc + 1;
            match self.vm.step(&self.program, &mut self.messages) {
                StepResult::Stopped(cause) => {
                    self.report_stop(cause, out)?;
                    return Ok(());
                }
                StepResult::Ran => {}
            }
            if over_call {
                // Run the callee to completion, still honoring breakpoints.
                while self.vm.pc != return_to {
                    if self.breakpoints.contains(&self.vm.pc) {
                        writeln!(out, "hit breakpoint")?;
                        self.print_position(out)?;
                        return Ok(());
                    }
                    match self.vm.step(&self.program, &mut self.messages) {
                        StepResult::Stopped(cause) => {
                            self.report_stop(cause, out)?;
                            return Ok(());
                        }
                        StepResult::Ran => {}
                    }
                }
            }
            if self.breakpoints.contains(&self.vm.pc) {
                writeln!(out, "hit breakpoint")?;
                self.print_position(out)?;
                return Ok(());
            }
        }
        self.print_position(out)
    }

    fn report_stop<W: Write>(&mut self, cause: StopCause, out: &mut W) -> std::io::Result<()> {
        match cause {
            StopCause::Halted => writeln!(out, "the machine has halted"),
            StopCause::EndOfProgram => {
                writeln!(out, "execution has reached the end of the program")
            }
            // The error itself is already in the message bag.
            _ => Ok(()),
        }
    }

    fn cmd_goto<W: Write>(&mut self, rest: &str, out: &mut W) -> std::io::Result<()> {
        if rest.is_empty() {
            return writeln!(out, "goto needs a location");
        }
        match self.resolve_loc(rest) {
            Ok(index) => {
                self.snapshot();
                self.vm.pc = index;
                self.print_position(out)
            }
            Err(problem) => writeln!(out, "{}", problem),
        }
    }

    fn cmd_execute<W: Write>(&mut self, rest: &str, out: &mut W) -> std::io::Result<()> {
        if rest.is_empty() {
            return writeln!(out, "execute needs an operation");
        }
        let (snippet, messages) =
            hasm::compile_source("<execute>", rest, hasm::CheckOptions::default());
        if messages.has_errors() {
            for message in messages.sorted() {
                writeln!(out, "{}", message.text)?;
            }
            return Ok(());
        }
        if !snippet.symbols.is_empty() || !snippet.data.is_empty() {
            return writeln!(out, "execute does not accept labels or data directives");
        }
        let branches = snippet.ops.iter().any(|slot| {
            matches!(
                slot.op,
                ExecOp::Real(RealOp::Branch { .. })
                    | ExecOp::Real(RealOp::BranchRel { .. })
                    | ExecOp::Real(RealOp::Call { .. })
                    | ExecOp::Real(RealOp::Return { .. })
            )
        });
        if branches {
            return writeln!(out, "execute does not accept branches or calls");
        }
        self.snapshot();
        let saved_pc = self.vm.pc;
        self.vm.pc = 0;
        loop {
            match self.vm.step(&snippet, &mut self.messages) {
                StepResult::Stopped(StopCause::EndOfProgram) => break,
                StepResult::Stopped(cause) => {
                    self.report_stop(cause, out)?;
                    break;
                }
                StepResult::Ran => {}
            }
        }
        self.vm.pc = saved_pc;
        Ok(())
    }

    fn cmd_assign<W: Write>(&mut self, text: &str, out: &mut W) -> std::io::Result<()> {
        match eval::parse_statement(text, &mut self.messages) {
            Ok(eval::Stmt::Assign(lhs, rhs)) => {
                match eval::eval(&rhs, &self.vm, &self.program) {
                    Ok(value) => {
                        self.snapshot();
                        if let Err(problem) = eval::assign(&lhs, value, &mut self.vm, &self.program)
                        {
                            writeln!(out, "{}", problem)?;
                        }
                    }
                    Err(problem) => writeln!(out, "{}", problem)?,
                }
            }
            Ok(eval::Stmt::Show(_)) => {
                writeln!(out, "assign needs the form <lhs> = <expr>")?;
            }
            Err(problem) => writeln!(out, "{}", problem)?,
        }
        Ok(())
    }

    fn cmd_print<W: Write>(&mut self, rest: &str, out: &mut W) -> std::io::Result<()> {
        if rest.is_empty() {
            return writeln!(out, "print needs an expression");
        }
        match eval::parse_print_list(rest, &mut self.messages) {
            Ok(items) => {
                for (expr, format) in items {
                    match eval::eval(&expr, &self.vm, &self.program) {
                        Ok(value) => {
                            writeln!(out, "{}", eval::render(value, format))?;
                        }
                        Err(problem) => writeln!(out, "{}", problem)?,
                    }
                }
            }
            Err(problem) => writeln!(out, "{}", problem)?,
        }
        Ok(())
    }

    fn cmd_flags<W: Write>(
        &mut self,
        rest: &str,
        value: bool,
        out: &mut W,
    ) -> std::io::Result<()> {
        if rest.is_empty() {
            return writeln!(out, "name a flag: sign, zero, overflow or carry");
        }
        self.snapshot();
        for name in rest.split_whitespace() {
            if !self.vm.flags.set(name, value) {
                writeln!(out, "no flag named \"{}\"", name)?;
            }
        }
        writeln!(out, "{}", self.vm.flags)
    }

    fn cmd_undo<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        match self.history.pop_back() {
            Some(snapshot) => {
                self.vm.restore(&snapshot);
                writeln!(out, "undone")?;
                self.print_position(out)
            }
            None => writeln!(out, "nothing to undo"),
        }
    }

    fn cmd_restart<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        self.vm = VirtualMachine::new(self.options);
        self.vm.reset(&self.program);
        for &(r, value) in &self.inits.clone() {
            self.vm.set_reg(r, value);
        }
        self.history.clear();
        self.messages = Messages::new();
        writeln!(out, "restarted")?;
        self.print_position(out)
    }

    fn cmd_info<W: Write>(&mut self, rest: &str, out: &mut W) -> std::io::Result<()> {
        let aspects: Vec<&str> = if rest.is_empty() {
            vec!["registers", "flags"]
        } else {
            rest.split_whitespace().collect()
        };
        for aspect in aspects {
            match aspect {
                a if "registers".starts_with(a) => {
                    for index in 1..hvm::constants::REGISTER_COUNT {
                        let r = Reg::from_index(index as Word).unwrap();
                        writeln!(out, "{}", format_register(r, self.vm.reg(r)))?;
                    }
                    writeln!(out, "pc = {}, executed = {}", self.vm.pc, self.vm.op_count)?;
                }
                a if "flags".starts_with(a) => {
                    writeln!(out, "{}", self.vm.flags)?;
                }
                a if "memory".starts_with(a) => {
                    let start = self.program.data_start;
                    if self.program.data.is_empty() {
                        writeln!(out, "data segment is empty (starts at 0x{:04X})", start)?;
                    }
                    for (offset, _) in self.program.data.iter().enumerate() {
                        let address = start.wrapping_add(offset as Word);
                        writeln!(
                            out,
                            "@0x{:04X} = {}",
                            address,
                            eval::render(self.vm.read_mem(address), eval::Format::Default)
                        )?;
                    }
                }
                a if "stack".starts_with(a) => {
                    if self.vm.call_stack.is_empty() {
                        writeln!(out, "call stack is empty")?;
                    }
                    for frame in self.vm.call_stack.iter().rev() {
                        let loc = self.program.ops[frame.call_index].loc;
                        writeln!(
                            out,
                            "called from pc {} [{}:{}], returns to {}",
                            frame.call_index,
                            self.program.files.name(loc.file).display(),
                            loc.line,
                            frame.return_index
                        )?;
                    }
                }
                other => writeln!(out, "no aspect \"{}\"", other)?,
            }
        }
        Ok(())
    }

    fn cmd_list<W: Write>(&mut self, out: &mut W, whole: bool) -> std::io::Result<()> {
        let loc = match self.program.ops.get(self.vm.pc) {
            Some(slot) => slot.loc,
            None => match self.program.ops.last() {
                Some(slot) => slot.loc,
                None => return writeln!(out, "the program is empty"),
            },
        };
        let text = self.program.files.text(loc.file).to_string();
        let total = text.lines().count() as u32;
        let (first, last) = if whole {
            (1, total)
        } else {
            (loc.line.saturating_sub(4).max(1), (loc.line + 4).min(total))
        };
        let break_lines: BTreeSet<u32> = self
            .breakpoints
            .iter()
            .filter(|&&index| self.program.ops[index].loc.file == loc.file)
            .map(|&index| self.program.ops[index].loc.line)
            .collect();
        for (number, line) in text.lines().enumerate() {
            let number = number as u32 + 1;
            if number < first || number > last {
                continue;
            }
            let marker = if number == loc.line { "->" } else { "  " };
            let bp = if break_lines.contains(&number) { "b" } else { " " };
            writeln!(out, "{}{} {:>4}  {}", marker, bp, number, line)?;
        }
        Ok(())
    }

    fn cmd_asm<W: Write>(&mut self, rest: &str, out: &mut W) -> std::io::Result<()> {
        if rest.is_empty() {
            return writeln!(out, "asm needs an operation");
        }
        let (snippet, messages) =
            hasm::compile_source("<asm>", rest, hasm::CheckOptions::default());
        if messages.has_errors() {
            for message in messages.sorted() {
                writeln!(out, "{}", message.text)?;
            }
            return Ok(());
        }
        for word in hasm::assemble(&snippet) {
            writeln!(out, "{:04X}", word)?;
        }
        Ok(())
    }

    fn cmd_dis<W: Write>(&mut self, rest: &str, out: &mut W) -> std::io::Result<()> {
        let text = rest.trim().trim_start_matches("0x").trim_start_matches("0X");
        match Word::from_str_radix(text, 16) {
            Ok(word) => match RealOp::decode(word) {
                Some(op) => writeln!(out, "{}", op),
                None => writeln!(out, "{}", RealOp::Word(word)),
            },
            Err(_) => writeln!(out, "dis needs a hex machine word"),
        }
    }

    fn cmd_doc<W: Write>(&mut self, rest: &str, out: &mut W) -> std::io::Result<()> {
        if rest.is_empty() {
            let names: Vec<&str> = isa::all().map(|info| info.name).collect();
            return writeln!(out, "{}", names.join(" "));
        }
        match isa::lookup(rest) {
            Some(info) => {
                writeln!(out, "{} — {}", info.name, info.doc)?;
                if !info.flags.is_empty() {
                    writeln!(out, "flags touched: {}", info.flags)?;
                }
                Ok(())
            }
            None => writeln!(out, "no operation named \"{}\"", rest),
        }
    }

    fn cmd_help<W: Write>(&mut self, rest: &str, out: &mut W) -> std::io::Result<()> {
        if rest.is_empty() {
            for info in command::COMMANDS {
                writeln!(out, "{:<28} {}", info.usage, info.help)?;
            }
            return Ok(());
        }
        match lookup(rest) {
            Some(info) => writeln!(out, "{}\n  {}", info.usage, info.help),
            None => writeln!(out, "no command named \"{}\"", rest),
        }
    }
}
