//! Drivers behind the `hera` command-line tool.
//!
//! Each subcommand gets a function taking the shared [`Config`] plus output
//! sinks, and returns the process exit code: 0 for success, 1 when
//! diagnostics contained errors, 2 for usage problems (handled in `main`),
//! 3 for runtime failures.

use hvm::messages::{render_message, FileSet, Messages, Severity, WarnOnce};
use hvm::ops::Reg;
use hvm::program::Program;
use hvm::vm::{StepResult, VirtualMachine, VmOptions};
use hvm::{constants, Word};
use std::io::Write;
use std::path::Path;

pub const EXIT_OK: i32 = 0;
pub const EXIT_DIAGNOSTICS: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_RUNTIME: i32 = 3;

pub const CREDITS: &str = "\
hera: a toolchain for the Haverford Educational RISC Architecture.
HERA was designed by Dave Wonnacott for Haverford College's computer
science curriculum; this toolchain follows the published architecture
handouts.
";

#[derive(Clone, Debug)]
pub struct Config {
    pub verbose: bool,
    pub quiet: bool,
    pub color: bool,
    pub no_debug_ops: bool,
    pub warn_octal: bool,
    pub warn_return: bool,
    pub big_stack: bool,
    pub throttle: Option<u64>,
    pub inits: Vec<(Reg, Word)>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            verbose: false,
            quiet: false,
            color: true,
            no_debug_ops: false,
            warn_octal: true,
            warn_return: true,
            big_stack: false,
            throttle: None,
            inits: Vec::new(),
        }
    }
}

impl Config {
    fn check_options(&self) -> hasm::CheckOptions {
        hasm::CheckOptions {
            data_start: if self.big_stack {
                constants::BIG_STACK_DATA_START
            } else {
                constants::DATA_START
            },
            strip_debug_ops: self.no_debug_ops,
        }
    }

    fn vm_options(&self) -> VmOptions {
        VmOptions {
            throttle: self.throttle,
            warn_return: self.warn_return,
        }
    }
}

/// Parses `--init=R1=5,SP=0x100` lists.
pub fn parse_inits(text: &str) -> Result<Vec<(Reg, Word)>, String> {
    let mut inits = Vec::new();
    for part in text.split(',') {
        let mut halves = part.splitn(2, '=');
        let register = halves.next().unwrap_or("").trim();
        let value = halves.next().ok_or_else(|| {
            format!("\"{}\" is not of the form REGISTER=VALUE", part)
        })?;
        let register: Reg = register
            .parse()
            .map_err(|_| format!("\"{}\" is not a register", register))?;
        let value = parse_word(value.trim())
            .ok_or_else(|| format!("\"{}\" is not a 16-bit value", value))?;
        inits.push((register, value));
    }
    Ok(inits)
}

fn parse_word(text: &str) -> Option<Word> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return Word::from_str_radix(hex, 16).ok();
    }
    if let Some(negative) = text.strip_prefix('-') {
        return negative
            .parse::<i32>()
            .ok()
            .filter(|v| *v <= 0x8000)
            .map(|v| (-v) as Word);
    }
    text.parse().ok()
}

fn print_messages(
    messages: &Messages,
    files: &FileSet,
    config: &Config,
    err: &mut dyn Write,
) -> std::io::Result<()> {
    for message in messages.sorted() {
        if message.severity == Severity::Warning {
            if config.quiet {
                continue;
            }
            if message.category == Some(WarnOnce::Octal) && !config.warn_octal {
                continue;
            }
            if message.category == Some(WarnOnce::ReturnAddress) && !config.warn_return {
                continue;
            }
        }
        let rendered = render_message(message, files);
        if config.color {
            let color = match message.severity {
                Severity::Error => "\x1b[31m",
                Severity::Warning => "\x1b[33m",
            };
            writeln!(err, "{}{}\x1b[0m", color, rendered)?;
        } else {
            writeln!(err, "{}", rendered)?;
        }
    }
    Ok(())
}

fn compile(
    path: &Path,
    config: &Config,
    err: &mut dyn Write,
) -> std::io::Result<Result<Program, i32>> {
    let (program, messages) = hasm::compile_file(path, config.check_options());
    print_messages(&messages, &program.files, config, err)?;
    if messages.has_errors() {
        return Ok(Err(EXIT_DIAGNOSTICS));
    }
    Ok(Ok(program))
}

fn execute(
    program: &Program,
    config: &Config,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> std::io::Result<i32> {
    let mut vm = VirtualMachine::new(config.vm_options());
    vm.reset(program);
    for &(register, value) in &config.inits {
        vm.set_reg(register, value);
    }
    let mut runtime = Messages::new();
    let cause = loop {
        match vm.step(program, &mut runtime) {
            StepResult::Ran => {
                for line in vm.output.drain(..) {
                    writeln!(out, "{}", line)?;
                }
            }
            StepResult::Stopped(cause) => break cause,
        }
    };
    for line in vm.output.drain(..) {
        writeln!(out, "{}", line)?;
    }
    print_messages(&runtime, &program.files, config, err)?;
    if config.verbose {
        writeln!(err, "executed {} operations", vm.op_count)?;
    }
    if cause.is_error() || runtime.has_errors() {
        Ok(EXIT_RUNTIME)
    } else {
        Ok(EXIT_OK)
    }
}

/// `hera run` (and the bare `hera <file>` form).
pub fn run(
    path: &Path,
    config: &Config,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> std::io::Result<i32> {
    match compile(path, config, err)? {
        Ok(program) => execute(&program, config, out, err),
        Err(code) => Ok(code),
    }
}

/// `hera debug`: hand the checked program to the interactive debugger.
pub fn debug<R: std::io::BufRead, W: Write>(
    path: &Path,
    config: &Config,
    input: R,
    mut out: W,
    err: &mut dyn Write,
) -> std::io::Result<i32> {
    match compile(path, config, err)? {
        Ok(program) => {
            let mut debugger =
                hdb::Debugger::new(program, config.vm_options(), config.inits.clone());
            debugger.run(input, &mut out)?;
            Ok(EXIT_OK)
        }
        Err(code) => Ok(code),
    }
}

/// `hera preprocess`: show the resolved operation stream.
pub fn preprocess(
    path: &Path,
    config: &Config,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> std::io::Result<i32> {
    match compile(path, config, err)? {
        Ok(program) => {
            if config.verbose && !program.data.is_empty() {
                writeln!(
                    out,
                    "// data segment: {} word(s) at 0x{:04X}",
                    program.data.len(),
                    program.data_start
                )?;
            }
            write!(out, "{}", hasm::listing(&program))?;
            Ok(EXIT_OK)
        }
        Err(code) => Ok(code),
    }
}

/// `hera assemble`: emit machine code as a hex listing or raw bytes.
pub fn assemble(
    path: &Path,
    output: Option<&Path>,
    raw: bool,
    config: &Config,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> std::io::Result<i32> {
    match compile(path, config, err)? {
        Ok(program) => {
            let words = hasm::assemble(&program);
            match output {
                Some(target) => {
                    let file = std::fs::File::create(target)?;
                    let mut writer = std::io::BufWriter::new(file);
                    write_words(&mut writer, &words, raw)?;
                }
                None => write_words(out, &words, raw)?,
            }
            Ok(EXIT_OK)
        }
        Err(code) => Ok(code),
    }
}

fn write_words(out: &mut dyn Write, words: &[Word], raw: bool) -> std::io::Result<()> {
    if raw {
        hcode::write_raw(out, words)
    } else {
        hcode::write_listing(out, words)
    }
}

/// `hera disassemble`: read a listing and print the operations.
pub fn disassemble(
    path: &Path,
    _config: &Config,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> std::io::Result<i32> {
    let words = match hcode::read_file(path) {
        Ok(words) => words,
        Err(problem) => {
            writeln!(err, "error: {}: {}", path.display(), problem)?;
            return Ok(EXIT_DIAGNOSTICS);
        }
    };
    for op in hasm::disassemble(&words) {
        writeln!(out, "{}", op)?;
    }
    Ok(EXIT_OK)
}
