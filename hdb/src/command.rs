//! The command table and name resolution.
//!
//! Commands may be abbreviated to any unambiguous prefix, with one
//! exception: `restart` throws away the whole machine state and must be
//! typed in full.

pub struct CommandInfo {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
}

pub static COMMANDS: &[CommandInfo] = &[
    CommandInfo { name: "asm", usage: "asm <op>",
                  help: "Assemble a single operation and show its machine word." },
    CommandInfo { name: "assign", usage: "assign <lhs> = <expr>",
                  help: "Evaluate an expression and store it in a register, PC or @address." },
    CommandInfo { name: "break", usage: "break [loc]",
                  help: "Set a breakpoint at a line, path:line, label or '.'; alone, list breakpoints." },
    CommandInfo { name: "clear", usage: "clear [loc]",
                  help: "Remove the breakpoint at loc, or all breakpoints." },
    CommandInfo { name: "continue", usage: "continue",
                  help: "Run until a breakpoint, halt or error." },
    CommandInfo { name: "dis", usage: "dis <word>",
                  help: "Disassemble a machine word (hex)." },
    CommandInfo { name: "doc", usage: "doc [op]",
                  help: "Describe an operation, or list all of them." },
    CommandInfo { name: "execute", usage: "execute <ops>",
                  help: "Run a self-contained snippet (no labels, data or branches)." },
    CommandInfo { name: "goto", usage: "goto <loc>",
                  help: "Move PC to loc without executing anything." },
    CommandInfo { name: "help", usage: "help [command]",
                  help: "Show this summary, or details for one command." },
    CommandInfo { name: "info", usage: "info [registers|flags|memory|stack]",
                  help: "Show machine state; with no aspect, registers and flags." },
    CommandInfo { name: "list", usage: "list",
                  help: "Show source around the current operation." },
    CommandInfo { name: "ll", usage: "ll",
                  help: "Show the whole current source file." },
    CommandInfo { name: "next", usage: "next [n]",
                  help: "Step over n operations (a CALL runs to its return)." },
    CommandInfo { name: "off", usage: "off <flag>...",
                  help: "Clear flags by name (sign, zero, overflow, carry)." },
    CommandInfo { name: "on", usage: "on <flag>...",
                  help: "Set flags by name." },
    CommandInfo { name: "print", usage: "print <expr>[:fmt][, ...]",
                  help: "Evaluate expressions; formats are :d :x :b :s :c." },
    CommandInfo { name: "quit", usage: "quit",
                  help: "Leave the debugger." },
    CommandInfo { name: "restart", usage: "restart",
                  help: "Reset the machine and start over (cannot be abbreviated)." },
    CommandInfo { name: "step", usage: "step",
                  help: "Execute exactly one operation." },
    CommandInfo { name: "undo", usage: "undo",
                  help: "Revert the machine to before the last mutating command." },
];

pub enum Resolution {
    Match(&'static str),
    Ambiguous(Vec<&'static str>),
    NeedsFullName(&'static str),
    Unknown,
}

pub fn resolve(token: &str) -> Resolution {
    if let Some(info) = COMMANDS.iter().find(|c| c.name == token) {
        return Resolution::Match(info.name);
    }
    let candidates: Vec<&'static str> = COMMANDS
        .iter()
        .map(|c| c.name)
        .filter(|name| name.starts_with(token))
        .collect();
    match candidates.as_slice() {
        [] => Resolution::Unknown,
        [single] => {
            if *single == "restart" {
                Resolution::NeedsFullName(single)
            } else {
                Resolution::Match(single)
            }
        }
        _ => Resolution::Ambiguous(candidates),
    }
}

pub fn lookup(name: &str) -> Option<&'static CommandInfo> {
    COMMANDS.iter().find(|c| c.name == name)
}
