//! The debugger's expression language.
//!
//! Expressions combine integer literals (decimal, hex, octal with the usual
//! one-shot warning), register names, symbol names, `PC` and `@address`
//! memory cells with `+ - * /` at the customary precedences. `assign`
//! targets a register, `PC` or a memory cell. Evaluation is pure over a
//! read-only machine view; only assignment mutates.

use crate::messages::{Messages, WarnOnce};
use crate::ops::Reg;
use crate::program::Program;
use crate::vm::{format_word, VirtualMachine};
use crate::Word;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Expr {
    Num(i64),
    Reg(Reg),
    Pc,
    Sym(String),
    Mem(Box<Expr>),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Format {
    Default,
    Dec,
    Hex,
    Bin,
    Signed,
    Char,
}

/// A `print`/`assign`-level statement.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Stmt {
    Assign(Lhs, Expr),
    Show(Expr),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Lhs {
    Reg(Reg),
    Pc,
    Mem(Expr),
}

#[derive(Clone, PartialEq, Eq, Debug)]
enum Token {
    Num(i64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    At,
    LParen,
    RParen,
    Eq,
    Colon,
    Comma,
}

fn lex(input: &str, messages: &mut Messages) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '@' => {
                tokens.push(Token::At);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '=' => {
                tokens.push(Token::Eq);
                i += 1;
            }
            ':' => {
                tokens.push(Token::Colon);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '0'..='9' => {
                let start = i;
                while i < bytes.len() && (bytes[i] as char).is_ascii_alphanumeric() {
                    i += 1;
                }
                let text = &input[start..i];
                tokens.push(Token::Num(parse_number(text, messages)?));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len()
                    && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                tokens.push(Token::Ident(input[start..i].to_string()));
            }
            c => return Err(format!("unexpected character '{}'", c)),
        }
    }
    Ok(tokens)
}

fn parse_number(text: &str, messages: &mut Messages) -> Result<i64, String> {
    let parsed = if text == "0" {
        Ok(0)
    } else if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16)
    } else if let Some(oct) = text.strip_prefix('0') {
        messages.warn_once(
            WarnOnce::Octal,
            None,
            "integer literals starting with 0 are octal",
        );
        i64::from_str_radix(oct, 8)
    } else {
        text.parse()
    };
    parsed.map_err(|_| format!("bad integer literal \"{}\"", text))
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn expr(&mut self, min_power: u8) -> Result<Expr, String> {
        let mut lhs = match self.next() {
            Some(Token::Num(n)) => Expr::Num(n),
            Some(Token::Ident(name)) => classify(&name),
            Some(Token::Minus) => Expr::Neg(Box::new(self.expr(5)?)),
            Some(Token::At) => Expr::Mem(Box::new(self.expr(7)?)),
            Some(Token::LParen) => {
                let inner = self.expr(0)?;
                match self.next() {
                    Some(Token::RParen) => inner,
                    _ => return Err("expected ')'".to_string()),
                }
            }
            Some(token) => return Err(format!("unexpected {:?}", token)),
            None => return Err("unexpected end of expression".to_string()),
        };
        loop {
            let (left_power, right_power) = match self.peek() {
                Some(Token::Plus) | Some(Token::Minus) => (1, 2),
                Some(Token::Star) | Some(Token::Slash) => (3, 4),
                _ => break,
            };
            if left_power < min_power {
                break;
            }
            let op = self.next().unwrap();
            let rhs = self.expr(right_power)?;
            lhs = match op {
                Token::Plus => Expr::Add(Box::new(lhs), Box::new(rhs)),
                Token::Minus => Expr::Sub(Box::new(lhs), Box::new(rhs)),
                Token::Star => Expr::Mul(Box::new(lhs), Box::new(rhs)),
                _ => Expr::Div(Box::new(lhs), Box::new(rhs)),
            };
        }
        Ok(lhs)
    }
}

fn classify(name: &str) -> Expr {
    if name.eq_ignore_ascii_case("PC") {
        return Expr::Pc;
    }
    match name.parse::<Reg>() {
        Ok(r) => Expr::Reg(r),
        Err(_) => Expr::Sym(name.to_string()),
    }
}

fn format_from_name(name: &str) -> Result<Format, String> {
    match name {
        "d" => Ok(Format::Dec),
        "x" => Ok(Format::Hex),
        "b" => Ok(Format::Bin),
        "s" => Ok(Format::Signed),
        "c" => Ok(Format::Char),
        other => Err(format!("unknown format \"{}\"", other)),
    }
}

/// Parses a single complete expression.
pub fn parse_expr(input: &str, messages: &mut Messages) -> Result<Expr, String> {
    let mut parser = Parser {
        tokens: lex(input, messages)?,
        position: 0,
    };
    let expr = parser.expr(0)?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(format!("trailing {:?}", token)),
    }
}

/// Parses the comma-separated argument list of `print`, each expression with
/// an optional `:x`-style format suffix.
pub fn parse_print_list(
    input: &str,
    messages: &mut Messages,
) -> Result<Vec<(Expr, Format)>, String> {
    let mut parser = Parser {
        tokens: lex(input, messages)?,
        position: 0,
    };
    let mut items = Vec::new();
    loop {
        let expr = parser.expr(0)?;
        let format = if parser.peek() == Some(&Token::Colon) {
            parser.next();
            match parser.next() {
                Some(Token::Ident(name)) => format_from_name(&name)?,
                _ => return Err("expected a format letter after ':'".to_string()),
            }
        } else {
            Format::Default
        };
        items.push((expr, format));
        match parser.next() {
            None => return Ok(items),
            Some(Token::Comma) => {}
            Some(token) => return Err(format!("trailing {:?}", token)),
        }
    }
}

/// Parses `lhs = expr` or a bare expression.
pub fn parse_statement(input: &str, messages: &mut Messages) -> Result<Stmt, String> {
    let mut parser = Parser {
        tokens: lex(input, messages)?,
        position: 0,
    };
    let first = parser.expr(0)?;
    match parser.next() {
        None => Ok(Stmt::Show(first)),
        Some(Token::Eq) => {
            let lhs = match first {
                Expr::Reg(r) => Lhs::Reg(r),
                Expr::Pc => Lhs::Pc,
                Expr::Mem(address) => Lhs::Mem(*address),
                other => return Err(format!("cannot assign to {:?}", other)),
            };
            let rhs = parser.expr(0)?;
            match parser.peek() {
                None => Ok(Stmt::Assign(lhs, rhs)),
                Some(token) => Err(format!("trailing {:?}", token)),
            }
        }
        Some(token) => Err(format!("trailing {:?}", token)),
    }
}

/// Evaluates an expression against the machine and symbol table.
pub fn eval(expr: &Expr, vm: &VirtualMachine, program: &Program) -> Result<Word, String> {
    match expr {
        Expr::Num(n) => {
            if *n < -0x8000 || *n > 0xFFFF {
                Err(format!("integer {} does not fit in 16 bits", n))
            } else {
                Ok(*n as Word)
            }
        }
        Expr::Reg(r) => Ok(vm.reg(*r)),
        Expr::Pc => Ok(vm.pc as Word),
        Expr::Sym(name) => match program.symbols.get(name) {
            Some(symbol) => Ok(symbol.value()),
            None => Err(format!("undefined symbol \"{}\"", name)),
        },
        Expr::Mem(address) => Ok(vm.read_mem(eval(address, vm, program)?)),
        Expr::Neg(inner) => Ok(eval(inner, vm, program)?.wrapping_neg()),
        Expr::Add(a, b) => Ok(eval(a, vm, program)?.wrapping_add(eval(b, vm, program)?)),
        Expr::Sub(a, b) => Ok(eval(a, vm, program)?.wrapping_sub(eval(b, vm, program)?)),
        Expr::Mul(a, b) => Ok(eval(a, vm, program)?.wrapping_mul(eval(b, vm, program)?)),
        Expr::Div(a, b) => {
            let divisor = eval(b, vm, program)?;
            if divisor == 0 {
                Err("division by zero".to_string())
            } else {
                Ok(eval(a, vm, program)? / divisor)
            }
        }
    }
}

/// Applies an assignment under the caller's snapshot discipline.
pub fn assign(
    lhs: &Lhs,
    value: Word,
    vm: &mut VirtualMachine,
    program: &Program,
) -> Result<(), String> {
    match lhs {
        Lhs::Reg(r) => {
            vm.set_reg(*r, value);
            Ok(())
        }
        Lhs::Pc => {
            vm.pc = value as usize;
            Ok(())
        }
        Lhs::Mem(address) => {
            let address = eval(address, &*vm, program)?;
            vm.write_mem(address, value);
            Ok(())
        }
    }
}

/// Renders a value in the requested format.
pub fn render(value: Word, format: Format) -> String {
    match format {
        Format::Default => format_word(value),
        Format::Dec => format!("{}", value),
        Format::Hex => format!("0x{:04X}", value),
        Format::Bin => format!("0b{:016b}", value),
        Format::Signed => format!("{}", value as i16),
        Format::Char => {
            let byte = (value & 0x7F) as u8;
            if byte.is_ascii_graphic() || byte == b' ' {
                format!("'{}'", byte as char)
            } else {
                format!("0x{:04X}", value)
            }
        }
    }
}

/// Runs one `__eval` statement. Returns the line to print, if any.
pub fn exec_statement(
    vm: &mut VirtualMachine,
    program: &Program,
    source: &str,
    messages: &mut Messages,
) -> Result<Option<String>, String> {
    match parse_statement(source, messages)? {
        Stmt::Show(expr) => {
            let value = eval(&expr, vm, program)?;
            Ok(Some(format!("{} = {}", source.trim(), render(value, Format::Default))))
        }
        Stmt::Assign(lhs, rhs) => {
            let value = eval(&rhs, vm, program)?;
            assign(&lhs, value, vm, program)?;
            Ok(None)
        }
    }
}
