//! Grammar and conversion from parse pairs to raw operations.

use hvm::messages::{FileId, Location, Messages, WarnOnce};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "hera.pest"]
pub struct HeraParser;

/// An operation invocation as written: mnemonic, arguments, position. The
/// checker turns these into the resolved stream.
#[derive(Clone, PartialEq, Debug)]
pub struct RawOp {
    pub name: String,
    pub loc: Location,
    pub args: Vec<RawArg>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct RawArg {
    pub loc: Location,
    pub value: RawValue,
}

#[derive(Clone, PartialEq, Debug)]
pub enum RawValue {
    Int(i64),
    Str(String),
    Sym(String),
}

pub fn location(span: &pest::Span, file: FileId) -> Location {
    let (line, column) = span.start_pos().line_col();
    Location::new(file, line as u32, column as u32)
}

pub fn parse_program(
    input: &str,
    _file: FileId,
) -> Result<Pair<Rule>, Box<pest::error::Error<Rule>>> {
    match HeraParser::parse(Rule::program, input) {
        Ok(mut pairs) => Ok(pairs.next().unwrap()),
        Err(err) => Err(Box::new(err)),
    }
}

/// Converts a pest error into a located diagnostic.
pub fn report_parse_error(
    err: &pest::error::Error<Rule>,
    file: FileId,
    messages: &mut Messages,
) {
    use pest::error::LineColLocation;
    let (line, column) = match err.line_col {
        LineColLocation::Pos((line, column)) => (line, column),
        LineColLocation::Span((line, column), _) => (line, column),
    };
    messages.error(
        Some(Location::new(file, line as u32, column as u32)),
        format!("{}", err.variant.message()),
    );
}

/// Converts a `Rule::op` pair. Returns `None` when an argument was
/// malformed; the problem has already been reported.
pub fn convert_op(pair: Pair<Rule>, file: FileId, messages: &mut Messages) -> Option<RawOp> {
    let mut inner = pair.into_inner();
    let name_pair = inner.next().unwrap();
    let loc = location(&name_pair.as_span(), file);
    let name = name_pair.as_str().to_string();
    let mut args = Vec::new();
    let mut ok = true;
    if let Some(args_pair) = inner.next() {
        for arg in args_pair.into_inner() {
            match convert_arg(arg, file, messages) {
                Some(arg) => args.push(arg),
                None => ok = false,
            }
        }
    }
    if ok {
        Some(RawOp { name, loc, args })
    } else {
        None
    }
}

fn convert_arg(pair: Pair<Rule>, file: FileId, messages: &mut Messages) -> Option<RawArg> {
    let inner = pair.into_inner().next().unwrap();
    let loc = location(&inner.as_span(), file);
    let value = match inner.as_rule() {
        Rule::int => RawValue::Int(convert_int(inner, file, messages)?),
        Rule::identifier => RawValue::Sym(inner.as_str().to_string()),
        Rule::string => {
            let raw = inner.into_inner().next().unwrap();
            match unescape(raw.as_str()) {
                Ok(text) => RawValue::Str(text),
                Err((offset, problem)) => {
                    let mut at = location(&raw.as_span(), file);
                    at.column += offset as u32;
                    messages.error(Some(at), problem);
                    return None;
                }
            }
        }
        Rule::char_lit => {
            let raw = inner.into_inner().next().unwrap();
            match convert_char(raw.as_str()) {
                Ok(byte) => RawValue::Int(i64::from(byte)),
                Err(problem) => {
                    messages.error(Some(location(&raw.as_span(), file)), problem);
                    return None;
                }
            }
        }
        _ => unreachable!(),
    };
    Some(RawArg { loc, value })
}

fn convert_int(pair: Pair<Rule>, file: FileId, messages: &mut Messages) -> Option<i64> {
    let loc = location(&pair.as_span(), file);
    let mut negative = false;
    let mut magnitude = None;
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::neg => negative = true,
            Rule::uint => {
                let literal = part.into_inner().next().unwrap();
                let parsed = match literal.as_rule() {
                    Rule::hex_uint => {
                        i64::from_str_radix(literal.into_inner().next().unwrap().as_str(), 16)
                    }
                    Rule::oct_uint => {
                        messages.warn_once(
                            WarnOnce::Octal,
                            Some(loc),
                            "integer literals starting with 0 are octal",
                        );
                        i64::from_str_radix(literal.into_inner().next().unwrap().as_str(), 8)
                    }
                    _ => literal.as_str().parse(),
                };
                match parsed {
                    Ok(value) => magnitude = Some(value),
                    Err(_) => {
                        messages.error(Some(loc), "integer literal out of range");
                        return None;
                    }
                }
            }
            _ => unreachable!(),
        }
    }
    let magnitude = magnitude.unwrap();
    Some(if negative { -magnitude } else { magnitude })
}

fn convert_char(raw: &str) -> Result<u8, String> {
    let text = unescape(raw).map_err(|(_, problem)| problem)?;
    let mut bytes = text.bytes();
    match (bytes.next(), bytes.next()) {
        (Some(byte), None) => Ok(byte),
        _ => Err(format!("character literal '{}' must be a single character", raw)),
    }
}

/// Resolves the escape set `\n \t \r \\ \' \" \0`, `\xHH` and `\o...`
/// (up to three octal digits). Errors carry the byte offset of the escape.
pub fn unescape(raw: &str) -> Result<String, (usize, String)> {
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c != '\\' {
            out.push(c);
            i += 1;
            continue;
        }
        let start = i;
        i += 1;
        let escape = match bytes.get(i) {
            Some(&b) => b as char,
            None => return Err((start, "dangling escape at end of literal".to_string())),
        };
        i += 1;
        match escape {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            '0' => out.push('\0'),
            'x' => {
                let digits = raw.get(i..i + 2).filter(|d| {
                    d.bytes().all(|b| b.is_ascii_hexdigit())
                });
                match digits {
                    Some(digits) => {
                        let value = u8::from_str_radix(digits, 16).unwrap();
                        if !value.is_ascii() {
                            return Err((start, format!("escape \\x{} is outside ASCII", digits)));
                        }
                        out.push(value as char);
                        i += 2;
                    }
                    None => {
                        return Err((start, "\\x escape needs two hex digits".to_string()))
                    }
                }
            }
            'o' => {
                let mut len = 0;
                while len < 3
                    && bytes
                        .get(i + len)
                        .map_or(false, |b| (b'0'..=b'7').contains(b))
                {
                    len += 1;
                }
                if len == 0 {
                    return Err((start, "\\o escape needs octal digits".to_string()));
                }
                let value = u16::from_str_radix(&raw[i..i + len], 8).unwrap();
                if value > 0x7F {
                    return Err((start, format!("escape \\o{} is outside ASCII", &raw[i..i + len])));
                }
                out.push(value as u8 as char);
                i += len;
            }
            other => return Err((start, format!("invalid escape '\\{}'", other))),
        }
    }
    Ok(out)
}
