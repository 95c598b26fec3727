//! On-disk formats for assembled programs.
//!
//! The canonical format is the *listing*: one 16-bit word per line as four
//! uppercase hex digits, no prefix. A raw binary format (big-endian byte
//! pairs) is available behind a flag for tools that want bytes.

use byteorder::{ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use util::Endian;

type Word = u16;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// A listing line that is not a four-digit hex word.
    Malformed { line: usize, text: String },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::Malformed { line, text } => {
                write!(f, "line {}: \"{}\" is not a machine word", line, text)
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

pub fn write_listing<W: Write + ?Sized>(writer: &mut W, words: &[Word]) -> std::io::Result<()> {
    for word in words {
        writeln!(writer, "{:04X}", word)?;
    }
    Ok(())
}

pub fn read_listing<R: BufRead>(reader: &mut R) -> Result<Vec<Word>, Error> {
    let mut words = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        match Word::from_str_radix(text, 16) {
            Ok(word) if text.len() == 4 => words.push(word),
            _ => {
                return Err(Error::Malformed {
                    line: index + 1,
                    text: text.to_string(),
                })
            }
        }
    }
    Ok(words)
}

pub fn write_raw<W: Write + ?Sized>(writer: &mut W, words: &[Word]) -> std::io::Result<()> {
    for &word in words {
        writer.write_u16::<Endian>(word)?;
    }
    Ok(())
}

pub fn read_raw<R: Read>(reader: &mut R) -> std::io::Result<Vec<Word>> {
    let mut words = Vec::new();
    loop {
        match reader.read_u16::<Endian>() {
            Ok(word) => words.push(word),
            Err(ref err) if err.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(err),
        }
    }
    Ok(words)
}

pub trait ReadCodeExt: BufRead + Sized {
    fn read_code(&mut self) -> Result<Vec<Word>, Error> {
        read_listing(self)
    }
}

impl<R: BufRead + Sized> ReadCodeExt for R {}

pub trait WriteCodeExt: Write + Sized {
    fn write_code(&mut self, words: &[Word]) -> std::io::Result<()> {
        write_listing(self, words)
    }
}

impl<W: Write + Sized> WriteCodeExt for W {}

pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<Word>, Error> {
    BufReader::new(File::open(path)?).read_code()
}

pub fn write_file<P: AsRef<Path>>(path: P, words: &[Word]) -> std::io::Result<()> {
    BufWriter::new(File::create(path)?).write_code(words)
}

#[cfg(test)]
mod test;
