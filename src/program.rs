//! The checked program: resolved operation stream, data image and symbols.

use crate::messages::{FileSet, Location};
use crate::ops::ExecOp;
use crate::Word;
use std::collections::HashMap;

/// What a source identifier resolved to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Symbol {
    /// Index into the resolved operation stream.
    Label(Word),
    /// Named constant.
    Constant(Word),
    /// Static data address.
    DataLabel(Word),
}

impl Symbol {
    pub fn value(self) -> Word {
        match self {
            Symbol::Label(v) | Symbol::Constant(v) | Symbol::DataLabel(v) => v,
        }
    }

    pub fn kind(self) -> &'static str {
        match self {
            Symbol::Label(_) => "label",
            Symbol::Constant(_) => "constant",
            Symbol::DataLabel(_) => "data label",
        }
    }
}

/// Flat, case-sensitive name table. Redefinition is rejected.
#[derive(Clone, Default, Debug)]
pub struct SymbolTable {
    map: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn define(&mut self, name: &str, symbol: Symbol) -> Result<(), Symbol> {
        if let Some(&existing) = self.map.get(name) {
            return Err(existing);
        }
        self.map.insert(name.to_string(), symbol);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.map.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Symbols sorted by name, for stable listings.
    pub fn sorted(&self) -> Vec<(&str, Symbol)> {
        let mut entries: Vec<(&str, Symbol)> = self
            .map
            .iter()
            .map(|(name, &symbol)| (name.as_str(), symbol))
            .collect();
        entries.sort_by_key(|&(name, _)| name);
        entries
    }

    /// Reverse lookup: the label naming a stream index, if any.
    pub fn label_at(&self, index: Word) -> Option<&str> {
        self.map
            .iter()
            .filter(|(_, s)| **s == Symbol::Label(index))
            .map(|(name, _)| name.as_str())
            .min()
    }
}

/// One slot of the resolved stream, with its source position.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AnnotatedOp {
    pub op: ExecOp,
    pub loc: Location,
}

/// Output of the checker: only real and debug operations remain, the data
/// segment is laid out, and every symbol is resolved.
#[derive(Clone, Default, Debug)]
pub struct Program {
    pub ops: Vec<AnnotatedOp>,
    pub data: Vec<Word>,
    pub data_start: Word,
    pub symbols: SymbolTable,
    pub files: FileSet,
}

impl Program {
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
