//! Source loading: file reading, `#include` resolution and conditional
//! compilation.
//!
//! Includes resolve relative to the directory of the including file;
//! circular includes are rejected at the include site. Conditional blocks
//! (`#ifdef`/`#ifndef`/`#else`/`#endif`) gate whole items; the only
//! predefined symbol is `HERA_PY`.

use crate::parser::{self, RawOp, Rule};
use hvm::messages::{FileId, FileSet, Location, Messages, WarnOnce};
use pest::iterators::Pair;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const PREDEFINED: &[&str] = &["HERA_PY"];

struct Loader {
    files: FileSet,
    messages: Messages,
    ops: Vec<RawOp>,
    defined: HashSet<String>,
    /// Canonical paths of the include chain, for cycle detection.
    active: Vec<PathBuf>,
}

/// Loads a program from disk, following includes.
pub fn load_file(path: &Path) -> (Vec<RawOp>, FileSet, Messages) {
    let mut loader = Loader::new();
    loader.load_path(path, None);
    (loader.ops, loader.files, loader.messages)
}

/// Loads a program from an in-memory string. Includes resolve against the
/// current directory.
pub fn load_source(name: &str, text: &str) -> (Vec<RawOp>, FileSet, Messages) {
    let mut loader = Loader::new();
    loader.load_text(PathBuf::from(name), text.to_string(), None);
    (loader.ops, loader.files, loader.messages)
}

impl Loader {
    fn new() -> Loader {
        Loader {
            files: FileSet::default(),
            messages: Messages::new(),
            ops: Vec::new(),
            defined: PREDEFINED.iter().map(|s| s.to_string()).collect(),
            active: Vec::new(),
        }
    }

    fn load_path(&mut self, path: &Path, include_site: Option<Location>) {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.messages.error(
                    include_site,
                    format!("cannot read \"{}\": {}", path.display(), err),
                );
                return;
            }
        };
        if let Some(position) = bytes.iter().position(|b| !b.is_ascii()) {
            let (line, column) = line_col(&bytes, position);
            let id = self
                .files
                .add(path, String::from_utf8_lossy(&bytes).into_owned());
            self.messages.error(
                Some(Location::new(id, line, column)),
                "source contains a non-ASCII byte",
            );
            return;
        }
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if self.active.contains(&canonical) {
            self.messages.error(
                include_site,
                format!("circular include of \"{}\"", path.display()),
            );
            return;
        }
        self.active.push(canonical);
        let text = String::from_utf8(bytes).unwrap();
        let dir = path.parent().map(Path::to_path_buf);
        self.load_text(path.to_path_buf(), text, dir);
        self.active.pop();
    }

    fn load_text(&mut self, name: PathBuf, text: String, dir: Option<PathBuf>) {
        let id = self.files.add(name, text.clone());
        match parser::parse_program(&text, id) {
            Ok(root) => {
                let items: Vec<Pair<Rule>> = root.into_inner().collect();
                self.walk_items(items, id, dir.as_deref());
            }
            Err(err) => parser::report_parse_error(&err, id, &mut self.messages),
        }
    }

    fn walk_items(&mut self, items: Vec<Pair<Rule>>, file: FileId, dir: Option<&Path>) {
        for item in items {
            if item.as_rule() == Rule::EOI {
                continue;
            }
            let loc = parser::location(&item.as_span(), file);
            let inner = item.into_inner().next().unwrap();
            match inner.as_rule() {
                Rule::op => {
                    if let Some(op) = parser::convert_op(inner, file, &mut self.messages) {
                        self.ops.push(op);
                    }
                }
                Rule::include => self.handle_include(inner, loc, file, dir),
                Rule::cond_block => self.handle_cond(inner, file, dir),
                Rule::bad_directive => {
                    self.messages.error(
                        Some(loc),
                        format!("unknown directive \"{}\"", inner.as_str().trim()),
                    );
                }
                _ => unreachable!(),
            }
        }
    }

    fn handle_include(
        &mut self,
        pair: Pair<Rule>,
        loc: Location,
        _file: FileId,
        dir: Option<&Path>,
    ) {
        let target = pair.into_inner().next().unwrap();
        match target.as_rule() {
            Rule::string => {
                let raw = target.into_inner().next().unwrap().as_str();
                match parser::unescape(raw) {
                    Ok(relative) => {
                        let base = dir.unwrap_or_else(|| Path::new("."));
                        let path = base.join(relative);
                        self.load_path(&path, Some(loc));
                    }
                    Err((_, problem)) => self.messages.error(Some(loc), problem),
                }
            }
            Rule::angle_path => {
                self.messages.warn_once(
                    WarnOnce::AngleInclude,
                    Some(loc),
                    format!("ignoring system include {}", target.as_str()),
                );
            }
            _ => unreachable!(),
        }
    }

    fn handle_cond(&mut self, pair: Pair<Rule>, file: FileId, dir: Option<&Path>) {
        let mut taken = Vec::new();
        let mut else_items = Vec::new();
        let mut active = false;
        for (index, part) in pair.into_inner().enumerate() {
            match part.as_rule() {
                Rule::ifdef | Rule::ifndef => {
                    debug_assert_eq!(index, 0);
                    let symbol = part.clone().into_inner().next().unwrap().as_str();
                    let defined = self.defined.contains(symbol);
                    active = if part.as_rule() == Rule::ifdef {
                        defined
                    } else {
                        !defined
                    };
                }
                Rule::item => taken.push(part),
                Rule::else_branch => else_items = part.into_inner().collect(),
                _ => unreachable!(),
            }
        }
        if active {
            self.walk_items(taken, file, dir);
        } else {
            self.walk_items(else_items, file, dir);
        }
    }
}

fn line_col(bytes: &[u8], position: usize) -> (u32, u32) {
    let mut line = 1;
    let mut column = 1;
    for &b in &bytes[..position] {
        if b == b'\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}
