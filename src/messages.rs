//! Diagnostics that travel alongside pass results.
//!
//! Every pass of the toolchain returns its normal output together with a
//! [`Messages`] bag instead of aborting on the first problem. Errors mark the
//! result as unusable for downstream stages; warnings do not.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

pub type FileId = usize;

/// A position in one of the loaded source files. Ordering follows source
/// order: file, then line, then column.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Location {
    pub file: FileId,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(file: FileId, line: u32, column: u32) -> Location {
        Location { file, line, column }
    }
}

#[derive(Clone, Debug)]
struct SourceFile {
    name: PathBuf,
    text: String,
}

/// The set of files that contributed operations, in include order. Id 0 is
/// the root file.
#[derive(Clone, Default, Debug)]
pub struct FileSet {
    files: Vec<SourceFile>,
}

impl FileSet {
    pub fn add(&mut self, name: impl Into<PathBuf>, text: impl Into<String>) -> FileId {
        self.files.push(SourceFile {
            name: name.into(),
            text: text.into(),
        });
        self.files.len() - 1
    }

    pub fn name(&self, id: FileId) -> &Path {
        &self.files[id].name
    }

    pub fn text(&self, id: FileId) -> &str {
        &self.files[id].text
    }

    /// One-based line lookup.
    pub fn line(&self, id: FileId, line: u32) -> Option<&str> {
        self.files
            .get(id)?
            .text
            .lines()
            .nth(line.checked_sub(1)? as usize)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// Diagnostic categories that are reported at most once per program run.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum WarnOnce {
    Octal,
    CallRegisters,
    BranchRange,
    ReturnAddress,
    AngleInclude,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Message {
    pub severity: Severity,
    pub location: Option<Location>,
    pub text: String,
    /// Set for once-per-run warnings, so drivers can filter categories.
    pub category: Option<WarnOnce>,
}

#[derive(Clone, Default, Debug)]
pub struct Messages {
    items: Vec<Message>,
    emitted: HashSet<WarnOnce>,
}

impl Messages {
    pub fn new() -> Messages {
        Messages::default()
    }

    pub fn error(&mut self, location: Option<Location>, text: impl Into<String>) {
        self.items.push(Message {
            severity: Severity::Error,
            location,
            text: text.into(),
            category: None,
        });
    }

    pub fn warning(&mut self, location: Option<Location>, text: impl Into<String>) {
        self.items.push(Message {
            severity: Severity::Warning,
            location,
            text: text.into(),
            category: None,
        });
    }

    /// Emits a warning in a once-per-run category. Returns whether the
    /// message was actually recorded.
    pub fn warn_once(
        &mut self,
        category: WarnOnce,
        location: Option<Location>,
        text: impl Into<String>,
    ) -> bool {
        if self.emitted.insert(category) {
            self.items.push(Message {
                severity: Severity::Warning,
                location,
                text: text.into(),
                category: Some(category),
            });
            true
        } else {
            false
        }
    }

    pub fn merge(&mut self, other: Messages) {
        self.items.extend(other.items);
        self.emitted.extend(other.emitted);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|m| m.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.items.iter()
    }

    /// Messages in source order; located messages precede unlocated ones.
    pub fn sorted(&self) -> Vec<&Message> {
        let mut items: Vec<&Message> = self.items.iter().collect();
        items.sort_by_key(|m| match m.location {
            Some(loc) => (0, loc),
            None => (1, Location::new(FileId::max_value(), 0, 0)),
        });
        items
    }

    pub fn take(&mut self) -> Vec<Message> {
        std::mem::replace(&mut self.items, Vec::new())
    }
}

/// Renders a message the way the command-line tools print it.
pub fn render_message(message: &Message, files: &FileSet) -> String {
    match message.location {
        Some(loc) if loc.file < files.len() => format!(
            "{}:{}:{}: {}: {}",
            files.name(loc.file).display(),
            loc.line,
            loc.column,
            message.severity,
            message.text
        ),
        _ => format!("{}: {}", message.severity, message.text),
    }
}
