use crate::{compile_source, CheckOptions};
use hvm::messages::Messages;
use hvm::program::Program;

mod assemble;
mod check;
mod loader;
mod pest;

pub fn compile(text: &str) -> (Program, Messages) {
    compile_source("<test>", text, CheckOptions::default())
}

pub fn compile_ok(text: &str) -> Program {
    let (program, messages) = compile(text);
    assert!(
        !messages.has_errors(),
        "unexpected errors: {:?}",
        messages.sorted()
    );
    program
}

pub fn first_error(messages: &Messages) -> &str {
    messages
        .iter()
        .find(|m| m.severity == hvm::Severity::Error)
        .map(|m| m.text.as_str())
        .expect("expected at least one error")
}
