use crate::{HeraParser, Rule};
use ::pest::*;

#[test]
fn comment() {
    parses_to! {
        parser: HeraParser,
        input: "// anything at all ;'%",
        rule: Rule::COMMENT,
        tokens: []
    };

    parses_to! {
        parser: HeraParser,
        input: "/* multi\nline */",
        rule: Rule::COMMENT,
        tokens: []
    };
}

#[test]
fn dec_uint() {
    parses_to! {
        parser: HeraParser,
        input: "4492",
        rule: Rule::dec_uint,
        tokens: [dec_uint(0, 4)]
    };
}

#[test]
fn hex_uint() {
    parses_to! {
        parser: HeraParser,
        input: "0xF40a",
        rule: Rule::hex_uint,
        tokens: [hex_uint(0, 6, [hex_lit(2, 6)])]
    };
}

#[test]
fn oct_uint() {
    parses_to! {
        parser: HeraParser,
        input: "0777",
        rule: Rule::oct_uint,
        tokens: [oct_uint(0, 4, [oct_lit(1, 4)])]
    };
}

#[test]
fn negative_int() {
    parses_to! {
        parser: HeraParser,
        input: "-42",
        rule: Rule::int,
        tokens: [int(0, 3, [neg(0, 1), uint(1, 3, [dec_uint(1, 3)])])]
    };
}

#[test]
fn identifier() {
    parses_to! {
        parser: HeraParser,
        input: "R1_INIT",
        rule: Rule::identifier,
        tokens: [identifier(0, 7)]
    };

    parses_to! {
        parser: HeraParser,
        input: "__eval",
        rule: Rule::identifier,
        tokens: [identifier(0, 6)]
    };

    assert!(HeraParser::parse(Rule::identifier, "9lives").is_err());
}

#[test]
fn op_with_args() {
    parses_to! {
        parser: HeraParser,
        input: "SET(R1, 3)",
        rule: Rule::op,
        tokens: [op(0, 10, [
            identifier(0, 3),
            args(4, 9, [
                arg(4, 6, [identifier(4, 6)]),
                arg(8, 9, [int(8, 9, [uint(8, 9, [dec_uint(8, 9)])])])
            ])
        ])]
    };
}

#[test]
fn op_with_semicolon_and_no_args() {
    parses_to! {
        parser: HeraParser,
        input: "HALT();",
        rule: Rule::op,
        tokens: [op(0, 7, [identifier(0, 4)])]
    };
}

#[test]
fn string_literal() {
    parses_to! {
        parser: HeraParser,
        input: "\"hi\\n\"",
        rule: Rule::string,
        tokens: [string(0, 6, [string_inner(1, 5)])]
    };
}

#[test]
fn string_rejects_raw_newline() {
    assert!(HeraParser::parse(Rule::string, "\"broken\nstring\"").is_err());
}

#[test]
fn include_forms() {
    parses_to! {
        parser: HeraParser,
        input: "#include \"lib.hera\"",
        rule: Rule::include,
        tokens: [include(0, 19, [string(9, 19, [string_inner(10, 18)])])]
    };

    parses_to! {
        parser: HeraParser,
        input: "#include <HERA.h>",
        rule: Rule::include,
        tokens: [include(0, 17, [angle_path(9, 17)])]
    };
}

#[test]
fn conditional_blocks_nest() {
    let input = "#ifdef A\nNOP()\n#ifndef B\nHALT()\n#endif\n#else\nNOP()\n#endif";
    assert!(HeraParser::parse(Rule::program, input).is_ok());
}

#[test]
fn stray_endif_fails() {
    assert!(HeraParser::parse(Rule::program, "NOP()\n#endif").is_err());
}

#[test]
fn whole_program() {
    let input = "// a program\nCONSTANT(N, 10)\nSET(R1, N)\nLABEL(top)\nDEC(R1, 1)\nBNZR(top)\nHALT()\n";
    assert!(HeraParser::parse(Rule::program, input).is_ok());
}
