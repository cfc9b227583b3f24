//! GCode Parser
//!
//! Text to classified commands: line reading, word extraction and
//! classification. Never fails; malformed input surfaces as
//! [`Command::Unknown`].

pub mod ast;
pub mod classify;
pub mod lexer;

pub use ast::{Command, ParsedLine, PartialPosition};
pub use classify::{classify, describe_code, SUPPORTED_CODES};
pub use lexer::{read_lines, tokenize_line, Lexeme, SourceLine, Word};

/// Parse a single line of command text into commands
pub fn parse_line(code: &str) -> Vec<Command> {
    classify::classify(&lexer::tokenize_line(code))
}

/// Parse a whole program, keeping only lines that carry at least one command
pub fn parse_program(text: &str) -> Vec<ParsedLine> {
    lexer::read_lines(text)
        .filter_map(|source| {
            let commands = parse_line(&source.code);
            if commands.is_empty() {
                None
            } else {
                Some(ParsedLine { source, commands })
            }
        })
        .collect()
}
