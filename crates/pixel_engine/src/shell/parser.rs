//! Shell input grammar
//!
//! Tokenization rules: unescaped whitespace separates tokens; a
//! double-quoted run is one token with the quotes stripped; `\` escapes the
//! next character inside or outside quotes; an unescaped `;` splits the line
//! into independent invocations executed in order.

use thiserror::Error;

/// Diagnostics attached to a malformed invocation
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// A `"` was opened but never closed before the end of the segment
    #[error("unterminated double quote")]
    UnterminatedQuote,

    /// The input ended right after a `\`
    #[error("dangling escape at end of input")]
    DanglingEscape,
}

/// One resolved command invocation extracted from raw shell input
///
/// A malformed segment still yields a `ParseResult` carrying whatever tokens
/// were recovered plus the attached [`ParseError`]; the shell reports the
/// diagnostic instead of executing it, and parsing of the rest of the line
/// is unaffected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    name: String,
    args: Vec<String>,
    error: Option<ParseError>,
}

impl ParseResult {
    /// The command name (first token of the segment).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The argument tokens following the command name, in order.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The diagnostic attached to this invocation, if the segment was
    /// malformed.
    pub fn error(&self) -> Option<ParseError> {
        self.error
    }
}

/// Parses raw shell input into command invocations
#[derive(Debug, Default)]
pub struct Parser;

impl Parser {
    /// Create a parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse one line of input into its invocations, in order.
    ///
    /// Empty segments (for example between two `;`) produce nothing.
    pub fn parse_input(&self, input: &str) -> Vec<ParseResult> {
        let mut results = Vec::new();
        let mut tokens: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut has_current = false;
        let mut in_quotes = false;
        let mut error: Option<ParseError> = None;

        let flush_token = |current: &mut String, has_current: &mut bool, tokens: &mut Vec<String>| {
            if *has_current {
                tokens.push(std::mem::take(current));
                *has_current = false;
            }
        };
        let flush_segment = |tokens: &mut Vec<String>,
                             error: &mut Option<ParseError>,
                             results: &mut Vec<ParseResult>| {
            if tokens.is_empty() && error.is_none() {
                return;
            }
            let mut drained = std::mem::take(tokens).into_iter();
            results.push(ParseResult {
                name: drained.next().unwrap_or_default(),
                args: drained.collect(),
                error: error.take(),
            });
        };

        let mut chars = input.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some(escaped) => {
                        current.push(escaped);
                        has_current = true;
                    }
                    None => error = Some(ParseError::DanglingEscape),
                }
                continue;
            }
            if in_quotes {
                if c == '"' {
                    in_quotes = false;
                } else {
                    current.push(c);
                }
                continue;
            }
            match c {
                '"' => {
                    // An empty quoted run is still a (empty) token.
                    in_quotes = true;
                    has_current = true;
                }
                ';' => {
                    flush_token(&mut current, &mut has_current, &mut tokens);
                    flush_segment(&mut tokens, &mut error, &mut results);
                }
                c if c.is_whitespace() => {
                    flush_token(&mut current, &mut has_current, &mut tokens);
                }
                _ => {
                    current.push(c);
                    has_current = true;
                }
            }
        }

        if in_quotes {
            error = Some(ParseError::UnterminatedQuote);
        }
        flush_token(&mut current, &mut has_current, &mut tokens);
        flush_segment(&mut tokens, &mut error, &mut results);
        results
    }
}
