//! Command shell: grammar, registry contract and execution pipeline
//!
//! A line of input is parsed into one or more command invocations, each
//! resolved against the environment scopes and executed against a shared
//! transcript. A failing command is reported inline and never stops the
//! rest of its line.

pub mod builtins;
pub mod command;
pub mod parser;

use std::fmt::Write;

use crate::env::Environments;

pub use command::{Command, STATUS_ERROR, STATUS_OK};
pub use parser::{ParseError, ParseResult, Parser};

/// Per-invocation record produced by [`Shell::execute_line`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// The invoked (or attempted) command name
    pub name: String,
    /// The status code: [`STATUS_OK`] on success
    pub status: i32,
}

/// Executes shell input lines against the environment scopes
pub struct Shell {
    parser: Parser,
}

impl Shell {
    /// Create a shell with the default grammar.
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// The shell's parser.
    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    /// Parse and execute one input line.
    ///
    /// Every invocation parsed from the line runs in order, appending its
    /// output to `transcript`. Parse diagnostics, unknown command names and
    /// non-zero statuses are reported inline; later invocations in the same
    /// line still execute.
    pub fn execute_line(
        &self,
        line: &str,
        envs: &Environments,
        transcript: &mut String,
    ) -> Vec<CommandOutcome> {
        let mut outcomes = Vec::new();
        for result in self.parser.parse_input(line) {
            if let Some(error) = result.error() {
                let _ = writeln!(transcript, "[color=red]parse error: {error}[/color]");
                outcomes.push(CommandOutcome {
                    name: result.name().to_string(),
                    status: STATUS_ERROR,
                });
                continue;
            }

            let Some(command) = envs.find_command(result.name()) else {
                let _ = writeln!(
                    transcript,
                    "[color=red]unknown command: '{}'[/color]",
                    result.name()
                );
                outcomes.push(CommandOutcome {
                    name: result.name().to_string(),
                    status: STATUS_ERROR,
                });
                continue;
            };

            let before = transcript.len();
            let status = command.execute(envs, transcript, result.args());
            if transcript.len() > before && !transcript.ends_with('\n') {
                transcript.push('\n');
            }
            if status != STATUS_OK {
                let _ = writeln!(
                    transcript,
                    "[color=red]command '{}' exited with status {status}[/color]",
                    result.name()
                );
            }
            outcomes.push(CommandOutcome {
                name: result.name().to_string(),
                status,
            });
        }
        outcomes
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::builtins::CmdEcho;
    use super::*;

    fn shell_envs() -> Environments {
        let mut envs = Environments::new();
        envs.root_mut().add_command(Box::new(CmdEcho)).unwrap();
        envs
    }

    #[test]
    fn test_unknown_command_does_not_stop_the_chain() {
        let shell = Shell::new();
        let envs = shell_envs();
        let mut transcript = String::new();

        let outcomes = shell.execute_line("badcmd; echo ok", &envs, &mut transcript);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].status, STATUS_ERROR);
        assert_eq!(outcomes[1].status, STATUS_OK);
        assert!(transcript.contains("unknown command: 'badcmd'"));
        assert!(transcript.contains("ok"));
    }

    #[test]
    fn test_multiple_commands_share_one_transcript() {
        let shell = Shell::new();
        let envs = shell_envs();
        let mut transcript = String::new();

        shell.execute_line("echo one; echo two", &envs, &mut transcript);
        let one = transcript.find("one").unwrap();
        let two = transcript.find("two").unwrap();
        assert!(one < two);
    }

    #[test]
    fn test_parse_diagnostic_is_inline() {
        let shell = Shell::new();
        let envs = shell_envs();
        let mut transcript = String::new();

        let outcomes = shell.execute_line("echo \"unterminated", &envs, &mut transcript);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, STATUS_ERROR);
        assert!(transcript.contains("parse error"));
    }

    #[test]
    fn test_empty_line_produces_nothing() {
        let shell = Shell::new();
        let envs = shell_envs();
        let mut transcript = String::new();

        let outcomes = shell.execute_line("   ", &envs, &mut transcript);
        assert!(outcomes.is_empty());
        assert!(transcript.is_empty());
    }
}
