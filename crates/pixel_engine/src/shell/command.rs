//! Command contract

use crate::env::Environments;

/// Status code returned by a successful command.
pub const STATUS_OK: i32 = 0;

/// Generic failure status code.
pub const STATUS_ERROR: i32 = 1;

/// A named operation invocable from the shell
///
/// Commands append human-readable (optionally markup-tagged) text to the
/// shared transcript instead of returning a string, so several commands
/// chained on one input line build one continuous transcript. The returned
/// status code is [`STATUS_OK`] on success; any other value is reported
/// inline by the shell without aborting the rest of the line.
pub trait Command: Send {
    /// The invocation name, unique within the owning scope (case-sensitive).
    fn name(&self) -> &str;

    /// One-line description shown by `help`.
    fn description(&self) -> &str;

    /// Run the command.
    ///
    /// `envs` is a shared view of every environment scope; variables are
    /// mutated through their own interior locks. `args` are the argument
    /// tokens that followed the command name.
    fn execute(&self, envs: &Environments, output: &mut String, args: &[String]) -> i32;
}
