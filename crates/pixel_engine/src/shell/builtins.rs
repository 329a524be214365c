//! Builtin shell commands
//!
//! Registered by the terminal module into its own scope. All output is
//! plain transcript text with the `[color=..]`/`[i]` markup vocabulary the
//! terminal UI collaborator understands.

use std::fmt::Write;

use crate::env::Environments;

use super::command::{Command, STATUS_ERROR, STATUS_OK};

/// `help`: list every command and variable across all scopes.
pub struct CmdHelp;

impl Command for CmdHelp {
    fn name(&self) -> &str {
        "help"
    }

    fn description(&self) -> &str {
        "Lists all available commands and variables."
    }

    fn execute(&self, envs: &Environments, output: &mut String, _args: &[String]) -> i32 {
        let mut commands: Vec<(&str, &str)> = envs
            .iter()
            .flat_map(|scope| scope.commands())
            .map(|command| (command.name(), command.description()))
            .collect();
        commands.sort_unstable();

        let _ = writeln!(output, "[i]Commands:[/i]");
        for (name, description) in commands {
            let _ = writeln!(output, "  {name} - {description}");
        }

        let mut variables: Vec<String> = Vec::new();
        for scope in envs.iter() {
            for variable in scope.variables() {
                variables.push(format!("{}.{}", scope.name(), variable.name()));
            }
        }
        variables.sort_unstable();

        let _ = writeln!(output, "[i]Variables:[/i]");
        for path in variables {
            let _ = writeln!(output, "  {path}");
        }
        STATUS_OK
    }
}

/// `echo`: append the arguments to the transcript.
pub struct CmdEcho;

impl Command for CmdEcho {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Prints its arguments."
    }

    fn execute(&self, _envs: &Environments, output: &mut String, args: &[String]) -> i32 {
        let _ = writeln!(output, "{}", args.join(" "));
        STATUS_OK
    }
}

/// `vars`: list every variable with its type, value and description.
pub struct CmdVars;

impl Command for CmdVars {
    fn name(&self) -> &str {
        "vars"
    }

    fn description(&self) -> &str {
        "Lists all variables with their current values."
    }

    fn execute(&self, envs: &Environments, output: &mut String, _args: &[String]) -> i32 {
        let mut lines: Vec<String> = Vec::new();
        for scope in envs.iter() {
            for variable in scope.variables() {
                let access = if variable.is_mutable() { "" } else { " (read-only)" };
                lines.push(format!(
                    "{}.{} [{}] = {}{} - {}",
                    scope.name(),
                    variable.name(),
                    variable.type_label(),
                    variable.value_text(),
                    access,
                    variable.description(),
                ));
            }
        }
        lines.sort_unstable();
        for line in lines {
            let _ = writeln!(output, "{line}");
        }
        STATUS_OK
    }
}

/// `get <var>`: print one variable's current value.
pub struct CmdGet;

impl Command for CmdGet {
    fn name(&self) -> &str {
        "get"
    }

    fn description(&self) -> &str {
        "Prints the value of a variable: get <name | scope.name>"
    }

    fn execute(&self, envs: &Environments, output: &mut String, args: &[String]) -> i32 {
        let Some(path) = args.first() else {
            let _ = writeln!(output, "[color=red]usage: {}[/color]", self.description());
            return STATUS_ERROR;
        };
        match envs.find_variable(path) {
            Some(variable) => {
                let _ = writeln!(output, "{path} = {}", variable.value_text());
                STATUS_OK
            }
            None => {
                let _ = writeln!(output, "[color=red]unknown variable: '{path}'[/color]");
                STATUS_ERROR
            }
        }
    }
}

/// `set <var> <value>`: assign a variable through its text parser.
pub struct CmdSet;

impl Command for CmdSet {
    fn name(&self) -> &str {
        "set"
    }

    fn description(&self) -> &str {
        "Assigns a variable: set <name | scope.name> <value>"
    }

    fn execute(&self, envs: &Environments, output: &mut String, args: &[String]) -> i32 {
        let (Some(path), Some(value)) = (args.first(), args.get(1)) else {
            let _ = writeln!(output, "[color=red]usage: {}[/color]", self.description());
            return STATUS_ERROR;
        };
        let Some(variable) = envs.find_variable(path) else {
            let _ = writeln!(output, "[color=red]unknown variable: '{path}'[/color]");
            return STATUS_ERROR;
        };
        match variable.set_from_text(value) {
            Ok(()) => {
                let _ = writeln!(output, "{path} = {}", variable.value_text());
                STATUS_OK
            }
            Err(error) => {
                let _ = writeln!(output, "[color=red]{error}[/color]");
                STATUS_ERROR
            }
        }
    }
}
