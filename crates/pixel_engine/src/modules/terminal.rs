//! Terminal module
//!
//! Owns the shell and its transcript. A terminal UI collaborator submits
//! raw input lines through a channel from whatever thread it lives on; the
//! module executes them against the environment scopes once per frame and
//! the UI reads the resulting transcript (with its markup tags) back
//! through the transcript handle.

use std::fmt::Write;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use crate::env::Variable;
use crate::module::{EngineModule, ModuleContext, ModuleError};
use crate::shell::builtins::{CmdEcho, CmdGet, CmdHelp, CmdSet, CmdVars};
use crate::shell::Shell;

/// Read view of the terminal transcript for the UI collaborator
#[derive(Clone)]
pub struct TranscriptHandle {
    text: Arc<Mutex<String>>,
}

impl TranscriptHandle {
    /// A copy of the current transcript text.
    pub fn snapshot(&self) -> String {
        self.text.lock().expect("transcript lock poisoned").clone()
    }

    /// Discard the transcript contents.
    pub fn clear(&self) {
        self.text.lock().expect("transcript lock poisoned").clear();
    }
}

/// Engine module driving the command shell
pub struct TerminalModule {
    shell: Shell,
    line_tx: Sender<String>,
    line_rx: Receiver<String>,
    transcript: Arc<Mutex<String>>,
    scrollback: Variable<i32>,
}

impl TerminalModule {
    /// Create the terminal module and its line channel.
    pub fn new() -> Self {
        let (line_tx, line_rx) = channel();
        let scrollback = Variable::bounded(
            "scrollback",
            1000,
            16,
            i32::MAX,
            "Maximum number of transcript lines kept.",
        )
        .expect("scrollback bounds are valid");
        Self {
            shell: Shell::new(),
            line_tx,
            line_rx,
            transcript: Arc::new(Mutex::new(String::new())),
            scrollback,
        }
    }

    /// A producer handle for submitting input lines.
    pub fn line_sender(&self) -> Sender<String> {
        self.line_tx.clone()
    }

    /// A shareable read view of the transcript.
    pub fn transcript(&self) -> TranscriptHandle {
        TranscriptHandle {
            text: Arc::clone(&self.transcript),
        }
    }

    // Keep at most `max_lines` transcript lines, dropping the oldest.
    fn trim_transcript(text: &mut String, max_lines: usize) {
        let lines = text.lines().count();
        if lines <= max_lines {
            return;
        }
        let drop = lines - max_lines;
        if let Some((cut, _)) = text.char_indices().filter(|&(_, c)| c == '\n').nth(drop - 1) {
            text.replace_range(..=cut, "");
        }
    }
}

impl Default for TerminalModule {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineModule for TerminalModule {
    fn id(&self) -> &str {
        "terminal"
    }

    fn name(&self) -> &str {
        "Terminal"
    }

    fn initialize(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let env = ctx.env();
        env.add_variable(self.scrollback.clone())?;
        env.add_command(Box::new(CmdHelp))?;
        env.add_command(Box::new(CmdEcho))?;
        env.add_command(Box::new(CmdVars))?;
        env.add_command(Box::new(CmdGet))?;
        env.add_command(Box::new(CmdSet))?;
        Ok(())
    }

    fn update(&mut self, ctx: &mut ModuleContext<'_>, _delta_time: f32) -> Result<(), ModuleError> {
        let mut transcript = self.transcript.lock().expect("transcript lock poisoned");
        let mut executed = false;
        for line in self.line_rx.try_iter() {
            let _ = writeln!(transcript, "> {line}");
            self.shell
                .execute_line(&line, ctx.environments(), &mut transcript);
            executed = true;
        }
        if executed {
            let max_lines = self.scrollback.get().max(0) as usize;
            Self::trim_transcript(&mut transcript, max_lines);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::engine::Engine;

    use super::*;

    fn engine_with_terminal() -> (Engine, Sender<String>, TranscriptHandle) {
        let mut engine = Engine::new(EngineConfig {
            target_fps: 0.0,
            max_delta_time: 0.25,
        });
        let module = TerminalModule::new();
        let lines = module.line_sender();
        let transcript = module.transcript();
        engine.add_module(Box::new(module)).unwrap();
        engine.startup().unwrap();
        (engine, lines, transcript)
    }

    #[test]
    fn test_submitted_lines_execute_in_order() {
        let (mut engine, lines, transcript) = engine_with_terminal();

        lines.send("echo first".to_string()).unwrap();
        lines.send("badcmd; echo second".to_string()).unwrap();
        engine.tick();

        let text = transcript.snapshot();
        let first = text.find("first").unwrap();
        let unknown = text.find("unknown command: 'badcmd'").unwrap();
        let second = text.find("second").unwrap();
        assert!(first < unknown && unknown < second);
    }

    #[test]
    fn test_shell_mutates_other_modules_variables() {
        let mut engine = Engine::new(EngineConfig {
            target_fps: 0.0,
            max_delta_time: 0.25,
        });
        let time = crate::modules::time::TimeModule::new();
        let scale = time.scale();
        let terminal = TerminalModule::new();
        let lines = terminal.line_sender();
        engine.add_module(Box::new(time)).unwrap();
        engine.add_module(Box::new(terminal)).unwrap();
        engine.startup().unwrap();

        lines.send("set time.scale 0.5".to_string()).unwrap();
        engine.tick();
        assert_eq!(scale.get(), 0.5);
    }

    #[test]
    fn test_scrollback_trims_oldest_lines() {
        let (mut engine, lines, transcript) = engine_with_terminal();
        engine
            .environments()
            .find_variable("terminal.scrollback")
            .unwrap()
            .set_from_text("16")
            .unwrap();

        for i in 0..32 {
            lines.send(format!("echo line-{i}")).unwrap();
        }
        engine.tick();

        let text = transcript.snapshot();
        assert_eq!(text.lines().count(), 16);
        assert!(!text.contains("line-0\n"));
        assert!(text.contains("line-31"));
    }
}
