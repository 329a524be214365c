//! Modules shipped with the engine
//!
//! Each of these implements the [`EngineModule`](crate::EngineModule)
//! contract and nothing more; collaborators get access through the cheap
//! clone handles the modules expose at construction time.

pub mod input;
pub mod terminal;
pub mod time;

pub use input::{InputHandle, InputModule, Key, KeyEvent, KeyEventKind};
pub use terminal::{TerminalModule, TranscriptHandle};
pub use time::{TimeHandle, TimeModule};
