//! # Pixel Engine
//!
//! A modular 2D pixel game engine runtime written in Rust.
//!
//! ## Features
//!
//! - **Module Lifecycle**: Subsystems plug in through one narrow
//!   [`EngineModule`] contract with deterministic ordering guarantees
//! - **ECS Scene Graph**: Entities and components with kind-indexed queries
//! - **Reactive Environment**: Typed, bounded variables with synchronous
//!   change hooks, scoped per module
//! - **Command Shell**: Quoting/escaping/chaining grammar mutating the
//!   environment live
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pixel_engine::prelude::*;
//!
//! struct MyGame;
//!
//! impl EngineModule for MyGame {
//!     fn id(&self) -> &str {
//!         "my_game"
//!     }
//!
//!     fn name(&self) -> &str {
//!         "My Game"
//!     }
//!
//!     fn initialize(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
//!         let camera = ctx.scene().create_entity("camera");
//!         ctx.scene().add_component(camera, Camera::default())?;
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, ctx: &mut ModuleContext<'_>, _delta_time: f32) -> Result<(), ModuleError> {
//!         if ctx.frame() > 600 {
//!             ctx.request_shutdown();
//!         }
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new(EngineConfig::default());
//!     engine.add_module(Box::new(TimeModule::new()))?;
//!     engine.add_module(Box::new(MyGame))?;
//!     engine.run()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod ecs;
pub mod env;
pub mod foundation;
pub mod modules;
pub mod shell;

mod engine;
mod module;

pub use config::{Config, ConfigError, EngineConfig};
pub use engine::{Engine, EngineError};
pub use module::{EngineModule, ModuleContext, ModuleError, ModuleState};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, EngineConfig},
        ecs::{
            components::{Camera, PostProcessingFilter, Transform},
            Component, EntityId, Scene, SceneError,
        },
        env::{AnyVariable, EnvError, Environment, Environments, VarError, Variable},
        foundation::{math::Vec2, time::FrameClock},
        modules::{
            InputHandle, InputModule, Key, KeyEvent, KeyEventKind, TerminalModule, TimeHandle,
            TimeModule, TranscriptHandle,
        },
        shell::{Command, ParseResult, Parser, Shell, STATUS_ERROR, STATUS_OK},
        Engine, EngineError, EngineModule, ModuleContext, ModuleError, ModuleState,
    };
}
