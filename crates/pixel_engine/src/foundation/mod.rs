//! Foundation utilities shared by the rest of the engine
//!
//! Small, dependency-light building blocks: logging setup, 2D math
//! aliases, and frame timing.

pub mod logging;
pub mod math;
pub mod time;

pub use math::Vec2;
pub use time::FrameClock;
