//! Time module
//!
//! Tracks scaled game time and exposes it through a shared handle, so any
//! collaborator can ask "how long has the game been running" without
//! touching the engine. The `time.scale` variable slows down or speeds up
//! game time live (0 pauses it).

use std::sync::{Arc, Mutex};

use crate::env::Variable;
use crate::module::{EngineModule, ModuleContext, ModuleError};

#[derive(Default)]
struct TimeData {
    total: f32,
    delta: f32,
    frame: u64,
}

/// Read-only view of the time module's state
#[derive(Clone)]
pub struct TimeHandle {
    shared: Arc<Mutex<TimeData>>,
}

impl TimeHandle {
    /// Scaled game time since startup, in seconds.
    pub fn total(&self) -> f32 {
        self.shared.lock().expect("time lock poisoned").total
    }

    /// Scaled delta of the most recent frame, in seconds.
    pub fn delta(&self) -> f32 {
        self.shared.lock().expect("time lock poisoned").delta
    }

    /// Frame counter of the most recent update.
    pub fn frame(&self) -> u64 {
        self.shared.lock().expect("time lock poisoned").frame
    }
}

/// Engine module owning the game clock
pub struct TimeModule {
    shared: Arc<Mutex<TimeData>>,
    scale: Variable<f32>,
}

impl TimeModule {
    /// Create the time module with scale 1.0.
    pub fn new() -> Self {
        let scale = Variable::bounded(
            "scale",
            1.0_f32,
            0.0,
            100.0,
            "Multiplier applied to delta time (0 pauses game time).",
        )
        .expect("time scale bounds are valid");
        Self {
            shared: Arc::new(Mutex::new(TimeData::default())),
            scale,
        }
    }

    /// A shareable read view of the clock.
    pub fn handle(&self) -> TimeHandle {
        TimeHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// The `time.scale` variable handle.
    pub fn scale(&self) -> Variable<f32> {
        self.scale.clone()
    }
}

impl Default for TimeModule {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineModule for TimeModule {
    fn id(&self) -> &str {
        "time"
    }

    fn name(&self) -> &str {
        "Time"
    }

    fn initialize(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        ctx.env().add_variable(self.scale.clone())?;
        Ok(())
    }

    fn update(&mut self, ctx: &mut ModuleContext<'_>, delta_time: f32) -> Result<(), ModuleError> {
        let scaled = delta_time * self.scale.get();
        let mut data = self.shared.lock().expect("time lock poisoned");
        data.total += scaled;
        data.delta = scaled;
        data.frame = ctx.frame();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::engine::Engine;

    use super::*;

    #[test]
    fn test_scaled_time_accumulates() {
        let mut engine = Engine::new(EngineConfig {
            target_fps: 0.0,
            max_delta_time: 0.25,
        });
        let module = TimeModule::new();
        let handle = module.handle();
        let scale = module.scale();
        engine.add_module(Box::new(module)).unwrap();
        engine.startup().unwrap();

        engine.tick();
        assert_eq!(handle.frame(), 1);
        let after_first = handle.total();

        // Pause game time; total must stop growing.
        scale.set(0.0).unwrap();
        engine.tick();
        assert_eq!(handle.frame(), 2);
        assert_eq!(handle.delta(), 0.0);
        assert_eq!(handle.total(), after_first);
    }

    #[test]
    fn test_scale_is_registered_and_bounded() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.add_module(Box::new(TimeModule::new())).unwrap();
        engine.startup().unwrap();

        let variable = engine.environments().find_variable("time.scale").unwrap();
        assert!(variable.set_from_text("-1").is_err());
        variable.set_from_text("2.5").unwrap();
        assert_eq!(variable.value_text(), "2.5");
    }
}
