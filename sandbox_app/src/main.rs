//! Sandbox demo application
//!
//! Wires the engine together with its shipped modules plus a small game
//! module, drives a few hundred frames, and dumps the terminal transcript.
//! Run with `RUST_LOG=debug` for the full bring-up log.

use std::sync::mpsc::Sender;

use pixel_engine::prelude::*;

/// Demo game module: spawns a camera and a spinning entity, pokes the shell,
/// and shuts the engine down after a fixed number of frames.
struct SandboxGame {
    shell_lines: Sender<String>,
    spin_speed: Variable<f32>,
    player: Option<EntityId>,
    run_frames: u64,
}

impl SandboxGame {
    fn new(shell_lines: Sender<String>, run_frames: u64) -> Self {
        let spin_speed = Variable::bounded(
            "spin_speed",
            1.5_f32,
            0.0,
            50.0,
            "Player spin speed in radians per second.",
        )
        .expect("spin speed bounds are valid");
        Self {
            shell_lines,
            spin_speed,
            player: None,
            run_frames,
        }
    }
}

impl EngineModule for SandboxGame {
    fn id(&self) -> &str {
        "sandbox"
    }

    fn name(&self) -> &str {
        "Sandbox Game"
    }

    fn initialize(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        ctx.env().add_variable(self.spin_speed.clone())?;
        self.spin_speed.add_change_hook(|speed| {
            log::info!("spin speed changed to {speed}");
        });

        let scene = ctx.scene();
        let camera = scene.create_entity("main-camera");
        scene.add_component(camera, Transform::from_position(Vec2::new(0.0, 0.0)))?;
        scene.add_component(camera, Camera::new(0xff20_2040))?;

        let player = scene.create_entity("player");
        scene.add_component(player, Transform::from_position(Vec2::new(32.0, 24.0)))?;
        self.player = Some(player);
        Ok(())
    }

    fn update(&mut self, ctx: &mut ModuleContext<'_>, delta_time: f32) -> Result<(), ModuleError> {
        if let Some(player) = self.player {
            if let Some(transform) = ctx.scene().component_mut::<Transform>(player) {
                transform.rotate(self.spin_speed.get() * delta_time);
            }
        }

        // Exercise the shell a few frames in, once everything is running.
        if ctx.frame() == 10 {
            let _ = self.shell_lines.send("help".to_string());
            let _ = self
                .shell_lines
                .send("set sandbox.spin_speed 4; get sandbox.spin_speed".to_string());
            let _ = self.shell_lines.send("echo \"sandbox says hi\"".to_string());
        }

        if ctx.frame() >= self.run_frames {
            ctx.request_shutdown();
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pixel_engine::foundation::logging::init();

    let mut engine = Engine::new(EngineConfig {
        target_fps: 120.0,
        ..EngineConfig::default()
    });

    let time = TimeModule::new();
    let time_handle = time.handle();

    let input = InputModule::new();
    // A real platform layer would clone this into its event callback thread.
    let _key_events = input.event_sender();

    let terminal = TerminalModule::new();
    let shell_lines = terminal.line_sender();
    let transcript = terminal.transcript();

    engine.add_module(Box::new(time))?;
    engine.add_module(Box::new(input))?;
    engine.add_module(Box::new(terminal))?;
    engine.add_module(Box::new(SandboxGame::new(shell_lines, 120)))?;

    engine.run()?;

    log::info!(
        "ran {} frames, {:.2}s of game time",
        engine.frame(),
        time_handle.total()
    );
    println!("--- terminal transcript ---");
    print!("{}", transcript.snapshot());
    Ok(())
}
