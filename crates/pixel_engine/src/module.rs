//! Engine module contract and lifecycle state

use thiserror::Error;

use crate::ecs::{Scene, SceneError};
use crate::env::{EnvError, Environment, Environments, VarError};

/// Lifecycle state of a registered module
///
/// `Created → Initialized → Started → Stopped`, with `Failed` as an
/// absorbing state entered when initialization or an update errors. The
/// engine tracks the state; modules never see it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// Registered, no lifecycle call made yet
    Created,
    /// `initialize` completed successfully
    Initialized,
    /// `start` was called; the module receives per-frame updates
    Started,
    /// Initialization or an update failed; excluded from further frames
    Failed,
    /// `stop` was called; terminal
    Stopped,
}

/// Failure payload returned from module lifecycle calls
#[derive(Error, Debug)]
pub enum ModuleError {
    /// Free-form module-defined failure
    #[error("{0}")]
    Message(String),

    /// Environment registration failure
    #[error(transparent)]
    Environment(#[from] EnvError),

    /// Variable construction/validation failure
    #[error(transparent)]
    Variable(#[from] VarError),

    /// Scene mutation failure
    #[error(transparent)]
    Scene(#[from] SceneError),
}

impl From<String> for ModuleError {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for ModuleError {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

/// Per-call context handed to module lifecycle methods
///
/// Gives a module access to its own environment scope, a shared view of
/// every scope, the active scene, and request surfaces whose effects the
/// engine applies at frame boundaries.
pub struct ModuleContext<'a> {
    module_id: &'a str,
    envs: &'a mut Environments,
    scene: &'a mut Scene,
    frame: u64,
    shutdown: &'a mut bool,
    scene_request: &'a mut Option<Scene>,
}

impl<'a> ModuleContext<'a> {
    pub(crate) fn new(
        module_id: &'a str,
        envs: &'a mut Environments,
        scene: &'a mut Scene,
        frame: u64,
        shutdown: &'a mut bool,
        scene_request: &'a mut Option<Scene>,
    ) -> Self {
        Self {
            module_id,
            envs,
            scene,
            frame,
            shutdown,
            scene_request,
        }
    }

    /// The module's own environment scope (named after its id).
    pub fn env(&mut self) -> &mut Environment {
        self.envs
            .scope_mut(self.module_id)
            .expect("module scope is created at registration")
    }

    /// Shared view of every environment scope.
    pub fn environments(&self) -> &Environments {
        self.envs
    }

    /// The active scene.
    pub fn scene(&mut self) -> &mut Scene {
        self.scene
    }

    /// Read-only view of the active scene.
    pub fn scene_ref(&self) -> &Scene {
        self.scene
    }

    /// Monotonic frame counter (0 during startup/shutdown calls).
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Ask the engine to leave the frame loop after the current frame.
    pub fn request_shutdown(&mut self) {
        *self.shutdown = true;
    }

    /// Ask the engine to swap in a new scene.
    ///
    /// The swap happens between frames, never mid-update: the outgoing
    /// scene's entities are destroyed (full detach cascade) before the new
    /// scene becomes visible to module updates.
    pub fn replace_scene(&mut self, scene: Scene) {
        *self.scene_request = Some(scene);
    }
}

/// Lifecycle contract every engine subsystem implements
///
/// All calls arrive sequentially on the engine's frame thread, in module
/// registration order for `initialize`/`start`/`update` and in reverse
/// registration order for `stop`. A module that needs other subsystems
/// receives their handles at construction time; the engine itself knows
/// nothing about what a module does.
pub trait EngineModule: Send {
    /// Stable unique id; also the name of the module's environment scope.
    fn id(&self) -> &str;

    /// Human-readable display name.
    fn name(&self) -> &str;

    /// One-time setup: register variables and commands, allocate resources.
    ///
    /// An error here is fatal to engine startup: already-initialized modules
    /// are stopped in reverse order and the failure is reported naming this
    /// module.
    fn initialize(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError>;

    /// Called once after every module initialized successfully.
    fn start(&mut self, _ctx: &mut ModuleContext<'_>) {}

    /// Called once per frame while the module is in the `Started` state.
    ///
    /// `delta_time` is the clamped time since the previous frame in seconds.
    /// An error is contained: it is logged, the module transitions to
    /// `Failed` and is skipped on subsequent frames, and the frame loop
    /// carries on.
    fn update(&mut self, ctx: &mut ModuleContext<'_>, delta_time: f32) -> Result<(), ModuleError>;

    /// Teardown notification; called exactly once for every module that
    /// reached `Started` (or `Failed`), in reverse registration order.
    fn stop(&mut self, _ctx: &mut ModuleContext<'_>) {}
}
