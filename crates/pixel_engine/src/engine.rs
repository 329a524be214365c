//! Core engine implementation

use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::EngineConfig;
use crate::ecs::Scene;
use crate::env::Environments;
use crate::foundation::time::FrameClock;
use crate::module::{EngineModule, ModuleContext, ModuleError, ModuleState};

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// A module with the same id is already registered
    #[error("a module with id '{0}' is already registered")]
    DuplicateModule(String),

    /// Modules can only be registered before startup
    #[error("cannot register module '{0}' after engine startup")]
    RegistrationClosed(String),

    /// A module failed to initialize; startup was aborted
    #[error("module '{module}' failed to initialize: {source}")]
    StartupFailed {
        /// Display name of the offending module
        module: String,
        /// The module's failure
        source: ModuleError,
    },

    /// `startup` was called twice
    #[error("engine has already been started")]
    AlreadyStarted,
}

struct ModuleEntry {
    id: String,
    name: String,
    module: Box<dyn EngineModule>,
    state: ModuleState,
}

/// Orchestrator of modules, the active scene and the frame loop
///
/// The engine owns its modules in registration order (which is also their
/// initialization and update order, and the reverse of their stop order),
/// the active [`Scene`], and one [`Environments`] scope set. Everything runs
/// sequentially on the thread driving [`Engine::run`] or [`Engine::tick`];
/// asynchronous producers (input events, shell input) hand data over through
/// the queue handles the shipped modules expose.
pub struct Engine {
    config: EngineConfig,
    modules: Vec<ModuleEntry>,
    envs: Environments,
    scene: Scene,
    scene_request: Option<Scene>,
    clock: FrameClock,
    frame: u64,
    running: bool,
    started: bool,
}

impl Engine {
    /// Create an engine with the given configuration and an empty scene.
    pub fn new(config: EngineConfig) -> Self {
        log::info!("initializing engine runtime");
        let clock = FrameClock::new(config.max_delta_time);
        Self {
            config,
            modules: Vec::new(),
            envs: Environments::new(),
            scene: Scene::new(),
            scene_request: None,
            clock,
            frame: 0,
            running: false,
            started: false,
        }
    }

    /// Register a module.
    ///
    /// Must happen before [`Engine::startup`]. A duplicate id is rejected
    /// without any lifecycle call and leaves the module set unchanged. The
    /// module's environment scope (named after its id) is created here.
    pub fn add_module(&mut self, module: Box<dyn EngineModule>) -> Result<(), EngineError> {
        let id = module.id().to_string();
        if self.started {
            return Err(EngineError::RegistrationClosed(id));
        }
        if self.modules.iter().any(|entry| entry.id == id) {
            return Err(EngineError::DuplicateModule(id));
        }
        self.envs
            .add_scope(id.clone())
            .map_err(|_| EngineError::DuplicateModule(id.clone()))?;
        let name = module.name().to_string();
        log::debug!("registered module '{name}' (id '{id}')");
        self.modules.push(ModuleEntry {
            id,
            name,
            module,
            state: ModuleState::Created,
        });
        Ok(())
    }

    /// Initialize and start every registered module, in registration order.
    ///
    /// If any `initialize` fails, startup aborts: modules that had already
    /// initialized are stopped in reverse registration order (best-effort
    /// cleanup) and the error names the offending module. No module reaches
    /// the `Started` state in that case.
    pub fn startup(&mut self) -> Result<(), EngineError> {
        if self.started {
            return Err(EngineError::AlreadyStarted);
        }
        log::info!("engine startup: initializing {} modules", self.modules.len());

        let mut shutdown = false;
        for index in 0..self.modules.len() {
            let ModuleEntry {
                id,
                name,
                module,
                state,
            } = &mut self.modules[index];
            let mut ctx = ModuleContext::new(
                id,
                &mut self.envs,
                &mut self.scene,
                0,
                &mut shutdown,
                &mut self.scene_request,
            );
            match module.initialize(&mut ctx) {
                Ok(()) => *state = ModuleState::Initialized,
                Err(source) => {
                    *state = ModuleState::Failed;
                    let failed = name.clone();
                    log::error!("module '{failed}' failed to initialize: {source}");
                    self.abort_startup(index);
                    return Err(EngineError::StartupFailed {
                        module: failed,
                        source,
                    });
                }
            }
        }

        for entry in &mut self.modules {
            let ModuleEntry {
                id, module, state, ..
            } = entry;
            let mut ctx = ModuleContext::new(
                id,
                &mut self.envs,
                &mut self.scene,
                0,
                &mut shutdown,
                &mut self.scene_request,
            );
            module.start(&mut ctx);
            *state = ModuleState::Started;
        }

        self.started = true;
        self.running = !shutdown;
        // Restart the clock so setup time does not leak into the first delta.
        self.clock = FrameClock::new(self.config.max_delta_time);
        log::info!("engine startup complete");
        Ok(())
    }

    // Reverse-order cleanup of everything initialized before `failed_index`.
    fn abort_startup(&mut self, failed_index: usize) {
        let mut shutdown = false;
        for entry in self.modules[..failed_index].iter_mut().rev() {
            if entry.state != ModuleState::Initialized {
                continue;
            }
            let ModuleEntry {
                id, module, state, ..
            } = entry;
            let mut ctx = ModuleContext::new(
                id,
                &mut self.envs,
                &mut self.scene,
                0,
                &mut shutdown,
                &mut self.scene_request,
            );
            module.stop(&mut ctx);
            *state = ModuleState::Stopped;
        }
    }

    /// Advance the engine by exactly one frame.
    ///
    /// Applies any pending scene swap, computes the frame delta and updates
    /// every `Started` module in registration order. A module whose update
    /// errors is logged, marked `Failed` and skipped from then on; the frame
    /// loop itself never aborts because of a single module fault.
    pub fn tick(&mut self) {
        if !self.started {
            return;
        }
        let delta = self.clock.tick();
        self.frame += 1;
        self.apply_scene_request();

        let mut shutdown = false;
        for entry in &mut self.modules {
            if entry.state != ModuleState::Started {
                continue;
            }
            let ModuleEntry {
                id,
                name,
                module,
                state,
            } = entry;
            let mut ctx = ModuleContext::new(
                id,
                &mut self.envs,
                &mut self.scene,
                self.frame,
                &mut shutdown,
                &mut self.scene_request,
            );
            if let Err(error) = module.update(&mut ctx, delta) {
                log::error!(
                    "module '{name}' failed during update; excluding it from further frames: {error}"
                );
                *state = ModuleState::Failed;
            }
        }

        if shutdown {
            log::info!("shutdown requested");
            self.running = false;
        }
    }

    /// Run the full lifecycle: startup, frame loop, shutdown.
    ///
    /// The loop runs until a module (or [`Engine::quit`] from a callback on
    /// this thread) requests shutdown. Frames are paced to
    /// `config.target_fps` when it is non-zero.
    pub fn run(&mut self) -> Result<(), EngineError> {
        self.startup()?;
        log::info!("entering frame loop");
        while self.running {
            let frame_start = Instant::now();
            self.tick();
            if !self.running {
                break;
            }
            if self.config.target_fps > 0.0 {
                let budget = Duration::from_secs_f32(1.0 / self.config.target_fps);
                let elapsed = frame_start.elapsed();
                if elapsed < budget {
                    thread::sleep(budget - elapsed);
                }
            }
        }
        self.shutdown();
        Ok(())
    }

    /// Stop every module that reached `Started` (or `Failed`), in reverse
    /// registration order. Idempotent: `stop` is never called twice for the
    /// same module.
    pub fn shutdown(&mut self) {
        let mut ignored = false;
        for entry in self.modules.iter_mut().rev() {
            if !matches!(entry.state, ModuleState::Started | ModuleState::Failed) {
                continue;
            }
            let ModuleEntry {
                id, module, state, ..
            } = entry;
            let mut ctx = ModuleContext::new(
                id,
                &mut self.envs,
                &mut self.scene,
                0,
                &mut ignored,
                &mut self.scene_request,
            );
            module.stop(&mut ctx);
            *state = ModuleState::Stopped;
        }
        self.running = false;
        if self.started {
            log::info!("engine shutdown complete");
        }
    }

    fn apply_scene_request(&mut self) {
        if let Some(next) = self.scene_request.take() {
            log::info!(
                "replacing active scene ({} outgoing entities)",
                self.scene.entity_count()
            );
            self.scene.clear();
            self.scene = next;
        }
    }

    /// Queue a scene replacement; applied at the top of the next frame.
    pub fn set_scene(&mut self, scene: Scene) {
        self.scene_request = Some(scene);
    }

    /// Leave the frame loop after the current frame.
    pub fn quit(&mut self) {
        log::info!("engine shutdown requested");
        self.running = false;
    }

    /// The active scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable access to the active scene (frame thread only).
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// The environment scope set.
    pub fn environments(&self) -> &Environments {
        &self.envs
    }

    /// Mutable access to the environment scope set.
    pub fn environments_mut(&mut self) -> &mut Environments {
        &mut self.envs
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Monotonic frame counter; 0 until the first [`Engine::tick`].
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Whether the frame loop should keep running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of registered modules.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Lifecycle state of the module with the given id.
    pub fn module_state(&self, id: &str) -> Option<ModuleState> {
        self.modules
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.state)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::ecs::Component;

    use super::*;

    type EventLog = Arc<Mutex<Vec<String>>>;

    struct Recorder {
        id: &'static str,
        log: EventLog,
        fail_initialize: bool,
        fail_on_frame: Option<u64>,
        quit_on_frame: Option<u64>,
    }

    impl Recorder {
        fn new(id: &'static str, log: EventLog) -> Self {
            Self {
                id,
                log,
                fail_initialize: false,
                fail_on_frame: None,
                quit_on_frame: None,
            }
        }

        fn push(&self, event: &str) {
            self.log.lock().unwrap().push(format!("{}:{event}", self.id));
        }
    }

    impl EngineModule for Recorder {
        fn id(&self) -> &str {
            self.id
        }

        fn name(&self) -> &str {
            self.id
        }

        fn initialize(&mut self, _ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
            self.push("init");
            if self.fail_initialize {
                return Err("refused to initialize".into());
            }
            Ok(())
        }

        fn start(&mut self, _ctx: &mut ModuleContext<'_>) {
            self.push("start");
        }

        fn update(&mut self, ctx: &mut ModuleContext<'_>, _delta_time: f32) -> Result<(), ModuleError> {
            self.push(&format!("update{}", ctx.frame()));
            if self.quit_on_frame == Some(ctx.frame()) {
                ctx.request_shutdown();
            }
            if self.fail_on_frame == Some(ctx.frame()) {
                return Err("update fault".into());
            }
            Ok(())
        }

        fn stop(&mut self, _ctx: &mut ModuleContext<'_>) {
            self.push("stop");
        }
    }

    fn quiet_engine() -> Engine {
        Engine::new(EngineConfig {
            target_fps: 0.0,
            max_delta_time: 0.25,
        })
    }

    #[test]
    fn test_duplicate_module_id_rejected() {
        let log = EventLog::default();
        let mut engine = quiet_engine();
        engine.add_module(Box::new(Recorder::new("a", log.clone()))).unwrap();

        let err = engine
            .add_module(Box::new(Recorder::new("a", log.clone())))
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateModule(id) if id == "a"));
        assert_eq!(engine.module_count(), 1);
        // No lifecycle call was made on either instance.
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_registration_closed_after_startup() {
        let log = EventLog::default();
        let mut engine = quiet_engine();
        engine.add_module(Box::new(Recorder::new("a", log.clone()))).unwrap();
        engine.startup().unwrap();

        assert!(matches!(
            engine.add_module(Box::new(Recorder::new("b", log))),
            Err(EngineError::RegistrationClosed(_))
        ));
    }

    #[test]
    fn test_startup_failure_rolls_back_in_reverse_order() {
        let log = EventLog::default();
        let mut engine = quiet_engine();
        engine.add_module(Box::new(Recorder::new("a", log.clone()))).unwrap();
        engine.add_module(Box::new(Recorder::new("b", log.clone()))).unwrap();
        let mut failing = Recorder::new("c", log.clone());
        failing.fail_initialize = true;
        engine.add_module(Box::new(failing)).unwrap();
        engine.add_module(Box::new(Recorder::new("d", log.clone()))).unwrap();

        let err = engine.startup().unwrap_err();
        assert!(matches!(err, EngineError::StartupFailed { module, .. } if module == "c"));

        // a and b initialized; cleanup stopped them in reverse order; d was
        // never touched and nothing reached start.
        assert_eq!(
            log.lock().unwrap().as_slice(),
            &["a:init", "b:init", "c:init", "b:stop", "a:stop"]
        );
        assert_eq!(engine.module_state("a"), Some(ModuleState::Stopped));
        assert_eq!(engine.module_state("b"), Some(ModuleState::Stopped));
        assert_eq!(engine.module_state("c"), Some(ModuleState::Failed));
        assert_eq!(engine.module_state("d"), Some(ModuleState::Created));
        assert!(!engine.is_running());
    }

    #[test]
    fn test_lifecycle_ordering() {
        let log = EventLog::default();
        let mut engine = quiet_engine();
        engine.add_module(Box::new(Recorder::new("a", log.clone()))).unwrap();
        engine.add_module(Box::new(Recorder::new("b", log.clone()))).unwrap();

        engine.startup().unwrap();
        engine.tick();
        engine.tick();
        engine.shutdown();

        assert_eq!(
            log.lock().unwrap().as_slice(),
            &[
                "a:init", "b:init", "a:start", "b:start", "a:update1", "b:update1", "a:update2",
                "b:update2", "b:stop", "a:stop"
            ]
        );
    }

    #[test]
    fn test_update_fault_is_isolated() {
        let log = EventLog::default();
        let mut engine = quiet_engine();
        engine.add_module(Box::new(Recorder::new("a", log.clone()))).unwrap();
        let mut flaky = Recorder::new("b", log.clone());
        flaky.fail_on_frame = Some(1);
        engine.add_module(Box::new(flaky)).unwrap();

        engine.startup().unwrap();
        engine.tick();
        assert_eq!(engine.module_state("b"), Some(ModuleState::Failed));
        engine.tick();
        engine.shutdown();

        // b updated once, was excluded afterwards, and still got stopped.
        assert_eq!(
            log.lock().unwrap().as_slice(),
            &[
                "a:init", "b:init", "a:start", "b:start", "a:update1", "b:update1", "a:update2",
                "b:stop", "a:stop"
            ]
        );
    }

    #[test]
    fn test_stop_never_called_twice() {
        let log = EventLog::default();
        let mut engine = quiet_engine();
        engine.add_module(Box::new(Recorder::new("a", log.clone()))).unwrap();
        engine.startup().unwrap();
        engine.shutdown();
        engine.shutdown();

        let stops = log
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.ends_with(":stop"))
            .count();
        assert_eq!(stops, 1);
    }

    #[test]
    fn test_run_exits_on_shutdown_request() {
        let log = EventLog::default();
        let mut engine = quiet_engine();
        let mut quitter = Recorder::new("a", log.clone());
        quitter.quit_on_frame = Some(3);
        engine.add_module(Box::new(quitter)).unwrap();

        engine.run().unwrap();
        assert_eq!(engine.frame(), 3);
        assert_eq!(engine.module_state("a"), Some(ModuleState::Stopped));
    }

    struct DetachCounter {
        detached: Arc<AtomicUsize>,
    }

    impl Component for DetachCounter {
        fn on_detach(&mut self) {
            self.detached.fetch_add(1, Ordering::SeqCst);
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    struct SceneSwapper {
        swap_on_frame: u64,
        seen_entities: EventLog,
    }

    impl EngineModule for SceneSwapper {
        fn id(&self) -> &str {
            "swapper"
        }

        fn name(&self) -> &str {
            "Scene Swapper"
        }

        fn initialize(&mut self, _ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
            Ok(())
        }

        fn update(&mut self, ctx: &mut ModuleContext<'_>, _delta_time: f32) -> Result<(), ModuleError> {
            let names: Vec<String> = ctx
                .scene_ref()
                .entity_ids()
                .filter_map(|id| ctx.scene_ref().entity_name(id).map(String::from))
                .collect();
            self.seen_entities.lock().unwrap().push(names.join(","));
            if ctx.frame() == self.swap_on_frame {
                let mut next = Scene::new();
                next.create_entity("fresh");
                ctx.replace_scene(next);
            }
            Ok(())
        }
    }

    #[test]
    fn test_scene_swap_happens_between_frames() {
        let detached = Arc::new(AtomicUsize::new(0));
        let seen = EventLog::default();
        let mut engine = quiet_engine();
        let entity = engine.scene_mut().create_entity("old");
        engine
            .scene_mut()
            .add_component(
                entity,
                DetachCounter {
                    detached: detached.clone(),
                },
            )
            .unwrap();
        engine
            .add_module(Box::new(SceneSwapper {
                swap_on_frame: 1,
                seen_entities: seen.clone(),
            }))
            .unwrap();

        engine.startup().unwrap();
        engine.tick();
        // The swap was only requested; the outgoing scene is still live.
        assert_eq!(detached.load(Ordering::SeqCst), 0);
        engine.tick();
        engine.shutdown();

        assert_eq!(detached.load(Ordering::SeqCst), 1);
        assert_eq!(seen.lock().unwrap().as_slice(), &["old", "fresh"]);
        assert_eq!(engine.scene().entity_count(), 1);
    }
}
