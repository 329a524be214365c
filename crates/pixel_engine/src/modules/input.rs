//! Input module
//!
//! Raw key events arrive on whatever thread the platform layer owns; they
//! are buffered through a multi-producer/single-consumer channel and drained
//! into queryable key state once per frame on the engine thread. The engine
//! core never translates platform key codes; the platform layer maps its
//! codes to [`Key`] before sending.

use std::collections::HashSet;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use crate::module::{EngineModule, ModuleContext, ModuleError};

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A key
    A,
    /// B key
    B,
    /// C key
    C,
    /// D key
    D,
    /// E key
    E,
    /// F key
    F,
    /// G key
    G,
    /// H key
    H,
    /// I key
    I,
    /// J key
    J,
    /// K key
    K,
    /// L key
    L,
    /// M key
    M,
    /// N key
    N,
    /// O key
    O,
    /// P key
    P,
    /// Q key
    Q,
    /// R key
    R,
    /// S key
    S,
    /// T key
    T,
    /// U key
    U,
    /// V key
    V,
    /// W key
    W,
    /// X key
    X,
    /// Y key
    Y,
    /// Z key
    Z,
    /// Space key
    Space,
    /// Enter key
    Enter,
    /// Escape key
    Escape,
    /// Backspace key
    Backspace,
    /// Tab key
    Tab,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
}

/// Whether a key went down or came back up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    /// The key was pressed
    Pressed,
    /// The key was released
    Released,
}

/// One raw key transition delivered by the platform layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key that changed
    pub key: Key,
    /// The direction of the change
    pub kind: KeyEventKind,
}

#[derive(Default)]
struct KeyState {
    down: HashSet<Key>,
    pressed: HashSet<Key>,
    released: HashSet<Key>,
}

/// Read-only key state queries for collaborators (e.g. the renderer)
#[derive(Clone)]
pub struct InputHandle {
    state: Arc<Mutex<KeyState>>,
}

impl InputHandle {
    /// Whether the key is currently held down.
    pub fn is_key_down(&self, key: Key) -> bool {
        self.state
            .lock()
            .expect("input lock poisoned")
            .down
            .contains(&key)
    }

    /// Whether the key went down during the most recent frame.
    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.state
            .lock()
            .expect("input lock poisoned")
            .pressed
            .contains(&key)
    }

    /// Whether the key came up during the most recent frame.
    pub fn is_key_released(&self, key: Key) -> bool {
        self.state
            .lock()
            .expect("input lock poisoned")
            .released
            .contains(&key)
    }
}

/// Engine module buffering asynchronous key events into per-frame state
pub struct InputModule {
    sender: Sender<KeyEvent>,
    receiver: Receiver<KeyEvent>,
    state: Arc<Mutex<KeyState>>,
}

impl InputModule {
    /// Create the input module and its event channel.
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self {
            sender,
            receiver,
            state: Arc::new(Mutex::new(KeyState::default())),
        }
    }

    /// A producer handle for the platform event thread.
    ///
    /// Senders are cheap to clone; events from all producers are merged in
    /// arrival order.
    pub fn event_sender(&self) -> Sender<KeyEvent> {
        self.sender.clone()
    }

    /// A shareable query view of the key state.
    pub fn handle(&self) -> InputHandle {
        InputHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for InputModule {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineModule for InputModule {
    fn id(&self) -> &str {
        "input"
    }

    fn name(&self) -> &str {
        "Input"
    }

    fn initialize(&mut self, _ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        Ok(())
    }

    fn update(&mut self, _ctx: &mut ModuleContext<'_>, _delta_time: f32) -> Result<(), ModuleError> {
        let mut state = self.state.lock().expect("input lock poisoned");
        state.pressed.clear();
        state.released.clear();
        // Drain the current backlog; events keep FIFO order within the batch.
        for event in self.receiver.try_iter() {
            match event.kind {
                KeyEventKind::Pressed => {
                    // Key-repeat delivers Pressed for held keys; only the
                    // first transition counts as a press.
                    if state.down.insert(event.key) {
                        state.pressed.insert(event.key);
                    }
                }
                KeyEventKind::Released => {
                    state.down.remove(&event.key);
                    state.released.insert(event.key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::engine::Engine;

    use super::*;

    fn engine_with_input() -> (Engine, Sender<KeyEvent>, InputHandle) {
        let mut engine = Engine::new(EngineConfig {
            target_fps: 0.0,
            max_delta_time: 0.25,
        });
        let module = InputModule::new();
        let sender = module.event_sender();
        let handle = module.handle();
        engine.add_module(Box::new(module)).unwrap();
        engine.startup().unwrap();
        (engine, sender, handle)
    }

    #[test]
    fn test_pressed_only_on_drain_frame() {
        let (mut engine, sender, handle) = engine_with_input();

        sender
            .send(KeyEvent {
                key: Key::Space,
                kind: KeyEventKind::Pressed,
            })
            .unwrap();
        assert!(!handle.is_key_down(Key::Space));

        engine.tick();
        assert!(handle.is_key_down(Key::Space));
        assert!(handle.is_key_pressed(Key::Space));

        engine.tick();
        assert!(handle.is_key_down(Key::Space));
        assert!(!handle.is_key_pressed(Key::Space));
    }

    #[test]
    fn test_release_clears_down_state() {
        let (mut engine, sender, handle) = engine_with_input();

        sender
            .send(KeyEvent {
                key: Key::W,
                kind: KeyEventKind::Pressed,
            })
            .unwrap();
        engine.tick();
        sender
            .send(KeyEvent {
                key: Key::W,
                kind: KeyEventKind::Released,
            })
            .unwrap();
        engine.tick();

        assert!(!handle.is_key_down(Key::W));
        assert!(handle.is_key_released(Key::W));
    }

    #[test]
    fn test_key_repeat_is_not_a_new_press() {
        let (mut engine, sender, handle) = engine_with_input();

        sender
            .send(KeyEvent {
                key: Key::A,
                kind: KeyEventKind::Pressed,
            })
            .unwrap();
        engine.tick();
        sender
            .send(KeyEvent {
                key: Key::A,
                kind: KeyEventKind::Pressed,
            })
            .unwrap();
        engine.tick();

        assert!(handle.is_key_down(Key::A));
        assert!(!handle.is_key_pressed(Key::A));
    }

    #[test]
    fn test_events_from_other_threads_are_drained_fifo() {
        let (mut engine, sender, handle) = engine_with_input();

        let producer = std::thread::spawn(move || {
            for key in [Key::A, Key::B, Key::C] {
                sender
                    .send(KeyEvent {
                        key,
                        kind: KeyEventKind::Pressed,
                    })
                    .unwrap();
            }
            // Released last: must win over the earlier press.
            sender
                .send(KeyEvent {
                    key: Key::A,
                    kind: KeyEventKind::Released,
                })
                .unwrap();
        });
        producer.join().unwrap();

        engine.tick();
        assert!(!handle.is_key_down(Key::A));
        assert!(handle.is_key_down(Key::B));
        assert!(handle.is_key_down(Key::C));
    }
}
