//! Typed reactive variables

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Errors raised by variable construction and mutation
#[derive(Error, Debug)]
pub enum VarError {
    /// The variable was declared immutable
    #[error("variable '{name}' is read-only")]
    Immutable {
        /// Variable name
        name: String,
    },

    /// The value falls outside the configured `[min, max]` range
    #[error("variable '{name}': value {value} is outside the allowed range [{min}, {max}]")]
    OutOfBounds {
        /// Variable name
        name: String,
        /// Rejected value
        value: String,
        /// Lower bound (inclusive)
        min: String,
        /// Upper bound (inclusive)
        max: String,
    },

    /// A `set` arrived while a change notification for the same variable was
    /// still running (recursive self-set or a racing writer)
    #[error("variable '{name}': rejected re-entrant set during change notification")]
    Reentrant {
        /// Variable name
        name: String,
    },

    /// Text could not be parsed as the variable's type
    #[error("variable '{name}': cannot parse '{text}' as {kind}")]
    Parse {
        /// Variable name
        name: String,
        /// Offending input text
        text: String,
        /// Expected type label
        kind: &'static str,
    },

    /// `min > max` at construction
    #[error("variable '{name}': bounds are inverted (min > max)")]
    InvertedBounds {
        /// Variable name
        name: String,
    },
}

/// Value types storable in a [`Variable`]
///
/// The text conversions exist for the shell: `set`/`get` commands address
/// variables of any type through strings.
pub trait VarValue: Clone + PartialOrd + fmt::Display + Send + Sync + 'static {
    /// Short label used in diagnostics and listings ("int", "bool", ...).
    fn type_label() -> &'static str;

    /// Parse a shell token into a value of this type.
    fn parse_text(text: &str) -> Option<Self>;
}

macro_rules! numeric_var_value {
    ($($ty:ty => $label:literal),* $(,)?) => {
        $(
            impl VarValue for $ty {
                fn type_label() -> &'static str {
                    $label
                }

                fn parse_text(text: &str) -> Option<Self> {
                    text.parse().ok()
                }
            }
        )*
    };
}

numeric_var_value! {
    i32 => "int",
    i64 => "int64",
    f32 => "float",
    f64 => "float64",
}

impl VarValue for bool {
    fn type_label() -> &'static str {
        "bool"
    }

    fn parse_text(text: &str) -> Option<Self> {
        match text {
            "true" | "1" | "on" => Some(true),
            "false" | "0" | "off" => Some(false),
            _ => None,
        }
    }
}

impl VarValue for String {
    fn type_label() -> &'static str {
        "string"
    }

    fn parse_text(text: &str) -> Option<Self> {
        Some(text.to_string())
    }
}

type ChangeHook<T> = Box<dyn FnMut(&T) + Send>;

struct VarState<T> {
    value: T,
    hooks: Vec<ChangeHook<T>>,
    // True while hooks for an applied set are running; guards against
    // re-entrant sets on the same variable.
    notifying: bool,
}

struct VarShared<T: VarValue> {
    name: String,
    description: String,
    mutable: bool,
    bounds: Option<(T, T)>,
    state: Mutex<VarState<T>>,
}

/// A named, typed, optionally bounded configuration cell with synchronous
/// change notification
///
/// `Variable` is a cheap-clone handle: every clone refers to the same cell,
/// which is how a module keeps access to a variable it registered into its
/// environment scope. Each cell owns its own lock, so a `set` is one atomic
/// check-and-mutate-and-notify step even if handles are spread across
/// threads; no two variables ever share a lock.
pub struct Variable<T: VarValue> {
    shared: Arc<VarShared<T>>,
}

impl<T: VarValue> Clone for Variable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: VarValue> Variable<T> {
    /// Create a mutable, unbounded variable.
    pub fn new(name: impl Into<String>, default: T, description: impl Into<String>) -> Self {
        Self::build(name.into(), default, true, None, description.into())
    }

    /// Create an immutable variable; every `set` call will be rejected.
    pub fn read_only(name: impl Into<String>, default: T, description: impl Into<String>) -> Self {
        Self::build(name.into(), default, false, None, description.into())
    }

    /// Create a mutable variable constrained to `[min, max]` (inclusive).
    ///
    /// Fails if the bounds are inverted or the default falls outside them.
    pub fn bounded(
        name: impl Into<String>,
        default: T,
        min: T,
        max: T,
        description: impl Into<String>,
    ) -> Result<Self, VarError> {
        let name = name.into();
        if min > max {
            return Err(VarError::InvertedBounds { name });
        }
        if default < min || default > max {
            return Err(VarError::OutOfBounds {
                name,
                value: default.to_string(),
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        Ok(Self::build(
            name,
            default,
            true,
            Some((min, max)),
            description.into(),
        ))
    }

    fn build(
        name: String,
        default: T,
        mutable: bool,
        bounds: Option<(T, T)>,
        description: String,
    ) -> Self {
        Self {
            shared: Arc::new(VarShared {
                name,
                description,
                mutable,
                bounds,
                state: Mutex::new(VarState {
                    value: default,
                    hooks: Vec::new(),
                    notifying: false,
                }),
            }),
        }
    }

    /// The variable's name, unique within its environment scope.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Human-readable description shown by the shell.
    pub fn description(&self) -> &str {
        &self.shared.description
    }

    /// Whether `set` is permitted at all.
    pub fn is_mutable(&self) -> bool {
        self.shared.mutable
    }

    /// The inclusive `[min, max]` bounds, if any were configured.
    pub fn bounds(&self) -> Option<(T, T)> {
        self.shared.bounds.clone()
    }

    /// A copy of the current value.
    pub fn get(&self) -> T {
        self.lock().value.clone()
    }

    /// Store a new value and notify every change hook.
    ///
    /// Validation (mutability, bounds) happens before the write; a rejected
    /// call leaves the previous value untouched. Hooks run after the value
    /// is applied, in registration order, synchronously on the calling
    /// thread. The cell's lock is released while hooks run so a hook may set
    /// *other* variables; a hook setting this same variable is rejected with
    /// [`VarError::Reentrant`].
    pub fn set(&self, value: T) -> Result<(), VarError> {
        let mut hooks = {
            let mut state = self.lock();
            if !self.shared.mutable {
                return Err(VarError::Immutable {
                    name: self.shared.name.clone(),
                });
            }
            if let Some((min, max)) = &self.shared.bounds {
                if value < *min || value > *max {
                    return Err(VarError::OutOfBounds {
                        name: self.shared.name.clone(),
                        value: value.to_string(),
                        min: min.to_string(),
                        max: max.to_string(),
                    });
                }
            }
            if state.notifying {
                return Err(VarError::Reentrant {
                    name: self.shared.name.clone(),
                });
            }
            state.value = value.clone();
            state.notifying = true;
            std::mem::take(&mut state.hooks)
        };

        for hook in &mut hooks {
            hook(&value);
        }

        let mut state = self.lock();
        // Hooks registered while the notification ran land behind the
        // existing ones and first fire on the next set.
        hooks.append(&mut state.hooks);
        state.hooks = hooks;
        state.notifying = false;
        Ok(())
    }

    /// Register a change hook.
    ///
    /// Hooks fire in registration order after every successful `set`,
    /// receiving the newly applied value.
    pub fn add_change_hook(&self, hook: impl FnMut(&T) + Send + 'static) {
        self.lock().hooks.push(Box::new(hook));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VarState<T>> {
        self.shared.state.lock().expect("variable lock poisoned")
    }
}

impl<T: VarValue> fmt::Debug for Variable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("name", &self.shared.name)
            .field("value", &self.get().to_string())
            .field("mutable", &self.shared.mutable)
            .finish()
    }
}

/// Type-erased view of a [`Variable`], used by environment scopes and the
/// shell
///
/// Text accessors go through the same validation and notification path as
/// the typed [`Variable::set`].
pub trait AnyVariable: Send + Sync {
    /// The variable's name.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// Whether `set` is permitted.
    fn is_mutable(&self) -> bool;

    /// Type label for listings ("int", "bool", ...).
    fn type_label(&self) -> &'static str;

    /// Current value rendered as text.
    fn value_text(&self) -> String;

    /// Parse `text` and apply it as the new value.
    fn set_from_text(&self, text: &str) -> Result<(), VarError>;

    /// Downcast support for recovering the typed handle.
    fn as_any(&self) -> &dyn Any;
}

impl<T: VarValue> AnyVariable for Variable<T> {
    fn name(&self) -> &str {
        Variable::name(self)
    }

    fn description(&self) -> &str {
        Variable::description(self)
    }

    fn is_mutable(&self) -> bool {
        Variable::is_mutable(self)
    }

    fn type_label(&self) -> &'static str {
        T::type_label()
    }

    fn value_text(&self) -> String {
        self.get().to_string()
    }

    fn set_from_text(&self, text: &str) -> Result<(), VarError> {
        let value = T::parse_text(text).ok_or_else(|| VarError::Parse {
            name: self.name().to_string(),
            text: text.to_string(),
            kind: T::type_label(),
        })?;
        self.set(value)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
