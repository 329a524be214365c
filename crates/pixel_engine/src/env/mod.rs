//! Environment: reactive, scoped configuration store
//!
//! Variables are typed, optionally bounded value cells with synchronous
//! change notification. Every variable and command lives in exactly one
//! [`Environment`] scope; the engine owns a root scope plus one scope per
//! registered module, so configuration lifetime is tied to its owner rather
//! than to process-wide globals.

pub mod environment;
pub mod variable;

pub use environment::{EnvError, Environment, Environments};
pub use variable::{AnyVariable, VarError, VarValue, Variable};
