//! Entity-Component scene graph
//!
//! Entities are opaque identities owned by a [`Scene`]; components are typed
//! units of data/behavior attached to entities, at most one per concrete
//! component type. The scene keeps an incrementally maintained kind index so
//! per-frame queries such as "all cameras, in the order they were added"
//! never scan the whole entity set.

pub mod component;
pub mod components;
pub mod entity;
pub mod scene;

pub use component::Component;
pub use entity::EntityId;
pub use scene::{Scene, SceneError};
