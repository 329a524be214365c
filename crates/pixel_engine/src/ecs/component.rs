//! Component contract consumed by the scene

use std::any::Any;

use super::EntityId;

/// A typed unit of data/behavior attached to exactly one entity
///
/// The concrete Rust type is the component kind: an entity holds at most one
/// instance of each kind. Attach/detach notifications and the active flag
/// are part of the contract; the lifecycle hooks default to no-ops so pure
/// data components stay boilerplate-free.
pub trait Component: Any + Send {
    /// Called after this component has been attached to an entity.
    ///
    /// `owner` is a non-owning back-reference for later lookups; components
    /// that need it should store it.
    fn on_attach(&mut self, _owner: EntityId) {}

    /// Called right before this component is discarded, either by explicit
    /// removal or because its owning entity is being destroyed.
    fn on_detach(&mut self) {}

    /// Whether this component should be considered by consumers that filter
    /// on activity (e.g. a renderer picking the first active camera).
    fn is_active(&self) -> bool {
        true
    }

    /// Toggle the active flag. Components without an activity notion can
    /// keep the default no-op.
    fn set_active(&mut self, _active: bool) {}

    /// Upcast for downcasting to the concrete component type.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete component type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
