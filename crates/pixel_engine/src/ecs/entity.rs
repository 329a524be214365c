//! Entity identifiers

slotmap::new_key_type! {
    /// Opaque, generation-safe identifier for an entity in a
    /// [`Scene`](crate::ecs::Scene).
    ///
    /// Ids are only meaningful to the scene that allocated them. A stale id
    /// (the entity was destroyed) simply fails lookups; it can never alias a
    /// newer entity because the generation changes on reuse.
    pub struct EntityId;
}
