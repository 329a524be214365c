//! Scene: entity set plus the component kind index

use std::any::{type_name, TypeId};
use std::collections::HashMap;

use slotmap::SlotMap;
use thiserror::Error;

use super::{Component, EntityId};

/// Errors raised by scene mutations
#[derive(Error, Debug)]
pub enum SceneError {
    /// The entity id does not (or no longer does) refer to a live entity
    #[error("entity does not exist in this scene")]
    UnknownEntity,

    /// The entity already holds a component of this concrete kind
    #[error("entity '{entity}' already has a component of kind {kind}")]
    DuplicateComponent {
        /// Display name of the entity
        entity: String,
        /// Component kind that was rejected
        kind: &'static str,
    },

    /// The entity has no component of the requested kind
    #[error("entity '{entity}' has no component of kind {kind}")]
    MissingComponent {
        /// Display name of the entity
        entity: String,
        /// Component kind that was requested
        kind: &'static str,
    },
}

struct ComponentRecord {
    kind: TypeId,
    component: Box<dyn Component>,
}

struct EntityRecord {
    name: String,
    // Attach order; also the detach order on destruction.
    components: Vec<ComponentRecord>,
}

/// Owner of the entity set and the component kind index
///
/// All entity and component lifecycle goes through the scene so the
/// `TypeId -> [EntityId]` kind index stays consistent with the entity set on
/// every add and remove. Queries by kind ([`Scene::components_of`]) are
/// served from that index in attach order; they never scan the entity set.
pub struct Scene {
    entities: SlotMap<EntityId, EntityRecord>,
    kind_index: HashMap<TypeId, Vec<EntityId>>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self {
            entities: SlotMap::with_key(),
            kind_index: HashMap::new(),
        }
    }

    /// Create a new entity with a display name and no components.
    pub fn create_entity(&mut self, name: impl Into<String>) -> EntityId {
        self.entities.insert(EntityRecord {
            name: name.into(),
            components: Vec::new(),
        })
    }

    /// Destroy an entity, detaching and discarding all of its components.
    ///
    /// Components receive `on_detach` in the order they were attached; the
    /// kind index is updated before the entity record is discarded, so no
    /// query can observe a destroyed component.
    pub fn destroy_entity(&mut self, id: EntityId) -> Result<(), SceneError> {
        let mut record = self.entities.remove(id).ok_or(SceneError::UnknownEntity)?;
        for rec in &mut record.components {
            if let Some(ids) = self.kind_index.get_mut(&rec.kind) {
                ids.retain(|&e| e != id);
            }
            rec.component.on_detach();
        }
        log::debug!(
            "destroyed entity '{}' ({} components)",
            record.name,
            record.components.len()
        );
        Ok(())
    }

    /// Destroy every entity in the scene (full detach cascade).
    pub fn clear(&mut self) {
        let ids: Vec<EntityId> = self.entities.keys().collect();
        for id in ids {
            // Ids were just collected from the live set; destroy cannot fail.
            let _ = self.destroy_entity(id);
        }
    }

    /// Whether `id` refers to a live entity in this scene.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Display name of a live entity.
    pub fn entity_name(&self, id: EntityId) -> Option<&str> {
        self.entities.get(id).map(|record| record.name.as_str())
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Iterator over all live entity ids.
    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys()
    }

    /// Attach a component to an entity.
    ///
    /// Rejected if the entity already holds a component of the same concrete
    /// kind; on success the kind index is updated and `on_attach` fires with
    /// the owning entity id.
    pub fn add_component<T: Component>(
        &mut self,
        id: EntityId,
        component: T,
    ) -> Result<(), SceneError> {
        let kind = TypeId::of::<T>();
        let record = self.entities.get_mut(id).ok_or(SceneError::UnknownEntity)?;
        if record.components.iter().any(|rec| rec.kind == kind) {
            return Err(SceneError::DuplicateComponent {
                entity: record.name.clone(),
                kind: type_name::<T>(),
            });
        }
        let mut boxed: Box<dyn Component> = Box::new(component);
        boxed.on_attach(id);
        record.components.push(ComponentRecord {
            kind,
            component: boxed,
        });
        self.kind_index.entry(kind).or_default().push(id);
        Ok(())
    }

    /// Detach and discard the entity's component of kind `T`.
    ///
    /// The kind index is updated immediately; `on_detach` fires before the
    /// component is dropped.
    pub fn remove_component<T: Component>(&mut self, id: EntityId) -> Result<(), SceneError> {
        let kind = TypeId::of::<T>();
        let record = self.entities.get_mut(id).ok_or(SceneError::UnknownEntity)?;
        let position = record
            .components
            .iter()
            .position(|rec| rec.kind == kind)
            .ok_or_else(|| SceneError::MissingComponent {
                entity: record.name.clone(),
                kind: type_name::<T>(),
            })?;
        let mut rec = record.components.remove(position);
        rec.component.on_detach();
        if let Some(ids) = self.kind_index.get_mut(&kind) {
            ids.retain(|&e| e != id);
        }
        Ok(())
    }

    /// The entity's component of kind `T`, if present.
    pub fn component<T: Component>(&self, id: EntityId) -> Option<&T> {
        let kind = TypeId::of::<T>();
        self.entities
            .get(id)?
            .components
            .iter()
            .find(|rec| rec.kind == kind)
            .and_then(|rec| rec.component.as_any().downcast_ref::<T>())
    }

    /// Mutable access to the entity's component of kind `T`, if present.
    pub fn component_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        let kind = TypeId::of::<T>();
        self.entities
            .get_mut(id)?
            .components
            .iter_mut()
            .find(|rec| rec.kind == kind)
            .and_then(|rec| rec.component.as_any_mut().downcast_mut::<T>())
    }

    /// Whether the entity holds a component of kind `T`.
    pub fn has_component<T: Component>(&self, id: EntityId) -> bool {
        self.component::<T>(id).is_some()
    }

    /// All live components of kind `T` across the scene, in attach order.
    ///
    /// Served from the kind index, so it is cheap enough to call every frame.
    /// The order is deterministic: consumers that tie-break on "first" (for
    /// example a renderer selecting the first active camera) see the same
    /// winner frame after frame. Activity filtering is left to the caller
    /// via [`Component::is_active`].
    pub fn components_of<T: Component>(&self) -> impl Iterator<Item = &T> + '_ {
        let kind = TypeId::of::<T>();
        self.kind_index
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(move |&id| {
                self.entities
                    .get(id)?
                    .components
                    .iter()
                    .find(|rec| rec.kind == kind)
            })
            .filter_map(|rec| rec.component.as_any().downcast_ref::<T>())
    }

    /// Owning entities of every live component of kind `T`, in attach order.
    pub fn entities_with<T: Component>(&self) -> impl Iterator<Item = EntityId> + '_ {
        let kind = TypeId::of::<T>();
        self.kind_index
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .copied()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    struct Probe {
        label: u32,
        owner: Option<EntityId>,
        detached: Arc<AtomicUsize>,
    }

    impl Probe {
        fn new(label: u32) -> Self {
            Self {
                label,
                owner: None,
                detached: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn with_counter(label: u32, detached: Arc<AtomicUsize>) -> Self {
            Self {
                label,
                owner: None,
                detached,
            }
        }
    }

    impl Component for Probe {
        fn on_attach(&mut self, owner: EntityId) {
            self.owner = Some(owner);
        }

        fn on_detach(&mut self) {
            self.owner = None;
            self.detached.fetch_add(1, Ordering::SeqCst);
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    struct Marker;

    impl Component for Marker {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    #[test]
    fn test_duplicate_kind_is_rejected() {
        let mut scene = Scene::new();
        let entity = scene.create_entity("player");
        scene.add_component(entity, Probe::new(1)).unwrap();

        let err = scene.add_component(entity, Probe::new(2)).unwrap_err();
        assert!(matches!(err, SceneError::DuplicateComponent { .. }));

        // The original instance is still the one attached.
        assert_eq!(scene.component::<Probe>(entity).unwrap().label, 1);
    }

    #[test]
    fn test_attach_sets_owner_back_reference() {
        let mut scene = Scene::new();
        let entity = scene.create_entity("player");
        scene.add_component(entity, Probe::new(1)).unwrap();
        assert_eq!(scene.component::<Probe>(entity).unwrap().owner, Some(entity));
    }

    #[test]
    fn test_components_of_preserves_attach_order() {
        let mut scene = Scene::new();
        let a = scene.create_entity("a");
        let b = scene.create_entity("b");
        scene.add_component(a, Probe::new(1)).unwrap();
        scene.add_component(b, Probe::new(2)).unwrap();

        let labels: Vec<u32> = scene.components_of::<Probe>().map(|p| p.label).collect();
        assert_eq!(labels, vec![1, 2]);

        scene.remove_component::<Probe>(a).unwrap();
        let labels: Vec<u32> = scene.components_of::<Probe>().map(|p| p.label).collect();
        assert_eq!(labels, vec![2]);
    }

    #[test]
    fn test_destroy_entity_detaches_all_components() {
        let mut scene = Scene::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let entity = scene.create_entity("doomed");
        scene
            .add_component(entity, Probe::with_counter(1, counter.clone()))
            .unwrap();
        scene.add_component(entity, Marker).unwrap();

        scene.destroy_entity(entity).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!scene.contains(entity));
        assert_eq!(scene.components_of::<Probe>().count(), 0);
        assert_eq!(scene.components_of::<Marker>().count(), 0);
    }

    #[test]
    fn test_clear_detaches_every_component_once() {
        let mut scene = Scene::new();
        let counter = Arc::new(AtomicUsize::new(0));
        for i in 0..3 {
            let entity = scene.create_entity(format!("e{i}"));
            scene
                .add_component(entity, Probe::with_counter(i, counter.clone()))
                .unwrap();
        }

        scene.clear();
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(scene.entity_count(), 0);
    }

    #[test]
    fn test_stale_id_fails_lookups() {
        let mut scene = Scene::new();
        let entity = scene.create_entity("ghost");
        scene.destroy_entity(entity).unwrap();

        assert!(scene.component::<Probe>(entity).is_none());
        assert!(matches!(
            scene.add_component(entity, Probe::new(1)),
            Err(SceneError::UnknownEntity)
        ));
    }

    #[test]
    fn test_remove_missing_component_reports_kind() {
        let mut scene = Scene::new();
        let entity = scene.create_entity("bare");
        let err = scene.remove_component::<Probe>(entity).unwrap_err();
        assert!(matches!(err, SceneError::MissingComponent { .. }));
    }
}
