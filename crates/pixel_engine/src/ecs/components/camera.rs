//! Camera component
//!
//! The camera is a view description consumed by a rendering collaborator:
//! background color for clearing and an ordered list of post-processing
//! filters to apply to the finished frame. The engine core never touches a
//! pixel itself.

use crate::ecs::{Component, EntityId};

/// Post-processing filter applied by the rendering collaborator
///
/// Filters mutate an ARGB pixel buffer in place after the scene has been
/// drawn. Implementations live entirely outside the engine core; the camera
/// only carries them in application order.
pub trait PostProcessingFilter: Send {
    /// Apply the filter to a `width * height` ARGB pixel buffer.
    fn apply(&self, pixels: &mut [u32], width: usize, height: usize);
}

/// View component used to render the scene
///
/// Renderers pick the first active camera returned by
/// [`Scene::components_of`](crate::ecs::Scene::components_of); attach order
/// makes that choice deterministic.
pub struct Camera {
    background_color: u32,
    filters: Vec<Box<dyn PostProcessingFilter>>,
    active: bool,
    owner: Option<EntityId>,
}

impl Camera {
    /// Create a camera clearing to the given ARGB background color.
    pub fn new(background_color: u32) -> Self {
        Self {
            background_color,
            filters: Vec::new(),
            active: true,
            owner: None,
        }
    }

    /// ARGB color the renderer clears to before drawing this camera's view.
    pub fn background_color(&self) -> u32 {
        self.background_color
    }

    /// Change the clear color.
    pub fn set_background_color(&mut self, color: u32) {
        self.background_color = color;
    }

    /// Append a post-processing filter; filters apply in insertion order.
    pub fn add_post_processing_filter(&mut self, filter: Box<dyn PostProcessingFilter>) {
        self.filters.push(filter);
    }

    /// Remove every post-processing filter.
    pub fn clear_post_processing_filters(&mut self) {
        self.filters.clear();
    }

    /// The filters to apply, in order.
    pub fn post_processing_filters(&self) -> &[Box<dyn PostProcessingFilter>] {
        &self.filters
    }

    /// The entity this camera is attached to, if any.
    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }
}

impl Default for Camera {
    /// Opaque black background, no filters.
    fn default() -> Self {
        Self::new(0xff00_0000)
    }
}

impl Component for Camera {
    fn on_attach(&mut self, owner: EntityId) {
        self.owner = Some(owner);
    }

    fn on_detach(&mut self) {
        self.owner = None;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
