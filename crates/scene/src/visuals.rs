use foundation::LayerKind;
use foundation::math::Vec3;

use crate::components::Visibility;
use crate::legend::Legend;
use crate::object::VisualObject;
use crate::render::{LayerRef, Renderer};
use crate::slots::{LayerSlots, SlotError};

/// Built objects and legends of one dataset, plus their current visibility.
///
/// A layer is present only once its loads resolved and its builder ran.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetVisuals {
    name: String,
    objects: LayerSlots<VisualObject>,
    legends: LayerSlots<Legend>,
    visibility: [Visibility; LayerKind::COUNT],
}

impl DatasetVisuals {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: LayerSlots::new(),
            legends: LayerSlots::new(),
            visibility: [Visibility::hidden(); LayerKind::COUNT],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layer_ref(&self, layer: LayerKind) -> LayerRef {
        LayerRef::new(self.name.clone(), layer)
    }

    pub fn objects(&self) -> &LayerSlots<VisualObject> {
        &self.objects
    }

    pub fn legends(&self) -> &LayerSlots<Legend> {
        &self.legends
    }

    pub fn object(&self, layer: LayerKind) -> Option<&VisualObject> {
        self.objects.get(layer)
    }

    pub fn legend(&self, layer: LayerKind) -> Option<&Legend> {
        self.legends.get(layer)
    }

    pub fn has_layer(&self, layer: LayerKind) -> bool {
        self.objects.contains(layer)
    }

    pub fn is_visible(&self, layer: LayerKind) -> bool {
        self.visibility[layer.index()].visible
    }

    /// Stores a built layer and registers it, hidden, with the renderer.
    pub fn install(
        &mut self,
        object: VisualObject,
        legend: Option<Legend>,
        renderer: &mut dyn Renderer,
    ) -> Result<(), SlotError> {
        let layer = object.layer;
        self.objects.insert(layer, object)?;
        if let Some(legend) = legend {
            self.legends.insert(layer, legend)?;
        }
        if let Some(object) = self.objects.get(layer) {
            renderer.add_object(self.layer_ref(layer), object);
        }
        if let Some(legend) = self.legends.get(layer) {
            renderer.add_legend(self.layer_ref(layer), legend);
        }
        Ok(())
    }

    /// Shows or hides the object and its legend together. Returns whether
    /// anything changed.
    pub(crate) fn set_visible(
        &mut self,
        layer: LayerKind,
        visible: bool,
        renderer: &mut dyn Renderer,
    ) -> bool {
        if !self.visibility[layer.index()].set(visible) {
            return false;
        }
        let target = self.layer_ref(layer);
        renderer.set_object_visible(&target, visible);
        if self.legends.contains(layer) {
            renderer.set_legend_displayed(&target, visible);
        }
        true
    }

    pub(crate) fn translate(&mut self, layer: LayerKind, delta: Vec3, renderer: &mut dyn Renderer) {
        if let Some(object) = self.objects.get_mut(layer) {
            object.translation = object.translation + delta;
            renderer.translate_object(&self.layer_ref(layer), delta);
        }
    }
}
