use std::collections::BTreeMap;
use std::fmt;

use foundation::LayerKind;
use foundation::math::Vec3;
use tracing::debug;

use crate::legend::Legend;
use crate::object::VisualObject;

/// Addresses one layer of one dataset in the scene.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerRef {
    pub dataset: String,
    pub layer: LayerKind,
}

impl LayerRef {
    pub fn new(dataset: impl Into<String>, layer: LayerKind) -> Self {
        Self {
            dataset: dataset.into(),
            layer,
        }
    }
}

impl fmt::Display for LayerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.dataset, self.layer)
    }
}

/// Scene graph and GUI collaborator.
///
/// Objects and legends are registered hidden; visibility is driven only
/// through [`Renderer::set_object_visible`] and
/// [`Renderer::set_legend_displayed`].
pub trait Renderer {
    fn add_object(&mut self, target: LayerRef, object: &VisualObject);
    fn add_legend(&mut self, target: LayerRef, legend: &Legend);
    fn set_object_visible(&mut self, target: &LayerRef, visible: bool);
    fn set_legend_displayed(&mut self, target: &LayerRef, displayed: bool);
    fn translate_object(&mut self, target: &LayerRef, delta: Vec3);
    fn request_render(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedObject {
    pub visible: bool,
    pub translation: Vec3,
    pub vertex_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLegend {
    pub displayed: bool,
    pub label: String,
}

/// Renderer that only records scene state. Used by the CLI and tests.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    objects: BTreeMap<LayerRef, RenderedObject>,
    legends: BTreeMap<LayerRef, RenderedLegend>,
    render_requests: usize,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object(&self, target: &LayerRef) -> Option<&RenderedObject> {
        self.objects.get(target)
    }

    pub fn legend(&self, target: &LayerRef) -> Option<&RenderedLegend> {
        self.legends.get(target)
    }

    pub fn is_object_visible(&self, target: &LayerRef) -> bool {
        self.objects.get(target).is_some_and(|o| o.visible)
    }

    pub fn is_legend_displayed(&self, target: &LayerRef) -> bool {
        self.legends.get(target).is_some_and(|l| l.displayed)
    }

    pub fn visible_objects(&self) -> Vec<&LayerRef> {
        self.objects
            .iter()
            .filter(|(_, o)| o.visible)
            .map(|(k, _)| k)
            .collect()
    }

    pub fn displayed_legends(&self) -> Vec<&LayerRef> {
        self.legends
            .iter()
            .filter(|(_, l)| l.displayed)
            .map(|(k, _)| k)
            .collect()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn render_requests(&self) -> usize {
        self.render_requests
    }
}

impl Renderer for HeadlessRenderer {
    fn add_object(&mut self, target: LayerRef, object: &VisualObject) {
        debug!(%target, vertices = object.geometry.vertex_count(), "add object");
        self.objects.insert(
            target,
            RenderedObject {
                visible: false,
                translation: object.translation,
                vertex_count: object.geometry.vertex_count(),
            },
        );
    }

    fn add_legend(&mut self, target: LayerRef, legend: &Legend) {
        let label = match legend {
            Legend::ColorBar(bar) => bar.title.clone(),
            Legend::Image { path } => path.clone(),
        };
        debug!(%target, %label, "add legend");
        self.legends.insert(
            target,
            RenderedLegend {
                displayed: false,
                label,
            },
        );
    }

    fn set_object_visible(&mut self, target: &LayerRef, visible: bool) {
        if let Some(object) = self.objects.get_mut(target) {
            debug!(%target, visible, "object visibility");
            object.visible = visible;
        }
    }

    fn set_legend_displayed(&mut self, target: &LayerRef, displayed: bool) {
        if let Some(legend) = self.legends.get_mut(target) {
            legend.displayed = displayed;
        }
    }

    fn translate_object(&mut self, target: &LayerRef, delta: Vec3) {
        if let Some(object) = self.objects.get_mut(target) {
            object.translation = object.translation + delta;
        }
    }

    fn request_render(&mut self) {
        self.render_requests += 1;
    }
}
