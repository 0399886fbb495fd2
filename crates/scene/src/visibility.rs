use foundation::LayerKind;
use foundation::math::Vec3;
use tracing::debug;

use crate::render::Renderer;
use crate::visuals::DatasetVisuals;

/// Distance moved by one nudge of the point-cloud layers.
pub const NUDGE_STEP: f64 = 0.1;

/// The current GUI selection: one option plus per-layer toggles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityConfig {
    pub selected_option: String,
    layers: [bool; LayerKind::COUNT],
}

impl VisibilityConfig {
    /// All layers enabled.
    pub fn new(selected_option: impl Into<String>) -> Self {
        Self {
            selected_option: selected_option.into(),
            layers: [true; LayerKind::COUNT],
        }
    }

    pub fn with_layer(mut self, layer: LayerKind, enabled: bool) -> Self {
        self.set_layer(layer, enabled);
        self
    }

    pub fn set_layer(&mut self, layer: LayerKind, enabled: bool) {
        self.layers[layer.index()] = enabled;
    }

    pub fn select(&mut self, option: impl Into<String>) {
        self.selected_option = option.into();
    }

    pub fn is_layer_enabled(&self, layer: LayerKind) -> bool {
        self.layers[layer.index()]
    }

    pub fn enabled_layers(&self) -> impl Iterator<Item = LayerKind> + '_ {
        LayerKind::ALL
            .into_iter()
            .filter(|l| self.is_layer_enabled(*l))
    }

    /// Whether `layer` of dataset `name` should be shown, ignoring presence.
    pub fn wants(&self, name: &str, layer: LayerKind) -> bool {
        name == self.selected_option && self.is_layer_enabled(layer)
    }
}

/// Reconciles every dataset's objects and legends against `config`.
///
/// A layer is shown iff its dataset is the selected option, the layer is
/// toggled on, and the layer was built. Returns the number of flips; a
/// second call with the same config returns 0 and requests no render.
pub fn apply<'a>(
    datasets: impl IntoIterator<Item = &'a mut DatasetVisuals>,
    config: &VisibilityConfig,
    renderer: &mut dyn Renderer,
) -> usize {
    let mut flips = 0;
    for dataset in datasets {
        for layer in LayerKind::ALL {
            let visible = dataset.has_layer(layer) && config.wants(dataset.name(), layer);
            if dataset.set_visible(layer, visible, renderer) {
                flips += 1;
            }
        }
    }
    if flips > 0 {
        debug!(flips, selected = %config.selected_option, "visibility applied");
        renderer.request_render();
    }
    flips
}

/// Moves the visible noise and radiation clouds vertically by `delta`.
/// Returns how many objects moved.
pub fn nudge<'a>(
    datasets: impl IntoIterator<Item = &'a mut DatasetVisuals>,
    delta: f64,
    renderer: &mut dyn Renderer,
) -> usize {
    let offset = Vec3::new(0.0, delta, 0.0);
    let mut moved = 0;
    for dataset in datasets {
        for layer in [LayerKind::Noise, LayerKind::Radiation] {
            if dataset.is_visible(layer) {
                dataset.translate(layer, offset, renderer);
                moved += 1;
            }
        }
    }
    if moved > 0 {
        renderer.request_render();
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::{NUDGE_STEP, VisibilityConfig, apply, nudge};
    use crate::legend::{ColorBar, Legend};
    use crate::object::{Geometry, Material, VisualObject};
    use crate::render::{HeadlessRenderer, LayerRef};
    use crate::visuals::DatasetVisuals;
    use foundation::LayerKind;
    use pretty_assertions::assert_eq;

    fn cloud(layer: LayerKind) -> VisualObject {
        VisualObject::new(
            layer,
            Geometry::Points {
                positions: vec![[0.0, 58.0, 0.0]],
                colors: vec![foundation::Rgb::WHITE],
            },
            Material::points(4.0),
        )
    }

    fn dataset(name: &str, layers: &[LayerKind], renderer: &mut HeadlessRenderer) -> DatasetVisuals {
        let mut d = DatasetVisuals::new(name);
        for layer in layers {
            let legend = Legend::ColorBar(ColorBar::new(layer.key(), "rainbow", 0.0, 1.0));
            d.install(cloud(*layer), Some(legend), renderer).unwrap();
        }
        d
    }

    #[test]
    fn only_selected_dataset_is_shown() {
        let mut r = HeadlessRenderer::new();
        let mut a = dataset("Option 1", &[LayerKind::Noise, LayerKind::Radiation], &mut r);
        let mut b = dataset("Option 2", &[LayerKind::Noise], &mut r);

        let config = VisibilityConfig::new("Option 1");
        assert_eq!(apply([&mut a, &mut b], &config, &mut r), 2);

        let shown: Vec<String> = r.visible_objects().iter().map(|t| t.to_string()).collect();
        assert_eq!(shown, vec!["Option 1:noise", "Option 1:radiation"]);
        assert_eq!(r.displayed_legends().len(), 2);
    }

    #[test]
    fn apply_is_idempotent() {
        let mut r = HeadlessRenderer::new();
        let mut a = dataset("A", &[LayerKind::Noise], &mut r);
        let config = VisibilityConfig::new("A");

        assert_eq!(apply([&mut a], &config, &mut r), 1);
        let before = r.render_requests();
        assert_eq!(apply([&mut a], &config, &mut r), 0);
        assert_eq!(r.render_requests(), before);
        assert!(r.is_object_visible(&LayerRef::new("A", LayerKind::Noise)));
    }

    #[test]
    fn legend_follows_object() {
        let mut r = HeadlessRenderer::new();
        let mut a = dataset("A", &[LayerKind::Noise], &mut r);
        let target = LayerRef::new("A", LayerKind::Noise);

        apply([&mut a], &VisibilityConfig::new("A"), &mut r);
        assert!(r.is_object_visible(&target) && r.is_legend_displayed(&target));

        let off = VisibilityConfig::new("A").with_layer(LayerKind::Noise, false);
        assert_eq!(apply([&mut a], &off, &mut r), 1);
        assert!(!r.is_object_visible(&target));
        assert!(!r.is_legend_displayed(&target));
    }

    #[test]
    fn absent_layers_stay_hidden() {
        let mut r = HeadlessRenderer::new();
        let mut b = dataset("B", &[LayerKind::Noise], &mut r);
        apply([&mut b], &VisibilityConfig::new("B"), &mut r);
        assert!(!b.is_visible(LayerKind::Radiation));
        assert!(!b.is_visible(LayerKind::Wind));
        assert_eq!(r.object_count(), 1);
    }

    #[test]
    fn nudge_moves_visible_clouds_only() {
        let mut r = HeadlessRenderer::new();
        let mut a = dataset("A", &[LayerKind::Noise, LayerKind::Radiation], &mut r);
        let config = VisibilityConfig::new("A").with_layer(LayerKind::Radiation, false);
        apply([&mut a], &config, &mut r);

        assert_eq!(nudge([&mut a], NUDGE_STEP, &mut r), 1);
        let noise = LayerRef::new("A", LayerKind::Noise);
        assert_eq!(r.object(&noise).unwrap().translation.y, NUDGE_STEP);
        assert_eq!(a.object(LayerKind::Noise).unwrap().translation.y, NUDGE_STEP);
        assert_eq!(a.object(LayerKind::Radiation).unwrap().translation.y, 0.0);
    }
}
