use foundation::LayerKind;
use foundation::math::LocalFrame;
use scene::{ColorBar, Geometry, Legend, Material, VisualObject};

use crate::color_scale::{ColorMap, ColorScale};
use crate::layer::BuiltLayer;
use crate::symbology::LayerStyle;

/// One georeferenced scalar sample in absolute projected coordinates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

/// Builds a colored sprite cloud at the layer's fixed height, plus a color bar.
pub(crate) fn build_point_cloud(
    layer: LayerKind,
    samples: &[Sample],
    frame: &LocalFrame,
) -> BuiltLayer {
    let style = LayerStyle::for_layer(layer);
    let height = style.height.unwrap_or(0.0);
    let scale = ColorScale::fit(
        style.color_map.unwrap_or(ColorMap::Rainbow),
        samples.iter().map(|s| s.value),
    );

    let mut positions = Vec::with_capacity(samples.len());
    let mut colors = Vec::with_capacity(samples.len());
    for s in samples {
        positions.push(frame.to_world(s.x, s.y, height).to_f32());
        colors.push(scale.color(s.value));
    }

    let object = VisualObject::new(
        layer,
        Geometry::Points { positions, colors },
        Material::points(style.point_size.unwrap_or(1.0)),
    );
    let legend = style.legend_title.map(|title| {
        Legend::ColorBar(ColorBar::new(
            title,
            scale.map().name(),
            scale.min,
            scale.max,
        ))
    });
    BuiltLayer::new(object, legend)
}
