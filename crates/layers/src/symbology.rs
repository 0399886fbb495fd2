use foundation::{LayerKind, Rgb};

use crate::color_scale::ColorMap;

/// Wind comfort chart shown as the wind legend.
pub const WIND_LEGEND_IMAGE: &str = "data/wind/surfaceLawson.png";

/// Fixed presentation rules for one layer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayerStyle {
    pub color_map: Option<ColorMap>,
    /// Constant world height for point clouds.
    pub height: Option<f64>,
    pub point_size: Option<f32>,
    pub base_color: Rgb,
    pub opacity: f32,
    pub legend_title: Option<&'static str>,
}

impl LayerStyle {
    pub const fn new(base_color: Rgb) -> Self {
        Self {
            color_map: None,
            height: None,
            point_size: None,
            base_color,
            opacity: 1.0,
            legend_title: None,
        }
    }

    pub const fn for_layer(layer: LayerKind) -> Self {
        match layer {
            LayerKind::BuildingOption => Self {
                opacity: 0.8,
                ..Self::new(Rgb::from_hex(0xAAAAAA))
            },
            LayerKind::Energy => Self {
                color_map: Some(ColorMap::Rainbow),
                legend_title: Some("Energy"),
                ..Self::new(Rgb::WHITE)
            },
            LayerKind::Noise => Self {
                color_map: Some(ColorMap::Rainbow),
                height: Some(58.0),
                point_size: Some(4.0),
                legend_title: Some("Noise (dB)"),
                ..Self::new(Rgb::WHITE)
            },
            LayerKind::Radiation => Self {
                color_map: Some(ColorMap::Blackbody),
                height: Some(50.0),
                point_size: Some(15.0),
                legend_title: Some("Radiation (kWh/m2)"),
                ..Self::new(Rgb::WHITE)
            },
            LayerKind::Wind => Self::new(Rgb::from_hex(0xF5F5F5)),
        }
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self::new(Rgb::WHITE)
    }
}

#[cfg(test)]
mod tests {
    use super::LayerStyle;
    use crate::color_scale::ColorMap;
    use foundation::LayerKind;

    #[test]
    fn point_layers_float_above_ground() {
        let noise = LayerStyle::for_layer(LayerKind::Noise);
        let radiation = LayerStyle::for_layer(LayerKind::Radiation);
        assert_eq!(noise.height, Some(58.0));
        assert_eq!(radiation.height, Some(50.0));
        assert_eq!(noise.color_map, Some(ColorMap::Rainbow));
        assert_eq!(radiation.color_map, Some(ColorMap::Blackbody));
    }

    #[test]
    fn massing_is_translucent_grey() {
        let style = LayerStyle::for_layer(LayerKind::BuildingOption);
        assert_eq!(style.base_color.to_hex(), 0xAAAAAA);
        assert_eq!(style.opacity, 0.8);
        assert!(style.legend_title.is_none());
    }
}
