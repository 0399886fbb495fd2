use foundation::math::Vec3;
use foundation::{LayerKind, Rgb};

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Sprite point cloud with one color per point.
    Points {
        positions: Vec<[f32; 3]>,
        colors: Vec<Rgb>,
    },
    /// Triangle mesh. Non-indexed when `indices` is `None`.
    Mesh {
        positions: Vec<[f32; 3]>,
        normals: Vec<[f32; 3]>,
        colors: Option<Vec<Rgb>>,
        indices: Option<Vec<u32>>,
    },
}

impl Geometry {
    pub fn vertex_count(&self) -> usize {
        match self {
            Geometry::Points { positions, .. } | Geometry::Mesh { positions, .. } => {
                positions.len()
            }
        }
    }

    pub fn triangle_count(&self) -> usize {
        match self {
            Geometry::Points { .. } => 0,
            Geometry::Mesh {
                positions, indices, ..
            } => match indices {
                Some(indices) => indices.len() / 3,
                None => positions.len() / 3,
            },
        }
    }

    pub fn colors(&self) -> Option<&[Rgb]> {
        match self {
            Geometry::Points { colors, .. } => Some(colors),
            Geometry::Mesh { colors, .. } => colors.as_deref(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Material {
    pub color: Rgb,
    pub opacity: f32,
    pub flat_shading: bool,
    pub vertex_colors: bool,
    /// Screen-space sprite size; only meaningful for point clouds.
    pub point_size: Option<f32>,
}

impl Material {
    pub fn points(size: f32) -> Self {
        Self {
            color: Rgb::WHITE,
            opacity: 1.0,
            flat_shading: false,
            vertex_colors: true,
            point_size: Some(size),
        }
    }

    pub fn solid(color: Rgb) -> Self {
        Self {
            color,
            opacity: 1.0,
            flat_shading: false,
            vertex_colors: false,
            point_size: None,
        }
    }

    pub fn vertex_colored(base: Rgb) -> Self {
        Self {
            vertex_colors: true,
            ..Self::solid(base)
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_flat_shading(mut self) -> Self {
        self.flat_shading = true;
        self
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }
}

/// One renderable built for one layer of one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualObject {
    pub layer: LayerKind,
    pub geometry: Geometry,
    pub material: Material,
    pub translation: Vec3,
}

impl VisualObject {
    pub fn new(layer: LayerKind, geometry: Geometry, material: Material) -> Self {
        Self {
            layer,
            geometry,
            material,
            translation: Vec3::default(),
        }
    }
}
