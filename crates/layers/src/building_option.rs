use foundation::LayerKind;
use foundation::math::LocalFrame;
use formats::StlMesh;
use scene::{Geometry, Material, VisualObject};

use crate::layer::BuiltLayer;
use crate::symbology::LayerStyle;

/// Places an absolute-coordinate STL massing model in the local frame.
///
/// STL is z-up: `(x, y, z)` maps to `(x - ox, z, -(y - oy))`.
pub fn build_building_option(mesh: &StlMesh, frame: &LocalFrame) -> BuiltLayer {
    let style = LayerStyle::for_layer(LayerKind::BuildingOption);
    let positions = mesh
        .positions
        .iter()
        .map(|[x, y, z]| {
            frame
                .to_world(f64::from(*x), f64::from(*y), f64::from(*z))
                .to_f32()
        })
        .collect();
    let normals = mesh.normals.iter().map(|[x, y, z]| [*x, *z, -*y]).collect();

    let object = VisualObject::new(
        LayerKind::BuildingOption,
        Geometry::Mesh {
            positions,
            normals,
            colors: None,
            indices: None,
        },
        Material::solid(style.base_color)
            .with_opacity(style.opacity)
            .with_flat_shading(),
    );
    BuiltLayer::new(object, None)
}
