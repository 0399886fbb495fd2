use std::collections::HashMap;

use earcutr::earcut;
use foundation::math::{LocalFrame, Vec3};
use foundation::{LayerKind, Rgb};
use formats::{Building, CityModel, PlanarPoint, Table};
use scene::{ColorBar, Geometry, Legend, Material, VisualObject};
use tracing::{debug, warn};

use crate::color_scale::{ColorMap, ColorScale};
use crate::layer::BuiltLayer;
use crate::symbology::LayerStyle;

pub const ID_COLUMN: &str = "ID";
pub const TOTAL_COLUMN: &str = "Total";

/// Building id → total energy, from rows with both columns set.
pub fn energy_totals(table: &Table) -> HashMap<String, f64> {
    table
        .rows()
        .filter_map(|row| {
            let id = row.get(ID_COLUMN)?.key_string()?;
            Some((id, row.number(TOTAL_COLUMN)?))
        })
        .collect()
}

#[derive(Debug, Default)]
struct MeshBuffers {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    colors: Vec<Rgb>,
    indices: Vec<u32>,
}

impl MeshBuffers {
    fn push_vertex(&mut self, p: Vec3, n: Vec3, color: Rgb) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(p.to_f32());
        self.normals.push(n.to_f32());
        self.colors.push(color);
        index
    }
}

/// Left join of the city buildings against the energy table.
///
/// Every building is extruded; buildings without an energy row stay white.
/// The legend exists only when the table has rows.
pub fn build_buildings(city: &CityModel, energy: Option<&Table>) -> BuiltLayer {
    let style = LayerStyle::for_layer(LayerKind::Energy);
    let totals = energy.map(energy_totals).unwrap_or_default();
    let scale = ColorScale::fit(
        style.color_map.unwrap_or(ColorMap::Rainbow),
        totals.values().copied(),
    );

    let mut mesh = MeshBuffers::default();
    let mut matched = 0usize;
    for building in &city.buildings {
        let color = match totals.get(&building.uuid) {
            Some(total) => {
                matched += 1;
                scale.color(*total)
            }
            None => style.base_color,
        };
        extrude_building(building, color, &mut mesh);
    }
    debug!(
        buildings = city.buildings.len(),
        matched, "energy joined against city model"
    );

    let object = VisualObject::new(
        LayerKind::Energy,
        Geometry::Mesh {
            positions: mesh.positions,
            normals: mesh.normals,
            colors: Some(mesh.colors),
            indices: Some(mesh.indices),
        },
        Material::vertex_colored(Rgb::WHITE),
    );

    let legend = match (energy, style.legend_title) {
        (Some(table), Some(title)) if !table.is_empty() => Some(Legend::ColorBar(
            ColorBar::new(title, scale.map().name(), scale.min, scale.max),
        )),
        _ => None,
    };
    BuiltLayer::new(object, legend)
}

fn footprint_ring(points: &[PlanarPoint]) -> Vec<PlanarPoint> {
    let mut ring = points.to_vec();
    if ring.len() >= 2 {
        let first = ring[0];
        let last = ring[ring.len() - 1];
        if (first.x - last.x).abs() < 1e-9 && (first.y - last.y).abs() < 1e-9 {
            ring.pop();
        }
    }
    ring
}

fn signed_area(ring: &[PlanarPoint]) -> f64 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        * 0.5
}

/// Ring indices of the roof triangles; empty when the ring cannot be
/// triangulated, in which case only the walls are built.
fn roof_triangles(building: &Building, ring: &[PlanarPoint]) -> Vec<usize> {
    if ring.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        warn!(uuid = %building.uuid, "non-finite footprint, building has no roof");
        return Vec::new();
    }
    let coords: Vec<f64> = ring.iter().flat_map(|p| [p.x, p.y]).collect();
    match earcut(&coords, &[], 2) {
        Ok(ix) => ix,
        Err(e) => {
            warn!(uuid = %building.uuid, error = ?e, "roof triangulation failed");
            Vec::new()
        }
    }
}

/// Prism from footprint to `ground + height`. Footprints are already local
/// to the city origin.
fn extrude_building(building: &Building, color: Rgb, mesh: &mut MeshBuffers) {
    let ring = footprint_ring(&building.footprint);
    if ring.len() < 3 {
        debug!(uuid = %building.uuid, "footprint with fewer than three points");
        return;
    }
    let base = building.ground_height;
    let top = building.ground_height + building.height;

    let triangles = roof_triangles(building, &ring);

    let up = Vec3::UP;
    let down = Vec3::new(0.0, -1.0, 0.0);
    let roof: Vec<u32> = ring
        .iter()
        .map(|p| mesh.push_vertex(LocalFrame::relative_to_world(p.x, p.y, top), up, color))
        .collect();
    let floor: Vec<u32> = ring
        .iter()
        .map(|p| mesh.push_vertex(LocalFrame::relative_to_world(p.x, p.y, base), down, color))
        .collect();
    for tri in triangles.chunks_exact(3) {
        mesh.indices.extend([roof[tri[0]], roof[tri[1]], roof[tri[2]]]);
        mesh.indices.extend([floor[tri[2]], floor[tri[1]], floor[tri[0]]]);
    }

    let outward = if signed_area(&ring) >= 0.0 { 1.0 } else { -1.0 };
    let n = ring.len();
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        // Outward ground normal (dy, -dx) for counter-clockwise rings, in world axes.
        let normal = Vec3::new(dy * outward, 0.0, dx * outward).normalized();
        let v0 = mesh.push_vertex(LocalFrame::relative_to_world(a.x, a.y, base), normal, color);
        let v1 = mesh.push_vertex(LocalFrame::relative_to_world(b.x, b.y, base), normal, color);
        let v2 = mesh.push_vertex(LocalFrame::relative_to_world(b.x, b.y, top), normal, color);
        let v3 = mesh.push_vertex(LocalFrame::relative_to_world(a.x, a.y, top), normal, color);
        mesh.indices.extend([v0, v1, v2, v0, v2, v3]);
    }
}

#[cfg(test)]
mod tests {
    use super::{build_buildings, energy_totals, footprint_ring, roof_triangles};
    use foundation::Rgb;
    use formats::{Building, CityModel, PlanarPoint, Table};
    use scene::{Geometry, Legend};

    const CITY: &str = r#"{
        "Origin": {"x": 319189.0, "y": 6396991.0},
        "Buildings": [
            {"UUID": "a", "Footprint": [{"x":0,"y":0},{"x":10,"y":0},{"x":10,"y":10},{"x":0,"y":10}], "Height": 20, "GroundHeight": 2},
            {"UUID": "b", "Footprint": [{"x":20,"y":0},{"x":30,"y":0},{"x":30,"y":10}], "Height": 5}
        ]
    }"#;

    fn vertex_colors(geometry: &Geometry) -> &[Rgb] {
        geometry.colors().unwrap()
    }

    #[test]
    fn totals_skip_incomplete_rows() {
        let table = Table::parse("ID,Total\na,10\nb,\n,5\n7,3\n", true).unwrap();
        let totals = energy_totals(&table);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals["a"], 10.0);
        assert_eq!(totals["7"], 3.0);
    }

    #[test]
    fn prisms_span_ground_to_roof() {
        let city = CityModel::from_json_str(CITY).unwrap();
        let built = build_buildings(&city, None);
        let Geometry::Mesh {
            positions, indices, ..
        } = &built.object.geometry
        else {
            panic!("buildings are a mesh");
        };
        let heights: Vec<f32> = positions.iter().map(|p| p[1]).collect();
        assert!(heights.iter().all(|h| [0.0, 2.0, 5.0, 22.0].contains(h)));
        assert!(heights.contains(&22.0));
        // Square: 2 roof + 2 floor + 8 wall triangles. Triangle: 1 + 1 + 6.
        assert_eq!(indices.as_ref().map(|ix| ix.len() / 3), Some(12 + 8));
        // North maps to negative Z.
        assert!(positions.iter().any(|p| p[2] == -10.0));
    }

    #[test]
    fn unmatched_buildings_are_white_and_no_legend_without_rows() {
        let city = CityModel::from_json_str(CITY).unwrap();
        let built = build_buildings(&city, None);
        assert!(vertex_colors(&built.object.geometry).iter().all(|c| *c == Rgb::WHITE));
        assert!(built.legend.is_none());

        let empty = Table::parse("ID,Total\n", true).unwrap();
        assert!(build_buildings(&city, Some(&empty)).legend.is_none());
    }

    #[test]
    fn joined_buildings_take_scale_colors() {
        let city = CityModel::from_json_str(CITY).unwrap();
        let table = Table::parse("ID,Total\na,100\nz,300\n", true).unwrap();
        let built = build_buildings(&city, Some(&table));

        let colors = vertex_colors(&built.object.geometry);
        assert_ne!(colors[0], Rgb::WHITE);
        assert_eq!(*colors.last().unwrap(), Rgb::WHITE);

        let Some(Legend::ColorBar(bar)) = built.legend else {
            panic!("energy legend expected");
        };
        assert_eq!((bar.min, bar.max), (100.0, 300.0));
    }

    #[test]
    fn untriangulable_footprint_keeps_walls_only() {
        let square = |corner: f64| Building {
            uuid: "n".into(),
            footprint: vec![
                PlanarPoint { x: corner, y: 0.0 },
                PlanarPoint { x: 10.0, y: 0.0 },
                PlanarPoint { x: 10.0, y: 10.0 },
                PlanarPoint { x: 0.0, y: 10.0 },
            ],
            height: 3.0,
            ground_height: 0.0,
        };
        let good = square(0.0);
        assert_eq!(roof_triangles(&good, &footprint_ring(&good.footprint)).len(), 6);
        let bad = square(f64::NAN);
        assert!(roof_triangles(&bad, &footprint_ring(&bad.footprint)).is_empty());

        let city = CityModel {
            origin: PlanarPoint { x: 0.0, y: 0.0 },
            buildings: vec![bad],
        };
        let built = build_buildings(&city, None);
        let indices = match &built.object.geometry {
            scene::Geometry::Mesh { indices, .. } => indices.as_ref().map(Vec::len),
            _ => None,
        };
        // Four walls, two triangles each.
        assert_eq!(indices, Some(8 * 3));
    }
}
