//! Wind comfort surface.
//!
//! Built from two tables: nodes (`x`, `y`, `z` per row, row index is the
//! node id) and cells (three node ids plus a Lawson category). Geometry and
//! colors are split so that datasets sharing a mesh only recompute colors.

use foundation::math::{LocalFrame, Vec3};
use foundation::{LayerKind, Rgb};
use formats::Table;
use scene::{Geometry, Legend, Material, VisualObject};
use tracing::warn;

use crate::lawson::LawsonCategory;
use crate::layer::BuiltLayer;
use crate::symbology::{LayerStyle, WIND_LEGEND_IMAGE};

pub const NODE_COLUMNS: [&str; 3] = ["node 1", "node 2", "node 3"];
pub const LAWSON_COLUMN: &str = "Lawson LDDC";

/// Non-indexed triangle soup, three vertices per kept cell.
#[derive(Debug, Clone, PartialEq)]
pub struct WindGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// Cell-table row of each triangle.
    pub cells: Vec<usize>,
}

impl WindGeometry {
    pub fn triangle_count(&self) -> usize {
        self.cells.len()
    }
}

fn cell_nodes(cells: &Table, row: usize) -> Option<[usize; 3]> {
    let row = cells.row(row)?;
    let mut ids = [0usize; 3];
    for (slot, column) in ids.iter_mut().zip(NODE_COLUMNS) {
        *slot = row.get(column)?.as_index()?;
    }
    Some(ids)
}

/// Digest of the cell connectivity only, ignoring categories.
pub fn cell_topology_digest(cells: &Table) -> String {
    let mut hasher = blake3::Hasher::new();
    for i in 0..cells.len() {
        match cell_nodes(cells, i) {
            Some(ids) => {
                for id in ids {
                    hasher.update(&(id as u64).to_le_bytes());
                }
            }
            None => {
                hasher.update(&u64::MAX.to_le_bytes());
            }
        }
    }
    hasher.finalize().to_hex().to_string()
}

pub fn build_wind_geometry(cells: &Table, nodes: &Table, frame: &LocalFrame) -> WindGeometry {
    let node_positions: Vec<Option<Vec3>> = nodes
        .rows()
        .map(|row| Some(frame.to_world(row.number("x")?, row.number("y")?, row.number("z")?)))
        .collect();

    let mut geometry = WindGeometry {
        positions: Vec::with_capacity(cells.len() * 3),
        normals: Vec::with_capacity(cells.len() * 3),
        cells: Vec::with_capacity(cells.len()),
    };
    let mut skipped = 0usize;

    for i in 0..cells.len() {
        let corners = cell_nodes(cells, i).and_then(|ids| {
            let mut out = [Vec3::default(); 3];
            for (corner, id) in out.iter_mut().zip(ids) {
                *corner = (*node_positions.get(id)?)?;
            }
            Some(out)
        });
        let Some(corners) = corners else {
            skipped += 1;
            continue;
        };
        for corner in corners {
            geometry.positions.push(corner.to_f32());
            geometry.normals.push([0.0, 1.0, 0.0]);
        }
        geometry.cells.push(i);
    }

    if skipped > 0 {
        warn!(skipped, nodes = nodes.len(), "wind cells reference unknown nodes");
    }
    geometry
}

/// Per-vertex colors for `geometry` from the Lawson column of `cells`.
/// Unknown categories stay white.
pub fn wind_colors(geometry: &WindGeometry, cells: &Table) -> Vec<Rgb> {
    let mut colors = Vec::with_capacity(geometry.positions.len());
    let mut unknown = 0usize;
    for &cell in &geometry.cells {
        let category = cells
            .row(cell)
            .and_then(|row| row.get(LAWSON_COLUMN))
            .and_then(LawsonCategory::from_value);
        let color = match category {
            Some(category) => category.color(),
            None => {
                unknown += 1;
                Rgb::WHITE
            }
        };
        colors.extend([color; 3]);
    }
    if unknown > 0 {
        warn!(unknown, "wind cells with an unknown Lawson category");
    }
    colors
}

pub fn build_wind(geometry: &WindGeometry, cells: &Table) -> BuiltLayer {
    let style = LayerStyle::for_layer(LayerKind::Wind);
    let object = VisualObject::new(
        LayerKind::Wind,
        Geometry::Mesh {
            positions: geometry.positions.clone(),
            normals: geometry.normals.clone(),
            colors: Some(wind_colors(geometry, cells)),
            indices: None,
        },
        Material::vertex_colored(style.base_color),
    );
    let legend = Legend::Image {
        path: WIND_LEGEND_IMAGE.to_string(),
    };
    BuiltLayer::new(object, Some(legend))
}
