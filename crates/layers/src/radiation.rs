use foundation::LayerKind;
use foundation::math::LocalFrame;
use formats::Table;
use tracing::debug;

use crate::layer::BuiltLayer;
use crate::points::{Sample, build_point_cloud};

/// Radiation tables carry a header with `x`, `y` and `value` columns.
pub fn radiation_samples(table: &Table) -> Vec<Sample> {
    let samples: Vec<Sample> = table
        .rows()
        .filter_map(|row| {
            Some(Sample {
                x: row.number("x")?,
                y: row.number("y")?,
                value: row.number("value")?,
            })
        })
        .collect();
    let skipped = table.len() - samples.len();
    if skipped > 0 {
        debug!(skipped, "radiation rows without a value");
    }
    samples
}

pub fn build_radiation(table: &Table, frame: &LocalFrame) -> BuiltLayer {
    build_point_cloud(LayerKind::Radiation, &radiation_samples(table), frame)
}
