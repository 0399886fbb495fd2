use foundation::LayerKind;
use foundation::math::LocalFrame;
use formats::Table;
use tracing::debug;

use crate::layer::BuiltLayer;
use crate::points::{Sample, build_point_cloud};

/// Noise tables are headerless: `x, y, dB` by position.
pub fn noise_samples(table: &Table) -> Vec<Sample> {
    let samples: Vec<Sample> = table
        .rows()
        .filter_map(|row| {
            Some(Sample {
                x: row.number_at(0)?,
                y: row.number_at(1)?,
                value: row.number_at(2)?,
            })
        })
        .collect();
    let skipped = table.len() - samples.len();
    if skipped > 0 {
        debug!(skipped, "noise rows without a numeric value");
    }
    samples
}

pub fn build_noise(table: &Table, frame: &LocalFrame) -> BuiltLayer {
    build_point_cloud(LayerKind::Noise, &noise_samples(table), frame)
}

#[cfg(test)]
mod tests {
    use super::{build_noise, noise_samples};
    use foundation::math::{LocalFrame, Vec2};
    use formats::Table;
    use scene::{Geometry, Legend};

    #[test]
    fn rows_without_numeric_value_are_skipped() {
        let table = Table::parse("10,20,55\n11,21,abc\n12,22,\n13,23,65\n", false).unwrap();
        let samples = noise_samples(&table);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].value, 65.0);
    }

    #[test]
    fn cloud_sits_at_fixed_height_relative_to_origin() {
        let table = Table::parse("110,220,40\n120,200,80\n", false).unwrap();
        let frame = LocalFrame::new(Vec2::new(100.0, 200.0));
        let built = build_noise(&table, &frame);

        let Geometry::Points { positions, colors } = &built.object.geometry else {
            panic!("noise should be a point cloud");
        };
        assert_eq!(positions, &vec![[10.0, 58.0, -20.0], [20.0, 58.0, 0.0]]);
        assert_eq!(colors.len(), 2);
        assert_eq!(built.object.material.point_size, Some(4.0));

        let Some(Legend::ColorBar(bar)) = &built.legend else {
            panic!("noise has a color bar");
        };
        assert_eq!((bar.min, bar.max), (40.0, 80.0));
        assert_eq!(bar.title, "Noise (dB)");
    }
}
