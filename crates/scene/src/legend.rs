/// Number of labels along a color bar.
pub const TICK_COUNT: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub enum Legend {
    ColorBar(ColorBar),
    /// Static image legend, e.g. the Lawson wind chart.
    Image { path: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorBar {
    pub title: String,
    pub color_map: String,
    pub min: f64,
    pub max: f64,
}

impl ColorBar {
    pub fn new(title: impl Into<String>, color_map: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            title: title.into(),
            color_map: color_map.into(),
            min,
            max,
        }
    }

    /// Labels from `max` down to `min`, evenly spaced.
    pub fn ticks(&self) -> Vec<String> {
        let step = (self.max - self.min) / (TICK_COUNT - 1) as f64;
        (0..TICK_COUNT)
            .map(|i| format_significant(self.max - i as f64 * step, 3))
            .collect()
    }
}

/// Formats `value` with `digits` significant digits, switching to exponent
/// notation when the integer part would need more digits than that.
pub fn format_significant(value: f64, digits: usize) -> String {
    let digits = digits.max(1);
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return format!("{:.*}", digits - 1, 0.0);
    }

    let mut exponent = value.abs().log10().floor() as i32;
    let scale = 10f64.powi(digits as i32 - 1 - exponent);
    let rounded = (value * scale).round() / scale;
    if rounded.abs() >= 10f64.powi(exponent + 1) {
        exponent += 1;
    }

    if exponent < -6 || exponent >= digits as i32 {
        let mantissa = rounded / 10f64.powi(exponent);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{:.*}e{sign}{}", digits - 1, mantissa, exponent.abs())
    } else {
        let decimals = (digits as i32 - 1 - exponent).max(0) as usize;
        format!("{rounded:.decimals$}")
    }
}

#[cfg(test)]
mod tests {
    use super::{ColorBar, format_significant};
    use pretty_assertions::assert_eq;

    #[test]
    fn significant_digits() {
        assert_eq!(format_significant(0.0, 3), "0.00");
        assert_eq!(format_significant(1.0, 3), "1.00");
        assert_eq!(format_significant(58.25, 3), "58.3");
        assert_eq!(format_significant(-3.14159, 3), "-3.14");
        assert_eq!(format_significant(0.012345, 3), "0.0123");
        assert_eq!(format_significant(999.6, 3), "1.00e+3");
        assert_eq!(format_significant(1234.0, 3), "1.23e+3");
    }

    #[test]
    fn ticks_run_from_max_to_min() {
        let bar = ColorBar::new("Noise (dB)", "rainbow", 40.0, 90.0);
        assert_eq!(
            bar.ticks(),
            vec!["90.0", "80.0", "70.0", "60.0", "50.0", "40.0"]
        );
    }

    #[test]
    fn flat_domain_repeats_one_label() {
        let bar = ColorBar::new("Energy", "rainbow", 5.0, 5.0);
        assert!(bar.ticks().iter().all(|t| t == "5.00"));
    }
}
