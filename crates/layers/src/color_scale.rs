use foundation::Rgb;

/// Steps sampled from a color map by default.
pub const DEFAULT_STEPS: usize = 32;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ColorMap {
    Rainbow,
    CoolToWarm,
    Blackbody,
    Grayscale,
}

impl ColorMap {
    pub const ALL: [ColorMap; 4] = [
        ColorMap::Rainbow,
        ColorMap::CoolToWarm,
        ColorMap::Blackbody,
        ColorMap::Grayscale,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ColorMap::Rainbow => "rainbow",
            ColorMap::CoolToWarm => "cooltowarm",
            ColorMap::Blackbody => "blackbody",
            ColorMap::Grayscale => "grayscale",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Control points `(position, 0xRRGGBB)` in ascending position.
    pub const fn stops(self) -> &'static [(f32, u32)] {
        match self {
            ColorMap::Rainbow => &[
                (0.0, 0x0000FF),
                (0.2, 0x00FFFF),
                (0.5, 0x00FF00),
                (0.8, 0xFFFF00),
                (1.0, 0xFF0000),
            ],
            ColorMap::CoolToWarm => &[
                (0.0, 0x3C4EC2),
                (0.2, 0x9BBCFF),
                (0.5, 0xDCDCDC),
                (0.8, 0xF6A385),
                (1.0, 0xB40426),
            ],
            ColorMap::Blackbody => &[
                (0.0, 0x000000),
                (0.2, 0x780000),
                (0.5, 0xE63200),
                (0.8, 0xFFFF00),
                (1.0, 0xFFFFFF),
            ],
            ColorMap::Grayscale => &[
                (0.0, 0x000000),
                (0.2, 0x404040),
                (0.5, 0x7F7F80),
                (0.8, 0xBFBFBF),
                (1.0, 0xFFFFFF),
            ],
        }
    }

    /// Continuous lookup at `t` in `[0, 1]`.
    pub fn sample(self, t: f32) -> Rgb {
        let stops = self.stops();
        let t = t.clamp(0.0, 1.0);
        for pair in stops.windows(2) {
            let (p0, c0) = pair[0];
            let (p1, c1) = pair[1];
            if t <= p1 {
                let span = (p1 - p0).max(f32::EPSILON);
                return Rgb::from_hex(c0).lerp(Rgb::from_hex(c1), (t - p0) / span);
            }
        }
        stops.last().map_or(Rgb::WHITE, |(_, c)| Rgb::from_hex(*c))
    }
}

impl std::fmt::Display for ColorMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A color map quantized into steps over a value domain.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    map: ColorMap,
    steps: Vec<Rgb>,
    pub min: f64,
    pub max: f64,
}

impl ColorScale {
    pub fn new(map: ColorMap, steps: usize) -> Self {
        let steps = steps.max(2);
        let colors = (0..steps)
            .map(|i| map.sample(i as f32 / (steps - 1) as f32))
            .collect();
        Self {
            map,
            steps: colors,
            min: 0.0,
            max: 1.0,
        }
    }

    /// Scale whose domain is the `[min, max]` of `values`, found in one pass.
    /// Falls back to `[0, 1]` when `values` is empty.
    pub fn fit(map: ColorMap, values: impl IntoIterator<Item = f64>) -> Self {
        let mut scale = Self::new(map, DEFAULT_STEPS);
        let mut domain: Option<(f64, f64)> = None;
        for v in values {
            if !v.is_finite() {
                continue;
            }
            domain = Some(match domain {
                None => (v, v),
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
            });
        }
        if let Some((lo, hi)) = domain {
            scale.min = lo;
            scale.max = hi;
        }
        scale
    }

    pub fn map(&self) -> ColorMap {
        self.map
    }

    pub fn steps(&self) -> &[Rgb] {
        &self.steps
    }

    /// The minimum maps to the first step, the maximum to the last.
    pub fn color(&self, value: f64) -> Rgb {
        let range = self.max - self.min;
        let t = if range > 0.0 {
            ((value - self.min) / range).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let last = self.steps.len() - 1;
        let index = (t * last as f64).round() as usize;
        self.steps[index.min(last)]
    }
}
