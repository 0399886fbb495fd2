use foundation::Rgb;
use formats::Value;

/// Lawson LDDC pedestrian wind comfort categories.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LawsonCategory {
    FrequentSitting,
    OccasionalSitting,
    Standing,
    Walking,
    Uncomfortable,
    Unsafe,
}

impl LawsonCategory {
    pub const ALL: [LawsonCategory; 6] = [
        LawsonCategory::FrequentSitting,
        LawsonCategory::OccasionalSitting,
        LawsonCategory::Standing,
        LawsonCategory::Walking,
        LawsonCategory::Uncomfortable,
        LawsonCategory::Unsafe,
    ];

    /// Categories are stored as indices 0..=5 in cell tables.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        Self::from_index(value.as_index()?)
    }

    pub const fn hex(self) -> u32 {
        match self {
            LawsonCategory::FrequentSitting => 0x0000FF,
            LawsonCategory::OccasionalSitting => 0x00AAFF,
            LawsonCategory::Standing => 0xAAFFFF,
            LawsonCategory::Walking => 0x55FF00,
            LawsonCategory::Uncomfortable => 0xFFFF00,
            LawsonCategory::Unsafe => 0xFF5500,
        }
    }

    pub fn color(self) -> Rgb {
        Rgb::from_hex(self.hex())
    }
}
