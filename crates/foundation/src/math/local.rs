use super::{Vec2, Vec3};

/// Origin used when no city model is available.
///
/// Matches the `Origin` of the reference city model the datasets were
/// exported against.
pub const FALLBACK_ORIGIN: Vec2 = Vec2::new(319_189.0, 6_396_991.0);

/// Shared local frame every spatial layer of a dataset renders in.
///
/// Source data is in absolute projected coordinates (metres, x east,
/// y north). The local frame subtracts `origin` and maps ground north onto
/// negative world Z so the scene is right-handed with Y up:
///
/// - world X = x - origin.x
/// - world Y = height
/// - world Z = -(y - origin.y)
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LocalFrame {
    pub origin: Vec2,
}

impl LocalFrame {
    pub fn new(origin: Vec2) -> Self {
        Self { origin }
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_ORIGIN)
    }

    pub fn to_world(&self, x: f64, y: f64, height: f64) -> Vec3 {
        Vec3::new(x - self.origin.x, height, -(y - self.origin.y))
    }

    /// Ground coordinates already relative to the origin (city footprints).
    pub fn relative_to_world(x: f64, y: f64, height: f64) -> Vec3 {
        Vec3::new(x, height, -y)
    }
}
