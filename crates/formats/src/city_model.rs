use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
}

/// Footprints are relative to [`CityModel::origin`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    #[serde(rename = "UUID")]
    pub uuid: String,
    #[serde(rename = "Footprint")]
    pub footprint: Vec<PlanarPoint>,
    #[serde(rename = "Height")]
    pub height: f64,
    #[serde(rename = "GroundHeight", default)]
    pub ground_height: f64,
}

/// City model export: `{ Origin: {x, y}, Buildings: [...] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityModel {
    #[serde(rename = "Origin")]
    pub origin: PlanarPoint,
    #[serde(rename = "Buildings", default)]
    pub buildings: Vec<Building>,
}

#[derive(Debug)]
pub enum CityModelError {
    Json(serde_json::Error),
}

impl std::fmt::Display for CityModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CityModelError::Json(e) => write!(f, "invalid city model JSON: {e}"),
        }
    }
}

impl std::error::Error for CityModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CityModelError::Json(e) => Some(e),
        }
    }
}

impl CityModel {
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, CityModelError> {
        serde_json::from_slice(bytes).map_err(CityModelError::Json)
    }

    pub fn from_json_str(payload: &str) -> Result<Self, CityModelError> {
        serde_json::from_str(payload).map_err(CityModelError::Json)
    }
}
