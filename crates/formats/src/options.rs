use std::collections::BTreeSet;

use foundation::{LayerKind, ResourceSlot};
use serde::{Deserialize, Serialize};

/// One planning option and where its layers live.
///
/// Paths are opaque source references resolved by the loader (relative
/// file paths or URLs). An absent path means the layer does not exist for
/// this option.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptionSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_option_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radiation_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_surface_cell_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_surface_nodes_path: Option<String>,
}

impl OptionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn path(&self, slot: ResourceSlot) -> Option<&str> {
        match slot {
            ResourceSlot::BuildingOption => self.building_option_path.as_deref(),
            ResourceSlot::EnergyTable => self.energy_path.as_deref(),
            ResourceSlot::Noise => self.noise_path.as_deref(),
            ResourceSlot::Radiation => self.radiation_path.as_deref(),
            ResourceSlot::WindCells => self.wind_surface_cell_path.as_deref(),
            ResourceSlot::WindNodes => self.wind_surface_nodes_path.as_deref(),
            ResourceSlot::CityModel => None,
        }
    }

    /// A layer is present only when every resource it needs has a path.
    pub fn has_layer(&self, layer: LayerKind) -> bool {
        layer.slots().iter().all(|s| self.path(*s).is_some())
    }

    pub fn remove_layer(&mut self, layer: LayerKind) {
        match layer {
            LayerKind::BuildingOption => self.building_option_path = None,
            LayerKind::Energy => self.energy_path = None,
            LayerKind::Noise => self.noise_path = None,
            LayerKind::Radiation => self.radiation_path = None,
            LayerKind::Wind => {
                self.wind_surface_cell_path = None;
                self.wind_surface_nodes_path = None;
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptionsManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_model_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_option: Option<String>,
    pub options: Vec<OptionSpec>,
}

#[derive(Debug)]
pub enum ManifestError {
    Json(serde_json::Error),
    Empty,
    DuplicateOption(String),
    UnknownLayer(String),
    NoMatchingOptions(Vec<String>),
}

impl std::fmt::Display for ManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestError::Json(e) => write!(f, "invalid options manifest: {e}"),
            ManifestError::Empty => write!(f, "options manifest lists no options"),
            ManifestError::DuplicateOption(name) => write!(f, "duplicate option name: {name}"),
            ManifestError::UnknownLayer(key) => write!(f, "unknown data layer: {key}"),
            ManifestError::NoMatchingOptions(names) => {
                write!(f, "no options match the query: {}", names.join(", "))
            }
        }
    }
}

impl std::error::Error for ManifestError {}

impl OptionsManifest {
    pub fn from_json_str(payload: &str) -> Result<Self, ManifestError> {
        let manifest: Self = serde_json::from_str(payload).map_err(ManifestError::Json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ManifestError> {
        let manifest: Self = serde_json::from_slice(bytes).map_err(ManifestError::Json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<(), ManifestError> {
        if self.options.is_empty() {
            return Err(ManifestError::Empty);
        }
        let mut seen = BTreeSet::new();
        for o in &self.options {
            if !seen.insert(o.name.as_str()) {
                return Err(ManifestError::DuplicateOption(o.name.clone()));
            }
        }
        Ok(())
    }

    pub fn option_names(&self) -> Vec<String> {
        self.options.iter().map(|o| o.name.clone()).collect()
    }

    /// The configured default if it exists, otherwise the first option.
    pub fn initial_selection(&self) -> Option<String> {
        self.default_option
            .as_ref()
            .filter(|d| self.options.iter().any(|o| &o.name == *d))
            .cloned()
            .or_else(|| self.options.first().map(|o| o.name.clone()))
    }

    /// Restricts the manifest to the options and layers a query asks for.
    ///
    /// Returns the option that should start out selected: the default if it
    /// survived the filter, otherwise the first requested option in query
    /// order. Dataset order stays the manifest order.
    pub fn apply_query(&mut self, query: &ViewerQuery) -> Result<String, ManifestError> {
        for option in &mut self.options {
            for layer in &query.ignore_data {
                option.remove_layer(*layer);
            }
        }
        if query.options.is_empty() {
            return self.initial_selection().ok_or(ManifestError::Empty);
        }

        self.options.retain(|o| query.options.contains(&o.name));
        let default_kept = self
            .default_option
            .as_ref()
            .filter(|d| self.options.iter().any(|o| &o.name == *d));
        if let Some(default) = default_kept {
            return Ok(default.clone());
        }
        query
            .options
            .iter()
            .find(|name| self.options.iter().any(|o| &o.name == *name))
            .cloned()
            .ok_or_else(|| ManifestError::NoMatchingOptions(query.options.clone()))
    }
}

/// URL-style viewer query: `option=1&option=3&ignoreData=wind`.
///
/// `option=<n>` selects the option named `Option <n>`; a value that is
/// already a full option name is taken as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerQuery {
    pub options: Vec<String>,
    pub ignore_data: Vec<LayerKind>,
}

impl ViewerQuery {
    pub fn parse(query: &str) -> Result<Self, ManifestError> {
        let mut out = Self::default();
        let query = query.trim_start_matches('?');
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = percent_decode(value);
            match key {
                "option" => out.push_option(&value),
                "ignoreData" => out.push_ignored(&value)?,
                // Renderer-only parameters (vr, scale, ...) are not ours.
                _ => {}
            }
        }
        Ok(out)
    }

    pub fn push_option(&mut self, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let name = if value.chars().all(|c| c.is_ascii_digit()) {
            format!("Option {value}")
        } else {
            value.to_string()
        };
        if !self.options.contains(&name) {
            self.options.push(name);
        }
    }

    pub fn push_ignored(&mut self, key: &str) -> Result<(), ManifestError> {
        let layer =
            LayerKind::from_key(key.trim()).ok_or_else(|| ManifestError::UnknownLayer(key.into()))?;
        if !self.ignore_data.contains(&layer) {
            self.ignore_data.push(layer);
        }
        Ok(())
    }

    pub fn is_ignored(&self, layer: LayerKind) -> bool {
        self.ignore_data.contains(&layer)
    }
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hi = (bytes[i + 1] as char).to_digit(16);
                let lo = (bytes[i + 2] as char).to_digit(16);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi * 16 + lo) as u8);
                        i += 2;
                    }
                    _ => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::{ManifestError, OptionSpec, OptionsManifest, ViewerQuery};
    use foundation::{LayerKind, ResourceSlot};
    use pretty_assertions::assert_eq;

    const MANIFEST: &str = r#"{
        "cityModelPath": "data/CityModel.json",
        "defaultOption": "Option 1",
        "options": [
            {
                "name": "Option 0",
                "noisePath": "data/noise/option_0_Lden.csv",
                "windSurfaceCellPath": "data/wind/Option_0/cells.csv",
                "windSurfaceNodesPath": "data/wind/Option_0/nodes.csv"
            },
            {
                "name": "Option 1",
                "buildingOptionPath": "data/buildingOptions/option_1.stl",
                "energyPath": "data/energy/alt_1.csv",
                "noisePath": "data/noise/option_1_Lden.csv"
            },
            { "name": "Option 2", "radiationPath": "data/radiation/option_2.csv" }
        ]
    }"#;

    #[test]
    fn parses_camel_case_paths() {
        let m = OptionsManifest::from_json_str(MANIFEST).unwrap();
        assert_eq!(m.city_model_path.as_deref(), Some("data/CityModel.json"));
        assert_eq!(
            m.options[1].path(ResourceSlot::EnergyTable),
            Some("data/energy/alt_1.csv")
        );
        assert!(m.options[0].has_layer(LayerKind::Wind));
        assert!(!m.options[2].has_layer(LayerKind::Noise));
    }

    #[test]
    fn query_filters_options_and_reselects() {
        let mut m = OptionsManifest::from_json_str(MANIFEST).unwrap();
        let q = ViewerQuery::parse("?option=0&option=2&ignoreData=wind&vr=true").unwrap();
        assert!(q.is_ignored(LayerKind::Wind));
        assert!(!q.is_ignored(LayerKind::Noise));
        let selected = m.apply_query(&q).unwrap();

        assert_eq!(m.option_names(), vec!["Option 0", "Option 2"]);
        assert_eq!(selected, "Option 0");
        assert!(!m.options[0].has_layer(LayerKind::Wind));
        assert_eq!(m.options[0].wind_surface_nodes_path, None);
        assert!(m.options[0].has_layer(LayerKind::Noise));
    }

    #[test]
    fn reselects_in_query_order() {
        let mut m = OptionsManifest::from_json_str(MANIFEST).unwrap();
        m.options.push(OptionSpec::new("Option 3"));
        let q = ViewerQuery::parse("option=3&option=0").unwrap();
        let selected = m.apply_query(&q).unwrap();

        assert_eq!(selected, "Option 3");
        assert_eq!(m.option_names(), vec!["Option 0", "Option 3"]);
    }

    #[test]
    fn reselection_skips_unknown_query_names() {
        let mut m = OptionsManifest::from_json_str(MANIFEST).unwrap();
        let q = ViewerQuery::parse("option=7&option=2&option=0").unwrap();
        assert_eq!(m.apply_query(&q).unwrap(), "Option 2");
    }

    #[test]
    fn keeps_default_when_it_survives() {
        let mut m = OptionsManifest::from_json_str(MANIFEST).unwrap();
        let q = ViewerQuery::parse("ignoreData=noise").unwrap();
        assert_eq!(m.apply_query(&q).unwrap(), "Option 1");
        assert!(m.options.iter().all(|o| o.noise_path.is_none()));
    }

    #[test]
    fn unknown_layer_is_rejected() {
        match ViewerQuery::parse("ignoreData=sky") {
            Err(ManifestError::UnknownLayer(k)) => assert_eq!(k, "sky"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn query_without_matches_is_an_error() {
        let mut m = OptionsManifest::from_json_str(MANIFEST).unwrap();
        let q = ViewerQuery::parse("option=9").unwrap();
        assert!(matches!(
            m.apply_query(&q),
            Err(ManifestError::NoMatchingOptions(_))
        ));
    }

    #[test]
    fn full_names_and_escapes_are_accepted() {
        let q = ViewerQuery::parse("option=Option%203&option=Base+case").unwrap();
        assert_eq!(q.options, vec!["Option 3", "Base case"]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let m = OptionsManifest {
            options: vec![OptionSpec::new("A"), OptionSpec::new("A")],
            ..OptionsManifest::default()
        };
        let json = serde_json::to_string(&m).unwrap();
        assert!(matches!(
            OptionsManifest::from_json_str(&json),
            Err(ManifestError::DuplicateOption(_))
        ));
    }
}
