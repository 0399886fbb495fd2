use std::fmt;

/// The fixed set of data categories overlaid on the city model.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerKind {
    BuildingOption,
    Energy,
    Noise,
    Radiation,
    Wind,
}

impl LayerKind {
    pub const ALL: [LayerKind; 5] = [
        LayerKind::BuildingOption,
        LayerKind::Energy,
        LayerKind::Noise,
        LayerKind::Radiation,
        LayerKind::Wind,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Dense index, stable across releases. Used by fixed-size per-layer records.
    pub const fn index(self) -> usize {
        match self {
            LayerKind::BuildingOption => 0,
            LayerKind::Energy => 1,
            LayerKind::Noise => 2,
            LayerKind::Radiation => 3,
            LayerKind::Wind => 4,
        }
    }

    /// Key used in manifests, query strings and the GUI.
    pub const fn key(self) -> &'static str {
        match self {
            LayerKind::BuildingOption => "buildingOption",
            LayerKind::Energy => "energy",
            LayerKind::Noise => "noise",
            LayerKind::Radiation => "radiation",
            LayerKind::Wind => "wind",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key)
    }

    /// Resources that must all resolve before this layer can be built.
    pub const fn slots(self) -> &'static [ResourceSlot] {
        match self {
            LayerKind::BuildingOption => &[ResourceSlot::BuildingOption],
            LayerKind::Energy => &[ResourceSlot::EnergyTable],
            LayerKind::Noise => &[ResourceSlot::Noise],
            LayerKind::Radiation => &[ResourceSlot::Radiation],
            LayerKind::Wind => &[ResourceSlot::WindCells, ResourceSlot::WindNodes],
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One loadable resource of a dataset.
///
/// Finer grained than [`LayerKind`]: the wind layer is fed by two tables.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceSlot {
    BuildingOption,
    EnergyTable,
    Noise,
    Radiation,
    WindCells,
    WindNodes,
    /// Session-wide city model; never pending on a dataset.
    CityModel,
}

impl ResourceSlot {
    pub const fn layer(self) -> LayerKind {
        match self {
            ResourceSlot::BuildingOption => LayerKind::BuildingOption,
            ResourceSlot::EnergyTable | ResourceSlot::CityModel => LayerKind::Energy,
            ResourceSlot::Noise => LayerKind::Noise,
            ResourceSlot::Radiation => LayerKind::Radiation,
            ResourceSlot::WindCells | ResourceSlot::WindNodes => LayerKind::Wind,
        }
    }
}

impl fmt::Display for ResourceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceSlot::BuildingOption => "buildingOption",
            ResourceSlot::EnergyTable => "energy",
            ResourceSlot::Noise => "noise",
            ResourceSlot::Radiation => "radiation",
            ResourceSlot::WindCells => "windCells",
            ResourceSlot::WindNodes => "windNodes",
            ResourceSlot::CityModel => "cityModel",
        };
        f.write_str(s)
    }
}

/// Identifies one resource load of one dataset. Unique within a session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey {
    pub dataset: String,
    pub slot: ResourceSlot,
}

impl ResourceKey {
    pub fn new(dataset: impl Into<String>, slot: ResourceSlot) -> Self {
        Self {
            dataset: dataset.into(),
            slot,
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dataset, self.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::{LayerKind, ResourceSlot};

    #[test]
    fn layer_keys_round_trip() {
        for kind in LayerKind::ALL {
            assert_eq!(LayerKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(LayerKind::from_key("sky"), None);
    }

    #[test]
    fn indices_are_dense() {
        for (i, kind) in LayerKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn every_slot_belongs_to_its_layer() {
        for kind in LayerKind::ALL {
            for slot in kind.slots() {
                assert_eq!(slot.layer(), kind);
            }
        }
        assert_eq!(ResourceSlot::WindNodes.layer(), LayerKind::Wind);
    }
}
