use foundation::ResourceKey;
use formats::{CityModel, StlMesh, Table};

use crate::error::LoadError;

/// How the fetched bytes of a resource are interpreted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResourceFormat {
    Table { has_header: bool },
    Stl,
    CityModel,
}

/// One resource to fetch and parse, consumed exactly once by a loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub key: ResourceKey,
    /// Opaque source reference resolved by a [`crate::ResourceSource`].
    pub source: String,
    pub format: ResourceFormat,
}

impl LoadRequest {
    pub fn new(key: ResourceKey, source: impl Into<String>, format: ResourceFormat) -> Self {
        Self {
            key,
            source: source.into(),
            format,
        }
    }

    pub fn table(key: ResourceKey, source: impl Into<String>, has_header: bool) -> Self {
        Self::new(key, source, ResourceFormat::Table { has_header })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Table(Table),
    Mesh(StlMesh),
    CityModel(CityModel),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedResource {
    /// blake3 hex digest of the raw bytes.
    pub digest: String,
    pub payload: Payload,
}

/// Outcome of one [`LoadRequest`]. Delivered once, never retried.
#[derive(Debug)]
pub struct LoadCompletion {
    pub key: ResourceKey,
    pub source: String,
    pub result: Result<LoadedResource, LoadError>,
}

impl LoadCompletion {
    pub fn failed(request: LoadRequest, error: LoadError) -> Self {
        Self {
            key: request.key,
            source: request.source,
            result: Err(error),
        }
    }
}
