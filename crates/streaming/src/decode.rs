use formats::{CityModel, Table, decode_stl};

use crate::request::{LoadedResource, Payload, ResourceFormat};

/// Parses fetched bytes according to `format`.
///
/// Errors are plain strings; the caller attaches the source reference.
pub fn decode(bytes: &[u8], format: ResourceFormat) -> Result<LoadedResource, String> {
    let digest = blake3::hash(bytes).to_hex().to_string();
    let payload = match format {
        ResourceFormat::Table { has_header } => {
            Payload::Table(Table::from_bytes(bytes, has_header).map_err(|e| e.to_string())?)
        }
        ResourceFormat::Stl => Payload::Mesh(decode_stl(bytes).map_err(|e| e.to_string())?),
        ResourceFormat::CityModel => {
            Payload::CityModel(CityModel::from_json_slice(bytes).map_err(|e| e.to_string())?)
        }
    };
    Ok(LoadedResource { digest, payload })
}
