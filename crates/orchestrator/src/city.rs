use std::sync::Arc;

use foundation::{ResourceKey, ResourceSlot};
use formats::CityModel;
use runtime::{EventBus, LoadEvent};
use streaming::{LoadError, LoadRequest, Payload, ResourceFormat, TabularLoader};
use tracing::{info, warn};

use crate::error::SessionError;

/// Dataset name used for session-wide loads in keys and the loading log.
pub const SESSION_DATASET: &str = "session";

/// Asked for a replacement when the city model cannot be loaded.
pub trait CityModelPrompt {
    /// Returns another source to try, or `None` to continue without a city model.
    fn substitute(&mut self, failed: &str, error: &LoadError) -> Option<String>;
}

/// Never substitutes; a failed city model is simply skipped.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoSubstitute;

impl CityModelPrompt for NoSubstitute {
    fn substitute(&mut self, _failed: &str, _error: &LoadError) -> Option<String> {
        None
    }
}

/// Loads the shared city model once, before any dataset starts.
///
/// The loader must be otherwise idle. Returns `Ok(None)` when no path is
/// configured or every attempt failed and the prompt gave up.
pub fn acquire_city_model(
    loader: &mut dyn TabularLoader,
    path: Option<&str>,
    prompt: &mut dyn CityModelPrompt,
    events: &mut EventBus,
) -> Result<Option<Arc<CityModel>>, SessionError> {
    let Some(mut path) = path.map(str::to_string) else {
        info!("no city model configured, using the fallback origin");
        return Ok(None);
    };

    loop {
        let key = ResourceKey::new(SESSION_DATASET, ResourceSlot::CityModel);
        loader.submit(LoadRequest::new(key, path.clone(), ResourceFormat::CityModel))?;
        let Some(done) = loader.next_completion() else {
            return Err(SessionError::Stalled {
                pending: vec![SESSION_DATASET.to_string()],
            });
        };

        let error = match done.result {
            Ok(resource) => match resource.payload {
                Payload::CityModel(city) => {
                    events.emit(LoadEvent::ResourceLoaded {
                        dataset: SESSION_DATASET.to_string(),
                        slot: ResourceSlot::CityModel,
                        source: done.source,
                    });
                    info!(buildings = city.buildings.len(), "city model loaded");
                    return Ok(Some(Arc::new(city)));
                }
                _ => LoadError::Decode {
                    source: done.source.clone(),
                    reason: "not a city model".to_string(),
                },
            },
            Err(e) => e,
        };

        events.emit(LoadEvent::ResourceFailed {
            dataset: SESSION_DATASET.to_string(),
            slot: ResourceSlot::CityModel,
            source: done.source,
            message: error.to_string(),
        });
        match prompt.substitute(&path, &error) {
            Some(next) => path = next,
            None => {
                warn!("continuing without a city model");
                return Ok(None);
            }
        }
    }
}
