use std::collections::HashMap;
use std::sync::Arc;

use formats::{CityModel, OptionsManifest};
use runtime::{EventBus, LoadEvent, LoadMetrics};
use scene::{NUDGE_STEP, Renderer, VisibilityConfig, apply, nudge};
use streaming::{LoadCompletion, TabularLoader};
use tracing::{debug, info, warn};

use crate::dataset::{Dataset, Step};
use crate::error::SessionError;
use crate::wind_cache::WindGeometryCache;

/// Owns every dataset, the loader and the renderer, and routes load
/// completions on a single thread.
pub struct Session<R: Renderer> {
    loader: Box<dyn TabularLoader>,
    renderer: R,
    datasets: Vec<Dataset>,
    index: HashMap<String, usize>,
    wind_cache: WindGeometryCache,
    events: EventBus,
    config: VisibilityConfig,
    started: bool,
    completed: usize,
    all_complete: bool,
}

impl<R: Renderer> std::fmt::Debug for Session<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("datasets", &self.datasets.len())
            .field("completed", &self.completed)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<R: Renderer> Session<R> {
    /// One dataset per manifest option, in manifest order.
    pub fn new(
        manifest: &OptionsManifest,
        city: Option<Arc<CityModel>>,
        loader: Box<dyn TabularLoader>,
        renderer: R,
        config: VisibilityConfig,
    ) -> Self {
        let datasets: Vec<Dataset> = manifest
            .options
            .iter()
            .map(|spec| Dataset::new(spec.clone(), city.clone()))
            .collect();
        let index = datasets
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name().to_string(), i))
            .collect();
        Self {
            loader,
            renderer,
            datasets,
            index,
            wind_cache: WindGeometryCache::new(),
            events: EventBus::new(),
            config,
            started: false,
            completed: 0,
            all_complete: false,
        }
    }

    /// Seeds the loading log, e.g. with city-model events.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn dataset(&self, name: &str) -> Option<&Dataset> {
        self.index.get(name).map(|i| &self.datasets[*i])
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn config(&self) -> &VisibilityConfig {
        &self.config
    }

    pub fn wind_cache(&self) -> &WindGeometryCache {
        &self.wind_cache
    }

    pub fn loader_metrics(&self) -> LoadMetrics {
        self.loader.metrics()
    }

    pub fn completed_datasets(&self) -> usize {
        self.completed
    }

    pub fn is_complete(&self) -> bool {
        self.all_complete
    }

    /// Starts every dataset. Idempotent.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        info!(datasets = self.datasets.len(), "loading session started");
        for i in 0..self.datasets.len() {
            let step = self.datasets[i].start(&mut self.events);
            self.after_step(i, step)?;
        }
        if self.datasets.is_empty() {
            self.finish();
        }
        Ok(())
    }

    /// Drives the loader until every dataset is complete, then shuts the
    /// loader down. Each dataset gets the current configuration applied as
    /// soon as it completes.
    pub fn run(&mut self) -> Result<(), SessionError> {
        self.start()?;
        while !self.all_complete {
            match self.loader.next_completion() {
                Some(completion) => {
                    self.handle(completion)?;
                    self.poll()?;
                }
                None => {
                    let pending: Vec<String> = self
                        .datasets
                        .iter()
                        .filter(|d| !d.is_complete())
                        .map(|d| d.name().to_string())
                        .collect();
                    warn!(?pending, "no loads in flight but datasets are incomplete");
                    return Err(SessionError::Stalled { pending });
                }
            }
        }
        Ok(())
    }

    /// Handles every completion that is already available without blocking.
    /// Returns how many were handled.
    pub fn poll(&mut self) -> Result<usize, SessionError> {
        let mut handled = 0;
        while !self.all_complete {
            let Some(completion) = self.loader.try_next_completion() else {
                break;
            };
            self.handle(completion)?;
            handled += 1;
        }
        Ok(handled)
    }

    /// Routes one completion to its dataset.
    pub fn handle(&mut self, completion: LoadCompletion) -> Result<(), SessionError> {
        let Some(&i) = self.index.get(&completion.key.dataset) else {
            warn!(key = %completion.key, "completion for unknown dataset");
            return Ok(());
        };
        let step = self.datasets[i].on_completion(
            completion,
            &mut self.renderer,
            &mut self.wind_cache,
            &mut self.events,
        );
        self.after_step(i, step)
    }

    fn after_step(&mut self, i: usize, step: Step) -> Result<(), SessionError> {
        for request in step.requests {
            debug!(key = %request.key, source = %request.source, "submitting");
            self.loader.submit(request)?;
        }
        if step.completed {
            // A dataset shows up as soon as it is fully loaded.
            apply(
                std::iter::once(self.datasets[i].visuals_mut()),
                &self.config,
                &mut self.renderer,
            );
            self.completed += 1;
            if self.completed == self.datasets.len() {
                self.finish();
            }
        }
        Ok(())
    }

    fn finish(&mut self) {
        if self.all_complete {
            return;
        }
        self.all_complete = true;
        self.loader.shutdown();
        self.events.emit(LoadEvent::AllComplete {
            datasets: self.datasets.len(),
        });
        let metrics = self.loader.metrics();
        info!(
            succeeded = metrics.succeeded,
            failed = metrics.failed,
            "all datasets loaded"
        );
    }

    fn apply_config(&mut self) -> usize {
        apply(
            self.datasets.iter_mut().map(Dataset::visuals_mut),
            &self.config,
            &mut self.renderer,
        )
    }

    /// The single "visibility changed" handler. Returns the number of flips.
    pub fn on_config_changed(&mut self, config: VisibilityConfig) -> usize {
        self.config = config;
        self.apply_config()
    }

    /// Moves the visible point clouds up (`steps > 0`) or down.
    pub fn nudge(&mut self, steps: i32) -> usize {
        nudge(
            self.datasets.iter_mut().map(Dataset::visuals_mut),
            f64::from(steps) * NUDGE_STEP,
            &mut self.renderer,
        )
    }
}
