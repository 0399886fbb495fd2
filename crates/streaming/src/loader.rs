use std::sync::Arc;

use runtime::LoadMetrics;

use crate::error::LoadError;
use crate::oneshot::OneShotLoader;
use crate::pool::WorkerPool;
use crate::request::{LoadCompletion, LoadRequest};
use crate::source::ResourceSource;

pub const DEFAULT_WORKERS: usize = 3;

/// Loader strategy chosen at startup.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoaderConfig {
    /// Fixed pool of `workers` threads behind a FIFO queue.
    Bounded { workers: usize },
    /// One short-lived thread per request, no cap.
    Unbounded,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig::Bounded {
            workers: DEFAULT_WORKERS,
        }
    }
}

/// Asynchronous tabular loading service.
///
/// `submit` never blocks on the load itself. Completions are pulled by the
/// owner; each submitted request yields exactly one completion.
pub trait TabularLoader: Send {
    fn submit(&mut self, request: LoadRequest) -> Result<(), LoadError>;

    /// Blocks for the next completion. `None` when nothing is in flight.
    fn next_completion(&mut self) -> Option<LoadCompletion>;

    /// Non-blocking variant of [`TabularLoader::next_completion`].
    fn try_next_completion(&mut self) -> Option<LoadCompletion>;

    /// Requests submitted but not yet returned by `next_completion`.
    fn in_flight(&self) -> usize;

    /// Stops accepting requests and releases workers.
    fn shutdown(&mut self);

    fn metrics(&self) -> LoadMetrics;
}

pub fn build_loader(
    config: LoaderConfig,
    source: Arc<dyn ResourceSource>,
) -> Result<Box<dyn TabularLoader>, LoadError> {
    match config {
        LoaderConfig::Bounded { workers } => Ok(Box::new(WorkerPool::new(workers, source)?)),
        LoaderConfig::Unbounded => Ok(Box::new(OneShotLoader::new(source))),
    }
}
