use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::decode::decode;
use crate::error::LoadError;
use crate::request::{LoadCompletion, LoadRequest};
use crate::source::ResourceSource;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    /// Holds the source reference being loaded.
    Busy(String),
}

/// Message sent from a worker thread back to its owner.
#[derive(Debug)]
pub(crate) struct WorkerReport {
    pub worker: Option<WorkerId>,
    pub completion: LoadCompletion,
}

#[derive(Debug)]
pub(crate) struct WorkerHandle {
    pub id: WorkerId,
    pub state: WorkerState,
    jobs: Option<Sender<LoadRequest>>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn spawn(
        id: WorkerId,
        source: Arc<dyn ResourceSource>,
        reports: Sender<WorkerReport>,
    ) -> Result<Self, LoadError> {
        let (jobs, inbox) = channel::<LoadRequest>();
        let thread = thread::Builder::new()
            .name(format!("load-worker-{}", id.0))
            .spawn(move || worker_loop(id, source, inbox, reports))
            .map_err(LoadError::Spawn)?;
        Ok(Self {
            id,
            state: WorkerState::Idle,
            jobs: Some(jobs),
            thread: Some(thread),
        })
    }

    /// Hands a request to the worker. Gives the request back if the thread is gone.
    pub fn assign(&mut self, request: LoadRequest) -> Result<(), LoadRequest> {
        let Some(jobs) = &self.jobs else {
            return Err(request);
        };
        let source = request.source.clone();
        match jobs.send(request) {
            Ok(()) => {
                self.state = WorkerState::Busy(source);
                Ok(())
            }
            Err(returned) => Err(returned.0),
        }
    }

    /// Closes the job channel and waits for the current request to finish.
    pub fn terminate(&mut self) {
        self.jobs = None;
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            debug!(worker = self.id.0, "load worker exited by panic");
        }
        self.state = WorkerState::Idle;
    }
}

fn worker_loop(
    id: WorkerId,
    source: Arc<dyn ResourceSource>,
    inbox: Receiver<LoadRequest>,
    reports: Sender<WorkerReport>,
) {
    while let Ok(request) = inbox.recv() {
        let completion = run_request(source.as_ref(), request);
        let report = WorkerReport {
            worker: Some(id),
            completion,
        };
        if reports.send(report).is_err() {
            break;
        }
    }
}

/// Fetches and decodes one request. Never panics; a panicking parser
/// becomes a failed completion.
pub(crate) fn run_request(source: &dyn ResourceSource, request: LoadRequest) -> LoadCompletion {
    let LoadRequest {
        key,
        source: reference,
        format,
    } = request;
    debug!(%key, source = %reference, "loading");

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let bytes = source.fetch(&reference).map_err(|error| LoadError::Fetch {
            source: reference.clone(),
            error,
        })?;
        decode(&bytes, format).map_err(|reason| LoadError::Decode {
            source: reference.clone(),
            reason,
        })
    }));

    let result = match outcome {
        Ok(result) => result,
        Err(_) => Err(LoadError::WorkerLost {
            source: reference.clone(),
        }),
    };

    LoadCompletion {
        key,
        source: reference,
        result,
    }
}
