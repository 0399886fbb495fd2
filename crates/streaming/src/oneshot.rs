use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

use runtime::LoadMetrics;
use tracing::debug;

use crate::error::LoadError;
use crate::loader::TabularLoader;
use crate::request::{LoadCompletion, LoadRequest};
use crate::source::ResourceSource;
use crate::worker::{WorkerReport, run_request};

/// Spawns one short-lived thread per request. No concurrency cap.
pub struct OneShotLoader {
    source: Arc<dyn ResourceSource>,
    report_tx: Sender<WorkerReport>,
    reports: Receiver<WorkerReport>,
    in_flight: usize,
    shut_down: bool,
    metrics: LoadMetrics,
}

impl OneShotLoader {
    pub fn new(source: Arc<dyn ResourceSource>) -> Self {
        let (report_tx, reports) = channel();
        Self {
            source,
            report_tx,
            reports,
            in_flight: 0,
            shut_down: false,
            metrics: LoadMetrics::new(),
        }
    }
}

impl TabularLoader for OneShotLoader {
    fn submit(&mut self, request: LoadRequest) -> Result<(), LoadError> {
        if self.shut_down {
            self.metrics.record_rejected();
            return Err(LoadError::ResourceUnavailable);
        }
        let source = Arc::clone(&self.source);
        let reports = self.report_tx.clone();
        let name = format!("load-{}", request.key);
        thread::Builder::new()
            .name(name)
            .spawn(move || {
                let completion = run_request(source.as_ref(), request);
                let _ = reports.send(WorkerReport {
                    worker: None,
                    completion,
                });
            })
            .map_err(LoadError::Spawn)?;
        self.in_flight += 1;
        self.metrics.record_submit(0);
        self.metrics.record_dispatch();
        Ok(())
    }

    fn next_completion(&mut self) -> Option<LoadCompletion> {
        if self.in_flight == 0 {
            return None;
        }
        let report = self.reports.recv().ok()?;
        self.in_flight -= 1;
        self.metrics
            .record_outcome(report.completion.result.is_ok());
        Some(report.completion)
    }

    fn try_next_completion(&mut self) -> Option<LoadCompletion> {
        let report = self.reports.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        self.metrics
            .record_outcome(report.completion.result.is_ok());
        Some(report.completion)
    }

    fn in_flight(&self) -> usize {
        self.in_flight
    }

    fn shutdown(&mut self) {
        if !self.shut_down {
            self.shut_down = true;
            debug!(in_flight = self.in_flight, "one-shot loader shut down");
        }
    }

    fn metrics(&self) -> LoadMetrics {
        self.metrics
    }
}
