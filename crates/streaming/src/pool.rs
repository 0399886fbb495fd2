use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, channel};

use foundation::ResourceKey;
use runtime::{LoadMetrics, WorkQueue};
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::loader::TabularLoader;
use crate::request::{LoadCompletion, LoadRequest};
use crate::source::ResourceSource;
use crate::worker::{WorkerHandle, WorkerId, WorkerReport, WorkerState};

/// Fixed-size pool of load workers draining a strict FIFO queue.
///
/// Single owner: only the thread driving the session touches the pool, so
/// the queue and idle list need no lock. Workers report back over one
/// shared channel.
pub struct WorkerPool {
    workers: Vec<WorkerHandle>,
    idle: Vec<WorkerId>,
    queue: WorkQueue<LoadRequest>,
    reports: Receiver<WorkerReport>,
    busy: usize,
    /// Completions produced without a worker (dead worker, shutdown leftovers).
    synthetic: VecDeque<LoadCompletion>,
    dispatch_log: Vec<ResourceKey>,
    metrics: LoadMetrics,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers.len())
            .field("idle", &self.idle.len())
            .field("queued", &self.queue.len())
            .field("busy", &self.busy)
            .finish_non_exhaustive()
    }
}

impl WorkerPool {
    /// Spawns `size` workers (at least one) sharing `source`.
    pub fn new(size: usize, source: Arc<dyn ResourceSource>) -> Result<Self, LoadError> {
        let size = size.max(1);
        let (report_tx, reports) = channel();
        let mut workers = Vec::with_capacity(size);
        for i in 0..size {
            workers.push(WorkerHandle::spawn(
                WorkerId(i),
                Arc::clone(&source),
                report_tx.clone(),
            )?);
        }
        // Last worker at the front so dispatch starts with worker 0.
        let idle = (0..size).rev().map(WorkerId).collect();
        debug!(size, source = %source.describe(), "worker pool started");

        Ok(Self {
            workers,
            idle,
            queue: WorkQueue::new(),
            reports,
            busy: 0,
            synthetic: VecDeque::new(),
            dispatch_log: Vec::new(),
            metrics: LoadMetrics::new(),
        })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn idle_workers(&self) -> usize {
        self.idle.len()
    }

    pub fn busy_workers(&self) -> usize {
        self.busy
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.queue.is_closed()
    }

    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.workers.iter().map(|w| w.state.clone()).collect()
    }

    /// Keys in the order they were handed to workers.
    pub fn dispatch_log(&self) -> &[ResourceKey] {
        &self.dispatch_log
    }

    /// Appends to the FIFO queue, then drains it onto idle workers.
    pub fn enqueue(&mut self, request: LoadRequest) -> Result<(), LoadError> {
        if self.queue.push(request).is_err() {
            self.metrics.record_rejected();
            return Err(LoadError::ResourceUnavailable);
        }
        self.metrics.record_submit(self.queue.len());
        self.drain();
        Ok(())
    }

    fn drain(&mut self) {
        while !self.queue.is_empty() {
            let Some(worker_id) = self.idle.pop() else {
                break;
            };
            let Some((_, request)) = self.queue.pop_next() else {
                self.idle.push(worker_id);
                break;
            };
            let key = request.key.clone();
            match self.workers[worker_id.0].assign(request) {
                Ok(()) => {
                    self.busy += 1;
                    self.dispatch_log.push(key);
                    self.metrics.record_dispatch();
                }
                Err(request) => {
                    // The worker's thread is gone; it is not returned to the idle list.
                    warn!(worker = worker_id.0, %key, "load worker unavailable");
                    let source = request.source.clone();
                    self.metrics.record_outcome(false);
                    self.synthetic
                        .push_back(LoadCompletion::failed(request, LoadError::WorkerLost { source }));
                }
            }
        }
    }

    fn on_report(&mut self, report: WorkerReport) -> LoadCompletion {
        if let Some(id) = report.worker
            && let Some(worker) = self.workers.get_mut(id.0)
        {
            worker.state = WorkerState::Idle;
            if !self.queue.is_closed() {
                self.idle.push(id);
            }
        }
        self.busy = self.busy.saturating_sub(1);
        self.metrics.record_outcome(report.completion.result.is_ok());
        self.drain();
        report.completion
    }
}

impl TabularLoader for WorkerPool {
    fn submit(&mut self, request: LoadRequest) -> Result<(), LoadError> {
        self.enqueue(request)
    }

    fn next_completion(&mut self) -> Option<LoadCompletion> {
        if let Some(done) = self.synthetic.pop_front() {
            return Some(done);
        }
        if self.busy == 0 {
            return None;
        }
        match self.reports.recv() {
            Ok(report) => Some(self.on_report(report)),
            Err(_) => {
                // Every worker thread is gone.
                self.busy = 0;
                None
            }
        }
    }

    fn try_next_completion(&mut self) -> Option<LoadCompletion> {
        if let Some(done) = self.synthetic.pop_front() {
            return Some(done);
        }
        let report = self.reports.try_recv().ok()?;
        Some(self.on_report(report))
    }

    fn in_flight(&self) -> usize {
        self.queue.len() + self.busy + self.synthetic.len()
    }

    fn shutdown(&mut self) {
        if self.queue.is_closed() {
            return;
        }
        for request in self.queue.close() {
            self.synthetic
                .push_back(LoadCompletion::failed(request, LoadError::ResourceUnavailable));
        }
        self.idle.clear();
        for worker in &mut self.workers {
            worker.terminate();
        }
        debug!(
            dispatched = self.metrics.dispatched,
            failed = self.metrics.failed,
            "worker pool shut down"
        );
    }

    fn metrics(&self) -> LoadMetrics {
        self.metrics
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
