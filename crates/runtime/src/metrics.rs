/// Load counters for the worker pool and loaders.
///
/// Plain integers only; snapshots are cheap copies for logs and tests.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct LoadMetrics {
    pub submitted: u64,
    pub dispatched: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub rejected: u64,
    pub queue_depth: Histogram,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Histogram {
    pub count: u64,
    pub sum: i64,
    pub min: i64,
    pub max: i64,
}

impl Histogram {
    pub fn record(&mut self, value: i64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
    }
}

impl LoadMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_submit(&mut self, queue_len: usize) {
        self.submitted += 1;
        self.queue_depth.record(queue_len as i64);
    }

    pub fn record_dispatch(&mut self) {
        self.dispatched += 1;
    }

    pub fn record_outcome(&mut self, ok: bool) {
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn record_rejected(&mut self) {
        self.rejected += 1;
    }

    /// Requests handed to a worker that have not reported back yet.
    pub fn outstanding(&self) -> u64 {
        self.dispatched
            .saturating_sub(self.succeeded)
            .saturating_sub(self.failed)
    }
}
