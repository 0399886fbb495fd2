use foundation::{LayerKind, ResourceSlot};
use tracing::{info, warn};

/// Observable progress of a loading session.
///
/// Every variant maps to one line of the user-facing loading log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadEvent {
    ResourceLoaded {
        dataset: String,
        slot: ResourceSlot,
        source: String,
    },
    ResourceFailed {
        dataset: String,
        slot: ResourceSlot,
        source: String,
        message: String,
    },
    /// The layer has no source and will never be loaded.
    LayerMissing { dataset: String, layer: LayerKind },
    DatasetComplete { dataset: String },
    AllComplete { datasets: usize },
}

impl LoadEvent {
    pub fn dataset(&self) -> Option<&str> {
        match self {
            LoadEvent::ResourceLoaded { dataset, .. }
            | LoadEvent::ResourceFailed { dataset, .. }
            | LoadEvent::LayerMissing { dataset, .. }
            | LoadEvent::DatasetComplete { dataset } => Some(dataset),
            LoadEvent::AllComplete { .. } => None,
        }
    }

    pub fn log_line(&self) -> String {
        match self {
            LoadEvent::ResourceLoaded {
                dataset, source, ..
            } => format!("{dataset} loaded {source}"),
            LoadEvent::ResourceFailed {
                dataset,
                source,
                message,
                ..
            } => format!("{dataset} failed {source}: {message}"),
            LoadEvent::LayerMissing { dataset, layer } => {
                format!("{dataset} has no {layer} data")
            }
            LoadEvent::DatasetComplete { dataset } => format!("{dataset} fully loaded"),
            LoadEvent::AllComplete { datasets } => format!("all {datasets} datasets loaded"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Position in the session, starting at 0.
    pub seq: u64,
    pub event: LoadEvent,
}

#[derive(Debug, Default)]
pub struct EventBus {
    next_seq: u64,
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: LoadEvent) {
        match &event {
            LoadEvent::ResourceFailed { .. } | LoadEvent::LayerMissing { .. } => {
                warn!("{}", event.log_line())
            }
            _ => info!("{}", event.log_line()),
        }
        self.events.push(Event {
            seq: self.next_seq,
            event,
        });
        self.next_seq += 1;
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = LoadEvent>) {
        for e in events {
            self.emit(e);
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn loading_log(&self) -> Vec<String> {
        self.events.iter().map(|e| e.event.log_line()).collect()
    }

    pub fn count_matching(&self, pred: impl Fn(&LoadEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(&e.event)).count()
    }
}
