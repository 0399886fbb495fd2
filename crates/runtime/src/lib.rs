pub mod event_bus;
pub mod metrics;
pub mod work_queue;

pub use event_bus::*;
pub use metrics::*;
pub use work_queue::*;
