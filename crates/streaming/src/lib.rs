pub mod decode;
pub mod error;
pub mod loader;
pub mod oneshot;
pub mod pool;
pub mod request;
pub mod source;
mod worker;

pub use decode::*;
pub use error::*;
pub use loader::*;
pub use oneshot::*;
pub use pool::*;
pub use request::*;
pub use source::*;
pub use worker::{WorkerId, WorkerState};
