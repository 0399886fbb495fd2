pub mod city;
pub mod dataset;
pub mod error;
pub mod session;
pub mod wind_cache;

pub use city::*;
pub use dataset::*;
pub use error::*;
pub use session::*;
pub use wind_cache::*;
