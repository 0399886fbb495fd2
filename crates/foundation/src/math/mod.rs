pub mod local;
pub mod vec;

pub use local::*;
pub use vec::*;
