pub mod building_option;
pub mod color_scale;
pub mod energy;
pub mod lawson;
pub mod layer;
pub mod noise;
mod points;
pub mod radiation;
pub mod symbology;
pub mod wind;

pub use building_option::*;
pub use color_scale::*;
pub use energy::*;
pub use lawson::*;
pub use layer::*;
pub use noise::*;
pub use points::Sample;
pub use radiation::*;
pub use symbology::*;
pub use wind::*;
