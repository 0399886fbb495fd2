pub mod city_model;
pub mod options;
pub mod stl;
pub mod table;

pub use city_model::*;
pub use options::*;
pub use stl::*;
pub use table::*;
