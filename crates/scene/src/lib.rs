pub mod components;
pub mod legend;
pub mod object;
pub mod render;
pub mod slots;
pub mod visibility;
pub mod visuals;

pub use components::Visibility;
pub use legend::*;
pub use object::*;
pub use render::*;
pub use slots::*;
pub use visibility::*;
pub use visuals::*;
