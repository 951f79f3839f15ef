pub mod array_view;
pub mod surface;
pub mod tree_view;

pub use surface::CommandSurface;
