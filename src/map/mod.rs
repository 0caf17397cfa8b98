mod geometry;
mod projection;
mod renderer;

pub use projection::{Viewport, MAX_ZOOM};
pub use renderer::{MapRenderer, Scene, TextOverlay};
