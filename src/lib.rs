pub mod app;
pub mod board;
pub mod cli;
pub mod config;
pub mod cooldown;
pub mod core;
pub mod error;
pub mod identity;
pub mod input;
pub mod loader;
pub mod palette;
pub mod placement;
pub mod status;
pub mod sync;
pub mod viewport;

pub use app::{AppServices, CanvasApp};
pub use board::{BoardSize, BoardSnapshot, Pixel, PixelBuffer};
pub use error::CanvasError;
pub use palette::{Palette, Rgba};
pub use placement::{PlacementPipeline, PlacementResult, UiRequest};
pub use viewport::{CoordinateTransform, Viewport};
