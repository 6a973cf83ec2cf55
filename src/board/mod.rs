pub mod pixel;
pub mod pixel_buffer;

pub use pixel::*;
pub use pixel_buffer::*;
