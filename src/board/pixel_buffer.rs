use crate::error::{CanvasError, Result};
use crate::palette::{Palette, Rgba};

use super::pixel::{BoardSize, Pixel};

/// Authoritative local copy of the board
///
/// Holds one palette index per cell and an RGBA raster derived from it.
/// Both are written together, so the raster never lags the index grid.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    size: BoardSize,
    palette: Palette,
    /// Palette index per cell, row-major
    cells: Vec<u8>,
    /// RGBA texel per cell, row-major
    raster: Vec<Rgba>,
    /// Advanced on every committed change
    generation: u64,
}

impl PixelBuffer {
    /// Create a background-filled buffer for the given board
    pub fn new(width: u32, height: u32, palette: Palette) -> Self {
        let mut buffer = Self {
            size: BoardSize::new(width, height),
            palette,
            cells: Vec::new(),
            raster: Vec::new(),
            generation: 0,
        };
        buffer.initialize(width, height);
        buffer
    }

    /// Reallocate for a (possibly different) board and fill with background
    pub fn initialize(&mut self, width: u32, height: u32) {
        self.size = BoardSize::new(width, height);
        let count = self.size.cell_count();
        self.cells = vec![self.palette.background_index(); count];
        self.raster = vec![self.palette.background_color(); count];
        self.commit();
        log::debug!("pixel buffer initialized at {width}x{height}");
    }

    /// Reset every cell to the background color
    pub fn clear(&mut self) {
        self.cells.fill(self.palette.background_index());
        self.raster.fill(self.palette.background_color());
        self.commit();
    }

    /// Replace the board with a snapshot: clear, apply in order, commit once
    pub fn load_bulk<'a, I>(&mut self, pixels: I) -> usize
    where
        I: IntoIterator<Item = &'a Pixel>,
    {
        self.cells.fill(self.palette.background_index());
        self.raster.fill(self.palette.background_color());

        let applied = pixels
            .into_iter()
            .filter(|pixel| self.apply(**pixel, false))
            .count();

        self.commit();
        applied
    }

    /// Write one pixel. Invalid pixels are dropped without error and
    /// `false` is returned. Reapplying the same pixel is harmless.
    pub fn apply(&mut self, pixel: Pixel, commit: bool) -> bool {
        if !self.is_valid(&pixel) {
            return false;
        }

        let idx = self.size.index(pixel.x as u32, pixel.y as u32);
        let color_index = pixel.c as u8;
        self.cells[idx] = color_index;
        self.raster[idx] = self
            .palette
            .color(color_index)
            .unwrap_or_else(|| self.palette.background_color());

        if commit {
            self.commit();
        }
        true
    }

    /// Pure bounds and palette-range check
    pub fn is_valid(&self, pixel: &Pixel) -> bool {
        self.size.contains(pixel.x, pixel.y)
            && pixel.c >= 0
            && (pixel.c as usize) < self.palette.len()
    }

    /// Like `is_valid`, but says what is wrong in words a user can act on
    pub fn check(&self, pixel: &Pixel) -> Result<()> {
        if !self.size.contains(pixel.x, pixel.y) {
            return Err(CanvasError::Validation("Click inside the canvas bounds.".into()));
        }
        if pixel.c < 0 || pixel.c as usize >= self.palette.len() {
            return Err(CanvasError::Validation("Pick a color from the palette.".into()));
        }
        Ok(())
    }

    /// Palette index at a cell, `None` outside the board
    pub fn color_at(&self, x: i32, y: i32) -> Option<u8> {
        if !self.size.contains(x, y) {
            return None;
        }
        Some(self.cells[self.size.index(x as u32, y as u32)])
    }

    /// RGBA at a cell, `None` outside the board
    pub fn rgba_at(&self, x: i32, y: i32) -> Option<Rgba> {
        if !self.size.contains(x, y) {
            return None;
        }
        Some(self.raster[self.size.index(x as u32, y as u32)])
    }

    pub fn dimensions(&self) -> BoardSize {
        self.size
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Raster cache as texels
    pub fn raster(&self) -> &[Rgba] {
        &self.raster
    }

    /// Raster cache as raw RGBA bytes
    pub fn raster_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.raster)
    }

    /// Palette index grid
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Generation counter consumed by the render loop to skip idle frames
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn commit(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}
