use glam::DVec2;

use super::display_context::DisplayContext;
use crate::palette::Rgba;
use crate::viewport::Viewport;

/// Borrowed view of a board raster
#[derive(Debug, Clone, Copy)]
pub struct RasterView<'a> {
    pub width: u32,
    pub height: u32,
    pub texels: &'a [Rgba],
}

/// Drawing target the render loop composes onto
///
/// Every method takes logical coordinates; implementations map them onto
/// their physical resolution using the context's device pixel ratio.
pub trait RasterSurface {
    /// Resize the backing store to the context's physical size
    fn resize(&mut self, context: DisplayContext);

    /// Current display context
    fn context(&self) -> DisplayContext;

    /// Fill the whole surface
    fn clear(&mut self, color: Rgba);

    /// Draw the raster through the viewport, nearest-neighbor
    fn blit(&mut self, raster: RasterView<'_>, viewport: &Viewport);

    /// Outline a logical rectangle with a logical line width
    fn stroke_rect(&mut self, origin: DVec2, size: DVec2, color: Rgba, line_width: f64);
}

/// CPU framebuffer in physical pixels
#[derive(Debug, Clone)]
pub struct SoftwareSurface {
    context: DisplayContext,
    width: u32,
    height: u32,
    frame: Vec<Rgba>,
    /// Scratch column lookup reused between frames
    columns: Vec<Option<u32>>,
}

impl SoftwareSurface {
    pub fn new(context: DisplayContext) -> Self {
        let mut surface = Self {
            context,
            width: 0,
            height: 0,
            frame: Vec::new(),
            columns: Vec::new(),
        };
        surface.resize(context);
        surface
    }

    /// Physical size of the framebuffer
    pub fn physical_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Framebuffer texels, row-major
    pub fn frame(&self) -> &[Rgba] {
        &self.frame
    }

    /// Framebuffer as raw RGBA bytes, ready for upload
    pub fn frame_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.frame)
    }

    /// Texel at a physical position
    pub fn physical_pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.frame[(y * self.width + x) as usize])
    }

    fn fill_span(&mut self, x0: i64, x1: i64, y0: i64, y1: i64, color: Rgba) {
        let x0 = x0.clamp(0, self.width as i64) as u32;
        let x1 = x1.clamp(0, self.width as i64) as u32;
        let y0 = y0.clamp(0, self.height as i64) as u32;
        let y1 = y1.clamp(0, self.height as i64) as u32;

        for y in y0..y1 {
            let row = (y * self.width) as usize;
            self.frame[row + x0 as usize..row + x1 as usize].fill(color);
        }
    }
}

impl RasterSurface for SoftwareSurface {
    fn resize(&mut self, context: DisplayContext) {
        self.context = context;
        self.width = context.physical_width();
        self.height = context.physical_height();
        self.frame = vec![Rgba::opaque(0, 0, 0); self.width as usize * self.height as usize];
        self.columns = Vec::with_capacity(self.width as usize);
    }

    fn context(&self) -> DisplayContext {
        self.context
    }

    fn clear(&mut self, color: Rgba) {
        self.frame.fill(color);
    }

    fn blit(&mut self, raster: RasterView<'_>, viewport: &Viewport) {
        if raster.texels.len() < raster.width as usize * raster.height as usize {
            log::warn!("raster smaller than its declared {}x{}", raster.width, raster.height);
            return;
        }

        let ratio = self.context.device_pixel_ratio;
        // Sample each physical pixel at its center, mapped back to logical
        // units and then into board space
        let to_board = |physical: u32, offset: f64, limit: u32| -> Option<u32> {
            let logical = (physical as f64 + 0.5) / ratio;
            let cell = ((logical - offset) / viewport.scale).floor();
            (cell >= 0.0 && cell < limit as f64).then_some(cell as u32)
        };

        self.columns.clear();
        for px in 0..self.width {
            self.columns.push(to_board(px, viewport.offset.x, raster.width));
        }

        for py in 0..self.height {
            let Some(by) = to_board(py, viewport.offset.y, raster.height) else {
                continue;
            };
            let src_row = (by * raster.width) as usize;
            let dst_row = (py * self.width) as usize;

            for (px, column) in self.columns.iter().enumerate() {
                if let Some(bx) = column {
                    self.frame[dst_row + px] = raster.texels[src_row + *bx as usize];
                }
            }
        }
    }

    fn stroke_rect(&mut self, origin: DVec2, size: DVec2, color: Rgba, line_width: f64) {
        let ratio = self.context.device_pixel_ratio;
        let x0 = (origin.x * ratio).round() as i64;
        let y0 = (origin.y * ratio).round() as i64;
        let x1 = ((origin.x + size.x) * ratio).round() as i64;
        let y1 = ((origin.y + size.y) * ratio).round() as i64;
        let w = ((line_width * ratio).round() as i64).max(1);

        self.fill_span(x0, x1, y0, y0 + w, color);
        self.fill_span(x0, x1, y1 - w, y1, color);
        self.fill_span(x0, x0 + w, y0, y1, color);
        self.fill_span(x1 - w, x1, y0, y1, color);
    }
}
