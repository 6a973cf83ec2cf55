/// Display context - logical size of the drawing area plus the device
/// pixel ratio that maps it onto physical pixels.
///
/// Interaction math stays in logical units; only raster composition
/// uses `physical_*`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayContext {
    /// Width in logical pixels
    pub width: f64,
    /// Height in logical pixels
    pub height: f64,
    /// Physical pixels per logical pixel
    pub device_pixel_ratio: f64,
}

impl DisplayContext {
    /// Create new display context
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        let device_pixel_ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            device_pixel_ratio,
        }
    }

    /// Build from a physical surface size, as window systems report it
    pub fn from_physical(width: u32, height: u32, device_pixel_ratio: f64) -> Self {
        let ctx = Self::new(0.0, 0.0, device_pixel_ratio);
        Self::new(
            width as f64 / ctx.device_pixel_ratio,
            height as f64 / ctx.device_pixel_ratio,
            ctx.device_pixel_ratio,
        )
    }

    /// Physical width of the backing surface
    pub fn physical_width(&self) -> u32 {
        (self.width * self.device_pixel_ratio).round() as u32
    }

    /// Physical height of the backing surface
    pub fn physical_height(&self) -> u32 {
        (self.height * self.device_pixel_ratio).round() as u32
    }

    /// Total number of physical pixels
    pub fn pixel_count(&self) -> usize {
        self.physical_width() as usize * self.physical_height() as usize
    }

    /// Total size in bytes for RGBA buffer
    pub fn buffer_size(&self) -> usize {
        self.pixel_count() * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_size_scales_with_ratio() {
        let ctx = DisplayContext::new(640.0, 480.0, 2.0);
        assert_eq!(ctx.physical_width(), 1280);
        assert_eq!(ctx.physical_height(), 960);
        assert_eq!(ctx.pixel_count(), 1280 * 960);
    }

    #[test]
    fn test_buffer_size_rgba() {
        let ctx = DisplayContext::new(100.0, 100.0, 1.0);
        // 100x100 pixels * 4 bytes per pixel (RGBA)
        assert_eq!(ctx.buffer_size(), 40000);
    }

    #[test]
    fn test_from_physical_divides_ratio() {
        let ctx = DisplayContext::from_physical(1500, 900, 1.5);
        assert!((ctx.width - 1000.0).abs() < 1e-9);
        assert!((ctx.height - 600.0).abs() < 1e-9);
        assert_eq!(ctx.physical_width(), 1500);
    }

    #[test]
    fn test_invalid_ratio_falls_back_to_one() {
        assert_eq!(DisplayContext::new(10.0, 10.0, 0.0).device_pixel_ratio, 1.0);
        assert_eq!(DisplayContext::new(10.0, 10.0, f64::NAN).device_pixel_ratio, 1.0);
    }

    #[test]
    fn test_various_common_resolutions() {
        let resolutions = [
            (800.0, 600.0, 1.0),
            (1280.0, 720.0, 1.25),
            (1440.0, 900.0, 2.0),
            (1920.0, 1080.0, 3.0),
        ];

        for (width, height, ratio) in resolutions {
            let ctx = DisplayContext::new(width, height, ratio);
            assert_eq!(ctx.physical_width(), (width * ratio).round() as u32);
            assert_eq!(ctx.buffer_size(), ctx.pixel_count() * 4);
        }
    }
}
