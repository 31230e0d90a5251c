//! In-memory RGBA raster.

use super::{Color, RasterSink, SinkError};
use crate::config::ScatterConfig;

/// Row-major RGBA pixel buffer implementing [`RasterSink`].
///
/// Plotting overwrites; there is no alpha blending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl PixelBuffer {
    /// Create a transparent buffer.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::TRANSPARENT; width as usize * height as usize],
        }
    }

    /// Create a buffer sized by the `scatter` section.
    #[must_use]
    pub fn from_config(config: &ScatterConfig) -> Self {
        Self::new(config.width, config.height)
    }

    /// Surface width.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Surface height.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Colour at `(x, y)`, or `None` out of bounds.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Number of pixels currently holding `color`.
    #[must_use]
    pub fn count(&self, color: Color) -> usize {
        self.pixels.iter().filter(|&&p| p == color).count()
    }

    /// Raw pixels, row-major.
    #[must_use]
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }
}

impl RasterSink for PixelBuffer {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) -> Result<(), SinkError> {
        self.pixels.fill(Color::TRANSPARENT);
        Ok(())
    }

    fn draw_outline(&mut self, color: Color) -> Result<(), SinkError> {
        let radius = f64::from(self.width);
        let bottom = f64::from(self.height);
        // Two steps per pixel of arc length leaves no gaps.
        let steps = (radius * std::f64::consts::PI).ceil().max(1.0) as u32;

        for step in 0..=steps {
            let theta = std::f64::consts::FRAC_PI_2 * f64::from(step) / f64::from(steps);
            let px = (radius * theta.cos()).floor();
            let py = (bottom - radius * theta.sin()).floor();
            if px < 0.0 || py < 0.0 {
                continue;
            }
            if let Some(i) = self.index(px as u32, py as u32) {
                self.pixels[i] = color;
            }
        }
        Ok(())
    }

    fn plot(&mut self, x: u32, y: u32, color: Color) -> Result<(), SinkError> {
        let i = self.index(x, y).ok_or(SinkError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        })?;
        self.pixels[i] = color;
        Ok(())
    }
}
