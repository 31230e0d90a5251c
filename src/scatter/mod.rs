//! Scatter visualization of classified samples.
//!
//! The engine may plot the first few thousand samples of a run onto a
//! caller-supplied [`RasterSink`]: blue inside the quarter disc, red outside,
//! over a faint quarter-circle outline. Drawing is best-effort visual
//! feedback. A failing sink is dropped for the rest of the run and never
//! affects the statistics.
//!
//! # Coordinate mapping
//!
//! ```text
//! px = floor(x · width)
//! py = floor(height - y · height)      (y axis points up)
//! ```

pub mod buffer;
pub mod color;
pub mod painter;

use std::sync::{Arc, Mutex};

use thiserror::Error;

pub use buffer::PixelBuffer;
pub use color::Color;
pub use painter::ScatterPainter;

/// Failure reported by a raster sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The surface cannot be drawn on (detached, poisoned, closed).
    #[error("raster sink unavailable: {0}")]
    Unavailable(String),

    /// A pixel outside the surface was addressed.
    #[error("pixel ({x}, {y}) outside {width}x{height} raster")]
    OutOfBounds {
        /// Column.
        x: u32,
        /// Row.
        y: u32,
        /// Surface width.
        width: u32,
        /// Surface height.
        height: u32,
    },

    /// Backend-specific failure.
    #[error("raster backend error: {0}")]
    Backend(String),
}

/// A fixed-size 2-D drawable surface.
pub trait RasterSink {
    /// Surface size as `(width, height)` in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Erase the whole surface.
    ///
    /// # Errors
    ///
    /// Returns error if the surface cannot be drawn on.
    fn clear(&mut self) -> Result<(), SinkError>;

    /// Stroke the quarter circle centred on the bottom-left corner with a
    /// radius of the surface width.
    ///
    /// # Errors
    ///
    /// Returns error if the surface cannot be drawn on.
    fn draw_outline(&mut self, color: Color) -> Result<(), SinkError>;

    /// Fill one pixel.
    ///
    /// # Errors
    ///
    /// Returns error if the surface cannot be drawn on or the pixel is out
    /// of bounds.
    fn plot(&mut self, x: u32, y: u32, color: Color) -> Result<(), SinkError>;
}

/// Shared surfaces let the host keep reading pixels while the engine draws.
impl<S: RasterSink> RasterSink for Arc<Mutex<S>> {
    fn dimensions(&self) -> (u32, u32) {
        self.lock().map_or((0, 0), |sink| sink.dimensions())
    }

    fn clear(&mut self) -> Result<(), SinkError> {
        self.lock()
            .map_err(|e| SinkError::Unavailable(e.to_string()))?
            .clear()
    }

    fn draw_outline(&mut self, color: Color) -> Result<(), SinkError> {
        self.lock()
            .map_err(|e| SinkError::Unavailable(e.to_string()))?
            .draw_outline(color)
    }

    fn plot(&mut self, x: u32, y: u32, color: Color) -> Result<(), SinkError> {
        self.lock()
            .map_err(|e| SinkError::Unavailable(e.to_string()))?
            .plot(x, y, color)
    }
}

/// Map a unit-square coordinate to a pixel, or `None` when it falls off the
/// surface.
#[must_use]
pub fn to_pixel(x: f64, y: f64, width: u32, height: u32) -> Option<(u32, u32)> {
    let w = f64::from(width);
    let h = f64::from(height);
    let px = (x * w).floor();
    let py = (h - y * h).floor();

    if !(0.0..w).contains(&px) || !(0.0..h).contains(&py) {
        return None;
    }
    Some((px as u32, py as u32))
}
