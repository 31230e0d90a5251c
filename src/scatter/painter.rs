//! Plots the leading samples of a run onto a raster sink.

use tracing::debug;

use super::{to_pixel, Color, RasterSink, SinkError};
use crate::config::ScatterConfig;
use crate::engine::sampler::Sample;

/// Draws up to `draw_limit` samples per run, disabling itself on the first
/// sink failure.
pub struct ScatterPainter {
    sink: Box<dyn RasterSink + Send>,
    draw_limit: u64,
    inside_color: Color,
    outside_color: Color,
    outline_color: Color,
    offered: u64,
    plotted: u64,
    failed: bool,
}

impl std::fmt::Debug for ScatterPainter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScatterPainter")
            .field("dimensions", &self.sink.dimensions())
            .field("draw_limit", &self.draw_limit)
            .field("offered", &self.offered)
            .field("plotted", &self.plotted)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

impl ScatterPainter {
    /// Wrap a sink using the colours and limit from `config`.
    #[must_use]
    pub fn new(sink: Box<dyn RasterSink + Send>, config: &ScatterConfig) -> Self {
        Self {
            sink,
            draw_limit: config.draw_limit,
            inside_color: config.inside_color,
            outside_color: config.outside_color,
            outline_color: config.outline_color,
            offered: 0,
            plotted: 0,
            failed: false,
        }
    }

    /// Reset per-run counters, clear the surface and draw the outline.
    pub fn begin_run(&mut self) {
        self.offered = 0;
        self.plotted = 0;
        self.failed = false;

        let prepared = self
            .sink
            .clear()
            .and_then(|()| self.sink.draw_outline(self.outline_color));
        if let Err(e) = prepared {
            self.disable(&e);
        }
    }

    /// Whether further samples would still be drawn this run.
    #[must_use]
    pub fn wants_samples(&self) -> bool {
        !self.failed && self.offered < self.draw_limit
    }

    /// Offer one classified sample.
    pub fn paint(&mut self, sample: &Sample, inside: bool) {
        if !self.wants_samples() {
            return;
        }
        self.offered += 1;

        let (width, height) = self.sink.dimensions();
        let Some((px, py)) = to_pixel(sample.x, sample.y, width, height) else {
            return;
        };
        let color = if inside {
            self.inside_color
        } else {
            self.outside_color
        };

        match self.sink.plot(px, py, color) {
            Ok(()) => self.plotted += 1,
            Err(e) => self.disable(&e),
        }
    }

    /// Samples offered this run (counts toward the draw limit).
    #[must_use]
    pub const fn offered(&self) -> u64 {
        self.offered
    }

    /// Samples actually plotted this run.
    #[must_use]
    pub const fn plotted(&self) -> u64 {
        self.plotted
    }

    /// Whether the sink failed during this run.
    #[must_use]
    pub const fn has_failed(&self) -> bool {
        self.failed
    }

    /// Give the sink back to the caller.
    #[must_use]
    pub fn into_sink(self) -> Box<dyn RasterSink + Send> {
        self.sink
    }

    fn disable(&mut self, error: &SinkError) {
        debug!(%error, offered = self.offered, "scatter sink failed, drawing disabled for this run");
        self.failed = true;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::scatter::PixelBuffer;

    /// A sink that refuses every call after `budget` plots.
    #[derive(Debug, Default)]
    struct FlakySink {
        budget: usize,
        plots: usize,
        fail_clear: bool,
    }

    impl RasterSink for FlakySink {
        fn dimensions(&self) -> (u32, u32) {
            (10, 10)
        }

        fn clear(&mut self) -> Result<(), SinkError> {
            if self.fail_clear {
                return Err(SinkError::Unavailable("detached".into()));
            }
            Ok(())
        }

        fn draw_outline(&mut self, _color: Color) -> Result<(), SinkError> {
            Ok(())
        }

        fn plot(&mut self, _x: u32, _y: u32, _color: Color) -> Result<(), SinkError> {
            if self.plots >= self.budget {
                return Err(SinkError::Backend("context lost".into()));
            }
            self.plots += 1;
            Ok(())
        }
    }

    fn config(draw_limit: u64) -> ScatterConfig {
        ScatterConfig {
            draw_limit,
            ..ScatterConfig::default()
        }
    }

    #[test]
    fn test_paints_inside_and_outside_colours() {
        let buffer = Arc::new(Mutex::new(PixelBuffer::new(10, 10)));
        let mut painter = ScatterPainter::new(Box::new(Arc::clone(&buffer)), &config(10));
        painter.begin_run();

        painter.paint(&Sample::new(0.15, 0.15), true);
        painter.paint(&Sample::new(0.95, 0.95), false);

        let raster = buffer.lock().expect("lock");
        assert_eq!(raster.pixel(1, 8), Some(Color::INSIDE_BLUE));
        assert_eq!(raster.pixel(9, 0), Some(Color::OUTSIDE_RED));
        assert_eq!(painter.plotted(), 2);
    }

    #[test]
    fn test_draw_limit_caps_offered_samples() {
        let buffer = Arc::new(Mutex::new(PixelBuffer::new(10, 10)));
        let mut painter = ScatterPainter::new(Box::new(buffer), &config(3));
        painter.begin_run();

        for _ in 0..10 {
            painter.paint(&Sample::new(0.5, 0.5), true);
        }
        assert_eq!(painter.offered(), 3);
        assert!(!painter.wants_samples());
    }

    #[test]
    fn test_off_surface_samples_count_toward_limit() {
        let mut painter =
            ScatterPainter::new(Box::new(PixelBuffer::new(10, 10)), &config(5));
        painter.begin_run();

        painter.paint(&Sample::new(0.5, 0.0), true);
        assert_eq!(painter.offered(), 1);
        assert_eq!(painter.plotted(), 0);
        assert!(!painter.has_failed());
    }

    #[test]
    fn test_plot_failure_disables_painter() {
        let sink = FlakySink {
            budget: 2,
            ..FlakySink::default()
        };
        let mut painter = ScatterPainter::new(Box::new(sink), &config(100));
        painter.begin_run();

        for _ in 0..10 {
            painter.paint(&Sample::new(0.5, 0.5), true);
        }
        assert!(painter.has_failed());
        assert_eq!(painter.plotted(), 2);
        assert_eq!(painter.offered(), 3);
    }

    #[test]
    fn test_clear_failure_disables_before_plotting() {
        let sink = FlakySink {
            budget: 100,
            fail_clear: true,
            ..FlakySink::default()
        };
        let mut painter = ScatterPainter::new(Box::new(sink), &config(100));
        painter.begin_run();

        painter.paint(&Sample::new(0.5, 0.5), true);
        assert!(painter.has_failed());
        assert_eq!(painter.offered(), 0);
    }

    #[test]
    fn test_begin_run_resets_counters_and_surface() {
        let buffer = Arc::new(Mutex::new(PixelBuffer::new(10, 10)));
        let mut painter = ScatterPainter::new(Box::new(Arc::clone(&buffer)), &config(1));
        painter.begin_run();
        painter.paint(&Sample::new(0.15, 0.15), true);
        assert!(!painter.wants_samples());

        painter.begin_run();
        assert!(painter.wants_samples());
        assert_eq!(painter.offered(), 0);
        assert_eq!(buffer.lock().expect("lock").count(Color::INSIDE_BLUE), 0);
    }

    #[test]
    fn test_zero_draw_limit_draws_nothing() {
        let mut painter =
            ScatterPainter::new(Box::new(PixelBuffer::new(10, 10)), &config(0));
        painter.begin_run();
        painter.paint(&Sample::new(0.5, 0.5), true);
        assert_eq!(painter.plotted(), 0);
    }

    #[test]
    fn test_debug_shows_counters() {
        let painter = ScatterPainter::new(Box::new(PixelBuffer::new(2, 2)), &config(1));
        let debug = format!("{painter:?}");
        assert!(debug.contains("ScatterPainter"));
        assert!(debug.contains("draw_limit"));
    }

    #[test]
    fn test_into_sink_returns_surface() {
        let painter = ScatterPainter::new(Box::new(PixelBuffer::new(6, 3)), &config(1));
        assert_eq!(painter.into_sink().dimensions(), (6, 3));
    }
}
