use crate::config::RenderConfig;
use crate::layout::axes::Axis;
use crate::primitives::FontWeight;
use crate::text::text_width;

/// Rectangular plot area within the canvas.
#[derive(Debug, Clone, Copy)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotArea {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Margins derived from tick label widths and the header band.
    pub fn auto(
        canvas_w: f64,
        canvas_h: f64,
        y_axis: Option<&Axis>,
        x_axis: Option<&Axis>,
        config: &RenderConfig,
    ) -> Self {
        let tick_size = config.font.tick_size;
        let label_size = config.font.label_size;

        let mut left = 15.0;
        if let Some(y) = y_axis {
            let max_tick_w = y
                .tick_labels
                .iter()
                .map(|l| text_width(l, tick_size, FontWeight::Regular))
                .fold(0.0_f64, f64::max);
            left += max_tick_w + 8.0;
            if !y.label.is_empty() {
                left += label_size + 6.0;
            }
        }

        let mut bottom = 15.0;
        if let Some(x) = x_axis {
            bottom += tick_size + 6.0;
            if !x.label.is_empty() {
                bottom += label_size + 6.0;
            }
        }

        // Header band above the axes.
        let top = if config.experiment.name.is_empty() {
            12.0
        } else {
            config.font.label_size * 1.3 + 20.0
        };

        let right = 15.0;

        let width = canvas_w - left - right;
        let height = canvas_h - top - bottom;

        Self { left, top, width: width.max(50.0), height: height.max(50.0) }
    }

    /// Manual placement, used by panel layouts.
    pub fn manual(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }
}
