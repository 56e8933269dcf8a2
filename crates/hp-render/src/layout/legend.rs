use crate::canvas::Canvas;
use crate::color::Color;
use crate::layout::margins::PlotArea;
use crate::primitives::*;
use crate::text::text_width;

pub struct LegendEntry {
    pub label: String,
    pub color: Color,
    pub kind: LegendKind,
}

pub enum LegendKind {
    FilledRect,
    Line(Option<String>), // dash pattern
    Marker,
    HatchedRect,
}

/// Legend box anchored to the top-right corner of the plot area.
pub fn draw_legend(
    canvas: &mut Canvas,
    area: &PlotArea,
    entries: &[LegendEntry],
    font_size: f64,
) {
    if entries.is_empty() {
        return;
    }

    let row_height = font_size + 4.0;
    let swatch_w = 14.0;
    let swatch_h = font_size - 2.0;
    let gap = 6.0;
    let padding = 6.0;
    let text_size = font_size * 0.85;

    let text_style = TextStyle {
        size: text_size,
        baseline: TextBaseline::Central,
        ..Default::default()
    };

    let max_w = entries
        .iter()
        .map(|e| text_width(&e.label, text_size, FontWeight::Regular))
        .fold(0.0_f64, f64::max);

    let legend_w = padding + swatch_w + gap + max_w + padding;
    let legend_h = padding + entries.len() as f64 * row_height + padding;

    let lx = area.right() - legend_w - 5.0;
    let ly = area.top + 5.0;

    let bg_style = Style {
        fill: Some(Color::rgb(255, 255, 255).with_alpha(0.9)),
        stroke: None,
        stroke_width: 0.5,
        opacity: 1.0,
    };
    canvas.rect(lx, ly, legend_w, legend_h, &bg_style);

    for (i, entry) in entries.iter().enumerate() {
        let ey = ly + padding + i as f64 * row_height + row_height / 2.0;
        let sx = lx + padding;

        match entry.kind {
            LegendKind::FilledRect => {
                canvas.rect(
                    sx,
                    ey - swatch_h / 2.0,
                    swatch_w,
                    swatch_h,
                    &Style::filled(entry.color),
                );
            }
            LegendKind::Line(ref dash) => {
                let ls = LineStyle { color: entry.color, width: 1.5, dash: dash.clone() };
                canvas.line(sx, ey, sx + swatch_w, ey, &ls);
            }
            LegendKind::Marker => {
                canvas.circle(
                    sx + swatch_w / 2.0,
                    ey,
                    3.0,
                    &MarkerStyle { color: entry.color, ..Default::default() },
                );
            }
            LegendKind::HatchedRect => {
                let paint = canvas.hatch_pattern(entry.color, 4.0);
                canvas.rect_paint(sx, ey - swatch_h / 2.0, swatch_w, swatch_h, &paint);
            }
        }

        canvas.text(sx + swatch_w + gap, ey, &entry.label, &text_style);
    }
}
