use crate::canvas::Canvas;
use crate::color::Color;
use crate::config::RenderConfig;
use crate::layout::margins::PlotArea;
use crate::primitives::*;
use crate::text::text_width;

/// Draw the experiment header (e.g., **CMS** *Preliminary*, √s = 13.6 TeV, 138 fb⁻¹)
/// and the category tag below it.
pub fn draw_experiment_header(
    canvas: &mut Canvas,
    area: &PlotArea,
    config: &RenderConfig,
    category: &str,
) {
    let y = area.top - 6.0;

    if !config.experiment.name.is_empty() {
        let header_size = config.font.label_size * 1.3;
        let x = area.left;

        let bold_style = TextStyle {
            size: header_size,
            color: Color::rgb(0, 0, 0),
            weight: FontWeight::Bold,
            anchor: TextAnchor::Start,
            baseline: TextBaseline::Alphabetic,
            ..Default::default()
        };
        canvas.text(x, y, &config.experiment.name, &bold_style);

        if !config.experiment.status.is_empty() {
            let name_w = text_width(&config.experiment.name, header_size, FontWeight::Bold);
            let italic_style = TextStyle {
                size: header_size * 0.85,
                color: Color::rgb(0, 0, 0),
                style: FontStyle::Italic,
                anchor: TextAnchor::Start,
                baseline: TextBaseline::Alphabetic,
                ..Default::default()
            };
            canvas.text(x + name_w + 5.0, y, &config.experiment.status, &italic_style);
        }
    }

    let mut info_parts = Vec::new();
    if config.experiment.sqrt_s_tev > 0.0 {
        info_parts.push(format!("\u{221A}s = {} TeV", config.experiment.sqrt_s_tev));
    }
    if config.experiment.lumi_fb_inv > 0.0 {
        info_parts.push(format!("{} fb\u{207B}\u{00B9}", config.experiment.lumi_fb_inv));
    }
    if !info_parts.is_empty() {
        let info = info_parts.join(", ");
        let info_style = TextStyle {
            size: config.font.tick_size,
            color: Color::rgb(80, 80, 80),
            anchor: TextAnchor::End,
            baseline: TextBaseline::Alphabetic,
            ..Default::default()
        };
        canvas.text(area.right(), y, &info, &info_style);
    }

    // Category tag inside the axes, top-left corner.
    if !category.is_empty() {
        let tag_style = TextStyle {
            size: config.font.size,
            color: Color::rgb(55, 65, 81),
            anchor: TextAnchor::Start,
            baseline: TextBaseline::Hanging,
            ..Default::default()
        };
        canvas.text(area.left + 6.0, area.top + 6.0, category, &tag_style);
    }
}
