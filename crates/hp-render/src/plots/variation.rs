use hp_shape::SystVariationArtifact;

use crate::canvas::Canvas;
use crate::color::Color;
use crate::config::RenderConfig;
use crate::header::draw_experiment_header;
use crate::layout::axes::Axis;
use crate::layout::legend::{self, LegendEntry, LegendKind};
use crate::layout::margins::PlotArea;
use crate::layout::panels::MainRatioLayout;
use crate::plots::axes_draw::draw_axes;
use crate::primitives::*;
use crate::RenderError;

fn validate(a: &SystVariationArtifact) -> crate::Result<usize> {
    if a.bin_edges.len() < 2 {
        return Err(RenderError::Artifact("fewer than two bin edges".into()));
    }
    let n_bins = a.bin_edges.len() - 1;
    for (name, v) in [("nominal", &a.nominal), ("up", &a.up), ("down", &a.down)] {
        if v.len() != n_bins {
            return Err(RenderError::Artifact(format!(
                "{name} has {} entries, expected {n_bins}",
                v.len()
            )));
        }
    }
    Ok(n_bins)
}

/// Step-line vertices along the bin edges.
fn step_points(
    edges: &[f64],
    values: &[f64],
    x_axis: &Axis,
    y_axis: &Axis,
    area: &PlotArea,
) -> Vec<(f64, f64)> {
    let mut pts = Vec::with_capacity(values.len() * 2);
    for (bi, &v) in values.iter().enumerate() {
        let py = y_axis.data_to_pixel(v, area.bottom(), area.top);
        let px_lo = x_axis.data_to_pixel(edges[bi], area.left, area.right());
        let px_hi = x_axis.data_to_pixel(edges[bi + 1], area.left, area.right());
        pts.push((px_lo, py));
        pts.push((px_hi, py));
    }
    pts
}

fn ratio_to(values: &[f64], nominal: &[f64]) -> Vec<f64> {
    values
        .iter()
        .zip(nominal)
        .map(|(v, n)| if *n != 0.0 { v / n } else { 1.0 })
        .collect()
}

/// Nominal/up/down overlay for one systematic source, with a
/// variation-over-nominal ratio panel.
pub fn render(artifact: &SystVariationArtifact, config: &RenderConfig) -> crate::Result<String> {
    let _n_bins = validate(artifact)?;

    let fig_w = config.figure.width;
    let fig_h = config.figure.height;
    let mut canvas = Canvas::new(fig_w, fig_h, &config.font.family);

    let edges = &artifact.bin_edges;
    let x_axis = Axis::binned(edges, 6).with_label(artifact.axis_label.as_str());

    let y_hi = artifact
        .nominal
        .iter()
        .chain(&artifact.up)
        .chain(&artifact.down)
        .copied()
        .filter(|v: &f64| v.is_finite())
        .fold(0.0_f64, f64::max);
    let y_axis = Axis::auto_linear(0.0, y_hi.max(1e-12) * 1.4, 5).with_label("Events");

    let ratio_up = ratio_to(&artifact.up, &artifact.nominal);
    let ratio_down = ratio_to(&artifact.down, &artifact.nominal);
    let spread = ratio_up
        .iter()
        .chain(&ratio_down)
        .copied()
        .filter(|v: &f64| v.is_finite())
        .fold(0.0_f64, |m, v| m.max((v - 1.0).abs()));
    let half = (spread * 1.3).max(0.05);
    let y_axis_ratio =
        Axis::fixed_with_ticks(1.0 - half, 1.0 + half, 3).with_label("Var. / Nom.");

    let area = PlotArea::auto(fig_w, fig_h, Some(&y_axis), Some(&x_axis), config);
    let layout = MainRatioLayout::new(area.left, area.top, area.width, area.height, 4.0, 0.25);
    let main = &layout.main;
    let ratio_area = &layout.ratio;

    draw_experiment_header(&mut canvas, main, config, &artifact.category);

    let nominal_style = LineStyle::solid(Color::rgb(0, 0, 0), 1.2);
    let up_style = LineStyle::solid(config.colors.variation_up, 1.0);
    let down_style = LineStyle::solid(config.colors.variation_down, 1.0);

    draw_axes(&mut canvas, main, &x_axis, &y_axis, config, false);
    canvas.push_clip(main.left, main.top, main.width, main.height);
    canvas.polyline(&step_points(edges, &artifact.nominal, &x_axis, &y_axis, main), &nominal_style);
    canvas.polyline(&step_points(edges, &artifact.up, &x_axis, &y_axis, main), &up_style);
    canvas.polyline(&step_points(edges, &artifact.down, &x_axis, &y_axis, main), &down_style);
    canvas.pop_clip();

    draw_axes(&mut canvas, ratio_area, &x_axis, &y_axis_ratio, config, true);
    canvas.push_clip(ratio_area.left, ratio_area.top, ratio_area.width, ratio_area.height);
    let ref_py = y_axis_ratio.data_to_pixel(1.0, ratio_area.bottom(), ratio_area.top);
    canvas.line(
        ratio_area.left,
        ref_py,
        ratio_area.right(),
        ref_py,
        &LineStyle::dashed(Color::rgb(150, 150, 150), 0.6),
    );
    canvas.polyline(
        &step_points(edges, &ratio_up, &x_axis, &y_axis_ratio, ratio_area),
        &up_style,
    );
    canvas.polyline(
        &step_points(edges, &ratio_down, &x_axis, &y_axis_ratio, ratio_area),
        &down_style,
    );
    canvas.pop_clip();

    let entries = vec![
        LegendEntry {
            label: format!("{} up", artifact.syst_name),
            color: config.colors.variation_up,
            kind: LegendKind::Line(None),
        },
        LegendEntry {
            label: "nominal".into(),
            color: Color::rgb(0, 0, 0),
            kind: LegendKind::Line(None),
        },
        LegendEntry {
            label: format!("{} down", artifact.syst_name),
            color: config.colors.variation_down,
            kind: LegendKind::Line(None),
        },
    ];
    legend::draw_legend(&mut canvas, main, &entries, config.font.size);

    Ok(canvas.finish_svg(None))
}
