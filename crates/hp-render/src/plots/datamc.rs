use hp_shape::DataMcArtifact;

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

fn check_len(name: &str, len: usize, n_bins: usize) -> crate::Result<()> {
    if len != n_bins {
        return Err(RenderError::Artifact(format!(
            "{name} has {len} entries, expected {n_bins}"
        )));
    }
    Ok(())
}

fn validate(a: &DataMcArtifact) -> crate::Result<usize> {
    if a.bin_edges.len() < 2 {
        return Err(RenderError::Artifact("fewer than two bin edges".into()));
    }
    let n_bins = a.bin_edges.len() - 1;
    check_len("total_mc_y", a.total_mc_y.len(), n_bins)?;
    for s in &a.samples {
        check_len(&format!("sample '{}'", s.name), s.y.len(), n_bins)?;
    }
    if let Some(d) = &a.data_y {
        check_len("data_y", d.len(), n_bins)?;
    }
    if let Some(b) = &a.band {
        check_len("band.lo", b.lo.len(), n_bins)?;
        check_len("band.hi", b.hi.len(), n_bins)?;
    }
    if let Some(r) = &a.ratio_y {
        check_len("ratio_y", r.len(), n_bins)?;
    }
    Ok(n_bins)
}

fn sample_color(explicit: Option<&String>, index: usize, palette: &[Color]) -> Color {
    match explicit {
        Some(hex) => Color::hex(hex),
        None => {
            if palette.is_empty() {
                Color::hex("#888888")
            } else {
                palette[index % palette.len()]
            }
        }
    }
}

/// Smallest positive value drawn, for the log-axis floor.
fn min_positive(artifact: &DataMcArtifact) -> f64 {
    let mut m = f64::INFINITY;
    let mut scan = |vals: &[f64]| {
        for &v in vals {
            if v.is_finite() && v > 0.0 && v < m {
                m = v;
            }
        }
    };
    scan(&artifact.total_mc_y);
    if let Some(d) = &artifact.data_y {
        scan(d);
    }
    if m.is_finite() {
        m
    } else {
        0.1
    }
}

fn y_max(artifact: &DataMcArtifact) -> f64 {
    let mut m = 0.0_f64;
    for &v in &artifact.total_mc_y {
        if v.is_finite() {
            m = m.max(v);
        }
    }
    if let Some(b) = &artifact.band {
        for &v in &b.hi {
            if v.is_finite() {
                m = m.max(v);
            }
        }
    }
    if let (Some(d), Some(hi)) = (&artifact.data_y, &artifact.data_yerr_hi) {
        for (v, e) in d.iter().zip(hi) {
            if v.is_finite() && e.is_finite() {
                m = m.max(v + e);
            }
        }
    }
    if m <= 0.0 {
        1.0
    } else {
        m
    }
}

pub fn render(artifact: &DataMcArtifact, config: &RenderConfig) -> crate::Result<String> {
    let n_bins = validate(artifact)?;
    let has_ratio = artifact.ratio_y.is_some();

    let fig_w = config.figure.width;
    let fig_h = config.figure.height;
    let mut canvas = Canvas::new(fig_w, fig_h, &config.font.family);

    let palette = config.palette_colors();
    let edges = &artifact.bin_edges;

    let x_axis = Axis::binned(edges, 6).with_label(artifact.axis_label.as_str());
    let y_label = if artifact.density { "Density" } else { "Events" };
    let y_axis = if artifact.log {
        // Extra decade of headroom so the legend does not overlap the stack.
        Axis::auto_log(min_positive(artifact), y_max(artifact) * 10.0)
    } else {
        Axis::auto_linear(0.0, y_max(artifact) * 1.4, 5)
    }
    .with_label(y_label);

    let ratio_range = config.distributions.ratio_y_range;
    let y_axis_ratio =
        Axis::fixed_with_ticks(ratio_range[0], ratio_range[1], 3).with_label("Data / MC");

    let area = PlotArea::auto(fig_w, fig_h, Some(&y_axis), Some(&x_axis), config);
    let (main, ratio_panel) = if has_ratio {
        let layout = MainRatioLayout::new(area.left, area.top, area.width, area.height, 4.0, 0.25);
        (layout.main, Some(layout.ratio))
    } else {
        (area, None)
    };

    draw_experiment_header(&mut canvas, &main, config, &artifact.category);

    // --- Main panel ---
    draw_axes(&mut canvas, &main, &x_axis, &y_axis, config, !has_ratio);
    canvas.push_clip(main.left, main.top, main.width, main.height);

    // Stack heights live in data units; only the drawn edges are clamped
    // to the log floor so sub-floor bases do not shift the whole stack.
    let floor = if artifact.log { y_axis.min } else { f64::NEG_INFINITY };
    let mut cumulative = vec![0.0_f64; n_bins];

    for (si, sample) in artifact.samples.iter().enumerate() {
        let color = sample_color(sample.color.as_ref(), si, &palette);
        for bi in 0..n_bins {
            let y_base = cumulative[bi];
            let y_top = y_base + sample.y[bi];
            let px_lo = x_axis.data_to_pixel(edges[bi], main.left, main.right());
            let px_hi = x_axis.data_to_pixel(edges[bi + 1], main.left, main.right());
            let py_base = y_axis.data_to_pixel(y_base.max(floor), main.bottom(), main.top);
            let py_top = y_axis.data_to_pixel(y_top.max(floor), main.bottom(), main.top);
            canvas.rect(px_lo, py_top, px_hi - px_lo, py_base - py_top, &Style::filled(color));
            cumulative[bi] = y_top;
        }
    }

    if config.distributions.show_mc_band {
        if let Some(band) = &artifact.band {
            let paint =
                canvas.hatch_pattern(config.colors.band, config.distributions.hatch_spacing);
            for bi in 0..n_bins {
                let px_lo = x_axis.data_to_pixel(edges[bi], main.left, main.right());
                let px_hi = x_axis.data_to_pixel(edges[bi + 1], main.left, main.right());
                let py_lo = y_axis.data_to_pixel(band.lo[bi], main.bottom(), main.top);
                let py_hi = y_axis.data_to_pixel(band.hi[bi], main.bottom(), main.top);
                canvas.rect_paint(px_lo, py_hi, px_hi - px_lo, py_lo - py_hi, &paint);
            }
        }
    }

    if let (Some(data), Some(err_lo), Some(err_hi)) =
        (&artifact.data_y, &artifact.data_yerr_lo, &artifact.data_yerr_hi)
    {
        let marker = MarkerStyle { color: config.colors.data, size: 2.5, fill: true };
        let err_style = LineStyle::solid(config.colors.data, 1.0);
        for bi in 0..n_bins {
            let y = data[bi];
            if !y.is_finite() {
                continue;
            }
            let x_center = (edges[bi] + edges[bi + 1]) / 2.0;
            let px = x_axis.data_to_pixel(x_center, main.left, main.right());
            let py = y_axis.data_to_pixel(y, main.bottom(), main.top);
            if err_lo[bi].is_finite() && err_hi[bi].is_finite() {
                let py_lo = y_axis.data_to_pixel(y - err_lo[bi], main.bottom(), main.top);
                let py_hi = y_axis.data_to_pixel(y + err_hi[bi], main.bottom(), main.top);
                canvas.error_bar(px, py_lo, py_hi, 0.0, &err_style);
            }
            canvas.circle(px, py, marker.size, &marker);
        }
    }

    canvas.pop_clip();

    // --- Ratio panel ---
    if let Some(ratio_area) = &ratio_panel {
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

        if let Some(band) = &artifact.ratio_band {
            let paint =
                canvas.hatch_pattern(config.colors.band, config.distributions.hatch_spacing);
            for bi in 0..n_bins {
                let px_lo = x_axis.data_to_pixel(edges[bi], ratio_area.left, ratio_area.right());
                let px_hi =
                    x_axis.data_to_pixel(edges[bi + 1], ratio_area.left, ratio_area.right());
                let py_lo =
                    y_axis_ratio.data_to_pixel(band.lo[bi], ratio_area.bottom(), ratio_area.top);
                let py_hi =
                    y_axis_ratio.data_to_pixel(band.hi[bi], ratio_area.bottom(), ratio_area.top);
                canvas.rect_paint(px_lo, py_hi, px_hi - px_lo, py_lo - py_hi, &paint);
            }
        }

        if let (Some(ry), Some(rlo), Some(rhi)) =
            (&artifact.ratio_y, &artifact.ratio_yerr_lo, &artifact.ratio_yerr_hi)
        {
            let marker = MarkerStyle { color: config.colors.data, size: 2.0, fill: true };
            let err_style = LineStyle::solid(config.colors.data, 0.8);
            for bi in 0..n_bins {
                let y = ry[bi];
                // MC sum vanished in this bin.
                if !y.is_finite() {
                    continue;
                }
                let x_center = (edges[bi] + edges[bi + 1]) / 2.0;
                let px = x_axis.data_to_pixel(x_center, ratio_area.left, ratio_area.right());
                let py = y_axis_ratio.data_to_pixel(y, ratio_area.bottom(), ratio_area.top);
                if rlo[bi].is_finite() && rhi[bi].is_finite() {
                    let py_lo = y_axis_ratio.data_to_pixel(
                        y - rlo[bi],
                        ratio_area.bottom(),
                        ratio_area.top,
                    );
                    let py_hi = y_axis_ratio.data_to_pixel(
                        y + rhi[bi],
                        ratio_area.bottom(),
                        ratio_area.top,
                    );
                    canvas.error_bar(px, py_lo, py_hi, 0.0, &err_style);
                }
                canvas.circle(px, py, marker.size, &marker);
            }
        }

        canvas.pop_clip();
    }

    // Legend: data first, then the stack top to bottom, then the band.
    let mut entries = Vec::new();
    if artifact.data_y.is_some() {
        entries.push(LegendEntry {
            label: "Data".into(),
            color: config.colors.data,
            kind: LegendKind::Marker,
        });
    }
    for (si, sample) in artifact.samples.iter().enumerate().rev() {
        entries.push(LegendEntry {
            label: sample.label.clone(),
            color: sample_color(sample.color.as_ref(), si, &palette),
            kind: LegendKind::FilledRect,
        });
    }
    if artifact.band.is_some() && config.distributions.show_mc_band {
        entries.push(LegendEntry {
            label: "Uncertainty".into(),
            color: config.colors.band,
            kind: LegendKind::HatchedRect,
        });
    }
    legend::draw_legend(&mut canvas, &main, &entries, config.font.size);

    Ok(canvas.finish_svg(None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hp_shape::{ArtifactMeta, BandEnvelope, SampleSeries};

    fn minimal_artifact() -> DataMcArtifact {
        DataMcArtifact {
            schema_version: "hepplot_datamc_v0".into(),
            meta: ArtifactMeta {
                tool: "hepplot".into(),
                tool_version: "0.0.0".into(),
                created_unix_ms: 0,
            },
            variable: "x".into(),
            category: "cat".into(),
            axis_label: "x [GeV]".into(),
            bin_edges: vec![0.0, 1.0, 2.0],
            data_y: Some(vec![10.0, 20.0]),
            data_yerr_lo: Some(vec![3.0, 4.0]),
            data_yerr_hi: Some(vec![3.5, 4.5]),
            data_error_model: Some("garwood_poisson_68".into()),
            samples: vec![
                SampleSeries { name: "tt".into(), label: "ttbar".into(), color: None, y: vec![6.0, 12.0] },
                SampleSeries {
                    name: "dy".into(),
                    label: "DY".into(),
                    color: Some("#00ff00".into()),
                    y: vec![3.0, 7.0],
                },
            ],
            total_mc_y: vec![9.0, 19.0],
            band: Some(BandEnvelope { lo: vec![8.0, 18.0], hi: vec![10.0, 20.0] }),
            ratio_y: Some(vec![10.0 / 9.0, 20.0 / 19.0]),
            ratio_yerr_lo: Some(vec![0.3, 0.2]),
            ratio_yerr_hi: Some(vec![0.35, 0.22]),
            ratio_band: Some(BandEnvelope { lo: vec![0.9, 0.95], hi: vec![1.1, 1.05] }),
            log: false,
            density: false,
        }
    }

    #[test]
    fn renders_well_formed_svg() {
        let svg = render(&minimal_artifact(), &RenderConfig::default()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        // Stack, band hatch and both legend labels are present.
        assert!(svg.contains("#00ff00"));
        assert!(svg.contains("patternTransform"));
        assert!(svg.contains("ttbar"));
        assert!(svg.contains("Data"));
        assert!(svg.contains("Events"));
    }

    #[test]
    fn mc_only_has_no_ratio_label() {
        let mut a = minimal_artifact();
        a.data_y = None;
        a.data_yerr_lo = None;
        a.data_yerr_hi = None;
        a.ratio_y = None;
        a.ratio_yerr_lo = None;
        a.ratio_yerr_hi = None;
        a.ratio_band = None;
        let svg = render(&a, &RenderConfig::default()).unwrap();
        assert!(!svg.contains("Data / MC"));
        assert!(svg.contains("ttbar"));
    }

    #[test]
    fn density_changes_y_label() {
        let mut a = minimal_artifact();
        a.density = true;
        let svg = render(&a, &RenderConfig::default()).unwrap();
        assert!(svg.contains("Density"));
        assert!(!svg.contains(">Events<"));
    }

    #[test]
    fn log_axis_uses_decade_labels() {
        let mut a = minimal_artifact();
        a.log = true;
        let svg = render(&a, &RenderConfig::default()).unwrap();
        // Superscript decade labels from the log axis.
        assert!(svg.contains("10"));
    }

    fn rect_y(svg: &str, marker: &str) -> String {
        let line = svg
            .lines()
            .find(|l| l.starts_with("<rect") && l.contains(marker))
            .unwrap();
        let tail = &line[line.find("y=\"").unwrap() + 3..];
        tail[..tail.find('"').unwrap()].to_string()
    }

    #[test]
    fn log_stack_top_stays_in_data_units() {
        let mut a = minimal_artifact();
        a.log = true;
        // Band upper edge equals the MC total, so the top of the stacked
        // rectangles must land on the same pixel row as the band.
        a.band = Some(BandEnvelope { lo: vec![8.0, 18.0], hi: vec![9.0, 19.0] });
        let svg = render(&a, &RenderConfig::default()).unwrap();
        assert_eq!(rect_y(&svg, "#00ff00"), rect_y(&svg, "url(#hatch"));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let mut a = minimal_artifact();
        a.total_mc_y = vec![1.0];
        let err = render(&a, &RenderConfig::default()).unwrap_err();
        assert!(matches!(err, RenderError::Artifact(_)));
    }
}
