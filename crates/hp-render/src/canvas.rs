//! Minimal SVG canvas.
//!
//! Elements are written directly into a body buffer; `<defs>` entries
//! (clip paths, hatch patterns) are collected separately and emitted
//! once at serialization time.

use std::fmt::Write as _;

use crate::color::Color;
use crate::primitives::{FontStyle, FontWeight, LineStyle, MarkerStyle, Style, TextStyle};

pub struct Canvas {
    width: f64,
    height: f64,
    font_family: String,
    body: String,
    defs: Vec<String>,
    clip_depth: usize,
    next_id: usize,
}

fn esc(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn fmt_coord(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.2}")
    } else {
        "0".to_string()
    }
}

impl Canvas {
    pub fn new(width: f64, height: f64, font_family: &str) -> Self {
        Self {
            width,
            height,
            font_family: font_family.to_string(),
            body: String::new(),
            defs: Vec::new(),
            clip_depth: 0,
            next_id: 0,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, style: &Style) {
        let mut attrs = String::new();
        match &style.fill {
            Some(c) => {
                let _ = write!(attrs, " fill=\"{}\"", c.to_svg());
            }
            None => attrs.push_str(" fill=\"none\""),
        }
        if let Some(c) = &style.stroke {
            let _ = write!(
                attrs,
                " stroke=\"{}\" stroke-width=\"{}\"",
                c.to_svg(),
                style.stroke_width
            );
        }
        if style.opacity < 1.0 {
            let _ = write!(attrs, " opacity=\"{}\"", style.opacity);
        }
        let _ = writeln!(
            self.body,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"{attrs}/>",
            fmt_coord(x),
            fmt_coord(y),
            fmt_coord(w),
            fmt_coord(h),
        );
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, style: &LineStyle) {
        let dash = match &style.dash {
            Some(d) => format!(" stroke-dasharray=\"{d}\""),
            None => String::new(),
        };
        let _ = writeln!(
            self.body,
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"{}\"{dash}/>",
            fmt_coord(x1),
            fmt_coord(y1),
            fmt_coord(x2),
            fmt_coord(y2),
            style.color.to_svg(),
            style.width,
        );
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], style: &LineStyle) {
        if points.len() < 2 {
            return;
        }
        let pts: Vec<String> = points
            .iter()
            .map(|(x, y)| format!("{},{}", fmt_coord(*x), fmt_coord(*y)))
            .collect();
        let dash = match &style.dash {
            Some(d) => format!(" stroke-dasharray=\"{d}\""),
            None => String::new(),
        };
        let _ = writeln!(
            self.body,
            "<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"{dash}/>",
            pts.join(" "),
            style.color.to_svg(),
            style.width,
        );
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, style: &MarkerStyle) {
        let fill = if style.fill {
            style.color.to_svg()
        } else {
            "none".to_string()
        };
        let _ = writeln!(
            self.body,
            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{fill}\" stroke=\"{}\"/>",
            fmt_coord(cx),
            fmt_coord(cy),
            r,
            style.color.to_svg(),
        );
    }

    pub fn text(&mut self, x: f64, y: f64, s: &str, style: &TextStyle) {
        self.text_inner(x, y, s, style, None);
    }

    /// Text rotated `angle_deg` degrees around its anchor point.
    pub fn text_rotated(&mut self, x: f64, y: f64, s: &str, style: &TextStyle, angle_deg: f64) {
        self.text_inner(x, y, s, style, Some(angle_deg));
    }

    fn text_inner(&mut self, x: f64, y: f64, s: &str, style: &TextStyle, angle: Option<f64>) {
        let weight = match style.weight {
            FontWeight::Regular => "",
            FontWeight::Bold => " font-weight=\"bold\"",
        };
        let slant = match style.style {
            FontStyle::Normal => "",
            FontStyle::Italic => " font-style=\"italic\"",
        };
        let transform = match angle {
            Some(a) => format!(
                " transform=\"rotate({a} {} {})\"",
                fmt_coord(x),
                fmt_coord(y)
            ),
            None => String::new(),
        };
        let _ = writeln!(
            self.body,
            "<text x=\"{}\" y=\"{}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\" \
             text-anchor=\"{}\" dominant-baseline=\"{}\"{weight}{slant}{transform}>{}</text>",
            fmt_coord(x),
            fmt_coord(y),
            esc(&self.font_family),
            style.size,
            style.color.to_svg(),
            style.anchor.as_str(),
            style.baseline.as_str(),
            esc(s),
        );
    }

    /// Vertical error bar with short horizontal caps.
    pub fn error_bar(&mut self, x: f64, y_lo: f64, y_hi: f64, cap: f64, style: &LineStyle) {
        self.line(x, y_lo, x, y_hi, style);
        if cap > 0.0 {
            self.line(x - cap, y_lo, x + cap, y_lo, style);
            self.line(x - cap, y_hi, x + cap, y_hi, style);
        }
    }

    /// Register a diagonal-hatch pattern and return its paint reference.
    pub fn hatch_pattern(&mut self, color: Color, spacing: f64) -> String {
        let id = self.fresh_id("hatch");
        self.defs.push(format!(
            "<pattern id=\"{id}\" width=\"{spacing}\" height=\"{spacing}\" \
             patternUnits=\"userSpaceOnUse\" patternTransform=\"rotate(45)\">\
             <line x1=\"0\" y1=\"0\" x2=\"0\" y2=\"{spacing}\" stroke=\"{}\" stroke-width=\"1\"/>\
             </pattern>",
            color.to_svg(),
        ));
        format!("url(#{id})")
    }

    /// Rect filled with a previously registered pattern paint.
    pub fn rect_paint(&mut self, x: f64, y: f64, w: f64, h: f64, paint: &str) {
        let _ = writeln!(
            self.body,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{paint}\"/>",
            fmt_coord(x),
            fmt_coord(y),
            fmt_coord(w),
            fmt_coord(h),
        );
    }

    /// Open a group clipped to the given rect. Pair with `pop_clip`.
    pub fn push_clip(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let id = self.fresh_id("clip");
        self.defs.push(format!(
            "<clipPath id=\"{id}\"><rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"/></clipPath>",
            fmt_coord(x),
            fmt_coord(y),
            fmt_coord(w),
            fmt_coord(h),
        ));
        let _ = writeln!(self.body, "<g clip-path=\"url(#{id})\">");
        self.clip_depth += 1;
    }

    pub fn pop_clip(&mut self) {
        if self.clip_depth > 0 {
            self.body.push_str("</g>\n");
            self.clip_depth -= 1;
        }
    }

    pub fn finish_svg(mut self, background: Option<Color>) -> String {
        while self.clip_depth > 0 {
            self.pop_clip();
        }
        let mut out = String::with_capacity(self.body.len() + 512);
        let _ = writeln!(
            out,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" \
             viewBox=\"0 0 {} {}\">",
            self.width, self.height, self.width, self.height,
        );
        if !self.defs.is_empty() {
            out.push_str("<defs>\n");
            for d in &self.defs {
                out.push_str(d);
                out.push('\n');
            }
            out.push_str("</defs>\n");
        }
        if let Some(bg) = background {
            let _ = writeln!(
                out,
                "<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
                self.width,
                self.height,
                bg.to_svg(),
            );
        }
        out.push_str(&self.body);
        out.push_str("</svg>\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::TextAnchor;

    #[test]
    fn svg_envelope_and_defs() {
        let mut c = Canvas::new(100.0, 50.0, "sans-serif");
        let paint = c.hatch_pattern(Color::rgb(0, 0, 0), 4.0);
        c.rect_paint(0.0, 0.0, 10.0, 10.0, &paint);
        let svg = c.finish_svg(Some(Color::rgb(255, 255, 255)));
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("<defs>"));
        assert!(svg.contains("patternTransform"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn clip_groups_are_balanced() {
        let mut c = Canvas::new(10.0, 10.0, "sans-serif");
        c.push_clip(0.0, 0.0, 5.0, 5.0);
        // Unbalanced on purpose; finish_svg closes it.
        let svg = c.finish_svg(None);
        assert_eq!(svg.matches("<g ").count(), svg.matches("</g>").count());
    }

    #[test]
    fn text_is_escaped() {
        let mut c = Canvas::new(10.0, 10.0, "sans-serif");
        let mut st = TextStyle::default();
        st.anchor = TextAnchor::Middle;
        c.text(1.0, 1.0, "a < b & c", &st);
        let svg = c.finish_svg(None);
        assert!(svg.contains("a &lt; b &amp; c"));
    }
}
