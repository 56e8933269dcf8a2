//! Approximate text measurement for layout.
//!
//! Final glyph shaping happens in the SVG consumer; layout only needs
//! widths that are close enough to place labels and size legend boxes.
//! Advance widths below are per-1000-em values for a generic sans-serif,
//! bucketed by character class.

use crate::primitives::FontWeight;

/// Per-mille advance for one character of a generic sans-serif face.
fn advance_permille(c: char) -> f64 {
    match c {
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' => 278.0,
        'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '{' | '}' | '/' | '\\' | ' ' => 333.0,
        'I' | 'J' => 333.0,
        '"' | '`' | '-' => 389.0,
        'a' | 'b' | 'c' | 'd' | 'e' | 'g' | 'h' | 'k' | 'n' | 'o' | 'p' | 'q' | 's' | 'u'
        | 'v' | 'x' | 'y' | 'z' => 556.0,
        '0'..='9' => 556.0,
        'w' | 'm' => 778.0,
        'A'..='Z' => 689.0,
        'W' | 'M' => 889.0,
        '_' | '=' | '+' | '<' | '>' | '~' => 584.0,
        '%' => 889.0,
        '@' => 1015.0,
        _ => 600.0,
    }
}

/// Width of `text` at `size` px, in px.
pub fn text_width(text: &str, size: f64, weight: FontWeight) -> f64 {
    let scale = match weight {
        FontWeight::Regular => 1.0,
        FontWeight::Bold => 1.06,
    };
    let permille: f64 = text.chars().map(advance_permille).sum();
    permille / 1000.0 * size * scale
}
