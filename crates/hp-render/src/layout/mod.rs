//! Axis scaling, margin computation and panel splitting.

pub mod axes;
pub mod legend;
pub mod margins;
pub mod panels;
