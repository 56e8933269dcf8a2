//! One module per plot family.

pub mod axes_draw;
pub mod datamc;
pub mod variation;
