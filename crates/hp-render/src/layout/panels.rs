use crate::layout::margins::PlotArea;

/// Main + ratio panel split for Data/MC plots.
/// The ratio panel takes `ratio_frac` of the available height.
#[derive(Debug, Clone)]
pub struct MainRatioLayout {
    pub main: PlotArea,
    pub ratio: PlotArea,
}

impl MainRatioLayout {
    pub fn new(
        left: f64,
        top: f64,
        width: f64,
        total_height: f64,
        gap: f64,
        ratio_frac: f64,
    ) -> Self {
        let ratio_h = total_height * ratio_frac;
        let main_h = total_height - ratio_h - gap;

        Self {
            main: PlotArea::manual(left, top, width, main_h),
            ratio: PlotArea::manual(left, top + main_h + gap, width, ratio_h),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panels_tile_the_height() {
        let l = MainRatioLayout::new(40.0, 30.0, 400.0, 300.0, 8.0, 0.25);
        assert!((l.main.height + l.ratio.height + 8.0 - 300.0).abs() < 1e-9);
        assert!((l.ratio.top - l.main.bottom() - 8.0).abs() < 1e-9);
        assert_eq!(l.main.left, l.ratio.left);
        assert_eq!(l.main.width, l.ratio.width);
    }
}
