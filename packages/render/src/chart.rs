//! PNG charts drawn directly onto an RGB buffer.
//!
//! Charts carry no text. Series colours come from [`crate::palette`].

use campus_safety_analytics_models::{SeverityPivot, TrendView};
use campus_safety_predictor::RankedFeature;

use crate::canvas::Canvas;
use crate::{ChartRenderer, RenderError, palette};

const MARGIN: u32 = 20;
const AXIS_GUTTER: u32 = 40;
const HEATMAP_CELL: u32 = 48;
const LEGEND_WIDTH: u32 = 20;
const IMPORTANCE_BAR: u32 = 24;
const IMPORTANCE_GAP: u32 = 8;
const MIN_HEIGHT: u32 = 100;

/// Default [`ChartRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterChartRenderer {
    /// Width of the trends and importance charts.
    pub width: u32,
    /// Height of the trends chart.
    pub height: u32,
}

impl Default for RasterChartRenderer {
    fn default() -> Self {
        Self {
            width: 800,
            height: 480,
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn scale(value: f64, max: f64, extent: u32) -> u32 {
    if max <= 0.0 {
        return 0;
    }
    (value / max * f64::from(extent)).round() as u32
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl ChartRenderer for RasterChartRenderer {
    #[allow(clippy::cast_precision_loss)]
    fn monthly_trends(&self, view: &TrendView) -> Result<Vec<u8>, RenderError> {
        let mut canvas = Canvas::new(self.width, self.height);
        let left = AXIS_GUTTER;
        let top = MARGIN;
        let right = self.width.saturating_sub(MARGIN);
        let bottom = self.height.saturating_sub(AXIS_GUTTER);
        let plot_w = right.saturating_sub(left + 2);
        let plot_h = bottom.saturating_sub(top);

        let rows: Vec<_> = view.rows().collect();
        let max_total = rows
            .iter()
            .map(|(_, counts)| counts.iter().sum::<u64>())
            .max()
            .unwrap_or(0) as f64;

        if !rows.is_empty() {
            let slot = (plot_w / to_u32(rows.len())).max(1);
            let bar_w = (slot * 4 / 5).max(1);

            for (i, (_, counts)) in rows.iter().enumerate() {
                let x = left + 2 + to_u32(i) * slot + (slot - bar_w) / 2;
                let mut y = bottom;
                for (series, &count) in counts.iter().enumerate() {
                    let h = scale(count as f64, max_total, plot_h).min(y.saturating_sub(top));
                    y -= h;
                    canvas.fill_rect(x, y, bar_w, h, palette::categorical(series));
                }
            }
        }

        canvas.axes(left, top, right, bottom);
        log::debug!(
            "Rendered monthly trends chart: {} months, {} incident types",
            rows.len(),
            view.incident_types().len()
        );
        canvas.encode_png()
    }

    fn severity_heatmap(&self, pivot: &SeverityPivot) -> Result<Vec<u8>, RenderError> {
        let grid = pivot.grid();
        let n_rows = to_u32(pivot.locations().len());
        let n_cols = to_u32(pivot.incident_types().len());

        let grid_w = n_cols * HEATMAP_CELL;
        let grid_h = n_rows * HEATMAP_CELL;
        let legend_h = grid_h.max(MIN_HEIGHT);
        let legend_x = MARGIN + grid_w + MARGIN;
        let width = legend_x + LEGEND_WIDTH + MARGIN;
        let height = MARGIN * 2 + legend_h;

        let mut canvas = Canvas::new(width, height);

        for (r, row) in grid.iter().enumerate() {
            for (c, mean) in row.iter().enumerate() {
                let color = mean.map_or(palette::MISSING, palette::severity);
                canvas.fill_rect(
                    MARGIN + to_u32(c) * HEATMAP_CELL + 1,
                    MARGIN + to_u32(r) * HEATMAP_CELL + 1,
                    HEATMAP_CELL - 2,
                    HEATMAP_CELL - 2,
                    color,
                );
            }
        }

        // colour bar, severity 5 at the top
        for dy in 0..legend_h {
            let t = 1.0 - f64::from(dy) / f64::from((legend_h - 1).max(1));
            canvas.fill_rect(legend_x, MARGIN + dy, LEGEND_WIDTH, 1, palette::yl_or_rd(t));
        }

        log::debug!(
            "Rendered severity heatmap: {n_rows} locations x {n_cols} incident types, {} observed cells",
            pivot.len()
        );
        canvas.encode_png()
    }

    fn feature_importance(&self, features: &[RankedFeature]) -> Result<Vec<u8>, RenderError> {
        let n = to_u32(features.len());
        let height = (MARGIN * 2 + n * (IMPORTANCE_BAR + IMPORTANCE_GAP)).max(MIN_HEIGHT);
        let mut canvas = Canvas::new(self.width, height);

        let left = MARGIN;
        let extent = self.width.saturating_sub(MARGIN * 2 + 2);
        let max = features
            .iter()
            .map(|f| f.importance)
            .fold(0.0_f64, f64::max);

        for (i, feature) in features.iter().enumerate() {
            let y = MARGIN + to_u32(i) * (IMPORTANCE_BAR + IMPORTANCE_GAP);
            let len = scale(feature.importance, max, extent);
            canvas.fill_rect(left + 2, y, len, IMPORTANCE_BAR, palette::IMPORTANCE_BAR);
        }

        canvas.axes(
            left,
            MARGIN,
            self.width.saturating_sub(MARGIN),
            height - MARGIN,
        );
        log::debug!("Rendered feature importance chart: {n} features");
        canvas.encode_png()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use campus_safety_analytics_models::{MonthKey, PivotCell};
    use image::{Rgb, RgbImage};

    use super::*;

    fn decode(png: &[u8]) -> RgbImage {
        image::load_from_memory(png).unwrap().to_rgb8()
    }

    #[test]
    fn trends_chart_has_configured_size() {
        let mut rows = BTreeMap::new();
        rows.insert(MonthKey::new(2024, 1), vec![3, 1]);
        rows.insert(MonthKey::new(2024, 2), vec![0, 2]);
        let view = TrendView::new(vec!["theft".into(), "vandalism".into()], rows);

        let img = decode(&RasterChartRenderer::default().monthly_trends(&view).unwrap());
        assert_eq!(img.dimensions(), (800, 480));

        // the tallest bar reaches the top of the plot area
        let first_bar_x = AXIS_GUTTER + 2 + (800 - MARGIN - AXIS_GUTTER - 2) / 2 / 2;
        assert_ne!(*img.get_pixel(first_bar_x, MARGIN + 1), Rgb([255, 255, 255]));
    }

    #[test]
    fn empty_trends_still_render() {
        let view = TrendView::new(Vec::new(), BTreeMap::new());
        let png = RasterChartRenderer::default().monthly_trends(&view).unwrap();
        assert!(!png.is_empty());
    }

    #[test]
    fn heatmap_marks_missing_cells_grey() {
        let mut cells = BTreeMap::new();
        cells.insert(
            ("Library".to_string(), "theft".to_string()),
            PivotCell { mean: 5.0, count: 2 },
        );
        cells.insert(
            ("Cafeteria".to_string(), "fighting".to_string()),
            PivotCell { mean: 1.0, count: 1 },
        );
        let pivot = SeverityPivot::new(cells);
        let img = decode(&RasterChartRenderer::default().severity_heatmap(&pivot).unwrap());

        let center = |r: u32, c: u32| {
            *img.get_pixel(
                MARGIN + c * HEATMAP_CELL + HEATMAP_CELL / 2,
                MARGIN + r * HEATMAP_CELL + HEATMAP_CELL / 2,
            )
        };
        // rows: Cafeteria, Library; columns: fighting, theft
        assert_eq!(center(0, 0), palette::severity(1.0));
        assert_eq!(center(0, 1), palette::MISSING);
        assert_eq!(center(1, 0), palette::MISSING);
        assert_eq!(center(1, 1), palette::severity(5.0));
    }

    #[test]
    fn importance_bars_scale_to_the_largest() {
        let features = vec![
            RankedFeature {
                feature: "incident_type_theft".into(),
                importance: 0.6,
            },
            RankedFeature {
                feature: "location_Library".into(),
                importance: 0.3,
            },
        ];
        let img = decode(
            &RasterChartRenderer::default()
                .feature_importance(&features)
                .unwrap(),
        );
        let y0 = MARGIN + IMPORTANCE_BAR / 2;
        let y1 = y0 + IMPORTANCE_BAR + IMPORTANCE_GAP;
        let x = 800 - MARGIN - 4;
        assert_eq!(*img.get_pixel(x, y0), palette::IMPORTANCE_BAR);
        assert_eq!(*img.get_pixel(x, y1), Rgb([255, 255, 255]));
        assert_eq!(*img.get_pixel(MARGIN + 10, y1), palette::IMPORTANCE_BAR);
    }
}
