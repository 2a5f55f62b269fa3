//! Plotters-powered SVG bar chart of adjusted prices.
//!
//! We use the SVG backend so the image sink needs no system font or image
//! libraries; labels are laid out with Plotters' built-in text estimates.

use std::path::Path;

use plotters::prelude::*;

use super::ChartBar;
use crate::error::AppError;

/// Horizontal space per bar, in pixels.
const BAR_PX: u32 = 130;
const HEIGHT_PX: u32 = 720;
const MIN_WIDTH_PX: u32 = 640;

/// Write one bar per entry to an SVG file at `path`.
pub fn write_svg_chart(path: &Path, bars: &[ChartBar]) -> Result<(), AppError> {
    if bars.is_empty() {
        return Err(AppError::Render("No prices to chart.".to_string()));
    }

    let n = bars.len() as u32;
    let width = (n * BAR_PX).max(MIN_WIDTH_PX);
    let y_max = bars.iter().map(|b| b.adjusted).fold(0.0, f64::max).max(1.0) * 1.1;

    let root = SVGBackend::new(path, (width, HEIGHT_PX)).into_drawing_area();
    draw(&root, bars, y_max).map_err(|e| AppError::Render(format!("Failed to draw chart: {e}")))?;
    root.present()
        .map_err(|e| AppError::Render(format!("Failed to write chart '{}': {e}", path.display())))?;
    Ok(())
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    bars: &[ChartBar],
    y_max: f64,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let n = bars.len() as u32;
    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .caption("Adjusted price", ("sans-serif", 24))
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d((0u32..n).into_segmented(), 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(bars.len())
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => bars
                .get(*i as usize)
                .map(|b| b.label.clone())
                .unwrap_or_default(),
            SegmentValue::Last => String::new(),
        })
        .y_label_formatter(&|v| format!("${v:.0}"))
        .x_desc("Year / Console")
        .y_desc("Adjusted price")
        .draw()?;

    let bar_color = RGBColor(70, 130, 180);
    chart.draw_series(bars.iter().enumerate().map(|(i, b)| {
        let i = i as u32;
        let mut rect = Rectangle::new(
            [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), b.adjusted)],
            bar_color.filled(),
        );
        rect.set_margin(0, 0, 25, 25);
        rect
    }))?;

    // Price annotations above each bar.
    chart.draw_series(bars.iter().enumerate().map(|(i, b)| {
        Text::new(
            format!("${:.2} / ${:.2}", b.price, b.adjusted),
            (SegmentValue::CenterOf(i as u32), b.adjusted + y_max * 0.01),
            ("sans-serif", 12).into_font().color(&BLACK),
        )
    }))?;

    Ok(())
}
