use crate::rarefaction::CurvePoint;
use plotters::prelude::*;

/// Plot a rarefaction curve: mean distinct-cluster count per sampling depth
/// with a shaded band of one standard deviation either side.
pub fn rarefaction_curve_plot(
    points: &[CurvePoint],
    output: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if points.is_empty() {
        return Ok(());
    }

    let root = BitMapBackend::new(output, (700, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_depth = points.last().map(|p| p.depth).unwrap_or(1) as f64;
    let max_y = points
        .iter()
        .map(|p| p.mean_clusters + p.std_dev)
        .fold(f64::MIN, f64::max)
        .max(1.0)
        * 1.05;

    let mut chart = ChartBuilder::on(&root)
        .caption("Species-level Rarefaction Curve", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(0f64..max_depth, 0f64..max_y)?;

    chart
        .configure_mesh()
        .x_desc("Number of genomes sampled")
        .y_desc("Number of species clusters (>95% ANI)")
        .draw()?;

    let mut band: Vec<(f64, f64)> = points
        .iter()
        .map(|p| (p.depth as f64, p.mean_clusters + p.std_dev))
        .collect();
    band.extend(
        points
            .iter()
            .rev()
            .map(|p| (p.depth as f64, (p.mean_clusters - p.std_dev).max(0.0))),
    );

    chart
        .draw_series(std::iter::once(Polygon::new(band, BLACK.mix(0.25).filled())))?
        .label("±1 SD")
        .legend(|(x, y)| Rectangle::new([(x, y - 4), (x + 16, y + 4)], BLACK.mix(0.25).filled()));

    chart
        .draw_series(LineSeries::new(
            points.iter().map(|p| (p.depth as f64, p.mean_clusters)),
            &BLACK,
        ))?
        .label("Mean species richness")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], &BLACK));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
