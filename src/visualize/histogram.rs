use plotters::coord::Shift;
use plotters::prelude::*;

const BAR_FILL: RGBColor = RGBColor(135, 206, 235);

fn finite(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// Sturges' rule, the usual choice for modest row counts.
fn bin_count(n: usize) -> usize {
    ((n as f64).log2().ceil() as usize + 1).max(1)
}

fn draw_histogram<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    values: &[f64],
    title: &str,
    x_label: &str,
    y_label: &str,
    x_tick_suffix: Option<&'static str>,
) -> Result<(), Box<dyn std::error::Error + 'static>>
where
    DB::ErrorType: 'static,
{
    let values = finite(values);
    if values.is_empty() {
        return Ok(());
    }

    let mut lo = values.iter().copied().fold(f64::MAX, f64::min);
    let mut hi = values.iter().copied().fold(f64::MIN, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let bins = bin_count(values.len());
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in &values {
        let bin = (((v - lo) / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }
    let max_count = counts.iter().copied().max().unwrap_or(1) as f64;

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(45)
        .build_cartesian_2d(lo.min(0.0)..hi, 0f64..max_count * 1.05)?;

    let formatter: Box<dyn Fn(&f64) -> String> = match x_tick_suffix {
        Some(suffix) => Box::new(move |v: &f64| format!("{} {}", *v as i64, suffix)),
        None => Box::new(|v: &f64| format!("{}", v)),
    };
    chart
        .configure_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .x_label_formatter(&formatter)
        .draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(i, &count)| {
        let x0 = lo + i as f64 * width;
        let x1 = x0 + width;
        Rectangle::new([(x0, 0.0), (x1, count as f64)], BAR_FILL.filled())
    }))?;
    chart.draw_series(counts.iter().enumerate().map(|(i, &count)| {
        let x0 = lo + i as f64 * width;
        let x1 = x0 + width;
        Rectangle::new([(x0, 0.0), (x1, count as f64)], BLACK.stroke_width(1))
    }))?;

    Ok(())
}

/// Single-panel histogram written to a PNG.
pub fn histogram_png(
    values: &[f64],
    title: &str,
    x_label: &str,
    x_tick_suffix: Option<&'static str>,
    output: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(output, (640, 480)).into_drawing_area();
    root.fill(&WHITE)?;
    draw_histogram(&root, values, title, x_label, "Frequency", x_tick_suffix)?;
    root.present()?;
    Ok(())
}

/// 2x2 panel of assembly-metric distributions (N50, total length, longest
/// contig, coding density).
pub fn assembly_info_panel(
    metrics: &[(&str, Vec<f64>)],
    output: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(output, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let areas = root.split_evenly((2, 2));
    for (area, (name, values)) in areas.iter().zip(metrics.iter()) {
        draw_histogram(
            area,
            values,
            &format!("Distribution of {}", name),
            name,
            "Count",
            None,
        )?;
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bin_count_grows_slowly() {
        assert_eq!(bin_count(1), 1);
        assert_eq!(bin_count(8), 4);
        assert_eq!(bin_count(100), 8);
    }

    #[test]
    fn test_histogram_png() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("n50.png");
        let values = vec![12.0, 48.0, 50.0, 52.0, 75.0, 110.0, f64::NAN];

        histogram_png(&values, "N50", "N50 (kbp)", Some("kb"), output.to_str().unwrap()).unwrap();
        assert!(output.exists());
    }

    #[test]
    fn test_assembly_panel() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("panel.png");
        let metrics = vec![
            ("N50", vec![10.0, 20.0, 30.0]),
            ("Total length Assembly", vec![2.0e6, 3.5e6, 4.1e6]),
            ("Longest Contig", vec![1.0e5, 2.0e5, 1.5e5]),
            ("Coding Density", vec![0.85, 0.9, 0.88]),
        ];

        assembly_info_panel(&metrics, output.to_str().unwrap()).unwrap();
        assert!(output.exists());
    }
}
