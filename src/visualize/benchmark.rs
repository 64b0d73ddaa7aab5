use plotters::prelude::*;

/// Bar chart comparing genome binners by mean F1 score per base pair, one
/// bar per tool.
pub fn binner_bar_chart(
    scores: &[(String, f64)],
    output: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if scores.is_empty() {
        return Ok(());
    }

    let n = scores.len();
    let max_score = scores.iter().map(|(_, s)| *s).fold(f64::MIN, f64::max).max(0.01);

    let root = BitMapBackend::new(output, (900, 520)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("F1 Score per Base Pair (Genome Binning)", ("sans-serif", 22))
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(55)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..max_score * 1.1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_desc("Binner")
        .y_desc("F1 Score per bp")
        .x_label_formatter(&|x| {
            let i = x.round();
            if (x - i).abs() < 0.25 && i >= 0.0 && (i as usize) < n {
                scores[i as usize].0.clone()
            } else {
                String::new()
            }
        })
        .x_label_style(("sans-serif", 12).into_font().transform(FontTransform::Rotate90))
        .draw()?;

    chart.draw_series(scores.iter().enumerate().map(|(i, (_, score))| {
        // Dark-to-light teal ramp across tools.
        let t = i as f64 / n.max(2) as f64;
        let fill = RGBColor(
            (32.0 + 90.0 * t) as u8,
            (96.0 + 104.0 * t) as u8,
            (112.0 + 68.0 * t) as u8,
        );
        Rectangle::new([(i as f64 - 0.35, 0.0), (i as f64 + 0.35, *score)], fill.filled())
    }))?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_chart_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("binners.png");
        let scores = vec![
            ("MetaBAT2".to_string(), 0.82),
            ("MaxBin2".to_string(), 0.71),
            ("CONCOCT".to_string(), 0.65),
        ];

        binner_bar_chart(&scores, output.to_str().unwrap()).unwrap();
        assert!(output.exists());
    }

    #[test]
    fn test_empty_scores_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("binners.png");
        binner_bar_chart(&[], output.to_str().unwrap()).unwrap();
        assert!(!output.exists());
    }
}
