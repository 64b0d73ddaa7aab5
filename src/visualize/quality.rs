use plotters::prelude::*;

const HIGH_QUALITY: RGBColor = RED;
const CONTAMINATED: RGBColor = BLUE;
const OTHERS: RGBColor = RGBColor(128, 128, 128);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QualityClass {
    HighQuality,
    Contaminated,
    Others,
}

fn classify(completeness: f64, contamination: f64) -> QualityClass {
    if completeness >= 90.0 && contamination <= 5.0 {
        QualityClass::HighQuality
    } else if completeness >= 90.0 {
        QualityClass::Contaminated
    } else {
        QualityClass::Others
    }
}

/// Scatter plot of CheckM completeness against contamination, colored by
/// MIMAG-style quality class.
pub fn completeness_contamination_plot(
    completeness: &[f64],
    contamination: &[f64],
    output: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let points: Vec<(f64, f64)> = completeness
        .iter()
        .zip(contamination.iter())
        .filter(|(c, t)| c.is_finite() && t.is_finite())
        .map(|(&c, &t)| (c, t))
        .collect();
    if points.is_empty() {
        return Ok(());
    }

    let min_comp = points.iter().map(|p| p.0).fold(f64::MAX, f64::min);
    let max_cont = points.iter().map(|p| p.1).fold(f64::MIN, f64::max);
    let x_min = (((min_comp - 10.0) / 10.0).floor() * 10.0).max(0.0);
    let y_max = (max_cont + 1.0).ceil().min(100.0);

    let root = BitMapBackend::new(output, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..100f64, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Completeness (%)")
        .y_desc("Contamination (%)")
        .draw()?;

    let classes = [
        (QualityClass::HighQuality, HIGH_QUALITY, "High Quality (>=90% comp, <=5% cont)"),
        (QualityClass::Contaminated, CONTAMINATED, "Contaminated (>=90% comp, >5% cont)"),
        (QualityClass::Others, OTHERS, "Others (<90% comp)"),
    ];

    for (class, color, label) in classes {
        chart
            .draw_series(
                points
                    .iter()
                    .filter(|(c, t)| classify(*c, *t) == class)
                    .map(|&(c, t)| Circle::new((c, t), 4, color.filled())),
            )?
            .label(label)
            .legend(move |(x, y)| Circle::new((x + 8, y), 4, color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_thresholds() {
        assert_eq!(classify(95.0, 2.0), QualityClass::HighQuality);
        assert_eq!(classify(90.0, 5.0), QualityClass::HighQuality);
        assert_eq!(classify(95.0, 5.1), QualityClass::Contaminated);
        assert_eq!(classify(89.9, 0.0), QualityClass::Others);
    }

    #[test]
    fn test_plot_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("comp_conta.png");
        let completeness = vec![98.0, 92.0, 55.0, f64::NAN];
        let contamination = vec![1.2, 8.0, 3.0, 1.0];

        completeness_contamination_plot(&completeness, &contamination, output.to_str().unwrap())
            .unwrap();
        assert!(output.exists());
    }
}
