use crate::io::coverage::CoverageMatrix;
use crate::taxonomy::{clean_sample_label, normalize_genome_id};
use ndarray::Array2;
use plotters::prelude::*;
use std::collections::HashMap;
use tracing::warn;

/// Binned color scale for relative abundance, from white through greens
/// into warning reds.
pub const ABUNDANCE_BOUNDS: [f64; 10] = [0.0, 1.0, 2.0, 4.0, 8.0, 16.0, 40.0, 60.0, 80.0, 1000.0];

const ABUNDANCE_COLORS: [RGBColor; 9] = [
    RGBColor(255, 255, 255),
    RGBColor(226, 245, 232),
    RGBColor(191, 230, 201),
    RGBColor(136, 208, 166),
    RGBColor(72, 176, 124),
    RGBColor(33, 156, 106),
    RGBColor(255, 182, 122),
    RGBColor(224, 85, 74),
    RGBColor(127, 29, 29),
];

const ABUNDANCE_BIN_LABELS: [&str; 9] = [
    "0", "1-2", "2-4", "4-8", "8-16", "16-40", "40-60", "60-80", ">80",
];

const GRID: RGBColor = RGBColor(208, 208, 208);
const BAR_GREY: RGBColor = RGBColor(107, 107, 107);
const BAR_BLUE: RGBColor = RGBColor(70, 130, 180);

pub fn abundance_color(value: f64) -> RGBColor {
    for (i, window) in ABUNDANCE_BOUNDS.windows(2).enumerate() {
        if value < window[1] {
            return ABUNDANCE_COLORS[i];
        }
    }
    ABUNDANCE_COLORS[ABUNDANCE_COLORS.len() - 1]
}

/// Heatmap of the merged abundance matrix: one cell per genome and sample,
/// annotated with the abundance value.
pub fn detection_heatmap(
    cov: &CoverageMatrix,
    output: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let n_rows = cov.num_genomes();
    let n_cols = cov.num_samples();
    if n_rows == 0 || n_cols == 0 {
        return Ok(());
    }

    let sample_labels: Vec<String> = cov.samples.iter().map(|s| clean_sample_label(s)).collect();

    let width = (72 * n_cols + 280).max(640) as u32;
    let height = (26 * n_rows + 180).max(480) as u32;
    let root = BitMapBackend::new(output, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled("MAG Detection Across Samples", ("sans-serif", 22))?;

    let max_val = cov.values.iter().cloned().fold(f64::MIN, f64::max);
    let min_val = cov.values.iter().cloned().fold(f64::MAX, f64::min);

    let mut chart = ChartBuilder::on(&root)
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(140)
        .build_cartesian_2d(0..n_cols, 0..n_rows)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n_cols)
        .y_labels(n_rows)
        .x_desc("Samples")
        .y_desc("MAGs")
        .x_label_formatter(&|x| sample_labels.get(*x).cloned().unwrap_or_default())
        .y_label_formatter(&|y| cov.genomes.get(*y).cloned().unwrap_or_default())
        .x_label_style(("sans-serif", 11).into_font().transform(FontTransform::Rotate90))
        .y_label_style(("sans-serif", 10))
        .draw()?;

    for row in 0..n_rows {
        for col in 0..n_cols {
            let val = cov.values[[row, col]];
            let intensity = (val - min_val) / (max_val - min_val + 1e-6);
            // Diverging blue-to-red, midpoint near neutral.
            let fill = HSLColor((240.0 - 230.0 * intensity) / 360.0, 0.7, 0.82 - 0.4 * intensity);
            chart.draw_series(std::iter::once(Rectangle::new(
                [(col, row), (col + 1, row + 1)],
                fill.filled(),
            )))?;
            chart.draw_series(std::iter::once(Rectangle::new(
                [(col, row), (col + 1, row + 1)],
                GRID.stroke_width(1),
            )))?;

            let text_color = if intensity > 0.55 { WHITE } else { BLACK };
            chart.draw_series(std::iter::once(Text::new(
                format!("{:.1}", val),
                (col, row),
                ("sans-serif", 11).into_font().color(&text_color),
            )))?;
        }
    }

    root.present()?;
    Ok(())
}

/// Sample-by-phylum abundance pivot with the two marginal summaries the
/// combined heatmap needs.
#[derive(Debug, Clone)]
pub struct PhylumSummary {
    pub phyla: Vec<String>,
    pub samples: Vec<String>,
    /// Shape (samples, phyla), summed relative abundance.
    pub abundance: Array2<f64>,
    pub mags_per_phylum: Vec<usize>,
    pub mags_per_sample: Vec<usize>,
}

impl PhylumSummary {
    /// Join the coverage matrix against GTDB phylum assignments (keyed by
    /// normalized `user_genome` id) and pivot to sample x phylum. Genomes
    /// without a classification are dropped; phyla are ordered by total
    /// abundance, highest first.
    pub fn build(
        cov: &CoverageMatrix,
        phylum_by_genome: &HashMap<String, String>,
        present_threshold: f64,
    ) -> Option<PhylumSummary> {
        let mut phyla: Vec<String> = Vec::new();
        let mut phylum_ids: HashMap<String, usize> = HashMap::new();
        let mut genome_phylum: Vec<Option<usize>> = Vec::with_capacity(cov.num_genomes());

        for genome in &cov.genomes {
            let key = normalize_genome_id(genome);
            match phylum_by_genome.get(&key) {
                Some(phylum) => {
                    let next_id = phyla.len();
                    let id = *phylum_ids.entry(phylum.clone()).or_insert(next_id);
                    if id == next_id {
                        phyla.push(phylum.clone());
                    }
                    genome_phylum.push(Some(id));
                }
                None => genome_phylum.push(None),
            }
        }

        let joined = genome_phylum.iter().flatten().count();
        if joined == 0 {
            warn!("no coverage genomes matched a GTDB classification");
            return None;
        }
        if joined < cov.num_genomes() {
            warn!(
                "{} of {} genomes have no phylum assignment and are excluded",
                cov.num_genomes() - joined,
                cov.num_genomes()
            );
        }

        let n_samples = cov.num_samples();
        let mut abundance = Array2::zeros((n_samples, phyla.len()));
        let mut mags_per_phylum = vec![0usize; phyla.len()];
        for (row, phylum) in genome_phylum.iter().enumerate() {
            if let Some(&p) = phylum.as_ref() {
                mags_per_phylum[p] += 1;
                for col in 0..n_samples {
                    abundance[[col, p]] += cov.values[[row, col]];
                }
            }
        }

        // Order phyla by total abundance, highest first.
        let mut order: Vec<usize> = (0..phyla.len()).collect();
        let totals: Vec<f64> = (0..phyla.len())
            .map(|p| abundance.column(p).sum())
            .collect();
        order.sort_by(|&a, &b| totals[b].partial_cmp(&totals[a]).unwrap_or(std::cmp::Ordering::Equal));

        let phyla_sorted: Vec<String> = order.iter().map(|&p| phyla[p].clone()).collect();
        let mags_sorted: Vec<usize> = order.iter().map(|&p| mags_per_phylum[p]).collect();
        let mut abundance_sorted = Array2::zeros((n_samples, phyla.len()));
        for (new_col, &old_col) in order.iter().enumerate() {
            for row in 0..n_samples {
                abundance_sorted[[row, new_col]] = abundance[[row, old_col]];
            }
        }

        Some(PhylumSummary {
            phyla: phyla_sorted,
            samples: cov.samples.iter().map(|s| clean_sample_label(s)).collect(),
            abundance: abundance_sorted,
            mags_per_phylum: mags_sorted,
            mags_per_sample: cov.detected_per_sample(present_threshold),
        })
    }
}

/// Combined view: central sample x phylum heatmap on the binned abundance
/// scale, log10 MAG counts per phylum on top, MAGs detected per sample on
/// the right, bin legend in the corner.
pub fn phylum_heatmap(
    summary: &PhylumSummary,
    output: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let n_cols = summary.phyla.len();
    let n_rows = summary.samples.len();
    if n_cols == 0 || n_rows == 0 {
        return Ok(());
    }

    let right_width = 240i32;
    let width = ((44 * n_cols + 340).max(900)) as u32;
    let height = ((30 * n_rows + 320).max(640)) as u32;

    let root = BitMapBackend::new(output, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled("MAG distribution: samples x phyla", ("sans-serif", 22))?;

    let (top, rest) = root.split_vertically(130);
    let (top_left, top_right) = top.split_horizontally(width as i32 - right_width);
    let (main, right) = rest.split_horizontally(width as i32 - right_width);

    // Top bar: log10 of MAG count per phylum, aligned with the heatmap
    // columns below (same margin and y label area).
    let max_log = summary
        .mags_per_phylum
        .iter()
        .map(|&m| if m > 0 { (m as f64).log10() } else { 0.0 })
        .fold(0.0f64, f64::max)
        .max(0.1);

    let mut top_chart = ChartBuilder::on(&top_left)
        .margin(10)
        .y_label_area_size(55)
        .build_cartesian_2d(0..n_cols, 0f64..max_log * 1.15)?;
    top_chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .y_labels(3)
        .y_desc("log10(MAGs/Phylum)")
        .draw()?;
    top_chart.draw_series(summary.mags_per_phylum.iter().enumerate().filter_map(
        |(col, &mags)| {
            if mags == 0 {
                return None;
            }
            Some(Rectangle::new(
                [(col, 0.0), (col + 1, (mags as f64).log10())],
                BAR_GREY.filled(),
            ))
        },
    ))?;

    // Bin legend in the spare corner.
    top_right.draw(&Text::new(
        "Relative abundance (%)",
        (10, 2),
        ("sans-serif", 12).into_font(),
    ))?;
    for (i, color) in ABUNDANCE_COLORS.iter().enumerate() {
        let y0 = 18 + (i as i32) * 12;
        top_right.draw(&Rectangle::new([(10, y0), (26, y0 + 10)], color.filled()))?;
        top_right.draw(&Rectangle::new([(10, y0), (26, y0 + 10)], BLACK.stroke_width(1)))?;
        top_right.draw(&Text::new(
            ABUNDANCE_BIN_LABELS[i],
            (32, y0),
            ("sans-serif", 11).into_font(),
        ))?;
    }

    // Central heatmap.
    let mut heat_chart = ChartBuilder::on(&main)
        .margin(10)
        .x_label_area_size(110)
        .y_label_area_size(55)
        .build_cartesian_2d(0..n_cols, 0..n_rows)?;
    heat_chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n_cols)
        .y_labels(n_rows)
        .x_desc("Phylum")
        .y_desc("Samples")
        .x_label_formatter(&|x| summary.phyla.get(*x).cloned().unwrap_or_default())
        .y_label_formatter(&|y| summary.samples.get(*y).cloned().unwrap_or_default())
        .x_label_style(("sans-serif", 10).into_font().transform(FontTransform::Rotate90))
        .y_label_style(("sans-serif", 10))
        .draw()?;

    for row in 0..n_rows {
        for col in 0..n_cols {
            let value = summary.abundance[[row, col]];
            heat_chart.draw_series(std::iter::once(Rectangle::new(
                [(col, row), (col + 1, row + 1)],
                abundance_color(value).filled(),
            )))?;
            heat_chart.draw_series(std::iter::once(Rectangle::new(
                [(col, row), (col + 1, row + 1)],
                GRID.stroke_width(1),
            )))?;
        }
    }

    // Right bar: MAGs detected per sample.
    let max_mags = summary.mags_per_sample.iter().copied().max().unwrap_or(1).max(1);
    let mut right_chart = ChartBuilder::on(&right)
        .margin(10)
        .x_label_area_size(110)
        .build_cartesian_2d(0f64..max_mags as f64 * 1.1, 0..n_rows)?;
    right_chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(0)
        .x_labels(4)
        .x_desc("MAGs/sample")
        .draw()?;
    right_chart.draw_series(summary.mags_per_sample.iter().enumerate().map(|(row, &mags)| {
        Rectangle::new([(0.0, row), (mags as f64, row + 1)], BAR_BLUE.filled())
    }))?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn test_matrix() -> CoverageMatrix {
        CoverageMatrix {
            genomes: vec!["bin.1".into(), "bin.2".into(), "bin.3".into()],
            samples: vec!["s1.fastq Relative Abundance (%)".into(), "s2".into()],
            values: array![[10.0, 0.0], [5.0, 3.0], [85.0, 0.5]],
        }
    }

    fn test_phyla() -> HashMap<String, String> {
        [
            ("bin_1_fasta", "Bacteroidota"),
            ("bin_2_fasta", "Bacillota"),
            ("bin_3_fasta", "Bacteroidota"),
        ]
        .iter()
        .map(|(g, p)| (g.to_string(), p.to_string()))
        .collect()
    }

    #[test]
    fn test_abundance_color_bins() {
        assert_eq!(abundance_color(0.0), ABUNDANCE_COLORS[0]);
        assert_eq!(abundance_color(0.9), ABUNDANCE_COLORS[0]);
        assert_eq!(abundance_color(1.0), ABUNDANCE_COLORS[1]);
        assert_eq!(abundance_color(39.9), ABUNDANCE_COLORS[5]);
        assert_eq!(abundance_color(81.0), ABUNDANCE_COLORS[8]);
        assert_eq!(abundance_color(5000.0), ABUNDANCE_COLORS[8]);
    }

    #[test]
    fn test_phylum_summary_pivot() {
        let summary = PhylumSummary::build(&test_matrix(), &test_phyla(), 0.0).unwrap();

        // Bacteroidota (10 + 85 = 95 in s1) outranks Bacillota.
        assert_eq!(summary.phyla, vec!["Bacteroidota", "Bacillota"]);
        assert_eq!(summary.samples, vec!["s1", "s2"]);
        assert_eq!(summary.abundance[[0, 0]], 95.0);
        assert_eq!(summary.abundance[[1, 0]], 0.5);
        assert_eq!(summary.abundance[[0, 1]], 5.0);
        assert_eq!(summary.mags_per_phylum, vec![2, 1]);
        assert_eq!(summary.mags_per_sample, vec![3, 2]);
    }

    #[test]
    fn test_unclassified_genomes_drop_out() {
        let mut phyla = test_phyla();
        phyla.remove("bin_3_fasta");
        let summary = PhylumSummary::build(&test_matrix(), &phyla, 0.0).unwrap();

        assert_eq!(summary.mags_per_phylum.iter().sum::<usize>(), 2);
    }

    #[test]
    fn test_no_join_yields_none() {
        let summary = PhylumSummary::build(&test_matrix(), &HashMap::new(), 0.0);
        assert!(summary.is_none());
    }

    #[test]
    fn test_heatmaps_write_pngs() {
        let dir = tempfile::tempdir().unwrap();
        let cov = test_matrix();

        let detection = dir.path().join("detection.png");
        detection_heatmap(&cov, detection.to_str().unwrap()).unwrap();
        assert!(detection.exists());

        let summary = PhylumSummary::build(&cov, &test_phyla(), 0.0).unwrap();
        let combined = dir.path().join("combined.png");
        phylum_heatmap(&summary, combined.to_str().unwrap()).unwrap();
        assert!(combined.exists());
    }
}
