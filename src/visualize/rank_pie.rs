use crate::taxonomy::Rank;
use plotters::prelude::*;

const PIE_PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// Pie chart of the most frequent taxa at one rank. `counts` is expected
/// pre-sorted by count, highest first; only the top `top_n` slices are drawn
/// and percentages are relative to the drawn slices.
pub fn rank_distribution_pie(
    counts: &[(String, usize)],
    rank: Rank,
    top_n: usize,
    output: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let top: Vec<&(String, usize)> = counts.iter().take(top_n).collect();
    if top.is_empty() {
        return Ok(());
    }
    let total: usize = top.iter().map(|(_, n)| n).sum();

    let root = BitMapBackend::new(output, (800, 800)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(
        &format!("{}-level distribution of MAGs", rank.label()),
        ("sans-serif", 24),
    )?;

    let sizes: Vec<f64> = top.iter().map(|(_, n)| *n as f64).collect();
    let labels: Vec<String> = top
        .iter()
        .map(|(name, n)| format!("{} ({:.1}%)", name, 100.0 * *n as f64 / total as f64))
        .collect();
    let colors: Vec<RGBColor> = (0..top.len())
        .map(|i| PIE_PALETTE[i % PIE_PALETTE.len()])
        .collect();

    let center = (400, 400);
    let radius = 260.0;
    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(-90.0);
    pie.label_style(("sans-serif", 16).into_font());
    root.draw(&pie)?;

    root.present()?;
    Ok(())
}
