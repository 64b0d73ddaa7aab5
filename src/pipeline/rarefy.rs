use crate::io::table::Table;
use crate::rarefaction::{rarefaction_curve, ClusterAssignments, CurvePoint};
use crate::visualize;
use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

pub struct RarefyConfig {
    pub input: PathBuf,
    pub genome_col: String,
    pub cluster_col: String,
    pub repetitions: usize,
    pub step: usize,
    pub seed: Option<u64>,
    pub format: String,
    pub output: Option<PathBuf>,
    pub plot: Option<PathBuf>,
}

/// Standalone rarefaction estimate: read a dereplication table, emit the
/// (depth, mean, stddev) triples, optionally render the curve.
pub fn run(cfg: &RarefyConfig) -> Result<()> {
    let table = Table::from_path(&cfg.input)?;
    let genomes = table.column_or_index(&cfg.genome_col)?;
    let clusters = table.column_or_index(&cfg.cluster_col)?;

    let distinct: HashSet<&str> = genomes.iter().copied().collect();
    if distinct.len() < genomes.len() {
        warn!(
            "{} duplicate genome ids in column '{}'",
            genomes.len() - distinct.len(),
            cfg.genome_col
        );
    }

    let assignments =
        ClusterAssignments::from_pairs(genomes.iter().copied().zip(clusters.iter().copied()));
    info!(
        "{} genomes in {} species clusters",
        assignments.num_genomes(),
        assignments.num_clusters()
    );

    let curve = rarefaction_curve(&assignments, cfg.repetitions, cfg.step, cfg.seed)?;

    let mut writer: Box<dyn Write> = match &cfg.output {
        Some(path) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout()),
    };

    match cfg.format.as_str() {
        "tsv" => write_curve_tsv(&curve, &mut writer)?,
        "json" => {
            serde_json::to_writer_pretty(&mut writer, &curve)?;
            writeln!(writer)?;
        }
        other => bail!("unsupported format: {}", other),
    }
    if let Some(path) = &cfg.output {
        info!("wrote {}", path.display());
    }

    if let Some(plot) = &cfg.plot {
        visualize::curve::rarefaction_curve_plot(&curve, plot.to_str().unwrap_or_default())
            .map_err(|e| anyhow!("failed to render rarefaction curve: {}", e))?;
        info!("wrote {}", plot.display());
    }

    Ok(())
}

pub fn write_curve_tsv<W: Write>(points: &[CurvePoint], mut writer: W) -> std::io::Result<()> {
    writeln!(writer, "depth\tmean_clusters\tstd_dev")?;
    for point in points {
        writeln!(
            writer,
            "{}\t{:.4}\t{:.4}",
            point.depth, point.mean_clusters, point.std_dev
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn drep_table(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("Cdb.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "genome,secondary_cluster").unwrap();
        writeln!(file, "bin_1.fasta,1_1").unwrap();
        writeln!(file, "bin_2.fasta,1_1").unwrap();
        writeln!(file, "bin_3.fasta,2_1").unwrap();
        writeln!(file, "bin_4.fasta,3_1").unwrap();
        path
    }

    fn config(input: PathBuf, output: PathBuf, format: &str) -> RarefyConfig {
        RarefyConfig {
            input,
            genome_col: "genome".to_string(),
            cluster_col: "secondary_cluster".to_string(),
            repetitions: 50,
            step: 1,
            seed: Some(13),
            format: format.to_string(),
            output: Some(output),
            plot: None,
        }
    }

    #[test]
    fn test_tsv_output_covers_every_depth() {
        let dir = tempfile::tempdir().unwrap();
        let input = drep_table(dir.path());
        let output = dir.path().join("curve.tsv");

        run(&config(input, output.clone(), "tsv")).unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "depth\tmean_clusters\tstd_dev");
        assert_eq!(lines.len(), 5);
        // Full depth recovers all three clusters with no spread.
        assert_eq!(lines[4], "4\t3.0000\t0.0000");
    }

    #[test]
    fn test_json_output_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let input = drep_table(dir.path());
        let output = dir.path().join("curve.json");

        run(&config(input, output.clone(), "json")).unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed[0]["depth"], 1);
    }

    #[test]
    fn test_unsupported_format_fails() {
        let dir = tempfile::tempdir().unwrap();
        let input = drep_table(dir.path());
        let output = dir.path().join("curve.xml");

        let err = run(&config(input, output, "xml")).unwrap_err();
        assert!(err.to_string().contains("unsupported format"));
    }

    #[test]
    fn test_missing_cluster_column_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "genome,primary_cluster").unwrap();
        writeln!(file, "bin_1.fasta,1").unwrap();

        let err = run(&config(path, dir.path().join("out.tsv"), "tsv")).unwrap_err();
        assert!(err.to_string().contains("secondary_cluster"));
    }
}
