use crate::io::table::Table;
use anyhow::{bail, Context, Result};
use ndarray::Array2;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Relative-abundance matrix: genomes on rows, samples on columns. One
/// CoverM output file contributes one column block; multiple files are
/// merged column-wise on the genome index.
#[derive(Debug, Clone)]
pub struct CoverageMatrix {
    pub genomes: Vec<String>,
    pub samples: Vec<String>,
    pub values: Array2<f64>,
}

impl CoverageMatrix {
    pub fn from_table(table: &Table) -> Result<CoverageMatrix> {
        let mut values = Array2::zeros((table.num_rows(), table.columns.len()));
        for (col, sample) in table.columns.iter().enumerate() {
            let parsed = table.numeric_column(sample)?;
            for (row, v) in parsed.into_iter().enumerate() {
                // Missing or unparsable abundance reads as absent.
                values[[row, col]] = if v.is_finite() { v } else { 0.0 };
            }
        }
        Ok(CoverageMatrix {
            genomes: table.index.clone(),
            samples: table.columns.clone(),
            values,
        })
    }

    /// Load every table in a CoverM output directory and merge them
    /// column-wise. Files are visited in name order so the sample column
    /// order is stable across runs.
    pub fn load_dir(dir: &Path) -> Result<CoverageMatrix> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .with_context(|| format!("failed to read coverage directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        paths.sort();

        if paths.is_empty() {
            bail!("coverage directory {} contains no tables", dir.display());
        }

        let mut parts = Vec::with_capacity(paths.len());
        for path in &paths {
            let table = Table::from_path(path)?;
            parts.push(CoverageMatrix::from_table(&table)?);
        }

        if parts.len() == 1 {
            return Ok(parts.remove(0));
        }
        let merged = merge(parts);
        info!(
            "merged {} coverage tables: {} genomes x {} samples",
            paths.len(),
            merged.num_genomes(),
            merged.num_samples()
        );
        Ok(merged)
    }

    pub fn num_genomes(&self) -> usize {
        self.genomes.len()
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    /// Genomes detected per sample: count of rows with abundance above the
    /// presence threshold.
    pub fn detected_per_sample(&self, threshold: f64) -> Vec<usize> {
        (0..self.num_samples())
            .map(|col| {
                self.values
                    .column(col)
                    .iter()
                    .filter(|&&v| v > threshold)
                    .count()
            })
            .collect()
    }
}

/// Outer join on the genome index: rows keep first-seen genome order, sample
/// columns are appended in part order, and cells missing from a part are 0.
fn merge(parts: Vec<CoverageMatrix>) -> CoverageMatrix {
    let mut genomes: Vec<String> = Vec::new();
    let mut genome_rows: HashMap<String, usize> = HashMap::new();
    for part in &parts {
        for genome in &part.genomes {
            if !genome_rows.contains_key(genome) {
                genome_rows.insert(genome.clone(), genomes.len());
                genomes.push(genome.clone());
            }
        }
    }

    let total_samples: usize = parts.iter().map(|p| p.num_samples()).sum();
    let mut samples = Vec::with_capacity(total_samples);
    let mut values = Array2::zeros((genomes.len(), total_samples));

    let mut col_offset = 0;
    for part in &parts {
        if part.num_genomes() != genomes.len() {
            warn!(
                "coverage tables disagree on genome sets ({} vs {} genomes); missing cells filled with 0",
                part.num_genomes(),
                genomes.len()
            );
        }
        for (part_row, genome) in part.genomes.iter().enumerate() {
            let row = genome_rows[genome];
            for part_col in 0..part.num_samples() {
                values[[row, col_offset + part_col]] = part.values[[part_row, part_col]];
            }
        }
        samples.extend(part.samples.iter().cloned());
        col_offset += part.num_samples();
    }

    CoverageMatrix {
        genomes,
        samples,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_table(dir: &Path, name: &str, content: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        write!(file, "{}", content).unwrap();
    }

    #[test]
    fn test_single_file_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        write_table(
            dir.path(),
            "cov.tsv",
            "Genome\ts1.fastq Relative Abundance (%)\nbin_1\t12.5\nbin_2\t0\n",
        );

        let cov = CoverageMatrix::load_dir(dir.path()).unwrap();
        assert_eq!(cov.num_genomes(), 2);
        assert_eq!(cov.num_samples(), 1);
        assert_eq!(cov.values[[0, 0]], 12.5);
    }

    #[test]
    fn test_merge_joins_on_genome_index() {
        let dir = tempfile::tempdir().unwrap();
        write_table(dir.path(), "a.csv", "Genome,s1\nbin_1,1.0\nbin_2,2.0\n");
        write_table(dir.path(), "b.csv", "Genome,s2\nbin_2,3.0\nbin_3,4.0\n");

        let cov = CoverageMatrix::load_dir(dir.path()).unwrap();
        assert_eq!(cov.genomes, vec!["bin_1", "bin_2", "bin_3"]);
        assert_eq!(cov.samples, vec!["s1", "s2"]);
        // bin_3 is absent from a.csv, bin_1 from b.csv.
        assert_eq!(cov.values[[2, 0]], 0.0);
        assert_eq!(cov.values[[0, 1]], 0.0);
        assert_eq!(cov.values[[1, 1]], 3.0);
    }

    #[test]
    fn test_detected_per_sample() {
        let dir = tempfile::tempdir().unwrap();
        write_table(dir.path(), "cov.csv", "Genome,s1,s2\nbin_1,0.0,5.0\nbin_2,1.5,2.5\n");

        let cov = CoverageMatrix::load_dir(dir.path()).unwrap();
        assert_eq!(cov.detected_per_sample(0.0), vec![1, 2]);
    }
}
