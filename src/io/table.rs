use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::{info, warn};

/// Delimiter chosen from the file extension: `.tsv` and `.tabular` are
/// tab-separated, everything else is treated as comma-separated.
pub fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some("tsv") | Some("tabular") => b'\t',
        _ => b',',
    }
}

/// A delimited table with its first column used as the row index, the way
/// the upstream tool outputs (CheckM, GTDB-Tk, dRep, CoverM) are shaped.
#[derive(Debug, Clone)]
pub struct Table {
    pub index_name: String,
    pub index: Vec<String>,
    pub columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn from_path(path: &Path) -> Result<Table> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter_for(path))
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("failed to open table {}", path.display()))?;

        let headers = reader
            .headers()
            .with_context(|| format!("failed to read headers from {}", path.display()))?
            .clone();
        if headers.is_empty() {
            bail!("table {} has no columns", path.display());
        }

        let index_name = headers[0].to_string();
        let columns: Vec<String> = headers.iter().skip(1).map(|h| h.to_string()).collect();

        let mut index = Vec::new();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record =
                record.with_context(|| format!("failed to parse row in {}", path.display()))?;
            if record.is_empty() {
                continue;
            }
            index.push(record[0].to_string());
            let mut row: Vec<String> = record.iter().skip(1).map(|f| f.to_string()).collect();
            // Short rows happen in hand-edited tables; pad so column access
            // stays positional.
            row.resize(columns.len(), String::new());
            rows.push(row);
        }

        info!(
            "{} loaded: {} rows x {} columns",
            path.display(),
            index.len(),
            columns.len()
        );

        Ok(Table {
            index_name,
            index,
            columns,
            rows,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.index.len()
    }

    fn column_position(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .with_context(|| format!("column '{}' not found (have: {})", name, self.columns.join(", ")))
    }

    /// Raw string values of a named column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let pos = self.column_position(name)?;
        Ok(self.rows.iter().map(|row| row[pos].as_str()).collect())
    }

    /// Like `column`, but the index column is addressable by its header
    /// name too. Upstream tools disagree on whether the id field counts as
    /// a column, so both spellings work.
    pub fn column_or_index(&self, name: &str) -> Result<Vec<&str>> {
        if name == self.index_name {
            Ok(self.index.iter().map(String::as_str).collect())
        } else {
            self.column(name)
        }
    }

    /// A named column parsed as f64, in row order. Cells that do not parse
    /// become NaN so row alignment with the index is preserved; callers
    /// filter non-finite values where it matters.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        let values = self.column(name)?;
        let mut parsed = Vec::with_capacity(values.len());
        let mut bad = 0usize;
        for value in values {
            match value.trim().parse::<f64>() {
                Ok(v) => parsed.push(v),
                Err(_) => {
                    bad += 1;
                    parsed.push(f64::NAN);
                }
            }
        }
        if bad > 0 {
            warn!("column '{}': {} non-numeric cells treated as NaN", name, bad);
        }
        Ok(parsed)
    }
}
