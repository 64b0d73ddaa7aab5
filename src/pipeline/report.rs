use crate::io::coverage::CoverageMatrix;
use crate::io::table::Table;
use crate::rarefaction::{rarefaction_curve, ClusterAssignments};
use crate::taxonomy::{Lineage, Rank};
use crate::visualize;
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct ReportConfig {
    pub coverm: Option<PathBuf>,
    pub checkm: Option<PathBuf>,
    pub checkm2: Option<PathBuf>,
    pub gtdb: Option<PathBuf>,
    pub drep: Option<PathBuf>,
    pub amber: Option<PathBuf>,
    pub output: PathBuf,
    pub rank: Rank,
    pub top_n: usize,
    pub repetitions: usize,
    pub step: usize,
    pub seed: Option<u64>,
    pub present_threshold: f64,
}

/// Run every chart whose input tables were supplied, in a fixed order.
pub fn run(cfg: &ReportConfig) -> Result<()> {
    ensure_output_dir(&cfg.output)?;

    let checkm = load_optional(cfg.checkm.as_deref())?;
    let checkm2 = load_optional(cfg.checkm2.as_deref())?;
    let gtdb = load_optional(cfg.gtdb.as_deref())?;
    let drep = load_optional(cfg.drep.as_deref())?;
    let amber = load_optional(cfg.amber.as_deref())?;
    let coverage = match cfg.coverm.as_deref() {
        Some(dir) => Some(CoverageMatrix::load_dir(dir)?),
        None => None,
    };

    if let Some(table) = &checkm {
        let completeness = table.numeric_column("Completeness")?;
        let contamination = table.numeric_column("Contamination")?;
        let output = cfg.output.join("comp_conta.png");
        chart(
            "completeness/contamination scatter",
            visualize::quality::completeness_contamination_plot(
                &completeness,
                &contamination,
                path_str(&output),
            ),
        )?;
        info!("wrote {}", output.display());
    }

    if let Some(table) = &checkm2 {
        let n50_kbp: Vec<f64> = table
            .numeric_column("Contig_N50")?
            .into_iter()
            .map(|v| v / 1000.0)
            .collect();
        let output = cfg.output.join("n50_histogram.png");
        chart(
            "N50 histogram",
            visualize::histogram::histogram_png(
                &n50_kbp,
                "N50 distribution",
                "N50 (kbp)",
                Some("kb"),
                path_str(&output),
            ),
        )?;
        info!("wrote {}", output.display());

        let contigs = table.numeric_column("Total_Contigs")?;
        let output = cfg.output.join("number_of_contig_his.png");
        chart(
            "contig count histogram",
            visualize::histogram::histogram_png(
                &contigs,
                "Contigs per genome",
                "Number of contigs per genome",
                None,
                path_str(&output),
            ),
        )?;
        info!("wrote {}", output.display());

        let metrics = vec![
            ("N50", table.numeric_column("Contig_N50")?),
            ("Total length Assembly", table.numeric_column("Genome_Size")?),
            ("Longest Contig", table.numeric_column("Max_Contig_Length")?),
            ("Coding Density", table.numeric_column("Coding_Density")?),
        ];
        let output = cfg.output.join("assambly_info_histo.png");
        chart(
            "assembly info panel",
            visualize::histogram::assembly_info_panel(&metrics, path_str(&output)),
        )?;
        info!("wrote {}", output.display());
    }

    let lineages: Option<Vec<Lineage>> = match &gtdb {
        Some(table) => Some(
            table
                .column("classification")?
                .into_iter()
                .map(Lineage::parse)
                .collect(),
        ),
        None => None,
    };

    if let Some(cov) = &coverage {
        let output = cfg.output.join("mag_detection_heatmap.png");
        chart(
            "MAG detection heatmap",
            visualize::heatmap::detection_heatmap(cov, path_str(&output)),
        )?;
        info!("wrote {}", output.display());

        if let (Some(table), Some(lineages)) = (&gtdb, &lineages) {
            let phylum_by_genome = phylum_assignments(table, lineages);
            if let Some(summary) =
                visualize::heatmap::PhylumSummary::build(cov, &phylum_by_genome, cfg.present_threshold)
            {
                let output = cfg.output.join("heatmap_with_bars.png");
                chart(
                    "phylum summary heatmap",
                    visualize::heatmap::phylum_heatmap(&summary, path_str(&output)),
                )?;
                info!("wrote {}", output.display());
            }
        }
    }

    if let Some(lineages) = &lineages {
        let counts = rank_counts(lineages, cfg.rank);
        let output = cfg.output.join("rank_dist_pie.png");
        chart(
            "rank distribution pie",
            visualize::rank_pie::rank_distribution_pie(
                &counts,
                cfg.rank,
                cfg.top_n,
                path_str(&output),
            ),
        )?;
        info!("wrote {}", output.display());

        let full = visualize::sankey::build_sankey(lineages, Rank::Species);
        let output = cfg.output.join("sankey_plot.html");
        visualize::sankey::write_sankey_html(&full, "Taxonomic Classification Sankey", &output)?;
        info!("wrote {}", output.display());

        let truncated = visualize::sankey::build_sankey(lineages, cfg.rank);
        let output = cfg
            .output
            .join(format!("sankey_{}.html", cfg.rank.label().to_lowercase()));
        visualize::sankey::write_sankey_html(
            &truncated,
            &format!("Taxonomic Classification Sankey ({})", cfg.rank.label()),
            &output,
        )?;
        info!("wrote {}", output.display());
    }

    if let Some(table) = &drep {
        let genomes = table.column_or_index("genome")?;
        let clusters = table.column_or_index("secondary_cluster")?;
        let assignments =
            ClusterAssignments::from_pairs(genomes.iter().copied().zip(clusters.iter().copied()));
        info!(
            "rarefying {} genomes in {} species clusters",
            assignments.num_genomes(),
            assignments.num_clusters()
        );

        let curve = rarefaction_curve(&assignments, cfg.repetitions, cfg.step, cfg.seed)?;

        let tsv = cfg.output.join("rarefaction.tsv");
        let file = std::fs::File::create(&tsv)
            .with_context(|| format!("failed to create {}", tsv.display()))?;
        super::rarefy::write_curve_tsv(&curve, std::io::BufWriter::new(file))?;
        info!("wrote {}", tsv.display());

        let output = cfg.output.join("rarefaction_curve.png");
        chart(
            "rarefaction curve",
            visualize::curve::rarefaction_curve_plot(&curve, path_str(&output)),
        )?;
        info!("wrote {}", output.display());
    }

    if let Some(table) = &amber {
        let scores = binner_scores(table)?;
        let output = cfg.output.join("binner_compare.png");
        chart(
            "binner comparison",
            visualize::benchmark::binner_bar_chart(&scores, path_str(&output)),
        )?;
        info!("wrote {}", output.display());
    }

    Ok(())
}

fn ensure_output_dir(path: &Path) -> Result<()> {
    if path.exists() {
        info!("output folder already exists: {}", path.display());
    } else {
        std::fs::create_dir_all(path)
            .with_context(|| format!("failed to create output folder {}", path.display()))?;
        info!("created output folder: {}", path.display());
    }
    Ok(())
}

fn load_optional(path: Option<&Path>) -> Result<Option<Table>> {
    path.map(Table::from_path).transpose()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap_or_default()
}

fn chart(name: &str, result: Result<(), Box<dyn std::error::Error>>) -> Result<()> {
    result.map_err(|e| anyhow!("failed to render {}: {}", name, e))
}

/// Normalized `user_genome` id -> phylum name, for joining coverage rows
/// against their classification.
fn phylum_assignments(gtdb: &Table, lineages: &[Lineage]) -> HashMap<String, String> {
    gtdb.index
        .iter()
        .zip(lineages.iter())
        .filter_map(|(genome, lineage)| {
            lineage.phylum().map(|p| (genome.clone(), p.to_string()))
        })
        .collect()
}

/// Taxon frequencies at one rank, unclassified rows pooled under
/// "Unknown <Rank>", ordered by count descending.
fn rank_counts(lineages: &[Lineage], rank: Rank) -> Vec<(String, usize)> {
    let unknown = format!("Unknown {}", rank.label());
    let mut counts: HashMap<String, usize> = HashMap::new();
    for lineage in lineages {
        let name = lineage.name_at(rank).unwrap_or(&unknown);
        *counts.entry(name.to_string()).or_insert(0) += 1;
    }

    let mut out: Vec<(String, usize)> = counts.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Mean f1_score_per_bp per tool over the genome-binning rows, tools in
/// first-seen order.
fn binner_scores(amber: &Table) -> Result<Vec<(String, f64)>> {
    let tools = amber.column_or_index("Tool")?;
    let kinds = amber.column_or_index("binning type")?;
    let scores = amber.numeric_column("f1_score_per_bp")?;

    let mut order: Vec<String> = Vec::new();
    let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
    for ((tool, kind), score) in tools.iter().zip(kinds.iter()).zip(scores.iter()) {
        if *kind != "genome" {
            continue;
        }
        if !score.is_finite() {
            warn!("tool {}: non-numeric f1_score_per_bp skipped", tool);
            continue;
        }
        if !sums.contains_key(*tool) {
            order.push(tool.to_string());
        }
        let entry = sums.entry(tool.to_string()).or_insert((0.0, 0));
        entry.0 += score;
        entry.1 += 1;
    }

    Ok(order
        .into_iter()
        .map(|tool| {
            let (sum, n) = sums[&tool];
            (tool, sum / n as f64)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_rank_counts_pools_unknowns() {
        let lineages = vec![
            Lineage::parse("d__Bacteria;p__Bacteroidota;c__;o__;f__;g__;s__"),
            Lineage::parse("d__Bacteria;p__Bacteroidota;c__;o__;f__;g__;s__"),
            Lineage::parse("d__Bacteria;p__;c__;o__;f__;g__;s__"),
        ];
        let counts = rank_counts(&lineages, Rank::Phylum);

        assert_eq!(counts[0], ("Bacteroidota".to_string(), 2));
        assert_eq!(counts[1], ("Unknown Phylum".to_string(), 1));
    }

    #[test]
    fn test_binner_scores_filters_and_averages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("amber.tsv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "sample\tTool\tbinning type\tf1_score_per_bp").unwrap();
        writeln!(file, "s1\tMetaBAT2\tgenome\t0.8").unwrap();
        writeln!(file, "s2\tMetaBAT2\tgenome\t0.6").unwrap();
        writeln!(file, "s1\tMetaBAT2\ttaxonomic\t0.1").unwrap();
        writeln!(file, "s1\tMaxBin2\tgenome\t0.5").unwrap();

        let table = Table::from_path(&path).unwrap();
        let scores = binner_scores(&table).unwrap();

        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].0, "MetaBAT2");
        assert!((scores[0].1 - 0.7).abs() < 1e-9);
        assert_eq!(scores[1], ("MaxBin2".to_string(), 0.5));
    }

    #[test]
    fn test_report_runs_on_partial_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let drep = dir.path().join("drep.csv");
        let mut file = std::fs::File::create(&drep).unwrap();
        writeln!(file, "genome,secondary_cluster").unwrap();
        writeln!(file, "bin_1.fasta,1_1").unwrap();
        writeln!(file, "bin_2.fasta,1_1").unwrap();
        writeln!(file, "bin_3.fasta,2_1").unwrap();

        let output = dir.path().join("plots");
        let cfg = ReportConfig {
            coverm: None,
            checkm: None,
            checkm2: None,
            gtdb: None,
            drep: Some(drep),
            amber: None,
            output: output.clone(),
            rank: Rank::Phylum,
            top_n: 10,
            repetitions: 20,
            step: 1,
            seed: Some(7),
            present_threshold: 0.0,
        };

        run(&cfg).unwrap();
        assert!(output.join("rarefaction_curve.png").exists());
        assert!(output.join("rarefaction.tsv").exists());
        assert!(!output.join("comp_conta.png").exists());
    }
}
