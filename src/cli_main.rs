use crate::taxonomy::Rank;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "magviz", version, about = "MAG quality, taxonomy and abundance reporting", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the report chart suite from pipeline output tables
    Report {
        /// Directory containing CoverM abundance tables
        #[arg(long)]
        coverm: Option<PathBuf>,

        /// CheckM quality table (CSV/TSV)
        #[arg(long)]
        checkm: Option<PathBuf>,

        /// CheckM2 quality table (CSV/TSV)
        #[arg(long)]
        checkm2: Option<PathBuf>,

        /// GTDB-Tk classification table (CSV/TSV)
        #[arg(long)]
        gtdb: Option<PathBuf>,

        /// dRep cluster table (CSV/TSV)
        #[arg(long)]
        drep: Option<PathBuf>,

        /// AMBER binning benchmark table (CSV/TSV)
        #[arg(long)]
        amber: Option<PathBuf>,

        /// Output folder for the generated plots
        #[arg(short, long)]
        output: PathBuf,

        /// Rank used for the distribution pie and the truncated sankey
        #[arg(short, long, value_enum, default_value = "species")]
        rank: Rank,

        /// Maximum number of pie slices
        #[arg(long, default_value_t = 10)]
        top_n: usize,

        /// Rarefaction repetitions per depth
        #[arg(long, default_value_t = 200)]
        repetitions: usize,

        /// Rarefaction depth step size
        #[arg(long, default_value_t = 1)]
        step: usize,

        /// Seed for reproducible rarefaction
        #[arg(long)]
        seed: Option<u64>,

        /// Abundance above which a MAG counts as detected in a sample
        #[arg(long, default_value_t = 0.0)]
        present_threshold: f64,

        /// Number of threads to use
        #[arg(long, default_value_t = num_cpus::get())]
        threads: usize,
    },

    /// Estimate a species-cluster rarefaction curve from a dereplication table
    Rarefaction {
        /// Input table with genome and cluster columns
        #[arg(short, long)]
        input: PathBuf,

        /// Column holding genome identifiers
        #[arg(long, default_value = "genome")]
        genome_col: String,

        /// Column holding species-cluster labels
        #[arg(long, default_value = "secondary_cluster")]
        cluster_col: String,

        /// Repetitions per depth
        #[arg(long, default_value_t = 200)]
        repetitions: usize,

        /// Depth step size
        #[arg(long, default_value_t = 1)]
        step: usize,

        /// Seed for reproducible sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Output format (tsv or json)
        #[arg(long, default_value = "tsv")]
        format: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Optional rarefaction curve PNG
        #[arg(long)]
        plot: Option<PathBuf>,

        /// Number of threads to use
        #[arg(long, default_value_t = num_cpus::get())]
        threads: usize,
    },
}
