use clap::Parser;
use magviz::cli_main::{Cli, Commands};
use magviz::pipeline::{rarefy, report};
use rayon::ThreadPoolBuilder;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Setting tracing default failed");

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            coverm,
            checkm,
            checkm2,
            gtdb,
            drep,
            amber,
            output,
            rank,
            top_n,
            repetitions,
            step,
            seed,
            present_threshold,
            threads,
        } => {
            info!("Generating MAG report in {}", output.display());
            let start = std::time::Instant::now();

            ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
                .expect("Failed to build thread pool");

            let config = report::ReportConfig {
                coverm,
                checkm,
                checkm2,
                gtdb,
                drep,
                amber,
                output,
                rank,
                top_n,
                repetitions,
                step,
                seed,
                present_threshold,
            };

            if let Err(e) = report::run(&config) {
                eprintln!("Error during report generation: {:#}", e);
                std::process::exit(1);
            }

            println!("Report completed in {:.2}s", start.elapsed().as_secs_f32());
        }

        Commands::Rarefaction {
            input,
            genome_col,
            cluster_col,
            repetitions,
            step,
            seed,
            format,
            output,
            plot,
            threads,
        } => {
            info!("Estimating rarefaction curve for {}", input.display());

            ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
                .expect("Failed to build thread pool");

            let config = rarefy::RarefyConfig {
                input,
                genome_col,
                cluster_col,
                repetitions,
                step,
                seed,
                format,
                output,
                plot,
            };

            if let Err(e) = rarefy::run(&config) {
                eprintln!("Error during rarefaction: {:#}", e);
                std::process::exit(1);
            }
        }
    }
}
