use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::info;

use lcia_flow_factors::settings::Settings;
use lcia_flow_factors::{catalog, compress, dataset, output, pipeline, report};

#[derive(Parser)]
#[command(
    name = "lcia-flow-factors",
    about = "Merge LCIA method characterization factors into one flow table"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every method's factors and write the merged table (+ .gz)
    Merge {
        /// Directory of method JSON files
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Merged output file; a .gz copy is written alongside
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Extraction threads (0 = all cores)
        #[arg(short = 'j', long)]
        threads: Option<usize>,
    },
    /// Gzip each method as <uuid>_<version>.json.gz
    Compress {
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Archive directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Regenerate the method catalog (list.json)
    List {
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Catalog file to write
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Preferred file order, one archive name per line
        #[arg(long)]
        order: Option<PathBuf>,
    },
    /// Summarize the method directory and an existing merged table
    Stats {
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Merged file (plain or .gz)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load()?;
    apply_overrides(&cli.command, &mut settings);
    info!(?settings, "Settings loaded");

    match &cli.command {
        Commands::Merge { .. } => run_merge(&settings)?,
        Commands::Compress { .. } => run_compress(&settings)?,
        Commands::List { .. } => run_list(&settings)?,
        Commands::Stats { file, .. } => {
            let file = file.clone().unwrap_or_else(|| settings.output_file.clone());
            run_stats(&settings, &file)?;
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", report::format_duration(elapsed));
    }
    Ok(())
}

/// Command-line flags win over file and environment settings.
fn apply_overrides(command: &Commands, settings: &mut Settings) {
    fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
        if let Some(v) = value {
            *slot = v.clone();
        }
    }
    match command {
        Commands::Merge {
            input,
            output,
            threads,
        } => {
            set(&mut settings.json_dir, input);
            set(&mut settings.output_file, output);
            set(&mut settings.threads, threads);
        }
        Commands::Compress { input, output } => {
            set(&mut settings.json_dir, input);
            set(&mut settings.compressed_dir, output);
        }
        Commands::List {
            input,
            output,
            order,
        } => {
            set(&mut settings.json_dir, input);
            set(&mut settings.list_file, output);
            set(&mut settings.order_file, order);
        }
        Commands::Stats { input, .. } => set(&mut settings.json_dir, input),
    }
}

fn run_merge(settings: &Settings) -> anyhow::Result<()> {
    let sources = dataset::discover(&settings.json_dir)?;
    if sources.is_empty() {
        println!(
            "No JSON files in {}, writing an empty table",
            settings.json_dir.display()
        );
    } else {
        println!("Found {} method files, extracting...", sources.len());
    }

    let gz_path = settings.compressed_output_file();
    let pb = report::progress_bar(sources.len());
    let summary =
        pipeline::run_to_files(&sources, settings.threads, &pb, &settings.output_file, &gz_path)?;
    pb.finish_and_clear();

    report::print_merge(&summary.report, summary.entries, summary.measurements);
    println!(
        "Wrote {} ({} bytes) and {}",
        settings.output_file.display(),
        summary.bytes,
        gz_path.display()
    );
    Ok(())
}

fn run_compress(settings: &Settings) -> anyhow::Result<()> {
    let sources = dataset::discover(&settings.json_dir)?;
    if sources.is_empty() {
        println!("No JSON files in {}", settings.json_dir.display());
        return Ok(());
    }
    println!("Found {} method files", sources.len());

    let pb = report::progress_bar(sources.len());
    let archived = compress::archive_all(&sources, &settings.compressed_dir, &pb)?;
    pb.finish_and_clear();
    report::print_archives(&archived, sources.len());
    println!("Archives in {}", settings.compressed_dir.display());

    let listings = compress::list_archives(&settings.compressed_dir)?;
    report::print_listing(&listings);
    Ok(())
}

fn run_list(settings: &Settings) -> anyhow::Result<()> {
    let order = catalog::read_order_file(&settings.order_file)?;
    match &order {
        Some(names) => println!(
            "Read {} names from {}",
            names.len(),
            settings.order_file.display()
        ),
        None => println!("No order file, sorting by name"),
    }

    let sources = dataset::discover(&settings.json_dir)?;
    if sources.is_empty() {
        println!("No JSON files in {}", settings.json_dir.display());
        return Ok(());
    }
    println!("Found {} method files", sources.len());

    let run = catalog::assemble(&sources, &settings.compressed_dir, order.as_deref());
    report::print_catalog(&run);

    catalog::write_catalog(&run.catalog, &settings.list_file)?;
    println!("Saved {}", settings.list_file.display());

    report::print_model_counts(&catalog::model_counts(&run.catalog));
    Ok(())
}

fn run_stats(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let datasets = dataset::discover(&settings.json_dir)?.len();
    let stats = output::TableStats::from_entries(&output::read_merged(file)?);

    println!("Input:         {}", settings.json_dir.display());
    println!("Datasets:      {}", datasets);
    println!("File:          {}", file.display());
    println!("Identities:    {}", stats.identities);
    println!("Measurements:  {}", stats.measurements);
    println!("Methods:       {}", stats.methods);
    println!("Null values:   {}", stats.null_values);
    Ok(())
}
