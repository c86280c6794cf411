use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use rse_map::convert::{self, ConvertOptions};

/// Convert RSE MAP files to JSON
#[derive(Parser, Debug)]
#[command(name = "map-converter")]
#[command(version)]
struct Args {
    /// Game install folders (or single MAP files) to convert
    #[arg(env = "RSE_GAME_PATH", required = true, num_args = 1..)]
    paths: Vec<PathBuf>,

    /// Extension of the files to look for, matched without regard to case
    #[arg(short, long, default_value = "map")]
    extension: String,

    /// Worker threads, 0 uses one per core
    #[arg(short, long, default_value = "0")]
    jobs: usize,

    /// Appended to each MAP path to name its JSON file
    #[arg(long, default_value = ".JSON")]
    output_suffix: String,

    /// Write vertex, face and index arrays out in full
    #[arg(long)]
    keep_arrays: bool,

    /// Write JSON on a single line
    #[arg(long)]
    compact: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs)
        .build_global()
        .context("could not start worker threads")?;

    let mut files = Vec::new();
    for path in &args.paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        let found = convert::discover_files(path, &args.extension)
            .with_context(|| format!("bad search path {}", path.display()))?;
        log::info!("Found {} files under {}", found.len(), path.display());
        files.extend(found);
    }

    let options = ConvertOptions {
        output_suffix: args.output_suffix,
        strip_arrays: !args.keep_arrays,
        pretty: !args.compact,
    };

    let now = Instant::now();
    let summary = convert::run_batch(&files, &options);

    log::info!(
        "Converted {} files in {:?}: {} skipped, {} failed",
        summary.converted,
        now.elapsed(),
        summary.skipped,
        summary.failed,
    );
    for path in &summary.incomplete {
        log::warn!("Did not reach end of file: {}", path.display());
    }
    let light_types: Vec<_> = summary.light_types.iter().collect();
    log::info!("Light types: {light_types:?}");

    Ok(())
}
