use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use rse_map::convert::{self, LightTypeCatalog};
use rse_map::map::{self, MapFile};

/// Decode every MAP file under a folder and print what was found
#[derive(Parser, Debug)]
#[command(name = "map-stats")]
struct Args {
    /// Game install folder
    #[arg(env = "RSE_GAME_PATH", default_value = "data")]
    path: PathBuf,

    /// Print a line per file as well as the totals
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let mut total = 0;
    let mut failed = 0;
    let mut bytes = 0;
    let mut elapsed = Duration::ZERO;
    let mut counts = HashMap::new();
    let mut light_types = LightTypeCatalog::new();

    for filename in convert::discover_files(&args.path, "map")? {
        if map::is_known_unsupported(&filename) {
            continue;
        }
        // Unreadable files are reported below with the decode failures
        bytes += fs::metadata(&filename).map(|m| m.len()).unwrap_or_default();

        let now = Instant::now();
        let decoded = MapFile::read_file(&filename);
        elapsed += now.elapsed();
        total += 1;

        let decoded = match decoded {
            Ok(decoded) => decoded,
            Err(err) => {
                println!("{err}");
                failed += 1;
                continue;
            }
        };
        let map = &decoded.map;
        *counts.entry((map.dialect, decoded.end_of_file_reached)).or_insert(0) += 1;
        map.light_types().for_each(|t| {
            light_types.insert(t);
        });

        if args.verbose {
            println!("{}", filename.display());
            println!("  dialect = {} ; end of file = {}", map.dialect, decoded.end_of_file_reached);
            println!(
                "  materials: {} ; geometry: {} ; portals: {} ; lights: {}",
                map.materials.materials.len(),
                map.geometries.objects.len(),
                map.portals.portals.len(),
                map.lights.lights.len(),
            );
            println!(
                "  objects: {} ; rooms: {} ; planning levels: {}",
                map.objects.objects.len(),
                map.rooms.rooms.len(),
                map.planning_levels.levels.len(),
            );
            let unevaluated = map.unevaluated_flags().len();
            if unevaluated > 0 {
                println!("  unevaluated flags: {unevaluated}");
            }
        }
    }
    println!("{:-<50}", "");
    println!("Read {total} MAP files in {:?} ({bytes} bytes), {failed} failed\n", elapsed);
    for ((dialect, eof), count) in counts {
        println!("{:<12} end of file={eof:<5}: {count:>5} files", dialect.to_string());
    }
    println!("light types: {:?}", light_types.iter().collect::<Vec<_>>());

    Ok(())
}
