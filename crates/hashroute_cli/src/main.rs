//! Route replay CLI.
//!
//! # Responsibility
//! - Load a JSON route manifest and replay a sequence of locations.
//! - Print which routes are mounted after each navigation.

use clap::Parser;
use hashroute_core::{build_tree, MemoryLocation, RouteManifest, RouteTree};
use log::warn;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "hashroute_cli",
    version,
    about = "Replay hash locations against a route manifest"
)]
struct Args {
    /// Print the node outline after every navigation
    #[arg(long)]
    outline: bool,
    /// Absolute directory for rotating log files
    #[arg(long, env = "HASHROUTE_LOG_DIR")]
    log_dir: Option<String>,
    /// JSON route manifest
    manifest_path: PathBuf,
    /// Locations to visit in order (e.g. `#/home`)
    locations: Vec<String>,
}

fn mounted_paths(tree: &RouteTree) -> String {
    tree.mounted_routes()
        .into_iter()
        .filter_map(|id| tree.cached_full_path(id))
        .collect::<Vec<_>>()
        .join(",")
}

/// Builds the manifest at an empty location and visits each location in turn.
///
/// Returns one report line per successful navigation, followed by the
/// outline when requested. Failed navigations are reported on stderr.
fn replay(manifest: &RouteManifest, args: &Args) -> Result<Vec<String>, String> {
    let (mut tree, _registries) =
        build_tree(manifest, MemoryLocation::default()).map_err(|err| err.to_string())?;

    let mut report = Vec::new();
    for location in &args.locations {
        if let Err(err) = tree.navigate(location.as_str()) {
            warn!(
                "event=cli_navigate module=cli status=error location={} error={}",
                location, err
            );
            eprintln!("location={location} error={err}");
            continue;
        }
        report.push(format!("location={location} mounted={}", mounted_paths(&tree)));
        if args.outline {
            report.push(tree.render_outline());
        }
    }
    Ok(report)
}

fn run(args: &Args) -> Result<(), String> {
    let manifest = RouteManifest::from_path(&args.manifest_path).map_err(|err| err.to_string())?;
    for line in replay(&manifest, args)? {
        println!("{}", line.trim_end());
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(log_dir) = args.log_dir.as_deref() {
        if let Err(err) = hashroute_core::init_logging(hashroute_core::default_log_level(), log_dir)
        {
            eprintln!("logging disabled: {err}");
        }
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
