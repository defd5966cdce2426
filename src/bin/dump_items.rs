// Builds the item catalog (items.json / itemsmin.js) from a directory of raw
// item definition dumps.

use clap::Parser;
use playerkit_render_server::item_dump::{build_catalog, write_catalog};
use std::path::PathBuf;
use tracing::Level;

/// Command line arguments for dump-items
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct DumpConfig {
    /// Directory of raw item definition JSON files, one item per file.
    #[arg(long, default_value = "./osrs-flatcache/dump/item_defs")]
    input_dir: PathBuf,

    /// Directory receiving items.json and itemsmin.js.
    #[arg(long, env = "DATAFILES_DIR", default_value = "./data_files")]
    output_dir: PathBuf,
}

fn main() {
    let config = DumpConfig::parse();

    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    tracing::info!("Reading item dumps from {}", config.input_dir.display());

    let items = match build_catalog(&config.input_dir) {
        Ok(items) => items,
        Err(e) => {
            tracing::error!("Failed to build item catalog: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = write_catalog(&items, &config.output_dir) {
        tracing::error!("Failed to write item catalog: {}", e);
        std::process::exit(1);
    }

    tracing::info!(
        "Wrote {} items to {}",
        items.len(),
        config.output_dir.display()
    );
}
