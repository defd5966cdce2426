// Main entry point for the playerkit render server.
// Loads the item catalog, configures the external renderer and the Axum router,
// and starts the HTTP server.

use clap::Parser;
use playerkit_render_server::{
    catalog::ItemCatalog,
    pipeline::{PipelineSettings, RenderPipeline},
    renderer::ExternalRenderer,
    shutdown_signal::shutdown_signal,
    web::{create_app, create_listener},
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::Level;

/// Command line arguments for playerkit-render-server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct AppConfig {
    /// Hostname/IP to bind the server to.
    /// If this option is specified without value, it will default to "*", meaning the server will listen on all interfaces.
    #[arg(long, env = "PLAYERKIT_SERVER_HOST", default_value = "localhost", num_args = 0..=1, default_missing_value = "*")]
    host: String,

    /// Port number to listen on.
    #[arg(short, long, env = "PLAYERKIT_SERVER_PORT", default_value_t = 6796)]
    port: u16,

    /// Directory containing items.json.
    #[arg(long, env = "DATAFILES_DIR", default_value = "data_files")]
    datafiles_dir: PathBuf,

    /// Explicit path of the item catalog. Overrides --datafiles-dir.
    #[arg(long, env = "ITEMS_JSON_PATH")]
    items_json: Option<PathBuf>,

    /// Path of the renderer jar.
    #[arg(long, env = "RENDERER_PATH")]
    renderer_path: PathBuf,

    /// Java launcher used to run the renderer jar.
    #[arg(long, env = "RENDERER_JAVA", default_value = "java")]
    java: PathBuf,

    /// Asset cache read by the renderer.
    #[arg(long, env = "RENDERER_CACHE_PATH", default_value = "./caches/cache")]
    cache_path: PathBuf,

    /// Root directory for per-request job directories. Defaults to the OS temp directory.
    #[arg(long, env = "PLAYERKIT_TMP_DIR")]
    tmp_dir: Option<PathBuf>,

    /// Keep job directories after responding, for debugging renderer output.
    #[arg(long, env = "PLAYERKIT_KEEP_ARTIFACTS", action = clap::ArgAction::SetTrue)]
    keep_artifacts: bool,

    /// Kill a renderer invocation after this many seconds. No limit when unset.
    #[arg(long, env = "PLAYERKIT_RENDER_TIMEOUT_SECS")]
    render_timeout_secs: Option<u64>,

    /// Maximum log level (error, warn, info, debug, trace).
    #[arg(long, env = "PLAYERKIT_LOG_LEVEL", default_value_t = Level::INFO)]
    log_level: Level,
}

#[tokio::main]
async fn main() {
    let config = AppConfig::parse();

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting playerkit-render-server...");

    // --- Load the item catalog ---
    // The server must not accept requests without a complete catalog.
    let items_path = config
        .items_json
        .clone()
        .unwrap_or_else(|| config.datafiles_dir.join("items.json"));
    let catalog = match ItemCatalog::load(&items_path) {
        Ok(catalog) => catalog,
        Err(err) => {
            tracing::error!("FATAL: Failed to load item catalog: {}", err);
            eprintln!("FATAL: Item catalog could not be loaded. See logs for details. Exiting.");
            std::process::exit(1);
        }
    };
    tracing::info!(
        "Loaded {} item(s) from {}",
        catalog.len(),
        items_path.display()
    );
    if catalog.is_empty() {
        tracing::warn!("The item catalog is empty. Every render request will be rejected.");
    }

    // --- Configure the renderer ---
    let render_timeout = config.render_timeout_secs.map(Duration::from_secs);
    let renderer = ExternalRenderer::java_jar(&config.java, &config.renderer_path)
        .with_timeout(render_timeout);
    tracing::info!(
        "Renderer: {} -jar {} (cache: {}, timeout: {:?})",
        config.java.display(),
        config.renderer_path.display(),
        config.cache_path.display(),
        render_timeout
    );

    let settings = PipelineSettings {
        cache_path: config.cache_path.clone(),
        tmp_root: config.tmp_dir.clone().unwrap_or_else(std::env::temp_dir),
        keep_artifacts: config.keep_artifacts,
    };
    tracing::info!("Job directories under {}", settings.tmp_root.display());

    let pipeline = Arc::new(RenderPipeline::new(
        Arc::new(catalog),
        Arc::new(renderer),
        settings,
    ));

    let app = create_app(pipeline);
    tracing::info!("Axum router configured.");

    // --- Start HTTP Server ---
    let listener = match create_listener(&config.host, config.port).await {
        Ok((addr, l)) => {
            tracing::info!("Server successfully bound. Listening on {}", addr);
            l
        }
        Err(e) => {
            tracing::error!("FATAL: Failed to bind server: {}", e);
            eprintln!("FATAL: Could not bind server. Error: {}. Exiting.", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server run error: {}", e);
        eprintln!("ERROR: Server shut down unexpectedly. Error: {}", e);
    }

    tracing::info!("playerkit-render-server has shut down.");
}
