//! Docent — document-grounded chat server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use docent_chat::{HttpPool, TemplateStore};
use docent_core::DocentConfig;
use docent_server::{build_router, AppState, DEFAULT_PROMPTS};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn resolve_data_dir() -> PathBuf {
    std::env::var("DOCENT_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

/// Write the bundled templates if the prompts file does not exist yet.
fn ensure_prompts_file(path: &Path) -> std::io::Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_PROMPTS)?;
    info!("Wrote default prompt templates to {}", path.display());
    Ok(())
}

fn validate_prompts(path: &Path) -> bool {
    match TemplateStore::load(path) {
        Ok(store) => {
            println!("{}: OK", path.display());
            for category in store.categories() {
                println!("  {:<16} {}", category, store.nodes(category).join(", "));
            }
            true
        }
        Err(e) => {
            eprintln!("{}: {}", path.display(), e);
            false
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--validate" | "validate" => {
                let path = match args.get(2) {
                    Some(p) => PathBuf::from(p),
                    None => DocentConfig::from_env(resolve_data_dir())?.data_paths.prompts_file,
                };
                std::process::exit(if validate_prompts(&path) { 0 } else { 1 });
            }
            "--help" | "-h" | "help" => {
                println!("Docent — document-grounded chat server");
                println!();
                println!("Usage: docent [command]");
                println!();
                println!("Commands:");
                println!("  (none)                   Start the server");
                println!("  validate [prompts-file]  Check a prompt template file");
                println!("  help                     Show this help message");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'docent help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = DocentConfig::from_env(&data_dir)?;
    let port = config.port;

    ensure_prompts_file(&config.data_paths.prompts_file)?;
    let templates = TemplateStore::load(&config.data_paths.prompts_file)?;

    let pool = HttpPool::with_defaults()?;
    let state = Arc::new(AppState::new(config, templates, pool));
    info!(
        "Default model: {}/{}",
        state.catalog.default_manufacturer(),
        state.catalog.default_model()
    );

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Docent server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
