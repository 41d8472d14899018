// ChildSafe chat client entry point.
//
// Startup sequence:
// 1. Load .env and parse arguments
// 2. Load config (creating it from defaults on first run)
// 3. Initialize tracing (log to file, not terminal)
// 4. Build the backend client
// 5. Run a one-shot subcommand, or:
//    a. create mpsc channels
//    b. spawn the app logic task
//    c. run the TUI until the user quits

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};

use childsafe_app::app::{self, AppState};
use childsafe_app::session::ChatSession;
use childsafe_backend::{HttpBackend, QueryBackend};
use childsafe_core::config::{self, Config, LoggingConfig};
use childsafe_tui::cli::{self, Cli, Command};
use childsafe_tui::tui::{self, ViewState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment and arguments
    let dotenv = dotenvy::dotenv();
    let args = Cli::parse();

    // 2. Config
    let (mut config, base_dir) =
        config::load_config(args.config_dir.as_deref()).context("failed to load configuration")?;
    if let Some(url) = &args.url {
        config::override_url(&mut config, url).context("invalid --url")?;
    }

    // 3. Tracing
    init_tracing(&base_dir, &config.logging)?;
    info!("ChildSafe chat starting up");
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }
    info!(
        "Config loaded from {}: backend={}, top_k={:?}, {} example prompts",
        base_dir.display(),
        config.backend.url,
        config.backend.top_k,
        config.ui.examples.len()
    );

    // 4. Backend client
    let backend: Arc<dyn QueryBackend> =
        Arc::new(HttpBackend::new(&config.backend).context("failed to create backend client")?);

    // 5. Dispatch
    match args.command {
        Some(Command::Ask { query, html }) => {
            let message = cli::ask(backend.as_ref(), &query, config.backend.top_k).await?;
            println!("{}", cli::render_answer(&message, html));
            if message.is_error {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Health) => {
            let url = config.backend.resolved_health_url();
            match cli::health(backend.as_ref()).await {
                Ok(status) => {
                    println!("{url}: {status}");
                    Ok(())
                }
                Err(e) => {
                    eprintln!("{url}: {e:#}");
                    std::process::exit(1);
                }
            }
        }
        None => run_interactive(config, backend).await,
    }
}

async fn run_interactive(config: Config, backend: Arc<dyn QueryBackend>) -> anyhow::Result<()> {
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (backend_tx, backend_rx) = mpsc::channel(16);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    let session = ChatSession::from_config(&config.ui);
    let app_state = AppState::new(session, backend, backend_tx).with_top_k(config.backend.top_k);

    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, backend_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    info!("Application ready");

    // Blocks until the user quits.
    if let Err(e) = tui::run(ui_rx, cmd_tx, ViewState::from_config(&config.ui)).await {
        error!("TUI error: {}", e);
    }

    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("ChildSafe chat shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing(base_dir: &Path, logging: &LoggingConfig) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = base_dir.join(&logging.directory);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let log_file = std::fs::File::create(log_dir.join("childsafe-chat.log"))
        .context("failed to create log file")?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter)),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
