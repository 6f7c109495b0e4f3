use chrono::Local;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging: stderr always, plus an append-mode file when `log_file` is set.
///
/// `RUST_LOG` takes precedence over the verbosity flags.
pub fn init_logging(verbose: bool, debug_mode: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = if verbose || debug_mode {
        "clusterlens=debug,info"
    } else {
        "clusterlens=info,warn"
    };

    let file_layer = match log_file {
        Some(path) => {
            // Create parent directory if it doesn't exist
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .try_init()?;

    if let Some(path) = log_file {
        // Session start marker
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        tracing::info!("=== clusterlens session started at {} ({}) ===", timestamp, path.display());
    }

    Ok(())
}

/// Default log file location
pub fn default_log_path() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("clusterlens").join("clusterlens.log")
    } else {
        PathBuf::from("clusterlens.log")
    }
}
