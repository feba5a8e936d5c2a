use std::fs::File;
use std::path::PathBuf;
use std::sync::Once;

use anyhow::{Context, Result};

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "waldo_engine=debug,wgpu=warn"). When unset, `RUST_LOG` is consulted and
/// the fallback is `info` with the chatty GPU crates held at `warn`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
    /// Append log lines to this file instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            log_file: None,
        }
    }
}

/// Filter used when neither the config nor `RUST_LOG` provides one.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// Subsequent calls are ignored. Fails only if the log file cannot be opened.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let target = match &config.log_file {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(env_logger::Target::Pipe(Box::new(file)))
        }
        None => None,
    };

    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = &config.env_filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.parse_filters(DEFAULT_FILTER);
        }

        match target {
            Some(target) => {
                // No ANSI escapes in files.
                builder.target(target).write_style(env_logger::WriteStyle::Never);
            }
            None => {
                builder.write_style(config.write_style);
            }
        }

        builder.init();

        log::debug!("logging initialized");
    });

    Ok(())
}
