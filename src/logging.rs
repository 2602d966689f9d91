//! Tracing subscriber setup.
//!
//! `RUST_LOG` takes precedence over `[logging].level`. The `json` format
//! emits one flattened object per event, with the enclosing span fields
//! (such as `request_id`) attached, which is what log collectors on
//! managed runtimes parse. `pretty` is for local runs.
//!
//! Logs go to stderr; stdout is reserved for command output.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| anyhow!("Invalid logging level '{}': {}", config.level, e))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match config.format.as_str() {
        "pretty" => builder.pretty().try_init(),
        _ => builder
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .try_init(),
    };

    installed.map_err(|e| anyhow!("Failed to install log subscriber: {}", e))
}
