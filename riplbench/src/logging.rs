//! Logging initialisation

use tracing_subscriber::EnvFilter;

/// Install a formatting subscriber for riplbench's tracing output.
///
/// `RUST_LOG` wins when set; otherwise riplbench logs at `debug` when
/// `verbose` and at `info` otherwise.
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let default = if verbose {
        "riplbench=debug"
    } else {
        "riplbench=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))
}
