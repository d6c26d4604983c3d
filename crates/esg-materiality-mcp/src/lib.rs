pub mod config;
pub mod protocol;
pub mod server;
mod transport;

pub use config::{BackendKind, ConfigError, ServerConfig};
pub use server::{McpServer, ServerError};

use tracing_subscriber::EnvFilter;

/// Installs the stderr `fmt` subscriber. `RUST_LOG` wins over `default_filter`.
/// Calling it twice is a no-op.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
