use std::io;

use esg_materiality_mcp::config::DEFAULT_HTTP_ADDR;
use esg_materiality_mcp::{init_tracing, McpServer};
use tracing::error;

fn main() -> io::Result<()> {
    init_tracing("info");
    let mode = std::env::var("ESG_MATERIALITYD_TRANSPORT").unwrap_or_else(|_| "stdio".to_string());
    let server = McpServer::from_env().map_err(|err| {
        error!(error = %err, "failed to start materiality server");
        io::Error::new(io::ErrorKind::InvalidInput, err.to_string())
    })?;
    match mode.as_str() {
        "stdio" => server.serve_stdio(),
        "http" => {
            let addr = std::env::var("ESG_MATERIALITY_HTTP_ADDR")
                .unwrap_or_else(|_| DEFAULT_HTTP_ADDR.to_string());
            server.serve_http(&addr)
        }
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "ESG_MATERIALITYD_TRANSPORT must be stdio or http",
        )),
    }
}
