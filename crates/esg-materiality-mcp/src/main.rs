use std::io;

use esg_materiality_mcp::{init_tracing, McpServer};

fn main() -> io::Result<()> {
    init_tracing("info");
    let server = McpServer::from_env()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;
    server.serve_stdio()
}
