//! Binary entry point for the docfs-mcp server.

use clap::Parser;
use docfs_mcp::DocfsServer;
use rmcp::ServiceExt;
use std::path::PathBuf;

/// Sandboxed document filesystem MCP server with PDF and DOCX text extraction.
#[derive(Parser)]
#[command(name = "docfs-mcp", version, about)]
struct Cli {
    /// Directory the server is confined to.
    #[arg(env = "DOCFS_ROOT")]
    root: PathBuf,
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Parsers may print to stdout; only the detached handle carries protocol messages.
    #[cfg(unix)]
    let transport = (
        tokio::io::stdin(),
        tokio::fs::File::from_std(docfs_mcp::stdio::detach_stdout()?),
    );
    #[cfg(not(unix))]
    let transport = rmcp::transport::stdio();

    let server = DocfsServer::new(&cli.root)
        .map_err(|e| anyhow::anyhow!("invalid root {}: {e}", cli.root.display()))?;
    eprintln!("docfs-mcp serving {} over stdio", server.root().display());

    let reason = server.serve(transport).await?.waiting().await?;
    tracing::debug!(?reason, "server stopped");
    Ok(())
}

#[tokio::main]
async fn main() {
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    }
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
