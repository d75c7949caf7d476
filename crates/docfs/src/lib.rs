//! MCP server exposing one sandboxed directory to a calling agent.
//!
//! Every operation is confined to a single root directory fixed at startup.
//! Reads are format aware: PDF and DOCX files are returned as extracted
//! text, anything else is decoded as UTF-8.

use rmcp::{
    ServerHandler,
    handler::server::router::tool::ToolRouter,
    model::{Implementation, ServerCapabilities, ServerInfo},
    tool_handler,
};
use std::path::Path;
pub mod error;
pub mod guard;
pub mod reader;
#[cfg(unix)]
pub mod stdio;
pub mod tools;

#[cfg(test)]
mod fixtures;

/// MCP document filesystem server bound to a single sandbox root.
#[derive(Debug, Clone)]
pub struct DocfsServer {
    pub(crate) guard: guard::PathGuard,
    pub(crate) tool_router: ToolRouter<Self>,
}

impl DocfsServer {
    /// The canonical sandbox root.
    pub fn root(&self) -> &Path {
        self.guard.root()
    }
}

#[tool_handler]
impl ServerHandler for DocfsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "docfs-mcp".into(),
                title: Some("Sandboxed Document Filesystem Server".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(format!(
                "Filesystem server confined to {}. read_file and search_files extract text \
                 from PDF and DOCX files; other files are read as UTF-8 text.",
                self.root().display()
            )),
        }
    }
}
