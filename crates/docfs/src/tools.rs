//! Tool implementations for the document filesystem server.

use crate::DocfsServer;
use crate::error::ToolError;
use crate::guard::{Access, GuardError, PathGuard};
use crate::reader::read_document;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::{self, join_all};
use futures::stream::{self, Stream, StreamExt};
use rmcp::{
    handler::server::wrapper::Parameters,
    schemars::{self, JsonSchema},
    tool, tool_router,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Parameters for listing a directory.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListFilesParams {
    /// Directory whose direct children are listed.
    pub path: String,
}

/// Parameters for reading a file.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadFileParams {
    /// Path to the file to read. PDF and DOCX files are returned as text.
    pub path: String,
}

/// Parameters for writing a file.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct WriteFileParams {
    /// Path to the file to write. The parent directory must exist.
    pub path: String,
    /// UTF-8 content that replaces the file.
    pub content: String,
}

/// Parameters for deleting a file.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteFileParams {
    /// Path to the file to delete.
    pub path: String,
}

/// Parameters for searching file contents.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchFilesParams {
    /// Text to look for, ignoring case.
    pub query: String,
    /// Directory whose direct children are searched.
    pub directory: String,
}

/// Parameters for getting file info.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetFileInfoParams {
    /// Path to the file or directory.
    pub path: String,
}

/// One line of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub is_dir: bool,
}

impl FileEntry {
    async fn load(entry: &tokio::fs::DirEntry) -> io::Result<Self> {
        let meta = entry.metadata().await?;
        Ok(Self {
            name: entry.file_name().to_string_lossy().into_owned(),
            size: meta.len(),
            modified: timestamp(meta.modified()),
            is_dir: meta.is_dir(),
        })
    }
}

impl fmt::Display for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.is_dir { "[DIR]" } else { "[FILE]" };
        write!(f, "{marker} {} ({} bytes, modified ", self.name, self.size)?;
        match self.modified {
            Some(ts) => write!(f, "{})", ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
            None => f.write_str("unknown)"),
        }
    }
}

/// File metadata returned by `get_file_info`.
#[derive(Debug, Serialize)]
struct FileInfo {
    size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created: Option<String>,
    is_dir: bool,
    is_file: bool,
    is_symlink: bool,
    #[cfg(unix)]
    permissions: String,
}

fn timestamp(time: io::Result<SystemTime>) -> Option<DateTime<Utc>> {
    time.ok().map(DateTime::<Utc>::from)
}

/// Entries of a directory in enumeration order, errors included.
fn dir_entries(
    read_dir: tokio::fs::ReadDir,
) -> impl Stream<Item = io::Result<tokio::fs::DirEntry>> {
    stream::unfold(read_dir, |mut read_dir| async move {
        match read_dir.next_entry().await {
            Ok(Some(entry)) => Some((Ok(entry), read_dir)),
            Ok(None) => None,
            Err(e) => Some((Err(e), read_dir)),
        }
    })
}

/// Drop failed items and keep going.
fn skip_failed<T>(items: impl Stream<Item = io::Result<T>>) -> impl Stream<Item = T> {
    items.filter_map(|item| future::ready(item.ok()))
}

#[tool_router]
impl DocfsServer {
    /// Create a server confined to `root`, which must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, GuardError> {
        Ok(Self {
            guard: PathGuard::new(root)?,
            tool_router: Self::tool_router(),
        })
    }

    /// List the direct children of a directory.
    #[tool(
        description = "List the files and directories directly inside a directory, with size, modification time and a [DIR]/[FILE] marker"
    )]
    async fn list_files(
        &self,
        Parameters(params): Parameters<ListFilesParams>,
    ) -> Result<String, String> {
        self.list(&params.path).await.map_err(|e| e.to_string())
    }

    /// Read a file as text.
    #[tool(
        description = "Read the contents of a file as text. PDF and DOCX files are converted to plain text"
    )]
    async fn read_file(
        &self,
        Parameters(params): Parameters<ReadFileParams>,
    ) -> Result<String, String> {
        self.read(&params.path).await.map_err(|e| e.to_string())
    }

    /// Create or overwrite a file.
    #[tool(
        description = "Create a new file or overwrite an existing file with the given UTF-8 content. Parent directories are not created"
    )]
    async fn write_file(
        &self,
        Parameters(params): Parameters<WriteFileParams>,
    ) -> Result<String, String> {
        self.write(&params.path, &params.content)
            .await
            .map_err(|e| e.to_string())
    }

    /// Permanently delete a file.
    #[tool(description = "Permanently delete a file. This cannot be undone")]
    async fn delete_file(
        &self,
        Parameters(params): Parameters<DeleteFileParams>,
    ) -> Result<String, String> {
        self.delete(&params.path).await.map_err(|e| e.to_string())
    }

    /// Find files whose text contains a query.
    #[tool(
        description = "Find files directly inside a directory whose text contains the query, ignoring case. PDF and DOCX files are searched by their extracted text"
    )]
    async fn search_files(
        &self,
        Parameters(params): Parameters<SearchFilesParams>,
    ) -> Result<String, String> {
        self.search(&params.query, &params.directory)
            .await
            .map_err(|e| e.to_string())
    }

    /// Get detailed metadata about a file or directory.
    #[tool(description = "Get detailed metadata about a file or directory as JSON")]
    async fn get_file_info(
        &self,
        Parameters(params): Parameters<GetFileInfoParams>,
    ) -> Result<String, String> {
        self.file_info(&params.path)
            .await
            .map_err(|e| e.to_string())
    }

    /// Report the sandbox root.
    #[tool(description = "Show the directory that this server is allowed to access")]
    async fn list_allowed_directories(&self) -> String {
        self.root().display().to_string()
    }
}

impl DocfsServer {
    async fn list(&self, path: &str) -> Result<String, ToolError> {
        let dir = self.guard.resolve(path)?;
        tracing::debug!(path = %dir.display(), "list_files");

        let mut read_dir = tokio::fs::read_dir(&dir).await?;
        let mut children = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            children.push(entry);
        }

        let mut entries: Vec<FileEntry> = join_all(children.iter().map(FileEntry::load))
            .await
            .into_iter()
            .filter_map(Result::ok)
            .collect();
        if entries.is_empty() {
            return Ok(format!("Directory {} is empty", dir.display()));
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(entries
            .iter()
            .map(FileEntry::to_string)
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn read(&self, path: &str) -> Result<String, ToolError> {
        let path = self.guard.resolve(path)?;
        tracing::debug!(path = %path.display(), "read_file");
        Ok(read_document(&path).await?)
    }

    async fn write(&self, path: &str, content: &str) -> Result<String, ToolError> {
        let path = self.guard.resolve(path)?;
        tracing::debug!(path = %path.display(), len = content.len(), "write_file");

        if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
            return Err(ToolError::InvalidOperation(format!(
                "{} is a directory, write_file only writes regular files",
                path.display()
            )));
        }
        tokio::fs::write(&path, content).await?;
        Ok(format!(
            "Successfully wrote {} bytes to {}",
            content.len(),
            path.display()
        ))
    }

    async fn delete(&self, path: &str) -> Result<String, ToolError> {
        let path = self.guard.resolve(path)?;
        tracing::debug!(path = %path.display(), "delete_file");

        let meta = tokio::fs::metadata(&path).await?;
        if meta.is_dir() {
            return Err(ToolError::InvalidOperation(format!(
                "{} is a directory, delete_file only removes regular files",
                path.display()
            )));
        }
        tokio::fs::remove_file(&path).await?;
        Ok(format!("Successfully deleted {}", path.display()))
    }

    async fn search(&self, query: &str, directory: &str) -> Result<String, ToolError> {
        if query.is_empty() {
            return Err(ToolError::InvalidOperation(
                "search query must not be empty".into(),
            ));
        }
        let dir = self.guard.resolve(directory)?;
        tracing::debug!(path = %dir.display(), query, "search_files");

        let needle = query.to_lowercase();
        let mut matches = Vec::new();
        let read_dir = tokio::fs::read_dir(&dir).await?;
        let mut entries = std::pin::pin!(skip_failed(dir_entries(read_dir)));
        while let Some(entry) = entries.next().await {
            // Children may be symlinks pointing outside the root.
            let Ok(Access::Allowed(path)) = self.guard.check_path(&entry.path()) else {
                continue;
            };
            // Unreadable entries (directories, binaries, broken documents) are skipped.
            let Ok(text) = read_document(&path).await else {
                continue;
            };
            if text.to_lowercase().contains(&needle) {
                matches.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        if matches.is_empty() {
            return Ok(format!(
                "No files matching {query:?} in {}",
                dir.display()
            ));
        }
        matches.sort();
        Ok(format!(
            "Found {} matching file(s):\n{}",
            matches.len(),
            matches.join("\n")
        ))
    }

    async fn file_info(&self, path: &str) -> Result<String, ToolError> {
        // Describe a symlink itself rather than its target.
        let path = self.guard.resolve_entry(path)?;
        let meta = tokio::fs::symlink_metadata(&path).await?;

        let info = FileInfo {
            size: meta.len(),
            modified: timestamp(meta.modified()).map(|dt| dt.to_rfc3339()),
            created: timestamp(meta.created()).map(|dt| dt.to_rfc3339()),
            is_dir: meta.is_dir(),
            is_file: meta.is_file(),
            is_symlink: meta.is_symlink(),
            #[cfg(unix)]
            permissions: {
                use std::os::unix::fs::PermissionsExt;
                format!("{:o}", meta.permissions().mode())
            },
        };
        Ok(serde_json::to_string_pretty(&info).map_err(io::Error::from)?)
    }
}
