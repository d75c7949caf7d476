//! Extension-driven text extraction.
//!
//! [`read_document`] returns the text of a file whatever its format: PDF and
//! DOCX files go through their extractors, everything else is decoded as
//! UTF-8.

use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCellContent, TableChild,
    TableRowChild,
};
use std::path::{Path, PathBuf};
use std::string::FromUtf8Error;
use thiserror::Error;

/// Errors from reading a file as text.
#[derive(Error, Debug)]
pub enum ReadError {
    /// The file could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The path is a directory.
    #[error("{} is a directory, use list_files to see its contents", .0.display())]
    IsDirectory(PathBuf),
    /// A plain-text file is not valid UTF-8.
    #[error("file is not valid UTF-8 text: {0}")]
    Decode(#[from] FromUtf8Error),
    /// A document could not be parsed.
    #[error("failed to extract {format} text: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
}

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Pick the format from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("pdf") => Self::Pdf,
            Some("docx") => Self::Docx,
            _ => Self::PlainText,
        }
    }

    /// Convert raw file bytes to text.
    pub fn extract(self, bytes: Vec<u8>) -> Result<String, ReadError> {
        match self {
            Self::PlainText => Ok(String::from_utf8(bytes)?),
            Self::Pdf => extract_pdf(&bytes),
            Self::Docx => extract_docx(&bytes),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::PlainText => "plain",
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
        }
    }
}

/// Read a regular file and return its text.
pub async fn read_document(path: &Path) -> Result<String, ReadError> {
    let meta = tokio::fs::metadata(path).await?;
    if meta.is_dir() {
        return Err(ReadError::IsDirectory(path.to_path_buf()));
    }

    let bytes = tokio::fs::read(path).await?;
    let kind = DocumentKind::from_path(path);
    tracing::debug!(path = %path.display(), ?kind, len = bytes.len(), "extracting text");

    // Parsers are CPU bound and may panic on hostile input.
    tokio::task::spawn_blocking(move || kind.extract(bytes))
        .await
        .map_err(|e| ReadError::Parse {
            format: kind.label(),
            message: e.to_string(),
        })?
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ReadError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ReadError::Parse {
        format: "PDF",
        message: e.to_string(),
    })
}

fn extract_docx(bytes: &[u8]) -> Result<String, ReadError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| ReadError::Parse {
        format: "DOCX",
        message: e.to_string(),
    })?;

    let mut lines = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => lines.push(paragraph_text(paragraph)),
            DocumentChild::Table(table) => table_text(table, &mut lines),
            _ => {}
        }
    }
    Ok(lines.join("\n"))
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                match run_child {
                    RunChild::Text(t) => text.push_str(&t.text),
                    RunChild::Tab(_) => text.push('\t'),
                    RunChild::Break(_) => text.push('\n'),
                    _ => {}
                }
            }
        }
    }
    text
}

/// One tab-separated line per table row.
fn table_text(table: &Table, lines: &mut Vec<String>) {
    for row_child in &table.rows {
        let TableChild::TableRow(row) = row_child;
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|cell_child| {
                let TableRowChild::TableCell(cell) = cell_child;
                cell.children
                    .iter()
                    .filter_map(|content| match content {
                        TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        lines.push(cells.join("\t"));
    }
}
