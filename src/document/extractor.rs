use std::io::Write;

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::document::PageRecord;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("failed to stage uploaded file: {0}")]
    Staging(#[from] std::io::Error),
    #[error("failed to parse PDF: {0}")]
    Parse(String),
    #[error("extraction task failed: {0}")]
    Task(String),
}

/// Extracts per-page text from a PDF byte stream.
///
/// The bytes are staged through a temp file that is unlinked when the
/// extraction returns, whether it parsed or not. Parsing is CPU-bound, so it
/// runs on the blocking pool.
pub async fn extract_pages(bytes: Vec<u8>) -> Result<Vec<PageRecord>, ExtractionError> {
    tokio::task::spawn_blocking(move || extract_pages_blocking(&bytes))
        .await
        .map_err(|e| ExtractionError::Task(e.to_string()))?
}

fn extract_pages_blocking(bytes: &[u8]) -> Result<Vec<PageRecord>, ExtractionError> {
    // NamedTempFile removes the staged file on drop, on every exit path.
    let mut staged = NamedTempFile::new()?;
    staged.write_all(bytes)?;
    staged.flush()?;

    let pages = pdf_extract::extract_text_by_pages(staged.path())
        .map_err(|e| ExtractionError::Parse(e.to_string()))?;

    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| PageRecord { page: i + 1, text })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_malformed_pdf() {
        let result = extract_pages(b"this is not a pdf".to_vec()).await;
        assert!(matches!(result, Err(ExtractionError::Parse(_))));
    }

    #[tokio::test]
    async fn rejects_empty_input() {
        let result = extract_pages(Vec::new()).await;
        assert!(matches!(result, Err(ExtractionError::Parse(_))));
    }
}
