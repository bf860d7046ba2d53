pub mod extractor;

pub use extractor::{extract_pages, ExtractionError};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A file received from the caller. Lives only for the duration of one
/// ingestion request.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Text of one PDF page, in source order. Page numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub page: usize,
    pub text: String,
}
