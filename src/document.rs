//! Text extraction from uploaded textbook PDFs.
//!
//! Only the first [`MAX_EXCERPT_PAGES`] pages are read. Everything after that is
//! ignored to keep prompts (and bills) small.

use lopdf::Document;
use tracing::{debug, info, instrument, warn};

use crate::error::DocumentError;

pub const MAX_EXCERPT_PAGES: usize = 3;

/// Anything that can turn document bytes into plain text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, DocumentError>;
}

#[derive(Debug, Clone, Copy)]
pub struct PdfExtractor {
    max_pages: usize,
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self { max_pages: MAX_EXCERPT_PAGES }
    }
}

impl PdfExtractor {
    pub fn with_max_pages(max_pages: usize) -> Self {
        Self { max_pages }
    }
}

impl TextExtractor for PdfExtractor {
    #[instrument(skip(self, bytes), fields(len = bytes.len(), max_pages = self.max_pages))]
    fn extract(&self, bytes: &[u8]) -> Result<String, DocumentError> {
        let document = Document::load_mem(bytes).map_err(|e| DocumentError::Parse(e.to_string()))?;

        // BTreeMap keyed by 1-based page number, so iteration is in page order
        let pages = document.get_pages();
        if pages.is_empty() {
            return Err(DocumentError::NoPages);
        }
        debug!(page_count = pages.len(), "PDF loaded");

        let mut text = String::new();
        for &page_number in pages.keys().take(self.max_pages) {
            match document.extract_text(&[page_number]) {
                Ok(page_text) => text.push_str(&page_text),
                Err(e) => warn!(page = page_number, error = %e, "Page has no extractable text"),
            }
        }

        info!(text_len = text.len(), "Extracted excerpt");
        Ok(text)
    }
}

/// Extract the excerpt with the default page limit.
pub fn extract_excerpt(bytes: &[u8]) -> Result<String, DocumentError> {
    PdfExtractor::default().extract(bytes)
}
