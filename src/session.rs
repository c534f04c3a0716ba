use std::path::Path;
use std::sync::OnceLock;

use tracing::debug;

use crate::document::TextExtractor;
use crate::error::{DocumentError, TutorError};

/// One user session: the uploaded document and its excerpt, extracted at most once.
pub struct Session {
    document: Vec<u8>,
    excerpt: OnceLock<String>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("document_len", &self.document.len())
            .field("excerpt_len", &self.excerpt.get().map(String::len))
            .finish()
    }
}

impl Session {
    pub fn new(document: Vec<u8>) -> Self {
        Self { document, excerpt: OnceLock::new() }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TutorError> {
        Ok(Self::new(std::fs::read(path)?))
    }

    /// The cached excerpt, if extraction already succeeded.
    pub fn cached_excerpt(&self) -> Option<&str> {
        self.excerpt.get().map(String::as_str)
    }

    /// Return the excerpt, running the extractor only on the first successful call.
    /// A failed extraction leaves the slot empty.
    pub fn excerpt(&self, extractor: &dyn TextExtractor) -> Result<&str, DocumentError> {
        if let Some(text) = self.excerpt.get() {
            debug!("Using cached excerpt");
            return Ok(text);
        }

        let text = extractor.extract(&self.document)?;
        Ok(self.excerpt.get_or_init(|| text))
    }
}
