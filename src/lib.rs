pub mod clients;
pub mod config;
pub mod core;
pub mod document;
pub mod error;
pub mod image;
pub mod interceptors;
pub mod prompt;
pub mod router;
pub mod session;

// Convenient re-exports
pub use crate::core::{ChatClient, ChatMessage};
pub use document::{extract_excerpt, PdfExtractor, TextExtractor, MAX_EXCERPT_PAGES};
pub use error::TutorError;
pub use prompt::TutorRequest;
pub use router::{build_request, AppState, Missing, Mode, Outcome, Tutor};
pub use session::Session;
