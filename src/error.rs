use thiserror::Error;

#[derive(Error, Debug)]
pub enum TutorError {
    #[error("AI error: {0}")]
    Ai(#[from] AIError),
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
    #[error("Image error: {0}")]
    Image(#[from] ImageError),
    #[error("No API key found. Set {0} or pass --api-key")]
    MissingCredential(&'static str),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum AIError {
    #[error("OpenAI API error: {0}")]
    OpenAI(#[from] OpenAIError),
    #[error("Mock error: {0}")]
    Mock(String),
}

#[derive(Error, Debug)]
pub enum OpenAIError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limit exceeded")]
    RateLimit,
    #[error("Authentication failed")]
    Authentication,
}

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("not a readable PDF: {0}")]
    Parse(String),
    #[error("the document has no pages")]
    NoPages,
}

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("the image is empty")]
    Empty,
    #[error("unsupported image format (expected PNG or JPEG)")]
    UnsupportedFormat,
}
