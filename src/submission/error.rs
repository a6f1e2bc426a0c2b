use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Missing form field: {0}")]
    MissingField(&'static str),

    #[error("Malformed form data: {0}")]
    MalformedForm(String),
}
