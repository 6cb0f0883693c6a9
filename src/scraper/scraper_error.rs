use thiserror::Error;

/// Failures of the external collaborators (zoning lookup, portal pages).
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Blocked by site: {0}")]
    Blocked(String),
    #[error("HTML parse error: {0}")]
    HtmlParse(String),
    #[error("JSON parse error: {0}")]
    JsonParse(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Unexpected data shape: {0}")]
    UnexpectedShape(String),
}
