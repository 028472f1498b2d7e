use thiserror::Error;

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("script failed: {0}")]
    Script(String),

    #[error("renderer unavailable: {0}")]
    Unavailable(String),

    #[error("non-finite price: {0}")]
    NonFinitePrice(f64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
