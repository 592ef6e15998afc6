#[derive(Debug, thiserror::Error)]
pub enum StrideError {
    /// Every parsing strategy finished without finding any week structure.
    /// The message concatenates the per-strategy failure reasons.
    #[error("no schedule structure found: {0}")]
    NoStructure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
