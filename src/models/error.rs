use thiserror::Error;

#[derive(Error, Debug)]
pub enum RankError {
    #[error("No snapshots available in rank history")]
    EmptyHistory,

    #[error("Malformed snapshot at index {index}: {reason}")]
    MalformedSnapshot { index: usize, reason: String },

    #[error("Malformed rank history: {0}")]
    MalformedHistory(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RankError {
    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedSnapshot {
            index,
            reason: reason.into(),
        }
    }
}

pub type RankResult<T> = Result<T, RankError>;
