use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortfolioRiskError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: String, found: String },

    #[error("Insufficient history: {required} periods required, {available} available")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Degenerate input in {context}")]
    DegenerateInput { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl PortfolioRiskError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PortfolioRiskError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn degenerate(context: impl Into<String>) -> Self {
        PortfolioRiskError::DegenerateInput {
            context: context.into(),
        }
    }
}

impl From<serde_json::Error> for PortfolioRiskError {
    fn from(e: serde_json::Error) -> Self {
        PortfolioRiskError::SerializationError(e.to_string())
    }
}
