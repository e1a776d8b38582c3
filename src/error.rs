//! Error types for the brew flow

/// Shown when a save is attempted without a coffee or brewer selected
pub const MISSING_SELECTION_MESSAGE: &str = "Falta seleccionar café o cafetera";

/// Generic message shown for any failed save, whatever the journal reported
pub const SAVE_FAILED_MESSAGE: &str = "Error al guardar la preparación";

#[derive(Debug, Clone, PartialEq)]
pub enum FlowError {
    MissingSelection,
    SubmissionInProgress,
    TooManyPours(u32),
    Submission(String),
    Config(String),
}

impl FlowError {
    /// Text for the session's `error` field
    pub fn user_message(&self) -> String {
        match self {
            FlowError::MissingSelection => MISSING_SELECTION_MESSAGE.to_string(),
            FlowError::Submission(_) | FlowError::SubmissionInProgress => {
                SAVE_FAILED_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}

impl std::fmt::Display for FlowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowError::MissingSelection => write!(f, "coffee or brewer not selected"),
            FlowError::SubmissionInProgress => write!(f, "a brew is already being saved"),
            FlowError::TooManyPours(count) => {
                write!(
                    f,
                    "guided brew supports at most {} pours, got {}",
                    crate::types::MAX_GUIDED_POURS,
                    count
                )
            }
            FlowError::Submission(msg) => write!(f, "submission failed: {}", msg),
            FlowError::Config(msg) => write!(f, "config error: {}", msg),
        }
    }
}

impl std::error::Error for FlowError {}
