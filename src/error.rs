use thiserror::Error;

use crate::database::StoreError;

/// Errors raised by the question bank, the session and the authoring flow.
#[derive(Error, Debug)]
pub enum QuizError {
    #[error("No questions could be loaded: {0}")]
    Load(String),

    #[error("Question #{} does not exist (bank has {len} questions)", .index + 1)]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Question text is empty")]
    EmptyQuestion,

    #[error("All four options (A-D) must be filled in")]
    IncompleteOptions,

    #[error("Failed to persist questions: {0}")]
    Persistence(#[from] StoreError),

    #[error("Failed to serialize questions: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T, E = QuizError> = std::result::Result<T, E>;
