use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the quiz session state machine.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QuizError {
    /// The requested topic is missing or holds no questions.
    #[error("no questions found for {subject} / {topic}")]
    EmptyBank { subject: String, topic: String },

    /// An operation was invoked outside the phase where it is valid.
    /// Session state is left untouched when this is returned.
    #[error("`{operation}` is not valid while the session is {phase}")]
    InvalidState {
        operation: &'static str,
        phase: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("catalog contains no subjects")]
    Empty,
}

/// A catalog question that breaks the answer-checking preconditions.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InvalidQuestion {
    #[error("only {0} option(s)")]
    TooFewOptions(usize),

    #[error("duplicate option {0:?}")]
    DuplicateOption(String),

    #[error("answer is not one of the options")]
    AnswerNotAnOption,
}
