use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error(transparent)]
    Store(#[from] studyhall_store::Error),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
