use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Authentication failed: {reason}{}", server_message.as_deref().map(|m| format!(" ({m})")).unwrap_or_default())]
    Authentication {
        reason: String,
        server_message: Option<String>,
    },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Transport,
    Authentication,
    Persistence,
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    pub fn authentication(reason: impl Into<String>, server_message: Option<String>) -> Self {
        Error::Authentication {
            reason: reason.into(),
            server_message,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_) | Error::Url(_) => ErrorKind::Configuration,
            Error::Transport(_) => ErrorKind::Transport,
            Error::Authentication { .. } => ErrorKind::Authentication,
            Error::Io(_) | Error::Serialization(_) => ErrorKind::Persistence,
        }
    }
}

/// Failure to turn one item block into a record. Never outlives the item.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("field `{field}` not found (selector `{selector}`)")]
    MissingField {
        field: &'static str,
        selector: &'static str,
    },

    #[error("selector `{selector}` for field `{field}` does not parse")]
    InvalidSelector {
        field: &'static str,
        selector: &'static str,
    },

    #[error("field `{field}` has unexpected value {value:?}")]
    Malformed { field: &'static str, value: String },

    #[error("record is missing declared field `{0}`")]
    IncompleteRecord(&'static str),

    #[error("record sets undeclared field `{0}`")]
    UnknownField(&'static str),
}
