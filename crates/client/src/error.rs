use {std::borrow::Cow, thiserror::Error};

use crate::redact::redact_token;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Payload(#[from] tgwire_payload::Error),

    /// Network or HTTP-level failure of an outbound call.
    #[error("{message}")]
    Transport { message: String },

    /// The API answered with `ok: false`.
    #[error("api error {code}: {description}")]
    Api {
        code: i64,
        description: String,
        retry_after: Option<u64>,
        migrate_to_chat_id: Option<i64>,
    },

    #[error("webhook reply failed: {message}")]
    Webhook { message: String },

    #[error("{message}")]
    Message { message: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn webhook(message: impl Into<String>) -> Self {
        Self::Webhook {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    /// Transport error carrying the full `reqwest` source chain.
    #[must_use]
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Transport { message }
    }

    /// Rewrites any credential path segment in the error text.
    ///
    /// Message-carrying variants keep their kind; anything else whose
    /// rendering contains a credential collapses into [`Error::Message`].
    #[must_use]
    pub fn redacted(self) -> Self {
        let scrub = |message: String| redact_token(&message).into_owned();
        match self {
            Self::Transport { message } => Self::Transport {
                message: scrub(message),
            },
            Self::Webhook { message } => Self::Webhook {
                message: scrub(message),
            },
            Self::Message { message } => Self::Message {
                message: scrub(message),
            },
            Self::Payload(tgwire_payload::Error::Transport { message }) => {
                Self::Payload(tgwire_payload::Error::transport(scrub(message)))
            },
            other => {
                let rendered = other.to_string();
                match redact_token(&rendered) {
                    Cow::Borrowed(_) => other,
                    Cow::Owned(clean) => Self::Message { message: clean },
                }
            },
        }
    }

    /// Seconds the API asked us to wait before retrying, if any.
    #[must_use]
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::Api { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
