use {std::path::PathBuf, thiserror::Error};

#[derive(Debug, Error)]
pub enum Error {
    /// A string source path does not point at a regular file.
    #[error("unable to upload '{source_path}': {reason}")]
    InvalidAttachmentSource { source_path: String, reason: String },

    #[error("{context} '{}': {source}", path.display())]
    Filesystem {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Remote attachment fetch failed. Carries only the message so the
    /// text can be rewritten before it reaches logs.
    #[error("{message}")]
    Transport { message: String },

    #[error("invalid parameter '{field}': {message}")]
    InvalidParameter { field: String, message: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn invalid_source(source_path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAttachmentSource {
            source_path: source_path.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn filesystem(
        context: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Filesystem {
            context,
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_parameter(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
