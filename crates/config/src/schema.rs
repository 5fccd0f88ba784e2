use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Path prefix the credential is embedded under.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    #[default]
    Bot,
    User,
}

impl ApiMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bot => "bot",
            Self::User => "user",
        }
    }
}

/// Settings for talking to the Bot API.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Credential in `<id>:<secret>` form.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Base URL of the API server.
    pub api_root: String,

    pub api_mode: ApiMode,

    /// Route calls to the test environment (`/bot<token>/test/<method>`).
    pub test_env: bool,

    /// Answer eligible calls on the inbound webhook response when one is
    /// available.
    pub webhook_reply: bool,

    /// Timeout for downloading `url` attachments, in seconds.
    pub attachment_fetch_timeout_secs: u64,

    /// Overall timeout for outbound calls, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &"[REDACTED]")
            .field("api_root", &self.api_root)
            .field("api_mode", &self.api_mode)
            .field("test_env", &self.test_env)
            .field("webhook_reply", &self.webhook_reply)
            .field(
                "attachment_fetch_timeout_secs",
                &self.attachment_fetch_timeout_secs,
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            api_root: "https://api.telegram.org".into(),
            api_mode: ApiMode::default(),
            test_env: false,
            webhook_reply: true,
            attachment_fetch_timeout_secs: 500,
            request_timeout_secs: None,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Secret::new(token.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().is_empty()
    }
}
