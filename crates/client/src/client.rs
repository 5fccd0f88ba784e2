use {
    secrecy::ExposeSecret,
    serde::Deserialize,
    serde_json::Value,
    std::time::Duration,
    tgwire_config::ClientConfig,
    tgwire_payload::{EncoderConfig, Params, PayloadEncoder},
    tracing::{debug, warn},
};

use crate::{
    dispatch::{Delivery, DispatchAdapter, InboundSink},
    error::{Error, Result},
};

/// Outcome of a call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallResult {
    /// The API's `result` value from an outbound request.
    Response(Value),
    /// The call was written onto the inbound webhook response; the API
    /// sends no result back for it.
    WebhookReply,
}

impl CallResult {
    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Response(value) => Some(value),
            Self::WebhookReply => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
    #[serde(default)]
    migrate_to_chat_id: Option<i64>,
}

/// Bot API client.
#[derive(Debug, Clone)]
pub struct BotClient {
    config: ClientConfig,
    encoder: PayloadEncoder,
    dispatcher: DispatchAdapter,
}

impl BotClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(|e| Error::from_reqwest(e).redacted())?;
        Ok(Self::with_http_client(config, http))
    }

    /// Uses `http` for both API calls and attachment downloads.
    #[must_use]
    pub fn with_http_client(config: ClientConfig, http: reqwest::Client) -> Self {
        let encoder = PayloadEncoder::new(
            EncoderConfig::with_client(http.clone())
                .fetch_timeout(Duration::from_secs(config.attachment_fetch_timeout_secs)),
        );
        Self {
            config,
            encoder,
            dispatcher: DispatchAdapter::new(http),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `{api_root}/{bot|user}{token}[/test]/{method}`.
    #[must_use]
    pub fn method_url(&self, method: &str) -> String {
        format!(
            "{}/{}{}{}/{}",
            self.config.api_root.trim_end_matches('/'),
            self.config.api_mode.as_str(),
            self.config.token.expose_secret(),
            if self.config.test_env { "/test" } else { "" },
            method
        )
    }

    /// Calls `method` over an outbound request and returns its result.
    pub async fn request(&self, method: &str, params: Params) -> Result<Value> {
        match self.call(method, params, None).await? {
            CallResult::Response(value) => Ok(value),
            CallResult::WebhookReply => Err(Error::message("call was answered as a webhook reply")),
        }
    }

    /// Calls `method`, answering on `sink` instead of a new request when
    /// the call can go there.
    ///
    /// A reply is used only when webhook replies are enabled, `sink` is
    /// still writable, and nothing in `params` needs uploading. The reply
    /// body is the JSON mapping with `"method"` as its first key.
    pub async fn call(
        &self,
        method: &str,
        mut params: Params,
        sink: Option<&mut dyn InboundSink>,
    ) -> Result<CallResult> {
        let reply = sink.filter(|sink| {
            self.config.webhook_reply && !sink.headers_sent() && !params.has_attachments()
        });

        let payload = if reply.is_some() {
            params.prepend("method", method);
            PayloadEncoder::encode_json(params)
        } else {
            self.encoder.encode(params).await
        }
        .map_err(|e| Error::from(e).redacted())?;
        debug!(
            method,
            channel = if reply.is_some() { "webhook" } else { "outbound" },
            mode = payload.mode().as_str(),
            "dispatching call"
        );

        match self
            .dispatcher
            .dispatch(&self.method_url(method), payload, reply)
            .await?
        {
            Delivery::Inbound => Ok(CallResult::WebhookReply),
            Delivery::Outbound(response) => self
                .read_response(method, response)
                .await
                .map(CallResult::Response),
        }
    }

    async fn read_response(&self, method: &str, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::from_reqwest(e).redacted())?;
        let envelope: ApiResponse = serde_json::from_slice(&body).map_err(|e| {
            Error::transport(format!("invalid response (HTTP {}): {e}", status.as_u16()))
        })?;

        if envelope.ok {
            debug!(method, status = status.as_u16(), "call succeeded");
            return Ok(envelope.result.unwrap_or(Value::Null));
        }

        let parameters = envelope.parameters.unwrap_or_default();
        let err = Error::Api {
            code: envelope.error_code.unwrap_or_else(|| i64::from(status.as_u16())),
            description: envelope
                .description
                .unwrap_or_else(|| "unknown error".to_owned()),
            retry_after: parameters.retry_after,
            migrate_to_chat_id: parameters.migrate_to_chat_id,
        };
        warn!(method, error = %err, "call failed");
        Err(err.redacted())
    }
}
