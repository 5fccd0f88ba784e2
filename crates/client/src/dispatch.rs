//! Delivery of an encoded payload, either onto an open inbound response or
//! as a new outbound request.

use {
    async_trait::async_trait,
    reqwest::header::CONTENT_TYPE,
    std::time::Duration,
    tgwire_payload::{EncodedPayload, PayloadBody},
    tracing::debug,
};

use crate::{
    error::{Error, Result},
    redact::redact_token,
};

/// An inbound HTTP response that is still open and may carry the reply.
#[async_trait]
pub trait InboundSink: Send {
    /// Whether the response head has already gone out.
    fn headers_sent(&self) -> bool;

    /// Writes the payload's headers and body, resolving once the body has
    /// been fully written.
    async fn deliver(&mut self, payload: EncodedPayload) -> Result<()>;
}

/// How a payload left the process.
#[derive(Debug)]
pub enum Delivery {
    /// Written onto the inbound response; no outbound connection was made.
    Inbound,
    Outbound(reqwest::Response),
}

/// Hands payloads to an inbound sink or the outbound HTTP client.
#[derive(Debug, Clone, Default)]
pub struct DispatchAdapter {
    http: reqwest::Client,
    timeout: Option<Duration>,
}

impl DispatchAdapter {
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            timeout: None,
        }
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Delivers on `sink` when it is still writable, otherwise POSTs to
    /// `url`. Errors from the outbound path have credentials redacted.
    pub async fn dispatch(
        &self,
        url: &str,
        payload: EncodedPayload,
        sink: Option<&mut dyn InboundSink>,
    ) -> Result<Delivery> {
        if let Some(sink) = sink
            && !sink.headers_sent()
        {
            debug!(mode = payload.mode().as_str(), "writing payload to inbound response");
            sink.deliver(payload).await?;
            return Ok(Delivery::Inbound);
        }
        self.send(url, payload)
            .await
            .map(Delivery::Outbound)
            .map_err(Error::redacted)
    }

    async fn send(&self, url: &str, payload: EncodedPayload) -> Result<reqwest::Response> {
        debug!(
            url = %redact_token(url),
            mode = payload.mode().as_str(),
            "sending outbound request"
        );
        let EncodedPayload { content_type, body } = payload;
        let mut request = self.http.post(url).header(CONTENT_TYPE, content_type);
        request = match body {
            PayloadBody::Json(bytes) => request.body(bytes),
            PayloadBody::Multipart(stream) => request.body(reqwest::Body::wrap_stream(stream)),
        };
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        request.send().await.map_err(Error::from_reqwest)
    }
}
