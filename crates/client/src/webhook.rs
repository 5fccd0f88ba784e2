//! Answering a call on the HTTP response of the webhook request that
//! triggered it.
//!
//! [`webhook_reply`] returns two halves. The [`WebhookReply`] goes to the
//! code handling the update and acts as an [`InboundSink`]; the
//! [`WebhookResponse`] stays in the axum handler, which awaits it and
//! returns whatever it resolves to.

use {
    async_trait::async_trait,
    axum::{
        body::Body,
        http::{StatusCode, header::CONTENT_TYPE},
        response::{IntoResponse, Response},
    },
    bytes::Bytes,
    futures::{Stream, StreamExt},
    std::{
        pin::Pin,
        task::{Context, Poll},
    },
    tgwire_payload::{ByteStream, EncodedPayload},
    tokio::sync::oneshot,
    tracing::{debug, warn},
};

use crate::{
    dispatch::InboundSink,
    error::{Error, Result},
};

type Completion = std::result::Result<(), String>;

/// Creates a connected reply sink and the response it feeds.
#[must_use]
pub fn webhook_reply() -> (WebhookReply, WebhookResponse) {
    let (tx, rx) = oneshot::channel();
    (WebhookReply { tx: Some(tx) }, WebhookResponse { rx })
}

/// Sink half: writes at most one payload onto the inbound response.
#[derive(Debug)]
pub struct WebhookReply {
    tx: Option<oneshot::Sender<Response>>,
}

#[async_trait]
impl InboundSink for WebhookReply {
    fn headers_sent(&self) -> bool {
        self.tx.as_ref().is_none_or(oneshot::Sender::is_closed)
    }

    async fn deliver(&mut self, payload: EncodedPayload) -> Result<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| Error::webhook("response already sent"))?;

        let (done_tx, done_rx) = oneshot::channel();
        let content_type = payload.content_type.clone();
        let body = CompletionStream {
            inner: payload.into_stream(),
            done: Some(done_tx),
        };
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, content_type)
            .body(Body::from_stream(body))
            .map_err(|e| Error::webhook(e.to_string()))?;

        tx.send(response)
            .map_err(|_| Error::webhook("inbound request closed"))?;

        match done_rx.await {
            Ok(Ok(())) => {
                debug!("webhook reply written");
                Ok(())
            },
            Ok(Err(message)) => Err(Error::webhook(message)),
            Err(_) => Err(Error::webhook("response dropped before the body was written")),
        }
    }
}

/// Responder half, held by the HTTP handler.
#[derive(Debug)]
pub struct WebhookResponse {
    rx: oneshot::Receiver<Response>,
}

impl WebhookResponse {
    /// Waits for the reply. An empty `200 OK` if the sink was dropped
    /// without delivering.
    pub async fn response(self) -> Response {
        match self.rx.await {
            Ok(response) => response,
            Err(_) => StatusCode::OK.into_response(),
        }
    }
}

/// Body stream that reports when it has been drained.
struct CompletionStream {
    inner: ByteStream,
    done: Option<oneshot::Sender<Completion>>,
}

impl CompletionStream {
    fn finish(&mut self, outcome: Completion) {
        if let Some(done) = self.done.take() {
            let _ = done.send(outcome);
        }
    }
}

impl Stream for CompletionStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let polled = self.inner.poll_next_unpin(cx);
        match &polled {
            Poll::Ready(None) => self.finish(Ok(())),
            Poll::Ready(Some(Err(e))) => {
                warn!(error = %e, "webhook reply body failed");
                self.finish(Err(e.to_string()));
            },
            _ => {},
        }
        polled
    }
}
