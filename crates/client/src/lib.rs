//! Bot API calls over two channels: a new outbound request, or the still
//! open HTTP response of the webhook request that triggered the call.
//!
//! Request bodies come from [`tgwire_payload`]; this crate picks the
//! channel, sends, and reads the API's response envelope.

pub mod client;
pub mod dispatch;
pub mod error;
pub mod redact;
pub mod webhook;

pub use {
    client::{BotClient, CallResult},
    dispatch::{Delivery, DispatchAdapter, InboundSink},
    error::{Error, Result},
    redact::redact_token,
    webhook::{WebhookReply, WebhookResponse, webhook_reply},
};
