//! Chooses between a compact JSON body and a multipart body for a call.

use {
    bytes::Bytes,
    futures::{StreamExt, future::try_join_all, stream},
    serde_json::{Map, Value},
    std::{fmt, sync::Arc, time::Duration},
    tracing::debug,
};

use crate::{
    error::{Error, Result},
    fields::is_json_field,
    ids::AttachmentIds,
    inline::AttachmentInliner,
    media::{DEFAULT_FETCH_TIMEOUT, MediaFetcher, MediaResolver, ReqwestFetcher},
    multipart::MultipartBody,
    value::{ByteStream, ParamValue, Params},
};

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Encoder settings, fixed for the lifetime of a [`PayloadEncoder`].
#[derive(Clone)]
pub struct EncoderConfig {
    /// Agent used to download `url` attachments.
    pub fetcher: Arc<dyn MediaFetcher>,
    /// Timeout for a single attachment download.
    pub fetch_timeout: Duration,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            fetcher: Arc::new(ReqwestFetcher::default()),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl fmt::Debug for EncoderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncoderConfig")
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}

impl EncoderConfig {
    /// Downloads attachments through `client`.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            fetcher: Arc::new(ReqwestFetcher::new(client)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingMode {
    Json,
    Multipart,
}

impl EncodingMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Multipart => "multipart",
        }
    }
}

pub enum PayloadBody {
    Json(Bytes),
    Multipart(ByteStream),
}

impl fmt::Debug for PayloadBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(bytes) => f
                .debug_tuple("Json")
                .field(&String::from_utf8_lossy(bytes))
                .finish(),
            Self::Multipart(_) => f.write_str("Multipart(..)"),
        }
    }
}

/// A transmission-ready body and its content type.
#[derive(Debug)]
pub struct EncodedPayload {
    pub content_type: String,
    pub body: PayloadBody,
}

impl EncodedPayload {
    #[must_use]
    pub fn mode(&self) -> EncodingMode {
        match self.body {
            PayloadBody::Json(_) => EncodingMode::Json,
            PayloadBody::Multipart(_) => EncodingMode::Multipart,
        }
    }

    #[must_use]
    pub fn into_stream(self) -> ByteStream {
        match self.body {
            PayloadBody::Json(bytes) => stream::once(futures::future::ready(Ok(bytes))).boxed(),
            PayloadBody::Multipart(body) => body,
        }
    }

    /// Collects the body into memory.
    pub async fn into_bytes(self) -> std::io::Result<Bytes> {
        match self.body {
            PayloadBody::Json(bytes) => Ok(bytes),
            PayloadBody::Multipart(mut body) => {
                let mut buf = Vec::new();
                while let Some(chunk) = body.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(Bytes::from(buf))
            },
        }
    }
}

/// Encodes parameter mappings into request bodies.
#[derive(Debug, Clone, Default)]
pub struct PayloadEncoder {
    config: EncoderConfig,
}

impl PayloadEncoder {
    #[must_use]
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Multipart if and only if something in `params` must be uploaded.
    #[must_use]
    pub fn select_mode(params: &Params) -> EncodingMode {
        if params.has_attachments() {
            EncodingMode::Multipart
        } else {
            EncodingMode::Json
        }
    }

    pub async fn encode(&self, params: Params) -> Result<EncodedPayload> {
        let mode = Self::select_mode(&params);
        debug!(mode = mode.as_str(), fields = params.len(), "encoding payload");
        match mode {
            EncodingMode::Json => Self::encode_json(params),
            EncodingMode::Multipart => {
                let body = self.encode_multipart(stringify_json_fields(params)?).await?;
                Ok(EncodedPayload {
                    content_type: body.content_type(),
                    body: PayloadBody::Multipart(body.into_stream()),
                })
            },
        }
    }

    /// JSON body with the JSON fields stringified and null-valued keys
    /// removed at every depth.
    pub fn encode_json(params: Params) -> Result<EncodedPayload> {
        let object = json_object(stringify_json_fields(params)?)?;
        let bytes = serde_json::to_vec(&Value::Object(object))?;
        Ok(EncodedPayload {
            content_type: JSON_CONTENT_TYPE.to_owned(),
            body: PayloadBody::Json(Bytes::from(bytes)),
        })
    }

    /// Resolves every field concurrently and assembles the parts in field
    /// order behind a fresh boundary.
    pub async fn encode_multipart(&self, params: Params) -> Result<MultipartBody> {
        let ids = AttachmentIds::new();
        let inliner = AttachmentInliner::new(
            MediaResolver::new(self.config.fetcher.as_ref(), self.config.fetch_timeout),
            &ids,
        );
        let inliner = &inliner;
        let per_field = try_join_all(
            params
                .into_iter()
                .map(|(field, value)| async move { inliner.inline(&field, value).await }),
        )
        .await?;

        let mut body = MultipartBody::new();
        for part in per_field.into_iter().flatten() {
            body.push(part);
        }
        debug!(
            parts = body.len(),
            attachments = ids.issued(),
            "multipart body assembled"
        );
        Ok(body)
    }
}

/// Replaces non-string values of the fixed JSON fields with their JSON text.
pub fn stringify_json_fields(params: Params) -> Result<Params> {
    params
        .into_iter()
        .map(|(key, value)| -> Result<(String, ParamValue)> {
            let value = match value {
                ParamValue::Json(inner)
                    if is_json_field(&key) && !inner.is_string() && !inner.is_null() =>
                {
                    ParamValue::Json(Value::String(serde_json::to_string(&inner)?))
                },
                other => other,
            };
            Ok((key, value))
        })
        .collect::<Result<Vec<_>>>()
        .map(|entries| entries.into_iter().collect())
}

fn json_object(params: Params) -> Result<Map<String, Value>> {
    let mut object = Map::new();
    for (key, value) in params {
        let value = match value {
            ParamValue::Json(Value::Null) => continue,
            ParamValue::Json(value) => strip_nulls(value),
            ParamValue::Media(media) => media.into_json(&key)?,
            ParamValue::MediaGroup(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| item.into_json(&key))
                    .collect::<Result<_>>()?,
            ),
            ParamValue::File(_) => {
                return Err(Error::invalid_parameter(
                    key,
                    "attachments cannot be sent in a JSON body",
                ));
            },
        };
        object.insert(key, value);
    }
    Ok(object)
}

/// Drops null-valued object keys at any depth. Array elements are kept.
#[must_use]
pub fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}
