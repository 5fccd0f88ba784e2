//! Parameter model for a single call.
//!
//! Values are a closed set of variants: callers (or [`Params::from_json`])
//! decide up front what is an attachment, and the encoder only matches on
//! the variant instead of probing shapes.

use {
    bytes::Bytes,
    futures::stream::BoxStream,
    serde_json::{Map, Value},
    std::{fmt, path::PathBuf},
};

use crate::{
    encode::strip_nulls,
    fields::{LINK_PREVIEW_OPTIONS, is_thumbnail_field},
};

/// Streaming binary body.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Where the bytes of an attachment come from.
pub enum MediaSource {
    /// Local filesystem path; symlinks are resolved before upload.
    Path(PathBuf),
    /// In-memory buffer.
    Bytes(Bytes),
    /// Already-open byte stream.
    Stream(ByteStream),
    /// Remote resource fetched through the configured [`MediaFetcher`](crate::MediaFetcher).
    Url(String),
}

impl MediaSource {
    /// Empty sources produce no part at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Path(path) => path.as_os_str().is_empty(),
            Self::Url(url) => url.is_empty(),
            Self::Bytes(_) | Self::Stream(_) => false,
        }
    }
}

impl fmt::Debug for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::Url(url) => f.debug_tuple("Url").field(url).finish(),
        }
    }
}

/// A reference to binary content to upload.
#[derive(Debug)]
pub struct InputFile {
    pub source: MediaSource,
    pub filename: Option<String>,
}

impl InputFile {
    #[must_use]
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::from_source(MediaSource::Path(path.into()))
    }

    #[must_use]
    pub fn bytes(bytes: impl Into<Bytes>) -> Self {
        Self::from_source(MediaSource::Bytes(bytes.into()))
    }

    #[must_use]
    pub fn stream(stream: ByteStream) -> Self {
        Self::from_source(MediaSource::Stream(stream))
    }

    #[must_use]
    pub fn url(url: impl Into<String>) -> Self {
        Self::from_source(MediaSource::Url(url.into()))
    }

    /// Explicit filename; wins over anything derived from the source.
    #[must_use]
    pub fn file_name(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    fn from_source(source: MediaSource) -> Self {
        Self {
            source,
            filename: None,
        }
    }
}

/// The `media` slot of an input-media object.
#[derive(Debug)]
pub enum MediaRef {
    /// Needs uploading.
    File(InputFile),
    /// Sent as-is (file id, or a URL the remote API fetches itself).
    Id(String),
}

impl MediaRef {
    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }
}

impl From<InputFile> for MediaRef {
    fn from(file: InputFile) -> Self {
        Self::File(file)
    }
}

impl From<String> for MediaRef {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for MediaRef {
    fn from(id: &str) -> Self {
        Self::Id(id.to_owned())
    }
}

/// Key a thumbnail was supplied under; preserved on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThumbnailKey {
    Thumb,
    #[default]
    Thumbnail,
}

impl ThumbnailKey {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Thumb => "thumb",
            Self::Thumbnail => "thumbnail",
        }
    }
}

#[derive(Debug)]
pub struct Thumbnail {
    pub key: ThumbnailKey,
    pub media: MediaRef,
}

/// An object carrying a `media` reference plus a `type`, optionally a
/// thumbnail; any other fields pass through untouched.
#[derive(Debug)]
pub struct InputMedia {
    pub kind: String,
    pub media: MediaRef,
    pub thumbnail: Option<Thumbnail>,
    pub fields: Map<String, Value>,
}

impl InputMedia {
    #[must_use]
    pub fn new(kind: impl Into<String>, media: impl Into<MediaRef>) -> Self {
        Self {
            kind: kind.into(),
            media: media.into(),
            thumbnail: None,
            fields: Map::new(),
        }
    }

    #[must_use]
    pub fn thumbnail(mut self, media: impl Into<MediaRef>) -> Self {
        self.thumbnail = Some(Thumbnail {
            key: ThumbnailKey::default(),
            media: media.into(),
        });
        self
    }

    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// JSON object for this item when nothing in it needs uploading.
    pub(crate) fn into_json(self, field: &str) -> crate::error::Result<Value> {
        let reference = |media: MediaRef| match media {
            MediaRef::Id(id) => Ok(id),
            MediaRef::File(_) => Err(crate::error::Error::invalid_parameter(
                field,
                "attachments cannot be sent in a JSON body",
            )),
        };
        let media = reference(self.media)?;
        let thumbnail = self
            .thumbnail
            .map(|thumb| reference(thumb.media).map(|id| (thumb.key, id)))
            .transpose()?;
        Ok(media_object(self.kind, media, self.fields, thumbnail))
    }

    #[must_use]
    pub fn has_attachments(&self) -> bool {
        self.media.is_file()
            || self
                .thumbnail
                .as_ref()
                .is_some_and(|thumb| thumb.media.is_file())
    }
}

/// Wire object for an input-media item whose references are already
/// strings.
pub(crate) fn media_object(
    kind: String,
    media: String,
    fields: Map<String, Value>,
    thumbnail: Option<(ThumbnailKey, String)>,
) -> Value {
    let mut object = Map::new();
    object.insert("type".into(), Value::String(kind));
    object.insert("media".into(), Value::String(media));
    object.extend(
        fields
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| (key, strip_nulls(value))),
    );
    if let Some((key, reference)) = thumbnail {
        object.insert(key.as_str().into(), Value::String(reference));
    }
    Value::Object(object)
}

/// One parameter value.
#[derive(Debug)]
pub enum ParamValue {
    /// Scalars, null, and attachment-free structures.
    Json(Value),
    File(InputFile),
    Media(InputMedia),
    MediaGroup(Vec<InputMedia>),
}

impl ParamValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Json(Value::Null))
    }

    #[must_use]
    pub fn has_attachments(&self) -> bool {
        match self {
            Self::Json(_) => false,
            Self::File(_) => true,
            Self::Media(media) => media.has_attachments(),
            Self::MediaGroup(items) => items.iter().any(InputMedia::has_attachments),
        }
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Json(Value::String(value.to_owned()))
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Json(Value::String(value))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Json(Value::Bool(value))
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Json(Value::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Json(Value::from(value))
    }
}

impl From<InputFile> for ParamValue {
    fn from(file: InputFile) -> Self {
        Self::File(file)
    }
}

impl From<InputMedia> for ParamValue {
    fn from(media: InputMedia) -> Self {
        Self::Media(media)
    }
}

impl From<Vec<InputMedia>> for ParamValue {
    fn from(items: Vec<InputMedia>) -> Self {
        Self::MediaGroup(items)
    }
}

/// Ordered parameter mapping for one call. Keys are unique; inserting an
/// existing key replaces the value in its original position.
#[derive(Debug, Default)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Option<ParamValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            },
        }
    }

    /// Inserts at the front, replacing any existing entry for `key`.
    pub fn prepend(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        self.entries.retain(|(k, _)| *k != key);
        self.entries.insert(0, (key, value.into()));
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether any value would have to travel as a binary part.
    ///
    /// Thumbnail fields holding a plain string count as attachments because
    /// they are always uploaded from the local path they name.
    /// `link_preview_options` is skipped whatever it holds.
    #[must_use]
    pub fn has_attachments(&self) -> bool {
        self.iter()
            .filter(|(key, _)| *key != LINK_PREVIEW_OPTIONS)
            .any(|(key, value)| {
                value.has_attachments()
                    || (is_thumbnail_field(key) && matches!(value, ParamValue::Json(Value::String(_))))
            })
    }
}

impl IntoIterator for Params {
    type IntoIter = std::vec::IntoIter<(String, ParamValue)>;
    type Item = (String, ParamValue);

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn insert_replaces_in_place() {
        let mut params = Params::new().with("a", 1_i64).with("b", 2_i64);
        let old = params.insert("a", 3_i64);
        assert!(matches!(old, Some(ParamValue::Json(v)) if v == json!(1)));
        let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "b"]);
        assert!(matches!(params.get("a"), Some(ParamValue::Json(v)) if *v == json!(3)));
    }

    #[test]
    fn prepend_moves_key_to_front() {
        let mut params = Params::new().with("chat_id", 1_i64).with("method", "x");
        params.prepend("method", "sendMessage");
        let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["method", "chat_id"]);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn attachment_free_params() {
        let params = Params::new()
            .with("chat_id", 42_i64)
            .with("text", "hi")
            .with("reply_markup", json!({"inline_keyboard": []}))
            .with("photo", InputMedia::new("photo", "file-id"));
        assert!(!params.has_attachments());
    }

    #[test]
    fn file_forces_attachments() {
        let params = Params::new().with("document", InputFile::bytes(&b"abc"[..]));
        assert!(params.has_attachments());
    }

    #[test]
    fn group_thumbnail_counts() {
        let item = InputMedia::new("video", "file-id").thumbnail(InputFile::path("/tmp/t.jpg"));
        let params = Params::new().with("media", vec![item]);
        assert!(params.has_attachments());
    }

    #[test]
    fn thumb_string_counts() {
        let params = Params::new().with("thumb", "/tmp/x.jpg");
        assert!(params.has_attachments());
    }

    #[test]
    fn link_preview_options_ignored() {
        let params = Params::new().with("link_preview_options", InputFile::url("https://x"));
        assert!(!params.has_attachments());
    }

    #[test]
    fn empty_sources() {
        assert!(MediaSource::Path(PathBuf::new()).is_empty());
        assert!(MediaSource::Url(String::new()).is_empty());
        assert!(!MediaSource::Bytes(Bytes::new()).is_empty());
    }
}
