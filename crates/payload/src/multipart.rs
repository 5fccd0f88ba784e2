//! `multipart/form-data` body assembly.
//!
//! Parts are kept in insertion order and serialised lazily: binary bodies
//! are forwarded chunk by chunk, never collected.

use {
    bytes::{Bytes, BytesMut},
    futures::{StreamExt, TryStreamExt, future, stream},
    std::{fmt, fmt::Write},
};

use crate::{ids::random_hex, value::ByteStream};

/// Random bytes behind a boundary (64 hex chars).
const BOUNDARY_BYTES: usize = 32;

pub enum PartBody {
    Text(String),
    Binary(ByteStream),
}

impl PartBody {
    fn into_stream(self) -> ByteStream {
        match self {
            Self::Text(text) => stream::once(future::ready(Ok(Bytes::from(text)))).boxed(),
            Self::Binary(body) => body,
        }
    }
}

impl fmt::Debug for PartBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Binary(_) => f.write_str("Binary(..)"),
        }
    }
}

/// One part of a multipart body, addressed by `name`.
#[derive(Debug)]
pub struct MultipartPart {
    pub name: String,
    pub filename: Option<String>,
    pub body: PartBody,
}

impl MultipartPart {
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            body: PartBody::Text(value.into()),
        }
    }

    #[must_use]
    pub fn binary(name: impl Into<String>, filename: impl Into<String>, body: ByteStream) -> Self {
        Self {
            name: name.into(),
            filename: Some(filename.into()),
            body: PartBody::Binary(body),
        }
    }

    #[must_use]
    pub fn is_binary(&self) -> bool {
        matches!(self.body, PartBody::Binary(_))
    }

    /// Text body, if this is a textual part.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match &self.body {
            PartBody::Text(text) => Some(text),
            PartBody::Binary(_) => None,
        }
    }

    fn head(&self, boundary: &str) -> String {
        let mut head = format!(
            "--{boundary}\r\ncontent-disposition: form-data; name=\"{}\"",
            escape_quoted(&self.name)
        );
        if let Some(filename) = &self.filename {
            let _ = write!(head, "; filename=\"{}\"", escape_quoted(filename));
        }
        head.push_str("\r\n\r\n");
        head
    }
}

/// Percent-escapes the characters that would break a quoted header value.
fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Ordered parts behind one boundary.
#[derive(Debug)]
pub struct MultipartBody {
    boundary: String,
    parts: Vec<MultipartPart>,
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBody {
    /// Empty body with a fresh random boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(random_hex(BOUNDARY_BYTES))
    }

    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn push(&mut self, part: MultipartPart) {
        self.parts.push(part);
    }

    #[must_use]
    pub fn parts(&self) -> &[MultipartPart] {
        &self.parts
    }

    #[must_use]
    pub fn part(&self, name: &str) -> Option<&MultipartPart> {
        self.parts.iter().find(|part| part.name == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Serialises the body as a single stream.
    #[must_use]
    pub fn into_stream(self) -> ByteStream {
        let Self { boundary, parts } = self;
        let closing = Bytes::from(format!("--{boundary}--\r\n"));
        let parts = parts.into_iter().map(move |part| {
            let head = Bytes::from(part.head(&boundary));
            stream::once(future::ready(Ok(head)))
                .chain(part.body.into_stream())
                .chain(stream::once(future::ready(Ok(Bytes::from_static(b"\r\n")))))
        });
        stream::iter(parts)
            .flatten()
            .chain(stream::once(future::ready(Ok(closing))))
            .boxed()
    }

    /// Collects the whole body into memory.
    pub async fn into_bytes(self) -> std::io::Result<Bytes> {
        let buf = self
            .into_stream()
            .try_fold(BytesMut::new(), |mut buf, chunk| {
                buf.extend_from_slice(&chunk);
                future::ready(Ok(buf))
            })
            .await?;
        Ok(buf.freeze())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn chunks(chunks: &[&'static [u8]]) -> ByteStream {
        let items: Vec<std::io::Result<Bytes>> =
            chunks.iter().map(|c| Ok(Bytes::from_static(c))).collect();
        stream::iter(items).boxed()
    }

    #[tokio::test]
    async fn serialises_text_and_binary_parts() {
        let mut body = MultipartBody::with_boundary("XYZ");
        body.push(MultipartPart::text("chat_id", "42"));
        body.push(MultipartPart::binary("doc", "a.txt", chunks(&[b"hel", b"lo"])));
        let bytes = body.into_bytes().await.unwrap();
        let expected = "--XYZ\r\ncontent-disposition: form-data; name=\"chat_id\"\r\n\r\n42\r\n\
             --XYZ\r\ncontent-disposition: form-data; name=\"doc\"; filename=\"a.txt\"\r\n\r\nhello\r\n\
             --XYZ--\r\n";
        assert_eq!(std::str::from_utf8(&bytes).unwrap(), expected);
    }

    #[tokio::test]
    async fn empty_body_is_just_closing_boundary() {
        let body = MultipartBody::with_boundary("b");
        assert_eq!(&body.into_bytes().await.unwrap()[..], b"--b--\r\n");
    }

    #[test]
    fn quotes_and_newlines_escaped() {
        let part = MultipartPart::binary("f", "a\"b\r\n.txt", stream::empty().boxed());
        let head = part.head("b");
        assert!(head.contains("filename=\"a%22b%0D%0A.txt\""));
    }

    #[test]
    fn fresh_boundaries_differ() {
        let a = MultipartBody::new();
        let b = MultipartBody::new();
        assert_eq!(a.boundary().len(), 64);
        assert_ne!(a.boundary(), b.boundary());
        assert_eq!(
            a.content_type(),
            format!("multipart/form-data; boundary={}", a.boundary())
        );
    }

    #[tokio::test]
    async fn stream_error_propagates() {
        let failing: ByteStream = stream::iter(vec![
            Ok(Bytes::from_static(b"a")),
            Err(std::io::Error::other("boom")),
        ])
        .boxed();
        let mut body = MultipartBody::with_boundary("b");
        body.push(MultipartPart::binary("f", "f.dat", failing));
        let err = body.into_bytes().await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
