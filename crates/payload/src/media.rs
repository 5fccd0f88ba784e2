//! Turns an [`InputFile`] into a binary multipart part.

use {
    async_trait::async_trait,
    futures::{StreamExt, TryStreamExt},
    std::{io, path::Path, time::Duration},
    tokio_util::io::ReaderStream,
    tracing::debug,
};

use crate::{
    error::{Error, Result},
    fields::default_file_name,
    multipart::MultipartPart,
    value::{ByteStream, InputFile, MediaSource},
};

/// Upper bound for downloading a remote attachment.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(500);

/// Fetches remote attachments as a byte stream.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<ByteStream>;
}

/// [`MediaFetcher`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MediaFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<ByteStream> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| Error::transport(format!("failed to fetch attachment {url}: {e}")))?;
        Ok(response.bytes_stream().map_err(io::Error::other).boxed())
    }
}

/// Resolves attachment sources into parts.
pub struct MediaResolver<'a> {
    fetcher: &'a dyn MediaFetcher,
    timeout: Duration,
}

impl<'a> MediaResolver<'a> {
    #[must_use]
    pub fn new(fetcher: &'a dyn MediaFetcher, timeout: Duration) -> Self {
        Self { fetcher, timeout }
    }

    /// Builds the part named `name` for `file`.
    ///
    /// Filename precedence: explicit filename, then the basename of a path
    /// source, then `<name>.<default extension for name>`. Returns `None`
    /// for an empty source.
    pub async fn resolve(&self, file: InputFile, name: &str) -> Result<Option<MultipartPart>> {
        let InputFile { source, filename } = file;
        if source.is_empty() {
            debug!(part = name, "empty attachment source, no part emitted");
            return Ok(None);
        }
        let (filename, body) = match source {
            MediaSource::Url(url) => {
                debug!(part = name, "fetching remote attachment");
                let body = self.fetcher.fetch(&url, self.timeout).await?;
                (filename.unwrap_or_else(|| default_file_name(name)), body)
            },
            MediaSource::Path(path) => {
                let body = open_regular_file(&path).await?;
                let filename = filename
                    .or_else(|| {
                        path.file_name()
                            .map(|base| base.to_string_lossy().into_owned())
                    })
                    .unwrap_or_else(|| default_file_name(name));
                (filename, body)
            },
            MediaSource::Bytes(bytes) => (
                filename.unwrap_or_else(|| default_file_name(name)),
                futures::stream::once(futures::future::ready(Ok(bytes))).boxed(),
            ),
            MediaSource::Stream(stream) => {
                (filename.unwrap_or_else(|| default_file_name(name)), stream)
            },
        };
        debug!(part = name, filename = %filename, "attachment resolved");
        Ok(Some(MultipartPart::binary(name, filename, body)))
    }
}

/// Resolves symlinks, checks the target is a regular file and opens it as
/// a stream.
async fn open_regular_file(path: &Path) -> Result<ByteStream> {
    let resolved = tokio::fs::canonicalize(path)
        .await
        .map_err(|e| fs_error("failed to resolve", path, e))?;
    let metadata = tokio::fs::metadata(&resolved)
        .await
        .map_err(|e| fs_error("failed to stat", path, e))?;
    if !metadata.is_file() {
        return Err(Error::invalid_source(
            path.display().to_string(),
            "not a file",
        ));
    }
    let file = tokio::fs::File::open(&resolved)
        .await
        .map_err(|e| fs_error("failed to open", path, e))?;
    Ok(ReaderStream::new(file).boxed())
}

fn fs_error(context: &'static str, path: &Path, err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::NotFound {
        Error::invalid_source(path.display().to_string(), "not a file")
    } else {
        Error::filesystem(context, path, err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {bytes::Bytes, futures::stream};

    use {super::*, crate::multipart::PartBody};

    async fn body_bytes(part: MultipartPart) -> Vec<u8> {
        let PartBody::Binary(body) = part.body else {
            panic!("expected binary body");
        };
        body.try_fold(Vec::new(), |mut acc, chunk| {
            acc.extend_from_slice(&chunk);
            futures::future::ready(Ok(acc))
        })
        .await
        .unwrap()
    }

    fn resolver(fetcher: &ReqwestFetcher) -> MediaResolver<'_> {
        MediaResolver::new(fetcher, DEFAULT_FETCH_TIMEOUT)
    }

    #[tokio::test]
    async fn path_source_uses_basename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.jpg");
        std::fs::write(&path, b"jpeg").unwrap();

        let fetcher = ReqwestFetcher::default();
        let part = resolver(&fetcher)
            .resolve(InputFile::path(&path), "thumb")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(part.name, "thumb");
        assert_eq!(part.filename.as_deref(), Some("x.jpg"));
        assert_eq!(body_bytes(part).await, b"jpeg");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_is_followed_but_link_name_kept() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("real.bin");
        std::fs::write(&target, b"data").unwrap();
        let link = dir.path().join("link.bin");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let fetcher = ReqwestFetcher::default();
        let part = resolver(&fetcher)
            .resolve(InputFile::path(&link), "document")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(part.filename.as_deref(), Some("link.bin"));
        assert_eq!(body_bytes(part).await, b"data");
    }

    #[tokio::test]
    async fn explicit_filename_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.jpg");
        std::fs::write(&path, b"jpeg").unwrap();

        let fetcher = ReqwestFetcher::default();
        let part = resolver(&fetcher)
            .resolve(InputFile::path(&path).file_name("cover.jpg"), "photo")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(part.filename.as_deref(), Some("cover.jpg"));
    }

    #[tokio::test]
    async fn directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ReqwestFetcher::default();
        let err = resolver(&fetcher)
            .resolve(InputFile::path(dir.path()), "document")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAttachmentSource { .. }));
        assert!(err.to_string().contains("not a file"));
    }

    #[tokio::test]
    async fn missing_path_is_invalid_source() {
        let fetcher = ReqwestFetcher::default();
        let err = resolver(&fetcher)
            .resolve(InputFile::path("/definitely/not/here.jpg"), "photo")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAttachmentSource { .. }));
    }

    #[tokio::test]
    async fn buffer_uses_field_extension() {
        let fetcher = ReqwestFetcher::default();
        let part = resolver(&fetcher)
            .resolve(InputFile::bytes(Bytes::from_static(b"ogg!")), "voice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(part.filename.as_deref(), Some("voice.ogg"));
        assert_eq!(body_bytes(part).await, b"ogg!");
    }

    #[tokio::test]
    async fn stream_defaults_to_dat() {
        let fetcher = ReqwestFetcher::default();
        let body = stream::iter(vec![
            Ok::<_, io::Error>(Bytes::from_static(b"a")),
            Ok(Bytes::from_static(b"b")),
        ]);
        let part = resolver(&fetcher)
            .resolve(InputFile::stream(body.boxed()), "0123456789abcdef")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(part.filename.as_deref(), Some("0123456789abcdef.dat"));
        assert_eq!(body_bytes(part).await, b"ab");
    }

    #[tokio::test]
    async fn empty_source_is_noop() {
        let fetcher = ReqwestFetcher::default();
        let part = resolver(&fetcher)
            .resolve(InputFile::path(""), "document")
            .await
            .unwrap();
        assert!(part.is_none());
    }

    #[tokio::test]
    async fn url_source_streams_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/files/a.png")
            .with_status(200)
            .with_body("png-bytes")
            .create_async()
            .await;

        let fetcher = ReqwestFetcher::default();
        let part = resolver(&fetcher)
            .resolve(InputFile::url(format!("{}/files/a.png", server.url())), "photo")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(part.filename.as_deref(), Some("photo.jpg"));
        assert_eq!(body_bytes(part).await, b"png-bytes");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn url_fetch_failure_is_transport_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = ReqwestFetcher::default();
        let err = resolver(&fetcher)
            .resolve(InputFile::url(format!("{}/missing", server.url())), "photo")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
        assert!(err.to_string().contains("404"));
    }
}
