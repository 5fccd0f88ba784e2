//! Rewrites one parameter into multipart parts, replacing every attachment
//! with an `attach://<id>` reference plus a binary part named `<id>`.

use {
    futures::future::try_join_all,
    serde_json::Value,
    tracing::debug,
};

use crate::{
    error::{Error, Result},
    fields::is_thumbnail_field,
    ids::{AttachmentIds, attach_ref},
    media::MediaResolver,
    multipart::MultipartPart,
    value::{InputFile, InputMedia, MediaRef, ParamValue, media_object},
};

const ATTACH_SCHEME: &str = "attach://";

pub struct AttachmentInliner<'a> {
    resolver: MediaResolver<'a>,
    ids: &'a AttachmentIds,
}

impl<'a> AttachmentInliner<'a> {
    #[must_use]
    pub fn new(resolver: MediaResolver<'a>, ids: &'a AttachmentIds) -> Self {
        Self { resolver, ids }
    }

    /// Parts for `field`, in emission order. Null values produce none.
    pub async fn inline(&self, field: &str, value: ParamValue) -> Result<Vec<MultipartPart>> {
        if is_thumbnail_field(field) {
            return self.inline_thumbnail(field, value).await;
        }
        match value {
            ParamValue::Json(Value::Null) => Ok(Vec::new()),
            ParamValue::Json(value) => Ok(vec![MultipartPart::text(field, text_value(value)?)]),
            ParamValue::File(file) => Ok(self.resolver.resolve(file, field).await?.into_iter().collect()),
            ParamValue::Media(media) => {
                let (object, mut parts) = self.inline_media(field, media).await?;
                parts.push(MultipartPart::text(field, serde_json::to_string(&object)?));
                Ok(parts)
            },
            ParamValue::MediaGroup(items) => {
                let resolved =
                    try_join_all(items.into_iter().map(|item| self.inline_media(field, item)))
                        .await?;
                let mut parts = Vec::new();
                let mut objects = Vec::with_capacity(resolved.len());
                for (object, item_parts) in resolved {
                    objects.push(object);
                    parts.extend(item_parts);
                }
                debug!(field, items = objects.len(), attachments = parts.len(), "media group inlined");
                parts.push(MultipartPart::text(
                    field,
                    serde_json::to_string(&Value::Array(objects))?,
                ));
                Ok(parts)
            },
        }
    }

    /// Thumbnails are always uploaded under a fresh id, with the field
    /// itself holding the reference.
    async fn inline_thumbnail(&self, field: &str, value: ParamValue) -> Result<Vec<MultipartPart>> {
        let file = match value {
            ParamValue::Json(Value::Null) => return Ok(Vec::new()),
            ParamValue::Json(Value::String(reference)) if reference.starts_with(ATTACH_SCHEME) => {
                return Ok(vec![MultipartPart::text(field, reference)]);
            },
            ParamValue::Json(Value::String(path)) => InputFile::path(path),
            ParamValue::File(file) => file,
            _ => {
                return Err(Error::invalid_parameter(
                    field,
                    "thumbnail must be a file or a local path",
                ));
            },
        };
        let id = self.ids.next_id();
        match self.resolver.resolve(file, &id).await? {
            Some(part) => Ok(vec![part, MultipartPart::text(field, attach_ref(&id))]),
            None => Ok(Vec::new()),
        }
    }

    /// Resolves the media (and thumbnail) of one item, returning the JSON
    /// object to send in its place and the binary parts it needs.
    async fn inline_media(
        &self,
        field: &str,
        media: InputMedia,
    ) -> Result<(Value, Vec<MultipartPart>)> {
        let InputMedia {
            kind,
            media,
            thumbnail,
            fields,
        } = media;
        let mut parts = Vec::new();

        let media = match self.reference(media, &mut parts).await? {
            Some(reference) => reference,
            None => {
                return Err(Error::invalid_parameter(field, "media has an empty source"));
            },
        };

        let thumbnail = match thumbnail {
            Some(thumb) => self
                .reference(thumb.media, &mut parts)
                .await?
                .map(|reference| (thumb.key, reference)),
            None => None,
        };
        Ok((media_object(kind, media, fields, thumbnail), parts))
    }

    /// String to put in place of `media`; uploads get a fresh id and push
    /// their part. `None` for an empty source.
    async fn reference(
        &self,
        media: MediaRef,
        parts: &mut Vec<MultipartPart>,
    ) -> Result<Option<String>> {
        match media {
            MediaRef::Id(id) => Ok(Some(id)),
            MediaRef::File(file) => {
                let id = self.ids.next_id();
                Ok(self.resolver.resolve(file, &id).await?.map(|part| {
                    parts.push(part);
                    attach_ref(&id)
                }))
            },
        }
    }
}

/// Text form of a non-null JSON value: strings verbatim, everything else
/// serialised.
fn text_value(value: Value) -> Result<String> {
    Ok(match value {
        Value::String(text) => text,
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        other => serde_json::to_string(&other)?,
    })
}
