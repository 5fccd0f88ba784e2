//! Conversion of loosely-shaped JSON parameters into [`Params`].
//!
//! Recognised attachment shapes:
//! - `{"source": "<path>"}` or `{"url": "<url>"}`, with optional `filename`;
//! - an object with `type` whose `media` (or `thumb`/`thumbnail`) has one of
//!   the shapes above;
//! - an object without `type` whose `media` has one of the shapes above,
//!   which is uploaded as a plain file;
//! - an array containing such objects.

use serde_json::{Map, Value};

use crate::{
    error::{Error, Result},
    fields::{LINK_PREVIEW_OPTIONS, is_thumbnail_field},
    value::{InputFile, InputMedia, MediaRef, ParamValue, Params, Thumbnail, ThumbnailKey},
};

impl Params {
    /// Builds a parameter mapping from a JSON object, turning
    /// attachment-shaped values into their typed variants.
    pub fn from_json(map: Map<String, Value>) -> Result<Self> {
        let mut params = Self::new();
        for (key, value) in map {
            let value = normalize_value(&key, value)?;
            params.insert(key, value);
        }
        Ok(params)
    }
}

impl ParamValue {
    /// Typed value for `key` from loosely-shaped JSON, with the same
    /// attachment detection as [`Params::from_json`].
    pub fn from_json(key: &str, value: Value) -> Result<Self> {
        normalize_value(key, value)
    }
}

fn normalize_value(key: &str, value: Value) -> Result<ParamValue> {
    if key == LINK_PREVIEW_OPTIONS {
        return Ok(ParamValue::Json(value));
    }
    match value {
        Value::Object(obj) => {
            if let Some(file) = input_file(&obj) {
                return Ok(ParamValue::File(file));
            }
            if !is_thumbnail_field(key) && obj.contains_key("type") && carries_attachment(&obj) {
                return input_media(key, obj).map(ParamValue::Media);
            }
            if let Some(file) = obj
                .get("media")
                .and_then(Value::as_object)
                .and_then(input_file)
            {
                return Ok(ParamValue::File(file));
            }
            Ok(ParamValue::Json(Value::Object(obj)))
        },
        Value::Array(items) => {
            let has_media = items
                .iter()
                .any(|item| item.as_object().is_some_and(carries_attachment));
            if !has_media {
                return Ok(ParamValue::Json(Value::Array(items)));
            }
            items
                .into_iter()
                .map(|item| match item {
                    Value::Object(obj) => input_media(key, obj),
                    other => Err(Error::invalid_parameter(
                        key,
                        format!("expected media object in array, got {other}"),
                    )),
                })
                .collect::<Result<Vec<_>>>()
                .map(ParamValue::MediaGroup)
        },
        other => Ok(ParamValue::Json(other)),
    }
}

/// `{"source": ..}` / `{"url": ..}` shapes. Non-string sources are not
/// representable in JSON and are left alone.
fn input_file(obj: &Map<String, Value>) -> Option<InputFile> {
    let file = if let Some(Value::String(url)) = obj.get("url") {
        InputFile::url(url.clone())
    } else if let Some(Value::String(path)) = obj.get("source") {
        InputFile::path(path)
    } else {
        return None;
    };
    Some(match obj.get("filename").and_then(Value::as_str) {
        Some(name) => file.file_name(name),
        None => file,
    })
}

fn carries_attachment(obj: &Map<String, Value>) -> bool {
    ["media", "thumb", "thumbnail"].iter().any(|slot| {
        obj.get(*slot)
            .and_then(Value::as_object)
            .is_some_and(|inner| input_file(inner).is_some())
    })
}

fn media_ref(key: &str, slot: &str, value: Value) -> Result<MediaRef> {
    match value {
        Value::String(id) => Ok(MediaRef::Id(id)),
        Value::Object(obj) => input_file(&obj).map(MediaRef::File).ok_or_else(|| {
            Error::invalid_parameter(key, format!("'{slot}' object has no source or url"))
        }),
        other => Err(Error::invalid_parameter(
            key,
            format!("unsupported '{slot}' value: {other}"),
        )),
    }
}

fn input_media(key: &str, mut obj: Map<String, Value>) -> Result<InputMedia> {
    let kind = match obj.shift_remove("type") {
        Some(Value::String(kind)) => kind,
        _ => return Err(Error::invalid_parameter(key, "media object without 'type'")),
    };
    let media = match obj.shift_remove("media") {
        Some(value) => media_ref(key, "media", value)?,
        None => return Err(Error::invalid_parameter(key, "media object without 'media'")),
    };
    let thumbnail = [ThumbnailKey::Thumbnail, ThumbnailKey::Thumb]
        .into_iter()
        .find_map(|thumb_key| obj.shift_remove(thumb_key.as_str()).map(|v| (thumb_key, v)))
        .map(|(thumb_key, value)| {
            media_ref(key, thumb_key.as_str(), value).map(|media| Thumbnail {
                key: thumb_key,
                media,
            })
        })
        .transpose()?;
    Ok(InputMedia {
        kind,
        media,
        thumbnail,
        fields: obj,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use serde_json::json;

    use {super::*, crate::value::MediaSource};

    fn params(value: Value) -> Params {
        let Value::Object(map) = value else {
            panic!("expected object");
        };
        Params::from_json(map).unwrap()
    }

    #[test]
    fn plain_values_stay_json() {
        let p = params(json!({"chat_id": 1, "text": "hi", "reply_markup": {"a": 1}}));
        assert!(!p.has_attachments());
        assert!(matches!(p.get("reply_markup"), Some(ParamValue::Json(_))));
    }

    #[test]
    fn source_object_becomes_file() {
        let p = params(json!({"document": {"source": "/tmp/a.txt", "filename": "b.txt"}}));
        let Some(ParamValue::File(file)) = p.get("document") else {
            panic!("expected file");
        };
        assert!(matches!(&file.source, MediaSource::Path(path) if path.ends_with("a.txt")));
        assert_eq!(file.filename.as_deref(), Some("b.txt"));
    }

    #[test]
    fn url_object_becomes_file() {
        let p = params(json!({"photo": {"url": "https://example.com/p.png"}}));
        assert!(matches!(
            p.get("photo"),
            Some(ParamValue::File(InputFile { source: MediaSource::Url(_), .. }))
        ));
    }

    #[test]
    fn media_object_with_type() {
        let p = params(json!({
            "media": {"type": "photo", "media": {"source": "/tmp/p.jpg"}, "caption": "c"}
        }));
        let Some(ParamValue::Media(media)) = p.get("media") else {
            panic!("expected media");
        };
        assert_eq!(media.kind, "photo");
        assert!(media.media.is_file());
        assert_eq!(media.fields.get("caption"), Some(&json!("c")));
    }

    #[test]
    fn remaining_fields_keep_their_order() {
        let p = params(json!({"media": {
            "type": "video",
            "caption": "c",
            "media": {"source": "/tmp/v.mp4"},
            "width": 640,
            "height": 480,
            "supports_streaming": true
        }}));
        let Some(ParamValue::Media(media)) = p.get("media") else {
            panic!("expected media");
        };
        let keys: Vec<_> = media.fields.keys().map(String::as_str).collect();
        assert_eq!(keys, ["caption", "width", "height", "supports_streaming"]);
    }

    #[test]
    fn array_with_mixed_items() {
        let p = params(json!({"media": [
            {"type": "photo", "media": {"source": "/tmp/1.jpg"}},
            {"type": "photo", "media": "file-id-2"},
            {"type": "video", "media": {"url": "https://x/3.mp4"}, "thumb": {"source": "/tmp/t.jpg"}},
        ]}));
        let Some(ParamValue::MediaGroup(items)) = p.get("media") else {
            panic!("expected group");
        };
        assert_eq!(items.len(), 3);
        assert!(items[0].media.is_file());
        assert!(matches!(&items[1].media, MediaRef::Id(id) if id == "file-id-2"));
        let thumb = items[2].thumbnail.as_ref().unwrap();
        assert_eq!(thumb.key, ThumbnailKey::Thumb);
        assert!(thumb.media.is_file());
    }

    #[test]
    fn nested_media_without_type_becomes_file() {
        let p = params(json!({"document": {"media": {"source": "/tmp/a.pdf", "filename": "a.pdf"}}}));
        let Some(ParamValue::File(file)) = p.get("document") else {
            panic!("expected file");
        };
        assert!(matches!(&file.source, MediaSource::Path(path) if path.to_str() == Some("/tmp/a.pdf")));
        assert_eq!(file.filename.as_deref(), Some("a.pdf"));
        assert!(p.has_attachments());
    }

    #[test]
    fn media_array_without_type_is_rejected() {
        let Value::Object(map) = json!({"media": [{"media": {"url": "https://x/1.jpg"}}]}) else {
            panic!("expected object");
        };
        let err = Params::from_json(map).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }

    #[test]
    fn single_value_uses_same_detection() {
        let value = ParamValue::from_json(
            "media",
            json!([{"type": "photo", "media": {"source": "/x.jpg"}}]),
        )
        .unwrap();
        assert!(matches!(value, ParamValue::MediaGroup(ref items) if items.len() == 1));
        assert!(value.has_attachments());
        assert!(matches!(
            ParamValue::from_json("text", json!("hi")).unwrap(),
            ParamValue::Json(Value::String(_))
        ));
    }

    #[test]
    fn array_without_media_stays_json() {
        let p = params(json!({"allowed_updates": ["message", "callback_query"]}));
        assert!(matches!(p.get("allowed_updates"), Some(ParamValue::Json(Value::Array(_)))));
    }

    #[test]
    fn link_preview_options_never_converted() {
        let p = params(json!({"link_preview_options": {"url": "https://example.com"}}));
        assert!(matches!(p.get("link_preview_options"), Some(ParamValue::Json(_))));
        assert!(!p.has_attachments());
    }

    #[test]
    fn non_object_in_media_array_fails() {
        let Value::Object(map) = json!({"media": [{"type": "photo", "media": {"source": "/a"}}, 3]})
        else {
            panic!("expected object");
        };
        let err = Params::from_json(map).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }
}
