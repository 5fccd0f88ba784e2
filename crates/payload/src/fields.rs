//! Field names with fixed wire treatment.

/// Fields whose non-string values are JSON-stringified before sending,
/// in both JSON and multipart mode.
pub const JSON_FIELDS: &[&str] = &[
    "results",
    "reply_markup",
    "mask_position",
    "shipping_options",
    "errors",
];

/// Fields that are always uploaded as a separate attachment part.
pub const THUMBNAIL_FIELDS: &[&str] = &["thumb", "thumbnail"];

/// Excluded from attachment detection whatever its shape.
pub const LINK_PREVIEW_OPTIONS: &str = "link_preview_options";

/// Extension used when nothing better names an uploaded part.
pub const FALLBACK_EXTENSION: &str = "dat";

#[must_use]
pub fn is_json_field(name: &str) -> bool {
    JSON_FIELDS.contains(&name)
}

#[must_use]
pub fn is_thumbnail_field(name: &str) -> bool {
    THUMBNAIL_FIELDS.contains(&name)
}

/// Default file extension for uploads keyed by field name.
#[must_use]
pub fn default_extension(field: &str) -> Option<&'static str> {
    match field {
        "audio" => Some("mp3"),
        "photo" => Some("jpg"),
        "sticker" => Some("webp"),
        "video" | "animation" | "video_note" => Some("mp4"),
        "voice" => Some("ogg"),
        _ => None,
    }
}

/// `<name>.<ext>` using the extension table, falling back to `.dat`.
#[must_use]
pub fn default_file_name(name: &str) -> String {
    let ext = default_extension(name).unwrap_or(FALLBACK_EXTENSION);
    format!("{name}.{ext}")
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("audio", "audio.mp3")]
    #[case("photo", "photo.jpg")]
    #[case("sticker", "sticker.webp")]
    #[case("video", "video.mp4")]
    #[case("animation", "animation.mp4")]
    #[case("video_note", "video_note.mp4")]
    #[case("voice", "voice.ogg")]
    #[case("document", "document.dat")]
    #[case("0f3a9c1d2b4e5f60", "0f3a9c1d2b4e5f60.dat")]
    fn file_name_from_table(#[case] field: &str, #[case] expected: &str) {
        assert_eq!(default_file_name(field), expected);
    }

    #[test]
    fn json_field_allowlist() {
        assert!(is_json_field("reply_markup"));
        assert!(is_json_field("shipping_options"));
        assert!(!is_json_field("caption"));
    }

    #[test]
    fn thumbnail_fields() {
        assert!(is_thumbnail_field("thumb"));
        assert!(is_thumbnail_field("thumbnail"));
        assert!(!is_thumbnail_field("photo"));
    }
}
