//! Request-body encoding for Bot API calls.
//!
//! A call's parameters are sent as a compact JSON object unless something
//! in them has to be uploaded, in which case every parameter becomes a
//! `multipart/form-data` part and each attachment is replaced by an
//! `attach://<id>` reference to a binary part named `<id>`.

pub mod encode;
pub mod error;
pub mod fields;
pub mod ids;
pub mod inline;
pub mod media;
pub mod multipart;
mod normalize;
pub mod value;

pub use {
    encode::{
        EncodedPayload, EncoderConfig, EncodingMode, JSON_CONTENT_TYPE, PayloadBody,
        PayloadEncoder, strip_nulls,
    },
    error::{Error, Result},
    media::{DEFAULT_FETCH_TIMEOUT, MediaFetcher, ReqwestFetcher},
    multipart::{MultipartBody, MultipartPart, PartBody},
    value::{
        ByteStream, InputFile, InputMedia, MediaRef, MediaSource, ParamValue, Params, Thumbnail,
        ThumbnailKey,
    },
};
