//! # Call Codec
//!
//! The encoding contract for remote calls. Every message is a [`Header`] followed by a
//! body, each written as one length-prefixed frame (see [`frame`](super::frame)). The
//! body encoding is selected by a [`ContentType`] tag; both ends of a stream must use
//! the same one.
//!
//! ```text
//!   ┌──────────────┬────────────────────┬──────────────┬────────────────────┐
//!   │ len: u32 BE  │ header (encoded)   │ len: u32 BE  │ body (encoded)     │
//!   └──────────────┴────────────────────┴──────────────┴────────────────────┘
//! ```
//!
//! | Content type          | Implementation   | Encoding                              |
//! |-----------------------|------------------|---------------------------------------|
//! | `application/bincode` | `BincodeCodec`   | bincode, little-endian, fixed ints    |
//! | `application/json`    | `JsonCodec`      | serde_json                            |
//!
//! `ContentType::new_codec` plays the role of a constructor registry: given a tag, a
//! stream and a [`CodecConfig`], it returns an [`AnyCodec`] that dispatches to the
//! matching implementation.
//!
//! ## Example Usage
//!
//! ```rust
//! use std::io::Cursor;
//! use flightgroup::common::config::CodecConfig;
//! use flightgroup::network::codec::{Codec, ContentType, Header};
//!
//! let config = CodecConfig::default();
//! let mut writer = ContentType::Json.new_codec(Cursor::new(Vec::new()), &config);
//! let header = Header::new("Arith.Sum", 1);
//! writer.write(&header, &(3u32, 4u32)).unwrap();
//!
//! let mut stream = writer.into_inner();
//! stream.set_position(0);
//! let mut reader = ContentType::Json.new_codec(stream, &config);
//! assert_eq!(reader.read_header().unwrap(), header);
//! assert_eq!(reader.read_body::<(u32, u32)>().unwrap(), (3, 4));
//! ```

use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::common::config::CodecConfig;
use crate::common::exception::CodecError;
use crate::network::bincode_codec::BincodeCodec;
use crate::network::json_codec::JsonCodec;

/// Per-call metadata sent ahead of every body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Header {
    /// Target in `"Service.Method"` form.
    pub service_method: String,
    /// Sequence number chosen by the caller; replies echo it back.
    pub seq: u64,
    /// Empty on success, otherwise the failure reported by the callee.
    pub error: String,
}

impl Header {
    pub fn new(service_method: impl Into<String>, seq: u64) -> Self {
        Self {
            service_method: service_method.into(),
            seq,
            error: String::new(),
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = error.into();
        self
    }

    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    #[serde(rename = "application/bincode")]
    Bincode,
    #[serde(rename = "application/json")]
    Json,
}

impl ContentType {
    pub const ALL: [ContentType; 2] = [ContentType::Bincode, ContentType::Json];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Bincode => "application/bincode",
            ContentType::Json => "application/json",
        }
    }

    /// Builds the codec registered for this content type over `stream`.
    pub fn new_codec<S: Read + Write>(self, stream: S, config: &CodecConfig) -> AnyCodec<S> {
        match self {
            ContentType::Bincode => {
                AnyCodec::Bincode(BincodeCodec::new(stream, config.max_frame_size))
            }
            ContentType::Json => AnyCodec::Json(JsonCodec::new(stream, config.max_frame_size)),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentType::ALL
            .into_iter()
            .find(|content_type| content_type.as_str() == s)
            .ok_or_else(|| CodecError::UnknownContentType(s.to_string()))
    }
}

/// Reads and writes header/body pairs over a byte stream.
pub trait Codec {
    fn content_type(&self) -> ContentType;

    /// Reads the next header. Returns [`CodecError::Closed`] at a clean end of stream.
    fn read_header(&mut self) -> Result<Header, CodecError>;

    /// Reads the body that follows the last header.
    fn read_body<B: DeserializeOwned>(&mut self) -> Result<B, CodecError>;

    /// Reads and discards the body that follows the last header.
    fn skip_body(&mut self) -> Result<(), CodecError>;

    /// Writes `header` then `body` and flushes the stream.
    fn write<B: Serialize>(&mut self, header: &Header, body: &B) -> Result<(), CodecError>;
}

/// A codec chosen at runtime by [`ContentType`].
#[derive(Debug)]
pub enum AnyCodec<S> {
    Bincode(BincodeCodec<S>),
    Json(JsonCodec<S>),
}

impl<S> AnyCodec<S> {
    pub fn get_ref(&self) -> &S {
        match self {
            AnyCodec::Bincode(codec) => codec.get_ref(),
            AnyCodec::Json(codec) => codec.get_ref(),
        }
    }

    pub fn into_inner(self) -> S {
        match self {
            AnyCodec::Bincode(codec) => codec.into_inner(),
            AnyCodec::Json(codec) => codec.into_inner(),
        }
    }
}

impl<S: Read + Write> Codec for AnyCodec<S> {
    fn content_type(&self) -> ContentType {
        match self {
            AnyCodec::Bincode(codec) => codec.content_type(),
            AnyCodec::Json(codec) => codec.content_type(),
        }
    }

    fn read_header(&mut self) -> Result<Header, CodecError> {
        match self {
            AnyCodec::Bincode(codec) => codec.read_header(),
            AnyCodec::Json(codec) => codec.read_header(),
        }
    }

    fn read_body<B: DeserializeOwned>(&mut self) -> Result<B, CodecError> {
        match self {
            AnyCodec::Bincode(codec) => codec.read_body(),
            AnyCodec::Json(codec) => codec.read_body(),
        }
    }

    fn skip_body(&mut self) -> Result<(), CodecError> {
        match self {
            AnyCodec::Bincode(codec) => codec.skip_body(),
            AnyCodec::Json(codec) => codec.skip_body(),
        }
    }

    fn write<B: Serialize>(&mut self, header: &Header, body: &B) -> Result<(), CodecError> {
        match self {
            AnyCodec::Bincode(codec) => codec.write(header, body),
            AnyCodec::Json(codec) => codec.write(header, body),
        }
    }
}
