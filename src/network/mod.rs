//! # Call Codec Layer
//!
//! Header/body encoding for remote calls, the boundary a caller deduplicating
//! identical remote calls would encode against.
//!
//! - **`codec`**: `Header`, `ContentType`, the `Codec` trait and the runtime-selected `AnyCodec`.
//! - **`bincode_codec`** / **`json_codec`**: the two interchangeable encodings.
//! - **`frame`**: length-prefixed framing shared by both.

pub mod bincode_codec;
pub mod codec;
mod frame;
pub mod json_codec;

pub use bincode_codec::BincodeCodec;
pub use codec::{AnyCodec, Codec, ContentType, Header};
pub use json_codec::JsonCodec;
