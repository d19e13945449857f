use std::io::{Read, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::common::config::wire_bincode_config;
use crate::common::exception::CodecError;
use crate::network::codec::{Codec, ContentType, Header};
use crate::network::frame::{read_frame, read_trailing_frame, write_frame};

/// `application/bincode`: compact binary encoding using the pinned wire config.
#[derive(Debug)]
pub struct BincodeCodec<S> {
    stream: S,
    max_frame_size: usize,
}

impl<S> BincodeCodec<S> {
    pub fn new(stream: S, max_frame_size: usize) -> Self {
        Self {
            stream,
            max_frame_size,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read + Write> BincodeCodec<S> {
    fn decode<V: DeserializeOwned>(payload: &[u8]) -> Result<V, CodecError> {
        let (value, _) = bincode::serde::decode_from_slice(payload, wire_bincode_config())?;
        Ok(value)
    }
}

impl<S: Read + Write> Codec for BincodeCodec<S> {
    fn content_type(&self) -> ContentType {
        ContentType::Bincode
    }

    fn read_header(&mut self) -> Result<Header, CodecError> {
        let payload = read_frame(&mut self.stream, self.max_frame_size)?;
        Self::decode(&payload)
    }

    fn read_body<B: DeserializeOwned>(&mut self) -> Result<B, CodecError> {
        let payload = read_trailing_frame(&mut self.stream, self.max_frame_size)?;
        Self::decode(&payload)
    }

    fn skip_body(&mut self) -> Result<(), CodecError> {
        read_trailing_frame(&mut self.stream, self.max_frame_size).map(|_| ())
    }

    fn write<B: Serialize>(&mut self, header: &Header, body: &B) -> Result<(), CodecError> {
        let header_bytes = bincode::serde::encode_to_vec(header, wire_bincode_config())?;
        let body_bytes = bincode::serde::encode_to_vec(body, wire_bincode_config())?;

        write_frame(&mut self.stream, &header_bytes, self.max_frame_size)?;
        write_frame(&mut self.stream, &body_bytes, self.max_frame_size)?;
        self.stream.flush()?;
        Ok(())
    }
}
