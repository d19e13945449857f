use std::io::{Read, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::common::exception::CodecError;
use crate::network::codec::{Codec, ContentType, Header};
use crate::network::frame::{read_frame, read_trailing_frame, write_frame};

/// `application/json`: human-readable encoding via serde_json.
#[derive(Debug)]
pub struct JsonCodec<S> {
    stream: S,
    max_frame_size: usize,
}

impl<S> JsonCodec<S> {
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

impl<S: Read + Write> JsonCodec<S> {
    fn decode<V: DeserializeOwned>(payload: &[u8]) -> Result<V, CodecError> {
        serde_json::from_slice(payload).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

impl<S: Read + Write> Codec for JsonCodec<S> {
    fn content_type(&self) -> ContentType {
        ContentType::Json
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
        let header_bytes =
            serde_json::to_vec(header).map_err(|e| CodecError::Encode(e.to_string()))?;
        let body_bytes = serde_json::to_vec(body).map_err(|e| CodecError::Encode(e.to_string()))?;

        write_frame(&mut self.stream, &header_bytes, self.max_frame_size)?;
        write_frame(&mut self.stream, &body_bytes, self.max_frame_size)?;
        self.stream.flush()?;
        Ok(())
    }
}
