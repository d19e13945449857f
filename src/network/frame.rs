//! Length-prefixed framing shared by every codec: a big-endian `u32` payload length
//! followed by the payload.

use std::io::{self, ErrorKind, Read, Write};

use log::{trace, warn};

use crate::common::exception::CodecError;

const LENGTH_PREFIX_SIZE: usize = 4;

pub(crate) fn write_frame<W: Write>(
    writer: &mut W,
    payload: &[u8],
    max_frame_size: usize,
) -> Result<(), CodecError> {
    check_size(payload.len(), max_frame_size)?;
    let length = u32::try_from(payload.len()).map_err(|_| CodecError::FrameTooLarge {
        size: payload.len(),
        limit: max_frame_size,
    })?;

    writer.write_all(&length.to_be_bytes())?;
    writer.write_all(payload)?;
    trace!("Wrote frame of {} bytes", payload.len());
    Ok(())
}

/// Reads one frame. A stream that ends exactly at a frame boundary yields
/// [`CodecError::Closed`]; one that ends inside the length prefix or the payload
/// is an I/O error.
pub(crate) fn read_frame<R: Read>(
    reader: &mut R,
    max_frame_size: usize,
) -> Result<Vec<u8>, CodecError> {
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    let mut filled = 0;
    while filled < LENGTH_PREFIX_SIZE {
        match reader.read(&mut prefix[filled..]) {
            Ok(0) if filled == 0 => return Err(CodecError::Closed),
            Ok(0) => {
                return Err(CodecError::Io(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "stream ended inside a frame length prefix",
                )));
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    let length = u32::from_be_bytes(prefix) as usize;
    check_size(length, max_frame_size)?;

    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload)?;
    trace!("Read frame of {} bytes", length);
    Ok(payload)
}

/// Reads a frame that must follow one already read, such as a body after its
/// header. End of stream here is an I/O error, never [`CodecError::Closed`].
pub(crate) fn read_trailing_frame<R: Read>(
    reader: &mut R,
    max_frame_size: usize,
) -> Result<Vec<u8>, CodecError> {
    read_frame(reader, max_frame_size).map_err(|err| match err {
        CodecError::Closed => CodecError::Io(io::Error::new(
            ErrorKind::UnexpectedEof,
            "stream ended before the message body",
        )),
        other => other,
    })
}

fn check_size(size: usize, limit: usize) -> Result<(), CodecError> {
    if size > limit {
        warn!("Rejecting frame of {} bytes (limit {})", size, limit);
        return Err(CodecError::FrameTooLarge { size, limit });
    }
    Ok(())
}
