//! Length-prefixed framing for byte-stream transports.
//!
//! Layout: `[len: u32 big-endian][bytes: len]`. Used when links are carried
//! over TCP rather than in-process queues; message boundaries must survive
//! arbitrary segmentation.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{
    errors::{Result, WireError},
    wire::MAX_MESSAGE_SIZE,
};

/// Size of the length prefix
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Write one frame carrying `message`.
///
/// # Errors
///
/// - `TooLarge` if `message` exceeds [`MAX_MESSAGE_SIZE`]
pub fn encode_frame(message: &[u8], dst: &mut impl BufMut) -> Result<()> {
    let len = checked_len(message.len())?;
    dst.put_u32(len);
    dst.put_slice(message);
    Ok(())
}

/// Validate a length prefix read from the stream.
///
/// # Errors
///
/// - `TooLarge` if the claimed length exceeds [`MAX_MESSAGE_SIZE`]
pub fn parse_length(prefix: [u8; LENGTH_PREFIX_SIZE]) -> Result<usize> {
    let len = u32::from_be_bytes(prefix) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(WireError::TooLarge { size: len, max: MAX_MESSAGE_SIZE });
    }
    Ok(len)
}

/// Take one complete frame off the front of `src`.
///
/// Returns `Ok(None)` if `src` does not yet hold a complete frame; nothing is
/// consumed in that case.
///
/// # Errors
///
/// - `TooLarge` if the prefix claims more than [`MAX_MESSAGE_SIZE`]; the
///   stream cannot be resynchronized after this
pub fn decode_frame(src: &mut BytesMut) -> Result<Option<Bytes>> {
    let Some(prefix) = src.get(..LENGTH_PREFIX_SIZE) else {
        return Ok(None);
    };

    let mut header = [0u8; LENGTH_PREFIX_SIZE];
    header.copy_from_slice(prefix);
    let len = parse_length(header)?;

    if src.len() < LENGTH_PREFIX_SIZE + len {
        return Ok(None);
    }

    src.advance(LENGTH_PREFIX_SIZE);
    Ok(Some(src.split_to(len).freeze()))
}

fn checked_len(len: usize) -> Result<u32> {
    if len > MAX_MESSAGE_SIZE {
        return Err(WireError::TooLarge { size: len, max: MAX_MESSAGE_SIZE });
    }
    // MAX_MESSAGE_SIZE < u32::MAX
    Ok(len as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_frame_is_not_consumed() {
        let mut wire = BytesMut::new();
        encode_frame(b"hello", &mut wire).unwrap();
        let mut partial = BytesMut::from(&wire[..6]);

        assert_eq!(decode_frame(&mut partial).unwrap(), None);
        assert_eq!(partial.len(), 6);
    }

    #[test]
    fn consecutive_frames_keep_boundaries() {
        let mut wire = BytesMut::new();
        encode_frame(b"first", &mut wire).unwrap();
        encode_frame(b"", &mut wire).unwrap();
        encode_frame(b"third", &mut wire).unwrap();

        assert_eq!(decode_frame(&mut wire).unwrap().as_deref(), Some(&b"first"[..]));
        assert_eq!(decode_frame(&mut wire).unwrap().as_deref(), Some(&b""[..]));
        assert_eq!(decode_frame(&mut wire).unwrap().as_deref(), Some(&b"third"[..]));
        assert!(wire.is_empty());
    }

    #[test]
    fn oversized_prefix_is_rejected() {
        let prefix = ((MAX_MESSAGE_SIZE + 1) as u32).to_be_bytes();
        assert!(matches!(parse_length(prefix), Err(WireError::TooLarge { .. })));
    }
}
