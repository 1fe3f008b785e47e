//! Self-describing wire format for messages.
//!
//! Layout, all integers big-endian:
//!
//! ```text
//! [0xA1 0x60] [version:u8] [property count:u32]
//! repeated: [key len:u32][key bytes][value len:u32][value bytes]
//! [payload len:u32] [payload bytes]
//! ```
//!
//! Decoding is strict: magic, format version, every length field, 7-bit
//! property text, key uniqueness, and the absence of trailing bytes are all
//! verified before a message is produced.

// Layer 1: Standard library imports
use std::str;

// Layer 2: Third-party crate imports
use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

// Layer 3: Internal module imports
use super::properties::{MessageProperties, PropertyError};
use super::value::Message;

/// Two-byte stream marker preceding every encoded message.
pub const MESSAGE_MAGIC: [u8; 2] = [0xA1, 0x60];

/// Wire format version emitted by [`Message::to_bytes`].
pub const FORMAT_VERSION: u8 = 1;

/// Errors produced while encoding or decoding the message wire format.
#[derive(Debug, Error)]
pub enum MessageCodecError {
    /// The stream ended before a complete message was read
    #[error("message stream truncated: needed {needed} more byte(s) for {reading}")]
    Truncated {
        /// How many bytes were missing
        needed: usize,
        /// Which field was being read
        reading: &'static str,
    },

    /// The stream did not begin with the message magic
    #[error("bad message magic: {0:02x?}")]
    BadMagic([u8; 2]),

    /// The stream declares a format version this gateway does not support
    #[error("unsupported message format version: {0}")]
    UnsupportedVersion(u8),

    /// A property key or value failed validation
    #[error(transparent)]
    Property(#[from] PropertyError),

    /// The same property key appeared twice in one stream
    #[error("duplicate property key in stream: {0:?}")]
    DuplicateKey(String),

    /// A property key or value was not valid text
    #[error("property bytes are not valid text")]
    InvalidText,

    /// Bytes remained after the payload
    #[error("{0} trailing byte(s) after message payload")]
    TrailingBytes(usize),

    /// A length field exceeded the u32 range during encoding
    #[error("{field} length {len} exceeds the wire format limit")]
    LengthOverflow {
        /// Which field overflowed
        field: &'static str,
        /// The offending length
        len: usize,
    },
}

impl Message {
    /// Encode the message into its self-describing byte stream.
    ///
    /// Properties are written in the bag's insertion order, which makes the
    /// encoding deterministic for a given message.
    ///
    /// # Errors
    ///
    /// Returns [`MessageCodecError::LengthOverflow`] when the payload, a
    /// key, a value, or the property count does not fit a `u32`.
    pub fn to_bytes(&self) -> Result<Bytes, MessageCodecError> {
        let mut buf = BytesMut::with_capacity(16 + self.payload().len());

        buf.put_slice(&MESSAGE_MAGIC);
        buf.put_u8(FORMAT_VERSION);
        buf.put_u32(checked_len("property count", self.properties().len())?);
        for (key, value) in self.properties().iter() {
            buf.put_u32(checked_len("property key", key.len())?);
            buf.put_slice(key.as_bytes());
            buf.put_u32(checked_len("property value", value.len())?);
            buf.put_slice(value.as_bytes());
        }
        buf.put_u32(checked_len("payload", self.payload().len())?);
        buf.put_slice(self.payload());

        Ok(buf.freeze())
    }

    /// Decode a message from its self-describing byte stream.
    ///
    /// # Errors
    ///
    /// Returns a [`MessageCodecError`] describing the first malformed field:
    /// bad magic, unsupported version, truncation, invalid or duplicate
    /// properties, or trailing bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Message, MessageCodecError> {
        let mut input = data;

        let magic = read_slice(&mut input, 2, "magic")?;
        if magic != MESSAGE_MAGIC.as_slice() {
            return Err(MessageCodecError::BadMagic([magic[0], magic[1]]));
        }
        let version = read_slice(&mut input, 1, "version")?[0];
        if version != FORMAT_VERSION {
            return Err(MessageCodecError::UnsupportedVersion(version));
        }

        let property_count = read_u32(&mut input, "property count")?;
        let mut properties = MessageProperties::new();
        for _ in 0..property_count {
            let key_len = read_u32(&mut input, "property key length")? as usize;
            let key = read_text(&mut input, key_len, "property key")?;
            let value_len = read_u32(&mut input, "property value length")? as usize;
            let value = read_text(&mut input, value_len, "property value")?;

            if properties.contains_key(key) {
                return Err(MessageCodecError::DuplicateKey(key.to_owned()));
            }
            properties.set(key, value)?;
        }

        let payload_len = read_u32(&mut input, "payload length")? as usize;
        let payload = read_slice(&mut input, payload_len, "payload")?;
        let message = Message::new(Bytes::copy_from_slice(payload), properties);

        if !input.is_empty() {
            return Err(MessageCodecError::TrailingBytes(input.len()));
        }
        Ok(message)
    }
}

fn checked_len(field: &'static str, len: usize) -> Result<u32, MessageCodecError> {
    u32::try_from(len).map_err(|_| MessageCodecError::LengthOverflow { field, len })
}

fn read_slice<'a>(
    input: &mut &'a [u8],
    len: usize,
    reading: &'static str,
) -> Result<&'a [u8], MessageCodecError> {
    if input.len() < len {
        return Err(MessageCodecError::Truncated {
            needed: len - input.len(),
            reading,
        });
    }
    let (head, tail) = input.split_at(len);
    *input = tail;
    Ok(head)
}

fn read_u32(input: &mut &[u8], reading: &'static str) -> Result<u32, MessageCodecError> {
    let bytes = read_slice(input, 4, reading)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_text<'a>(
    input: &mut &'a [u8],
    len: usize,
    reading: &'static str,
) -> Result<&'a str, MessageCodecError> {
    let bytes = read_slice(input, len, reading)?;
    str::from_utf8(bytes).map_err(|_| MessageCodecError::InvalidText)
}
