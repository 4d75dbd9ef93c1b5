//! Wayland wire format
//!
//! A message is a two-word header followed by 32-bit aligned arguments:
//! `[object id][size << 16 | opcode][args...]`, all in host byte order.

use thiserror::Error;

/// Size of the object id + size/opcode header
pub const HEADER_SIZE: usize = 8;

/// Wire encoding/decoding errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("message truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("declared message size {0} is smaller than the header")]
    BadSize(usize),

    #[error("message of {0} bytes does not fit the 16-bit size field")]
    TooLarge(usize),

    #[error("string argument is not NUL-terminated UTF-8")]
    BadString,
}

/// Signed 24.8 fixed-point number (`wl_fixed_t`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fixed(i32);

impl Fixed {
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    pub const fn from_int(value: i32) -> Self {
        Self(value.wrapping_shl(8))
    }

    /// Nearest representable value, saturating at the raw i32 range
    pub fn from_f64(value: f64) -> Self {
        Self((value * 256.0).round() as i32)
    }

    pub fn to_f64(self) -> f64 {
        f64::from(self.0) / 256.0
    }
}

/// Builds a single encoded message
#[derive(Debug)]
pub struct MessageBuilder {
    object_id: u32,
    opcode: u16,
    args: Vec<u8>,
}

impl MessageBuilder {
    pub fn new(object_id: u32, opcode: u16) -> Self {
        Self {
            object_id,
            opcode,
            args: Vec::new(),
        }
    }

    pub fn uint(mut self, value: u32) -> Self {
        self.args.extend_from_slice(&value.to_ne_bytes());
        self
    }

    /// Object argument; `None` encodes a null object
    pub fn object(self, id: Option<u32>) -> Self {
        self.uint(id.unwrap_or(0))
    }

    /// String argument; `None` encodes a null string
    pub fn string(mut self, value: Option<&str>) -> Self {
        let Some(value) = value else {
            return self.uint(0);
        };
        let len = value.len() + 1;
        self.args.extend_from_slice(&(len as u32).to_ne_bytes());
        self.args.extend_from_slice(value.as_bytes());
        self.args.push(0);
        let padding = (4 - len % 4) % 4;
        self.args.extend(std::iter::repeat_n(0u8, padding));
        self
    }

    /// Encode header and arguments
    pub fn build(self) -> Result<Vec<u8>, WireError> {
        let size = HEADER_SIZE + self.args.len();
        if size > usize::from(u16::MAX) {
            return Err(WireError::TooLarge(size));
        }

        let mut buf = Vec::with_capacity(size);
        buf.extend_from_slice(&self.object_id.to_ne_bytes());
        let word = ((size as u32) << 16) | u32::from(self.opcode);
        buf.extend_from_slice(&word.to_ne_bytes());
        buf.extend_from_slice(&self.args);
        Ok(buf)
    }
}

/// Decoded view of one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message<'a> {
    pub object_id: u32,
    pub opcode: u16,
    args: &'a [u8],
}

impl<'a> Message<'a> {
    /// Decode the first message of `buf`, returning it and the remaining bytes.
    pub fn split(buf: &'a [u8]) -> Result<(Self, &'a [u8]), WireError> {
        let object_id = read_word(buf, 0)?;
        let word = read_word(buf, 4)?;
        let size = (word >> 16) as usize;
        if size < HEADER_SIZE {
            return Err(WireError::BadSize(size));
        }
        if buf.len() < size {
            return Err(WireError::Truncated {
                needed: size,
                available: buf.len(),
            });
        }

        let message = Self {
            object_id,
            opcode: (word & 0xffff) as u16,
            args: &buf[HEADER_SIZE..size],
        };
        Ok((message, &buf[size..]))
    }

    /// Decode a buffer holding exactly one message.
    pub fn parse(buf: &'a [u8]) -> Result<Self, WireError> {
        let (message, rest) = Self::split(buf)?;
        if !rest.is_empty() {
            return Err(WireError::BadSize(message.size()));
        }
        Ok(message)
    }

    /// Total encoded size including the header
    pub fn size(&self) -> usize {
        HEADER_SIZE + self.args.len()
    }

    pub fn args(&self) -> ArgReader<'a> {
        ArgReader { buf: self.args }
    }
}

/// Sequential argument reader
#[derive(Debug, Clone)]
pub struct ArgReader<'a> {
    buf: &'a [u8],
}

impl<'a> ArgReader<'a> {
    pub fn uint(&mut self) -> Result<u32, WireError> {
        let value = read_word(self.buf, 0)?;
        self.buf = &self.buf[4..];
        Ok(value)
    }

    pub fn object(&mut self) -> Result<Option<u32>, WireError> {
        Ok(Some(self.uint()?).filter(|&id| id != 0))
    }

    pub fn string(&mut self) -> Result<Option<&'a str>, WireError> {
        let len = self.uint()? as usize;
        if len == 0 {
            return Ok(None);
        }
        let padded = len.div_ceil(4) * 4;
        if self.buf.len() < padded {
            return Err(WireError::Truncated {
                needed: padded,
                available: self.buf.len(),
            });
        }
        let (bytes, nul) = (&self.buf[..len - 1], self.buf[len - 1]);
        if nul != 0 {
            return Err(WireError::BadString);
        }
        let value = std::str::from_utf8(bytes).map_err(|_| WireError::BadString)?;
        self.buf = &self.buf[padded..];
        Ok(Some(value))
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

fn read_word(buf: &[u8], offset: usize) -> Result<u32, WireError> {
    let bytes = buf
        .get(offset..offset + 4)
        .ok_or(WireError::Truncated {
            needed: offset + 4,
            available: buf.len(),
        })?;
    Ok(u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let buf = MessageBuilder::new(7, 11).object(None).build().unwrap();
        assert_eq!(buf.len(), 12);
        assert_eq!(u32::from_ne_bytes(buf[0..4].try_into().unwrap()), 7);
        let word = u32::from_ne_bytes(buf[4..8].try_into().unwrap());
        assert_eq!(word >> 16, 12);
        assert_eq!(word & 0xffff, 11);
    }

    #[test]
    fn test_string_padding() {
        // "abc" + NUL is already aligned, "abcd" + NUL needs three pad bytes
        let aligned = MessageBuilder::new(1, 0).string(Some("abc")).build().unwrap();
        assert_eq!(aligned.len(), HEADER_SIZE + 4 + 4);
        let padded = MessageBuilder::new(1, 0).string(Some("abcd")).build().unwrap();
        assert_eq!(padded.len(), HEADER_SIZE + 4 + 8);

        let message = Message::parse(&padded).unwrap();
        let mut args = message.args();
        assert_eq!(args.string().unwrap(), Some("abcd"));
        assert!(args.is_empty());
    }

    #[test]
    fn test_null_string_and_object() {
        let buf = MessageBuilder::new(3, 1)
            .string(None)
            .object(Some(42))
            .object(None)
            .build()
            .unwrap();
        let message = Message::parse(&buf).unwrap();
        let mut args = message.args();
        assert_eq!(args.string().unwrap(), None);
        assert_eq!(args.object().unwrap(), Some(42));
        assert_eq!(args.object().unwrap(), None);
    }

    #[test]
    fn test_parse_rejects_truncated_buffer() {
        let buf = MessageBuilder::new(1, 2).uint(5).build().unwrap();
        assert!(matches!(
            Message::parse(&buf[..10]),
            Err(WireError::Truncated { needed: 12, available: 10 })
        ));
        assert!(matches!(Message::parse(&buf[..4]), Err(WireError::Truncated { .. })));
    }

    #[test]
    fn test_too_large() {
        let title = "x".repeat(70_000);
        let err = MessageBuilder::new(1, 2).string(Some(title.as_str())).build().unwrap_err();
        assert!(matches!(err, WireError::TooLarge(_)));
    }

    #[test]
    fn test_fixed_conversions() {
        assert_eq!(Fixed::from_int(3).raw(), 768);
        assert_eq!(Fixed::from_f64(1.5).raw(), 384);
        assert_eq!(Fixed::from_f64(-0.25).to_f64(), -0.25);
        assert_eq!(Fixed::from_raw(1).to_f64(), 1.0 / 256.0);
    }
}
