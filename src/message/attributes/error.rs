use bytes::{BufMut, BytesMut};

use crate::StunError;

/// recommended error codes.
///
/// The class (hundreds digit) lives in the high byte, the number in the
/// low byte, matching the wire layout.
#[repr(u16)]
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum ErrorKind {
    TryAlternate = 0x0300,
    BadRequest = 0x0400,
    Unauthorized = 0x0401,
    UnknownAttribute = 0x0414,
    StaleNonce = 0x0426,
    ServerError = 0x0500,
}

/// ERROR-CODE attribute value.
///
/// ```text
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           Reserved, should be 0         |Class|     Number    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      Reason Phrase (variable)                                ..
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, Debug, Eq)]
pub struct ErrorCode {
    pub code: u16,
    pub reason: String,
}

impl ErrorCode {
    /// create an error value with its recommended reason phrase.
    ///
    /// # Test
    ///
    /// ```
    /// use stun_agent::message::attributes::error::{ErrorCode, ErrorKind};
    ///
    /// let error = ErrorCode::from(ErrorKind::TryAlternate);
    /// assert_eq!(error.code, 0x0300);
    /// assert_eq!(error.reason, "Try Alternate");
    /// ```
    pub fn from(kind: ErrorKind) -> Self {
        Self {
            code: kind as u16,
            reason: reason_of(kind).to_string(),
        }
    }

    pub(crate) fn encode(&self, bytes: &mut BytesMut) {
        bytes.put_u16(0x0000);
        bytes.put_u16(self.code);
        bytes.put(self.reason.as_bytes());
    }

    /// # Test
    ///
    /// ```
    /// use stun_agent::message::attributes::error::{ErrorCode, ErrorKind};
    ///
    /// let buffer = [
    ///     0x00u8, 0x00, 0x03, 0x00, 0x54, 0x72, 0x79, 0x20, 0x41, 0x6c, 0x74,
    ///     0x65, 0x72, 0x6e, 0x61, 0x74, 0x65,
    /// ];
    ///
    /// let error = ErrorCode::decode(&buffer).unwrap();
    /// assert_eq!(error, ErrorCode::from(ErrorKind::TryAlternate));
    /// ```
    pub fn decode(value: &[u8]) -> Result<Self, StunError> {
        if value.len() < 4 {
            return Err(StunError::InvalidAttributeValue("ERROR-CODE"));
        }

        if u16::from_be_bytes([value[0], value[1]]) != 0x0000 {
            return Err(StunError::InvalidAttributeValue("ERROR-CODE"));
        }

        Ok(Self {
            code: u16::from_be_bytes([value[2], value[3]]),
            reason: std::str::from_utf8(&value[4..])?.to_string(),
        })
    }
}

impl PartialEq for ErrorCode {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

#[rustfmt::skip]
fn reason_of(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::TryAlternate => "Try Alternate",
        ErrorKind::BadRequest => "Bad Request",
        ErrorKind::Unauthorized => "Unauthorized",
        ErrorKind::UnknownAttribute => "Unknown Attribute",
        ErrorKind::StaleNonce => "Stale Nonce",
        ErrorKind::ServerError => "Server Error",
    }
}
