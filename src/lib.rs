//! ## Session Traversal Utilities for NAT (STUN)
//!
//! [RFC8489]: https://tools.ietf.org/html/rfc8489
//!
//! STUN is a binary request/response protocol that lets an endpoint
//! behind a NAT discover the public-facing transport address a server
//! observes for it. This crate implements the [RFC8489] wire format
//! (header and attribute codecs, including the XOR'd address, keyed
//! digest and checksum attributes) together with the client transaction
//! layer that turns a single best-effort datagram exchange, or a single
//! stream exchange, into a request/response transaction with bounded
//! failure.
//!
//! ### STUN Message Structure
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |0 0|     STUN Message Type     |         Message Length        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         Magic Cookie                          |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                                                               |
//! |                     Transaction ID (96 bits)                  |
//! |                                                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! ### STUN Attributes
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |         Type                  |            Length             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         Value (variable)                ....
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

pub mod agent;
pub mod crypto;
pub mod message;
pub mod server;

pub use self::{
    agent::{
        create_agent, Agent, AgentConfig, AgentError, Protocol, TcpAgent, TcpConfig, UdpAgent,
        UdpConfig,
    },
    crypto::Credential,
    message::{
        attributes::{AttrSpec, AttrValue, Attribute, AttributeType},
        decode_message, encode_message,
        header::{Class, Header, Method},
        transaction_id, validate_envelope, verify_integrity, StunMessage, MAGIC_COOKIE,
    },
    server::Server,
};

use thiserror::Error;

/// Codec failure.
///
/// Every decode error identifies the offending value; an encode or
/// decode either fully succeeds or fails with no partial result.
#[derive(Debug, Error)]
pub enum StunError {
    #[error("invalid stun message; expected length >= 20 bytes, actual is {0}")]
    TooShort(usize),
    #[error("invalid stun message; expected length to be a multiple of 4 bytes, actual is {0}")]
    NotAligned(usize),
    #[error("invalid stun message; the most significant 2 bits must be zeros")]
    LeadingBitsNotZero,
    #[error("invalid magic cookie; actual is 0x{0:08x}")]
    InvalidMagicCookie(u32),
    #[error("invalid stun message; declared length {declared} exceeds remaining {remaining} bytes")]
    BadMessageLength { declared: usize, remaining: usize },
    #[error("0x{0:04x} is not a known method")]
    UnknownMethod(u16),
    #[error("0b{0:02b} is not a known class")]
    UnknownClass(u8),
    #[error("0x{0:04x} is not a known attribute type")]
    UnknownAttributeType(u16),
    #[error("attribute value length {declared} exceeds remaining {remaining} bytes")]
    AttributeOverflow { declared: usize, remaining: usize },
    #[error("invalid address family: 0x{0:02x}")]
    InvalidAddressFamily(u8),
    #[error("invalid {0} attribute value")]
    InvalidAttributeValue(&'static str),
    #[error("FINGERPRINT must be the last attribute")]
    FingerprintNotLast,
    #[error("message does not carry a MESSAGE-INTEGRITY attribute")]
    NotFoundIntegrity,
    #[error("MESSAGE-INTEGRITY digest mismatch")]
    IntegrityFailed,
    #[error("digest computation failed")]
    SummaryFailed,
    #[error("Utf8Error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),
    #[error("TryFromSliceError: {0}")]
    TryFromSliceError(#[from] std::array::TryFromSliceError),
}
