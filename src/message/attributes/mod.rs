pub mod address;
pub mod error;

use bytes::{BufMut, BytesMut};
use num_enum::TryFromPrimitive;

use std::net::SocketAddr;

use crate::{crypto::Credential, StunError};

pub use self::{
    address::Addr,
    error::{ErrorCode, ErrorKind},
};

/// STUN Attributes Registry
///
/// [RFC8489]: https://datatracker.ietf.org/doc/html/rfc8489
///
/// A STUN attribute type is a hex number in the range 0x0000-0xFFFF.
/// Types in the range 0x0000-0x7FFF are comprehension-required; types in
/// the range 0x8000-0xFFFF are comprehension-optional. An unrecognized
/// code in either range is currently a decode error; tolerating unknown
/// comprehension-optional attributes per [RFC8489] is a known gap.
#[repr(u16)]
#[derive(TryFromPrimitive, PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum AttributeType {
    MappedAddress = 0x0001,
    UserName = 0x0006,
    MessageIntegrity = 0x0008,
    ErrorCode = 0x0009,
    UnknownAttributes = 0x000A,
    Realm = 0x0014,
    Nonce = 0x0015,
    XorMappedAddress = 0x0020,
    Software = 0x8022,
    AlternateServer = 0x8023,
    Fingerprint = 0x8028,
}

impl AttributeType {
    /// whether agents must comprehend this attribute to process the
    /// message.
    ///
    /// # Test
    ///
    /// ```
    /// use stun_agent::AttributeType;
    ///
    /// assert!(AttributeType::MappedAddress.is_comprehension_required());
    /// assert!(!AttributeType::Fingerprint.is_comprehension_required());
    /// ```
    pub fn is_comprehension_required(self) -> bool {
        (self as u16) < 0x8000
    }
}

/// a decoded attribute value.
///
/// USERNAME, REALM, NONCE and SOFTWARE are UTF-8 text; addresses are
/// decoded to their un-XOR'ed socket address; MESSAGE-INTEGRITY and
/// FINGERPRINT carry the digest and checksum read from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    MappedAddress(SocketAddr),
    XorMappedAddress(SocketAddr),
    UserName(String),
    MessageIntegrity([u8; 20]),
    ErrorCode(ErrorCode),
    UnknownAttributes(Vec<u16>),
    Realm(String),
    Nonce(String),
    Software(String),
    AlternateServer(SocketAddr),
    Fingerprint(u32),
}

impl AttrValue {
    pub fn attr_type(&self) -> AttributeType {
        match self {
            Self::MappedAddress(_) => AttributeType::MappedAddress,
            Self::XorMappedAddress(_) => AttributeType::XorMappedAddress,
            Self::UserName(_) => AttributeType::UserName,
            Self::MessageIntegrity(_) => AttributeType::MessageIntegrity,
            Self::ErrorCode(_) => AttributeType::ErrorCode,
            Self::UnknownAttributes(_) => AttributeType::UnknownAttributes,
            Self::Realm(_) => AttributeType::Realm,
            Self::Nonce(_) => AttributeType::Nonce,
            Self::Software(_) => AttributeType::Software,
            Self::AlternateServer(_) => AttributeType::AlternateServer,
            Self::Fingerprint(_) => AttributeType::Fingerprint,
        }
    }
}

/// a decoded attribute: the value length as declared on the wire
/// (before padding) and the typed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub length: u16,
    pub value: AttrValue,
}

/// an attribute description for encoding.
///
/// Differs from [`AttrValue`] where the wire value requires dependent
/// computation: MESSAGE-INTEGRITY takes the credentials to key the
/// digest with, FINGERPRINT takes no payload at all; both are computed
/// over the accumulated message during encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrSpec<'a> {
    MappedAddress(SocketAddr),
    XorMappedAddress(SocketAddr),
    UserName(&'a str),
    MessageIntegrity(Credential<'a>),
    ErrorCode(ErrorCode),
    UnknownAttributes(Vec<u16>),
    Realm(&'a str),
    Nonce(&'a str),
    Software(&'a str),
    AlternateServer(SocketAddr),
    Fingerprint,
}

impl AttrSpec<'_> {
    pub fn attr_type(&self) -> AttributeType {
        match self {
            Self::MappedAddress(_) => AttributeType::MappedAddress,
            Self::XorMappedAddress(_) => AttributeType::XorMappedAddress,
            Self::UserName(_) => AttributeType::UserName,
            Self::MessageIntegrity(_) => AttributeType::MessageIntegrity,
            Self::ErrorCode(_) => AttributeType::ErrorCode,
            Self::UnknownAttributes(_) => AttributeType::UnknownAttributes,
            Self::Realm(_) => AttributeType::Realm,
            Self::Nonce(_) => AttributeType::Nonce,
            Self::Software(_) => AttributeType::Software,
            Self::AlternateServer(_) => AttributeType::AlternateServer,
            Self::Fingerprint => AttributeType::Fingerprint,
        }
    }
}

/// decode one attribute value by its registered type.
pub(crate) fn decode_value(
    kind: AttributeType,
    value: &[u8],
    transaction_id: &[u8],
) -> Result<AttrValue, StunError> {
    Ok(match kind {
        AttributeType::MappedAddress => {
            AttrValue::MappedAddress(Addr::decode(value, transaction_id, false)?)
        }
        AttributeType::XorMappedAddress => {
            AttrValue::XorMappedAddress(Addr::decode(value, transaction_id, true)?)
        }
        AttributeType::AlternateServer => {
            AttrValue::AlternateServer(Addr::decode(value, transaction_id, false)?)
        }
        AttributeType::UserName => AttrValue::UserName(std::str::from_utf8(value)?.to_string()),
        AttributeType::Realm => AttrValue::Realm(std::str::from_utf8(value)?.to_string()),
        AttributeType::Nonce => AttrValue::Nonce(std::str::from_utf8(value)?.to_string()),
        AttributeType::Software => AttrValue::Software(std::str::from_utf8(value)?.to_string()),
        AttributeType::ErrorCode => AttrValue::ErrorCode(ErrorCode::decode(value)?),
        AttributeType::UnknownAttributes => {
            if value.len() % 2 != 0 {
                return Err(StunError::InvalidAttributeValue("UNKNOWN-ATTRIBUTES"));
            }

            AttrValue::UnknownAttributes(
                value
                    .chunks_exact(2)
                    .map(|it| u16::from_be_bytes([it[0], it[1]]))
                    .collect(),
            )
        }
        AttributeType::MessageIntegrity => {
            if value.len() != 20 {
                return Err(StunError::InvalidAttributeValue("MESSAGE-INTEGRITY"));
            }

            AttrValue::MessageIntegrity(value.try_into()?)
        }
        AttributeType::Fingerprint => {
            if value.len() != 4 {
                return Err(StunError::InvalidAttributeValue("FINGERPRINT"));
            }

            AttrValue::Fingerprint(u32::from_be_bytes(value.try_into()?))
        }
    })
}

/// encode one independent attribute value.
///
/// MESSAGE-INTEGRITY and FINGERPRINT are not handled here: their values
/// depend on the accumulated message and are computed by the message
/// encoder.
pub(crate) fn encode_value(spec: &AttrSpec, transaction_id: &[u8], bytes: &mut BytesMut) {
    match spec {
        AttrSpec::MappedAddress(addr) => Addr::encode(addr, transaction_id, bytes, false),
        AttrSpec::XorMappedAddress(addr) => Addr::encode(addr, transaction_id, bytes, true),
        AttrSpec::AlternateServer(addr) => Addr::encode(addr, transaction_id, bytes, false),
        AttrSpec::UserName(value)
        | AttrSpec::Realm(value)
        | AttrSpec::Nonce(value)
        | AttrSpec::Software(value) => bytes.put(value.as_bytes()),
        AttrSpec::ErrorCode(error) => error.encode(bytes),
        AttrSpec::UnknownAttributes(codes) => {
            for code in codes {
                bytes.put_u16(*code);
            }
        }
        AttrSpec::MessageIntegrity(_) | AttrSpec::Fingerprint => {
            unreachable!("dependent attributes are encoded by the message encoder")
        }
    }
}
