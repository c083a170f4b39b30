pub mod attributes;
pub mod header;

use bytes::{BufMut, BytesMut};
use rand::Rng;

use crate::{
    crypto::{fingerprint, hmac_sha1, Credential},
    StunError,
};

use self::{
    attributes::{AttrSpec, Attribute, AttributeType},
    header::{decode_header, encode_header, Class, Header, Method},
};

/// The magic cookie field MUST contain the fixed value 0x2112A442 in
/// network byte order.
pub const MAGIC_COOKIE: u32 = 0x2112A442;

const INTEGRITY_VALUE_LEN: u16 = 20;
const FINGERPRINT_VALUE_LEN: u16 = 4;

/// A decoded message: the fixed header and the attributes in wire
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StunMessage {
    pub header: Header,
    pub attributes: Vec<Attribute>,
}

impl StunMessage {
    /// first attribute value of the given type, in wire order.
    pub fn get(&self, kind: AttributeType) -> Option<&attributes::AttrValue> {
        self.attributes
            .iter()
            .find(|it| it.value.attr_type() == kind)
            .map(|it| &it.value)
    }
}

/// compute padding size.
///
/// RFC5766 rules that padding must be added at the end of the message,
/// and the padding size must be a multiple of 4.
///
/// # Test
///
/// ```
/// use stun_agent::message::alignment_32;
///
/// assert_eq!(alignment_32(4), 0);
/// assert_eq!(alignment_32(0), 0);
/// assert_eq!(alignment_32(5), 3);
/// ```
pub fn alignment_32(size: usize) -> usize {
    let pad = size % 4;
    if pad == 0 {
        0
    } else {
        4 - pad
    }
}

/// generate a fresh 96-bit transaction id.
///
/// Cryptographic randomness is not required, only uniform unpredictable
/// selection from the id space.
pub fn transaction_id() -> [u8; 12] {
    let mut id = [0u8; 12];
    rand::rng().fill(&mut id[..]);
    id
}

/// structural checks a datagram must pass before it is worth parsing.
///
/// # Test
///
/// ```
/// use stun_agent::{validate_envelope, StunError};
///
/// let buffer = [
///     0x00u8, 0x01, 0x00, 0x00, 0x21, 0x12, 0xa4, 0x42, 0x81, 0x4c, 0x72,
///     0x09, 0xa7, 0x68, 0xf9, 0x89, 0xf8, 0x0b, 0x73, 0xbd,
/// ];
///
/// assert!(validate_envelope(&buffer).is_ok());
/// assert!(matches!(
///     validate_envelope(&buffer[..8]),
///     Err(StunError::TooShort(8))
/// ));
/// assert!(matches!(
///     validate_envelope(&[0u8; 21]),
///     Err(StunError::NotAligned(21))
/// ));
/// ```
pub fn validate_envelope(bytes: &[u8]) -> Result<(), StunError> {
    if bytes.len() < 20 {
        return Err(StunError::TooShort(bytes.len()));
    }

    if bytes.len() % 4 != 0 {
        return Err(StunError::NotAligned(bytes.len()));
    }

    if bytes[0] >> 6 != 0 {
        return Err(StunError::LeadingBitsNotZero);
    }

    let cookie = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if cookie != MAGIC_COOKIE {
        return Err(StunError::InvalidMagicCookie(cookie));
    }

    Ok(())
}

/// encode a complete message.
///
/// Attributes are written in the given order; MESSAGE-INTEGRITY and
/// FINGERPRINT are computed over the message accumulated before them,
/// with the header length field patched to the value it will carry once
/// the attribute itself is appended. FINGERPRINT, when present, must be
/// the last attribute.
///
/// # Test
///
/// ```
/// use stun_agent::{encode_message, AttrSpec, Class, Method};
///
/// let expected = [
///     0x00u8, 0x01, 0x00, 0x0c, 0x21, 0x12, 0xa4, 0x42, 0x81, 0x4c, 0x72,
///     0x09, 0xa7, 0x68, 0xf9, 0x89, 0xf8, 0x0b, 0x73, 0xbd, 0x00, 0x20, 0x00,
///     0x08, 0x00, 0x01, 0x11, 0x2b, 0xe8, 0xd5, 0x61, 0x1b,
/// ];
///
/// let transaction_id = [
///     0x81u8, 0x4c, 0x72, 0x09, 0xa7, 0x68, 0xf9, 0x89, 0xf8, 0x0b, 0x73, 0xbd,
/// ];
///
/// let buffer = encode_message(
///     Class::Request,
///     Method::Binding,
///     &transaction_id,
///     &[AttrSpec::XorMappedAddress("201.199.197.89:12345".parse().unwrap())],
/// )
/// .unwrap();
///
/// assert_eq!(&buffer[..], &expected);
/// ```
pub fn encode_message(
    class: Class,
    method: Method,
    transaction_id: &[u8; 12],
    attrs: &[AttrSpec],
) -> Result<BytesMut, StunError> {
    for (i, attr) in attrs.iter().enumerate() {
        if attr.attr_type() == AttributeType::Fingerprint && i != attrs.len() - 1 {
            return Err(StunError::FingerprintNotLast);
        }
    }

    let mut bytes = BytesMut::with_capacity(1500);
    encode_header(class, method, 0, transaction_id, &mut bytes);

    for attr in attrs {
        match attr {
            AttrSpec::MessageIntegrity(credential) => {
                append_integrity(credential, &mut bytes)?;
            }
            AttrSpec::Fingerprint => {
                append_fingerprint(&mut bytes);
            }
            independent => {
                append_value(independent, transaction_id, &mut bytes);
            }
        }
    }

    let length = (bytes.len() - 20) as u16;
    bytes[2..4].copy_from_slice(&length.to_be_bytes());
    Ok(bytes)
}

/// write one independent attribute: type, placeholder length, value,
/// length patch, zero padding.
fn append_value(attr: &AttrSpec, transaction_id: &[u8], bytes: &mut BytesMut) {
    bytes.put_u16(attr.attr_type() as u16);

    let length_offset = bytes.len();
    bytes.put_u16(0);

    let value_offset = bytes.len();
    attributes::encode_value(attr, transaction_id, bytes);

    let length = (bytes.len() - value_offset) as u16;
    bytes[length_offset..length_offset + 2].copy_from_slice(&length.to_be_bytes());

    for _ in 0..alignment_32(length as usize) {
        bytes.put_u8(0);
    }
}

/// append MESSAGE-INTEGRITY.
///
/// The digest covers the message up to this attribute, with the header
/// length patched as if the 24-byte attribute were already included.
fn append_integrity(credential: &Credential, bytes: &mut BytesMut) -> Result<(), StunError> {
    let length = (bytes.len() + 4) as u16;
    bytes[2..4].copy_from_slice(&length.to_be_bytes());

    let digest = hmac_sha1(&credential.key(), &[&bytes[..]])?;
    bytes.put_u16(AttributeType::MessageIntegrity as u16);
    bytes.put_u16(INTEGRITY_VALUE_LEN);
    bytes.put(digest.as_slice());
    Ok(())
}

/// append FINGERPRINT.
///
/// Same length patching discipline as the integrity digest, with the
/// 8-byte attribute counted in.
fn append_fingerprint(bytes: &mut BytesMut) {
    let length = (bytes.len() - 20 + 8) as u16;
    bytes[2..4].copy_from_slice(&length.to_be_bytes());

    let checksum = fingerprint(&bytes[..]);
    bytes.put_u16(AttributeType::Fingerprint as u16);
    bytes.put_u16(FINGERPRINT_VALUE_LEN);
    bytes.put_u32(checksum);
}

/// decode a complete message.
///
/// The buffer must pass [`validate_envelope`], the declared length must
/// match the bytes actually present, and every attribute type must be
/// recognized.
///
/// # Test
///
/// ```
/// use stun_agent::{decode_message, AttrValue, AttributeType, Class, Method};
///
/// let buffer = [
///     0x00u8, 0x01, 0x00, 0x0c, 0x21, 0x12, 0xa4, 0x42, 0x81, 0x4c, 0x72,
///     0x09, 0xa7, 0x68, 0xf9, 0x89, 0xf8, 0x0b, 0x73, 0xbd, 0x00, 0x20, 0x00,
///     0x08, 0x00, 0x01, 0x11, 0x2b, 0xe8, 0xd5, 0x61, 0x1b,
/// ];
///
/// let message = decode_message(&buffer).unwrap();
/// assert_eq!(message.header.class, Class::Request);
/// assert_eq!(message.header.method, Method::Binding);
/// assert_eq!(message.header.length, 12);
///
/// let addr = "201.199.197.89:12345".parse().unwrap();
/// assert_eq!(
///     message.get(AttributeType::XorMappedAddress),
///     Some(&AttrValue::XorMappedAddress(addr))
/// );
/// ```
pub fn decode_message(bytes: &[u8]) -> Result<StunMessage, StunError> {
    validate_envelope(bytes)?;

    let header = decode_header(bytes)?;
    if header.length as usize != bytes.len() - 20 {
        return Err(StunError::BadMessageLength {
            declared: header.length as usize,
            remaining: bytes.len() - 20,
        });
    }

    let mut attributes = Vec::new();
    let mut offset = 20;

    while offset < bytes.len() {
        if bytes.len() - offset < 4 {
            return Err(StunError::AttributeOverflow {
                declared: 4,
                remaining: bytes.len() - offset,
            });
        }

        let code = u16::from_be_bytes([bytes[offset], bytes[offset + 1]]);
        let kind = AttributeType::try_from(code)
            .map_err(|_| StunError::UnknownAttributeType(code))?;

        let length = u16::from_be_bytes([bytes[offset + 2], bytes[offset + 3]]) as usize;
        offset += 4;

        if bytes.len() - offset < length {
            return Err(StunError::AttributeOverflow {
                declared: length,
                remaining: bytes.len() - offset,
            });
        }

        let value = attributes::decode_value(
            kind,
            &bytes[offset..offset + length],
            &header.transaction_id,
        )?;

        attributes.push(Attribute {
            length: length as u16,
            value,
        });

        offset += length + alignment_32(length);
    }

    Ok(StunMessage { header, attributes })
}

/// check the MESSAGE-INTEGRITY digest of an encoded message against the
/// given credentials.
///
/// The digest is recomputed over the bytes preceding the attribute,
/// with the header length restored to the value it carried when the
/// digest was produced.
pub fn verify_integrity(bytes: &[u8], credential: &Credential) -> Result<(), StunError> {
    validate_envelope(bytes)?;

    let mut offset = 20;
    while offset + 4 <= bytes.len() {
        let code = u16::from_be_bytes([bytes[offset], bytes[offset + 1]]);
        let length = u16::from_be_bytes([bytes[offset + 2], bytes[offset + 3]]) as usize;

        if code == AttributeType::MessageIntegrity as u16 {
            if length != INTEGRITY_VALUE_LEN as usize || bytes.len() - offset - 4 < length {
                return Err(StunError::InvalidAttributeValue("MESSAGE-INTEGRITY"));
            }

            let size_buf = ((offset + 4) as u16).to_be_bytes();
            let digest = hmac_sha1(
                &credential.key(),
                &[&bytes[..2], &size_buf, &bytes[4..offset]],
            )?;

            return if bytes[offset + 4..offset + 24] == digest {
                Ok(())
            } else {
                Err(StunError::IntegrityFailed)
            };
        }

        offset += 4 + length + alignment_32(length);
    }

    Err(StunError::NotFoundIntegrity)
}
