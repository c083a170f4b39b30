use bytes::{BufMut, BytesMut};
use num_enum::TryFromPrimitive;

use crate::StunError;

use super::MAGIC_COOKIE;

/// message class.
///
/// The class is carried in two non-contiguous bits of the message type
/// field; see [`encode_message_type`].
#[repr(u8)]
#[derive(TryFromPrimitive, PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum Class {
    Request = 0b00,
    Indication = 0b01,
    SuccessResponse = 0b10,
    ErrorResponse = 0b11,
}

/// message method.
#[repr(u16)]
#[derive(TryFromPrimitive, PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum Method {
    Binding = 0x0001,
}

/// the 20-byte fixed message header.
///
/// `length` is the byte count of the attribute section that follows the
/// header; decode recomputes nothing, it reports the wire value after
/// validating it against the remaining buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub class: Class,
    pub method: Method,
    pub length: u16,
    pub transaction_id: [u8; 12],
}

/// encode class and method into the 14-bit message type.
///
/// The method bits sit in place at positions 0-3, 5-7 and 9-13, with
/// class bit 0 at position 4 and class bit 1 at position 8. The wire
/// format mandates this interleave.
///
/// # Test
///
/// ```
/// use stun_agent::{Class, Method};
/// use stun_agent::message::header::encode_message_type;
///
/// assert_eq!(encode_message_type(Class::Request, Method::Binding), 0x0001);
/// assert_eq!(encode_message_type(Class::Indication, Method::Binding), 0x0011);
/// assert_eq!(encode_message_type(Class::SuccessResponse, Method::Binding), 0x0101);
/// assert_eq!(encode_message_type(Class::ErrorResponse, Method::Binding), 0x0111);
/// ```
pub fn encode_message_type(class: Class, method: Method) -> u16 {
    let c = class as u16;
    let m = method as u16;

    let mut value = m & 0b1111;
    if c & 0b01 != 0 {
        value |= 1 << 4;
    }

    value |= m & (0b111 << 5);
    if c & 0b10 != 0 {
        value |= 1 << 8;
    }

    value | (m & (0b11111 << 9))
}

/// inverse of [`encode_message_type`].
///
/// Fails with an unknown-method error if the extracted method value is
/// not in the recognized set, and analogously for the class bits.
///
/// # Test
///
/// ```
/// use stun_agent::{Class, Method, StunError};
/// use stun_agent::message::header::decode_message_type;
///
/// assert_eq!(
///     decode_message_type(0x0101).unwrap(),
///     (Class::SuccessResponse, Method::Binding)
/// );
///
/// assert!(matches!(
///     decode_message_type(0x0000),
///     Err(StunError::UnknownMethod(0))
/// ));
/// ```
pub fn decode_message_type(value: u16) -> Result<(Class, Method), StunError> {
    let value = value & 0x3fff;
    let class_bits = (((value >> 8) & 1) << 1 | ((value >> 4) & 1)) as u8;
    let method_bits = value & !(1 << 8) & !(1 << 4);

    let method =
        Method::try_from(method_bits).map_err(|_| StunError::UnknownMethod(method_bits))?;
    let class = Class::try_from(class_bits).map_err(|_| StunError::UnknownClass(class_bits))?;

    Ok((class, method))
}

/// write the 20-byte header to the buffer.
///
/// The length field is conceptually written twice: callers pass zero
/// here and patch it once the attribute section size is known.
pub fn encode_header(
    class: Class,
    method: Method,
    length: u16,
    transaction_id: &[u8; 12],
    bytes: &mut BytesMut,
) {
    bytes.put_u16(encode_message_type(class, method));
    bytes.put_u16(length);
    bytes.put_u32(MAGIC_COOKIE);
    bytes.put(transaction_id.as_slice());
}

/// parse the 20-byte fixed header.
///
/// # Test
///
/// ```
/// use stun_agent::{Class, Method, StunError};
/// use stun_agent::message::header::decode_header;
///
/// let buffer = [
///     0x00u8, 0x01, 0x10, 0x11, 0x21, 0x12, 0xa4, 0x42, 0x81, 0x4c, 0x72,
///     0x09, 0xa7, 0x68, 0xf9, 0x89, 0xf8, 0x0b, 0x73, 0xbd,
/// ];
///
/// let header = decode_header(&buffer).unwrap();
/// assert_eq!(header.class, Class::Request);
/// assert_eq!(header.method, Method::Binding);
/// assert_eq!(header.length, 0x1011);
///
/// let mut bad_cookie = buffer;
/// bad_cookie[7] = 0x41;
/// assert!(matches!(
///     decode_header(&bad_cookie),
///     Err(StunError::InvalidMagicCookie(0x2112a441))
/// ));
/// ```
pub fn decode_header(bytes: &[u8]) -> Result<Header, StunError> {
    if bytes.len() < 20 {
        return Err(StunError::TooShort(bytes.len()));
    }

    if bytes[0] >> 6 != 0 {
        return Err(StunError::LeadingBitsNotZero);
    }

    let (class, method) = decode_message_type(u16::from_be_bytes(bytes[..2].try_into()?))?;
    let length = u16::from_be_bytes(bytes[2..4].try_into()?);

    let cookie = u32::from_be_bytes(bytes[4..8].try_into()?);
    if cookie != MAGIC_COOKIE {
        return Err(StunError::InvalidMagicCookie(cookie));
    }

    Ok(Header {
        class,
        method,
        length,
        transaction_id: bytes[8..20].try_into()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_type_bijection() {
        let classes = [
            Class::Request,
            Class::Indication,
            Class::SuccessResponse,
            Class::ErrorResponse,
        ];

        for class in classes {
            let value = encode_message_type(class, Method::Binding);
            assert_eq!(decode_message_type(value).unwrap(), (class, Method::Binding));
        }
    }

    #[test]
    fn rejects_unknown_method_bits() {
        // binding method with a garbage high method bit set.
        assert!(matches!(
            decode_message_type(0x0001 | (1 << 9)),
            Err(StunError::UnknownMethod(_))
        ));
    }
}
