use bytes::{BufMut, BytesMut};

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::StunError;

use crate::message::MAGIC_COOKIE;

pub const FAMILY_IPV4: u8 = 0x01;
pub const FAMILY_IPV6: u8 = 0x02;

/// Address attribute value codec.
///
/// ```text
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |0 0 0 0 0 0 0 0|    Family     |           Port                |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// |                 Address (32 bits or 128 bits)                 |
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// MAPPED-ADDRESS carries the transport address in the clear;
/// XOR-MAPPED-ADDRESS obfuscates it against the magic cookie and the
/// transaction id. The XOR transform is self-inverse, so one routine
/// pair serves both directions, parameterized by `is_xor`.
pub struct Addr;

impl Addr {
    /// encode a socket address into the attribute value layout.
    ///
    /// # Test
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use stun_agent::message::attributes::address::Addr;
    ///
    /// let xor_buf: [u8; 8] = [0x00, 0x01, 0xfc, 0xbe, 0xe1, 0xba, 0xa4, 0x29];
    /// let plain_buf: [u8; 8] = [0x00, 0x01, 0xdd, 0xac, 0xc0, 0xa8, 0x00, 0x6b];
    ///
    /// let transaction_id: [u8; 12] = [
    ///     0x6c, 0x46, 0x62, 0x54, 0x75, 0x4b, 0x44, 0x51, 0x46, 0x48, 0x4c, 0x71,
    /// ];
    ///
    /// let source = "192.168.0.107:56748".parse().unwrap();
    ///
    /// let mut buffer = BytesMut::with_capacity(32);
    /// Addr::encode(&source, &transaction_id, &mut buffer, true);
    /// assert_eq!(&xor_buf, &buffer[..]);
    ///
    /// let mut buffer = BytesMut::with_capacity(32);
    /// Addr::encode(&source, &transaction_id, &mut buffer, false);
    /// assert_eq!(&plain_buf, &buffer[..]);
    /// ```
    pub fn encode(addr: &SocketAddr, transaction_id: &[u8], bytes: &mut BytesMut, is_xor: bool) {
        let addr = if is_xor {
            xor(addr, transaction_id)
        } else {
            *addr
        };

        bytes.put_u8(0);
        bytes.put_u8(if addr.is_ipv4() {
            FAMILY_IPV4
        } else {
            FAMILY_IPV6
        });

        bytes.put_u16(addr.port());
        match addr.ip() {
            IpAddr::V4(ip) => bytes.put(&ip.octets()[..]),
            IpAddr::V6(ip) => bytes.put(&ip.octets()[..]),
        }
    }

    /// decode an attribute value into a socket address.
    ///
    /// The decoded value is always the un-XOR'ed address.
    ///
    /// # Test
    ///
    /// ```
    /// use stun_agent::message::attributes::address::Addr;
    ///
    /// let xor_buf: [u8; 8] = [0x00, 0x01, 0xfc, 0xbe, 0xe1, 0xba, 0xa4, 0x29];
    /// let plain_buf: [u8; 8] = [0x00, 0x01, 0xdd, 0xac, 0xc0, 0xa8, 0x00, 0x6b];
    ///
    /// let transaction_id: [u8; 12] = [
    ///     0x6c, 0x46, 0x62, 0x54, 0x75, 0x4b, 0x44, 0x51, 0x46, 0x48, 0x4c, 0x71,
    /// ];
    ///
    /// let source = "192.168.0.107:56748".parse().unwrap();
    ///
    /// assert_eq!(Addr::decode(&xor_buf, &transaction_id, true).unwrap(), source);
    /// assert_eq!(Addr::decode(&plain_buf, &transaction_id, false).unwrap(), source);
    /// ```
    pub fn decode(
        value: &[u8],
        transaction_id: &[u8],
        is_xor: bool,
    ) -> Result<SocketAddr, StunError> {
        if value.len() < 4 {
            return Err(StunError::InvalidAttributeValue("address"));
        }

        let port = u16::from_be_bytes([value[2], value[3]]);
        let ip = match value[1] {
            FAMILY_IPV4 => ipv4_from_bytes(value)?,
            FAMILY_IPV6 => ipv6_from_bytes(value)?,
            family => return Err(StunError::InvalidAddressFamily(family)),
        };

        let addr = SocketAddr::new(ip, port);
        Ok(if is_xor {
            xor(&addr, transaction_id)
        } else {
            addr
        })
    }
}

fn ipv4_from_bytes(value: &[u8]) -> Result<IpAddr, StunError> {
    if value.len() != 8 {
        return Err(StunError::InvalidAttributeValue("ipv4 address"));
    }

    let octets: [u8; 4] = value[4..8].try_into()?;
    Ok(IpAddr::V4(octets.into()))
}

fn ipv6_from_bytes(value: &[u8]) -> Result<IpAddr, StunError> {
    if value.len() != 20 {
        return Err(StunError::InvalidAttributeValue("ipv6 address"));
    }

    let octets: [u8; 16] = value[4..20].try_into()?;
    Ok(IpAddr::V6(octets.into()))
}

/// apply the XOR transform to an address.
///
/// The port is XOR'ed with the upper 16 bits of the magic cookie; an
/// IPv4 address with the full cookie; an IPv6 address with the cookie
/// followed by the 96-bit transaction id.
///
/// # Test
///
/// ```
/// use std::net::SocketAddr;
/// use stun_agent::message::attributes::address::xor;
///
/// let source: SocketAddr = "192.168.0.107:1".parse().unwrap();
/// let expected: SocketAddr = "225.186.164.41:8467".parse().unwrap();
///
/// let transaction_id: [u8; 12] = [
///     0x6c, 0x46, 0x62, 0x54, 0x75, 0x4b, 0x44, 0x51, 0x46, 0x48, 0x4c, 0x71,
/// ];
///
/// assert_eq!(xor(&source, &transaction_id), expected);
///
/// let source_v6: SocketAddr = "[2001:db8::a:b:c:d]:3478".parse().unwrap();
/// let expected_v6: SocketAddr =
///     "[113:a9fa:6c46:6254:7541:445a:4644:4c7c]:11396".parse().unwrap();
///
/// assert_eq!(xor(&source_v6, &transaction_id), expected_v6);
/// assert_eq!(xor(&expected_v6, &transaction_id), source_v6);
/// ```
pub fn xor(addr: &SocketAddr, transaction_id: &[u8]) -> SocketAddr {
    let port = addr.port() ^ (MAGIC_COOKIE >> 16) as u16;
    let ip = match addr.ip() {
        IpAddr::V4(ip) => xor_v4(ip),
        IpAddr::V6(ip) => xor_v6(ip, transaction_id),
    };

    SocketAddr::new(ip, port)
}

fn xor_v4(addr: Ipv4Addr) -> IpAddr {
    let mut octets = addr.octets();
    for (i, b) in octets.iter_mut().enumerate() {
        *b ^= (MAGIC_COOKIE >> (24 - i * 8)) as u8;
    }

    IpAddr::V4(octets.into())
}

fn xor_v6(addr: Ipv6Addr, transaction_id: &[u8]) -> IpAddr {
    let mut octets = addr.octets();
    for (i, b) in octets.iter_mut().enumerate().take(4) {
        *b ^= (MAGIC_COOKIE >> (24 - i * 8)) as u8;
    }

    for (i, b) in octets.iter_mut().enumerate().take(16).skip(4) {
        *b ^= transaction_id[i - 4];
    }

    IpAddr::V6(octets.into())
}
