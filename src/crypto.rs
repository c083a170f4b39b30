use hmac::{Hmac, Mac};
use md5::{Digest, Md5};

use crate::StunError;

/// Credentials used to key the MESSAGE-INTEGRITY digest.
///
/// Long-term credentials are reduced to a 16-byte MD5 key; short-term
/// credentials use the raw password bytes. Credentials are an input to
/// encoding only and are never persisted in the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential<'a> {
    LongTerm {
        username: &'a str,
        realm: &'a str,
        password: &'a str,
    },
    ShortTerm {
        password: &'a str,
    },
}

impl Credential<'_> {
    /// materialize the HMAC key for this credential.
    pub fn key(&self) -> Vec<u8> {
        match self {
            Self::LongTerm {
                username,
                realm,
                password,
            } => long_term_credential_digest(username, realm, password).to_vec(),
            Self::ShortTerm { password } => password.as_bytes().to_vec(),
        }
    }
}

/// create long term credential key.
///
/// > key = MD5(username ":" OpaqueString(realm) ":" OpaqueString(password))
///
/// # Test
///
/// ```
/// let buffer = [
///     0x3eu8, 0x2f, 0x79, 0x1e, 0x1f, 0x14, 0xd1, 0x73, 0xfc, 0x91, 0xff,
///     0x2f, 0x59, 0xb5, 0x0f, 0xd1,
/// ];
///
/// let key =
///     stun_agent::crypto::long_term_credential_digest("panda", "raspberry", "panda");
/// assert_eq!(key, buffer);
/// ```
pub fn long_term_credential_digest(username: &str, realm: &str, password: &str) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update([username, realm, password].join(":"));
    hasher.finalize().into()
}

/// HMAC SHA1 digest over a multi-part message body.
///
/// # Test
///
/// ```
/// let buffer = [
///     0x00u8, 0x03, 0x00, 0x50, 0x21, 0x12, 0xa4, 0x42, 0x64, 0x4f, 0x5a,
///     0x78, 0x6a, 0x56, 0x33, 0x62, 0x4b, 0x52, 0x33, 0x31, 0x00, 0x19, 0x00,
///     0x04, 0x11, 0x00, 0x00, 0x00, 0x00, 0x06, 0x00, 0x05, 0x70, 0x61, 0x6e,
///     0x64, 0x61, 0x00, 0x00, 0x00, 0x00, 0x14, 0x00, 0x09, 0x72, 0x61, 0x73,
///     0x70, 0x62, 0x65, 0x72, 0x72, 0x79, 0x00, 0x00, 0x00, 0x00, 0x15, 0x00,
///     0x10, 0x31, 0x63, 0x31, 0x33, 0x64, 0x32, 0x62, 0x32, 0x34, 0x35, 0x62,
///     0x33, 0x61, 0x37, 0x33, 0x34,
/// ];
///
/// let key = [
///     0x3eu8, 0x2f, 0x79, 0x1e, 0x1f, 0x14, 0xd1, 0x73, 0xfc, 0x91, 0xff,
///     0x2f, 0x59, 0xb5, 0x0f, 0xd1,
/// ];
///
/// let sign = [
///     0xd6u8, 0x78, 0x26, 0x99, 0x0e, 0x15, 0x56, 0x15, 0xe5, 0xf4, 0x24,
///     0x74, 0xe2, 0x3c, 0x26, 0xc5, 0xb1, 0x03, 0xb2, 0x6d,
/// ];
///
/// let digest = stun_agent::crypto::hmac_sha1(&key, &[&buffer]).unwrap();
/// assert_eq!(&digest, &sign);
/// ```
pub fn hmac_sha1(key: &[u8], source: &[&[u8]]) -> Result<[u8; 20], StunError> {
    match Hmac::<sha1::Sha1>::new_from_slice(key) {
        Err(_) => Err(StunError::SummaryFailed),
        Ok(mut mac) => {
            for buf in source {
                mac.update(buf);
            }

            Ok(mac.finalize().into_bytes().into())
        }
    }
}

/// CRC32 Fingerprint.
///
/// The checksum is XOR'ed with 0x5354554e so the FINGERPRINT test does
/// not report a false positive on a packet carrying a CRC-32 generated
/// by an application protocol.
///
/// # Test
///
/// ```
/// assert_eq!(stun_agent::crypto::fingerprint(b"1"), 3498621689);
/// ```
pub fn fingerprint(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes) ^ 0x5354_554e
}
