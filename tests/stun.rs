use anyhow::Result;

use stun_agent::{
    crypto::fingerprint,
    decode_message, encode_message,
    message::attributes::error::{ErrorCode, ErrorKind},
    transaction_id, validate_envelope, verify_integrity, AttrSpec, AttrValue, AttributeType,
    Class, Credential, Method, StunError,
};

#[test]
fn binding_request_vector() -> Result<()> {
    let buffer = [
        0x00u8, 0x01, 0x00, 0x0c, 0x21, 0x12, 0xa4, 0x42, 0x81, 0x4c, 0x72, 0x09, 0xa7, 0x68,
        0xf9, 0x89, 0xf8, 0x0b, 0x73, 0xbd, 0x00, 0x20, 0x00, 0x08, 0x00, 0x01, 0x11, 0x2b,
        0xe8, 0xd5, 0x61, 0x1b,
    ];

    let message = decode_message(&buffer)?;
    assert_eq!(message.header.class, Class::Request);
    assert_eq!(message.header.method, Method::Binding);
    assert_eq!(message.header.length, 12);
    assert_eq!(
        message.header.transaction_id,
        [0x81, 0x4c, 0x72, 0x09, 0xa7, 0x68, 0xf9, 0x89, 0xf8, 0x0b, 0x73, 0xbd]
    );

    let addr = "201.199.197.89:12345".parse()?;
    assert_eq!(message.attributes.len(), 1);
    assert_eq!(message.attributes[0].length, 8);
    assert_eq!(
        message.get(AttributeType::XorMappedAddress),
        Some(&AttrValue::XorMappedAddress(addr))
    );

    let encoded = encode_message(
        message.header.class,
        message.header.method,
        &message.header.transaction_id,
        &[AttrSpec::XorMappedAddress(addr)],
    )?;

    assert_eq!(&encoded[..], &buffer);
    Ok(())
}

#[test]
fn round_trip_mixed_attributes() -> Result<()> {
    let id = transaction_id();
    let mapped = "192.168.0.107:56748".parse()?;
    let alternate = "[2001:db8::1]:3478".parse()?;

    let bytes = encode_message(
        Class::ErrorResponse,
        Method::Binding,
        &id,
        &[
            AttrSpec::UserName("panda"),
            AttrSpec::Realm("raspberry"),
            AttrSpec::Nonce("1c13d2b245b3a734"),
            AttrSpec::Software("stun-agent"),
            AttrSpec::ErrorCode(ErrorCode::from(ErrorKind::Unauthorized)),
            AttrSpec::UnknownAttributes(vec![0x0030, 0x0031]),
            AttrSpec::MappedAddress(mapped),
            AttrSpec::XorMappedAddress(mapped),
            AttrSpec::AlternateServer(alternate),
        ],
    )?;

    assert_eq!(bytes.len() % 4, 0);

    let message = decode_message(&bytes)?;
    assert_eq!(message.header.class, Class::ErrorResponse);
    assert_eq!(message.header.transaction_id, id);
    assert_eq!(message.attributes.len(), 9);

    assert_eq!(
        message.get(AttributeType::UserName),
        Some(&AttrValue::UserName("panda".to_string()))
    );
    assert_eq!(
        message.get(AttributeType::Realm),
        Some(&AttrValue::Realm("raspberry".to_string()))
    );
    assert_eq!(
        message.get(AttributeType::Nonce),
        Some(&AttrValue::Nonce("1c13d2b245b3a734".to_string()))
    );
    assert_eq!(
        message.get(AttributeType::Software),
        Some(&AttrValue::Software("stun-agent".to_string()))
    );
    assert_eq!(
        message.get(AttributeType::ErrorCode),
        Some(&AttrValue::ErrorCode(ErrorCode::from(
            ErrorKind::Unauthorized
        )))
    );
    assert_eq!(
        message.get(AttributeType::UnknownAttributes),
        Some(&AttrValue::UnknownAttributes(vec![0x0030, 0x0031]))
    );
    assert_eq!(
        message.get(AttributeType::MappedAddress),
        Some(&AttrValue::MappedAddress(mapped))
    );
    assert_eq!(
        message.get(AttributeType::XorMappedAddress),
        Some(&AttrValue::XorMappedAddress(mapped))
    );
    assert_eq!(
        message.get(AttributeType::AlternateServer),
        Some(&AttrValue::AlternateServer(alternate))
    );

    Ok(())
}

#[test]
fn xor_mapped_address_ipv6_round_trip() -> Result<()> {
    let id = [
        0x6cu8, 0x46, 0x62, 0x54, 0x75, 0x4b, 0x44, 0x51, 0x46, 0x48, 0x4c, 0x71,
    ];
    let addr = "[2001:db8::a:b:c:d]:3478".parse()?;

    let bytes = encode_message(Class::SuccessResponse, Method::Binding, &id, &[
        AttrSpec::XorMappedAddress(addr),
    ])?;

    // family 0x02, port and all four address words obfuscated: the
    // cookie over the first, transaction-id chunks over the rest.
    let value = [
        0x00u8, 0x02, 0x2c, 0x84, 0x01, 0x13, 0xa9, 0xfa, 0x6c, 0x46, 0x62, 0x54,
        0x75, 0x41, 0x44, 0x5a, 0x46, 0x44, 0x4c, 0x7c,
    ];
    assert_eq!(&bytes[24..44], &value);

    let message = decode_message(&bytes)?;
    assert_eq!(message.attributes[0].length, 20);
    assert_eq!(
        message.get(AttributeType::XorMappedAddress),
        Some(&AttrValue::XorMappedAddress(addr))
    );

    Ok(())
}

#[test]
fn xor_and_plain_addresses_differ_on_the_wire() -> Result<()> {
    let id = transaction_id();
    let addr = "192.168.0.107:56748".parse()?;

    let plain = encode_message(Class::Request, Method::Binding, &id, &[
        AttrSpec::MappedAddress(addr),
    ])?;
    let xored = encode_message(Class::Request, Method::Binding, &id, &[
        AttrSpec::XorMappedAddress(addr),
    ])?;

    // identical value layout, different obfuscation.
    assert_ne!(&plain[24..32], &xored[24..32]);
    Ok(())
}

#[test]
fn rejects_malformed_envelopes() {
    let id = transaction_id();
    let bytes = encode_message(Class::Request, Method::Binding, &id, &[]).unwrap();

    assert!(matches!(
        validate_envelope(&bytes[..12]),
        Err(StunError::TooShort(12))
    ));

    let mut unaligned = bytes.to_vec();
    unaligned.push(0);
    assert!(matches!(
        validate_envelope(&unaligned),
        Err(StunError::NotAligned(21))
    ));

    let mut leading = bytes.clone();
    leading[0] |= 0b1100_0000;
    assert!(matches!(
        validate_envelope(&leading),
        Err(StunError::LeadingBitsNotZero)
    ));

    let mut cookie = bytes.clone();
    cookie[7] = 0x41;
    assert!(matches!(
        validate_envelope(&cookie),
        Err(StunError::InvalidMagicCookie(0x2112a441))
    ));
}

#[test]
fn rejects_unknown_attribute_type() -> Result<()> {
    let id = transaction_id();
    let mut bytes = encode_message(Class::Request, Method::Binding, &id, &[
        AttrSpec::Software("test"),
    ])?
    .to_vec();

    bytes[20] = 0x7f;
    bytes[21] = 0xff;

    assert!(matches!(
        decode_message(&bytes),
        Err(StunError::UnknownAttributeType(0x7fff))
    ));

    Ok(())
}

#[test]
fn fingerprint_closes_the_message() -> Result<()> {
    let id = transaction_id();
    let bytes = encode_message(Class::Request, Method::Binding, &id, &[
        AttrSpec::Software("stun-agent"),
        AttrSpec::Fingerprint,
    ])?;

    let message = decode_message(&bytes)?;
    let expected = fingerprint(&bytes[..bytes.len() - 8]);
    assert_eq!(
        message.get(AttributeType::Fingerprint),
        Some(&AttrValue::Fingerprint(expected))
    );

    let misplaced = encode_message(Class::Request, Method::Binding, &id, &[
        AttrSpec::Fingerprint,
        AttrSpec::Software("stun-agent"),
    ]);

    assert!(matches!(misplaced, Err(StunError::FingerprintNotLast)));
    Ok(())
}

#[test]
fn integrity_round_trip_long_term() -> Result<()> {
    let id = transaction_id();
    let credential = Credential::LongTerm {
        username: "panda",
        realm: "raspberry",
        password: "panda",
    };

    let bytes = encode_message(Class::Request, Method::Binding, &id, &[
        AttrSpec::UserName("panda"),
        AttrSpec::Realm("raspberry"),
        AttrSpec::MessageIntegrity(credential.clone()),
        AttrSpec::Fingerprint,
    ])?;

    verify_integrity(&bytes, &credential)?;

    // a flipped transaction id byte invalidates the digest.
    let mut tampered = bytes.to_vec();
    tampered[8] ^= 0xff;
    assert!(matches!(
        verify_integrity(&tampered, &credential),
        Err(StunError::IntegrityFailed)
    ));

    Ok(())
}

#[test]
fn integrity_round_trip_short_term() -> Result<()> {
    let id = transaction_id();
    let credential = Credential::ShortTerm { password: "panda" };

    let bytes = encode_message(Class::Request, Method::Binding, &id, &[
        AttrSpec::UserName("panda"),
        AttrSpec::MessageIntegrity(credential.clone()),
    ])?;

    verify_integrity(&bytes, &credential)?;
    assert!(matches!(
        verify_integrity(&bytes, &Credential::ShortTerm { password: "other" }),
        Err(StunError::IntegrityFailed)
    ));

    Ok(())
}

#[test]
fn integrity_requires_the_attribute() -> Result<()> {
    let id = transaction_id();
    let bytes = encode_message(Class::Request, Method::Binding, &id, &[])?;

    assert!(matches!(
        verify_integrity(&bytes, &Credential::ShortTerm { password: "panda" }),
        Err(StunError::NotFoundIntegrity)
    ));

    Ok(())
}

#[test]
fn digest_depends_on_the_key() -> Result<()> {
    let id = transaction_id();
    let first = encode_message(Class::Request, Method::Binding, &id, &[
        AttrSpec::MessageIntegrity(Credential::ShortTerm { password: "panda" }),
    ])?;
    let second = encode_message(Class::Request, Method::Binding, &id, &[
        AttrSpec::MessageIntegrity(Credential::ShortTerm { password: "bamboo" }),
    ])?;

    assert_ne!(&first[24..44], &second[24..44]);
    Ok(())
}
