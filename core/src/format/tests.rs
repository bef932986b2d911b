use super::*;

#[test]
fn header_layout_is_fixed() {
    assert_eq!(HEADER_LEN, 128);

    let mut header = Header {
        flags: FLAG_CASE_SENSITIVE,
        checksum: [7u8; CHECKSUM_LEN],
        ..Header::default()
    };
    header.set_section(
        SectionKind::Keys,
        Section {
            offset: 200,
            len: 36,
        },
    );

    let bytes = header.encode();

    assert_eq!(&bytes[..8], b"DZLFUZZY");
    assert_eq!(read_u32(&bytes, 8).unwrap(), VERSION);
    // keys is the second section: 16 + 16
    assert_eq!(read_u64(&bytes, 32).unwrap(), 200);
    assert_eq!(read_u64(&bytes, 40).unwrap(), 36);
    assert_eq!(Header::decode(&bytes).unwrap(), header);
    assert!(header.case_sensitive());
}

#[test]
fn header_rejects_foreign_bytes() {
    let mut bytes = Header::default().encode();
    bytes[0] = b'X';
    assert!(matches!(Header::decode(&bytes), Err(ReadError::BadMagic)));
}

#[test]
fn header_rejects_newer_version() {
    let mut bytes = Header::default().encode();
    bytes[8..12].copy_from_slice(&2u32.to_le_bytes());
    assert!(matches!(
        Header::decode(&bytes),
        Err(ReadError::UnsupportedVersion(2))
    ));
}

#[test]
fn header_rejects_short_input() {
    assert!(matches!(
        Header::decode(&[0u8; 10]),
        Err(ReadError::Truncated)
    ));
}

#[test]
fn integers_are_little_endian() {
    let bytes = encode_posting(Posting::new(KeyId::new(1), 0x0203));
    assert_eq!(bytes, [1, 0, 0, 0, 3, 2, 0, 0]);
    assert_eq!(
        decode_posting(&bytes),
        Posting::new(KeyId::new(1), 0x0203)
    );
}

#[test]
fn reads_past_end_are_truncated() {
    assert!(matches!(read_u32(&[1, 2, 3], 0), Err(ReadError::Truncated)));
    assert!(matches!(read_u64(&[0; 8], 1), Err(ReadError::Truncated)));
}

#[test]
fn checksum_covers_header_prefix() {
    let digest = *blake3::hash(b"body").as_bytes();
    let header = Header::default().encode();
    let mut flagged = header;
    flagged[12] = 1;

    assert_eq!(CHECKSUM_OFFSET, 96);
    assert_ne!(
        checksum(&header[..CHECKSUM_OFFSET], &digest),
        checksum(&flagged[..CHECKSUM_OFFSET], &digest)
    );
}
