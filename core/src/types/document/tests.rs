use super::*;

#[test]
fn nested_document_survives_encoding() {
    let mut map = BTreeMap::new();
    map.insert("path".to_string(), Document::from("src/main.rs"));
    map.insert("line".to_string(), Document::from(42u32));
    map.insert(
        "tags".to_string(),
        Document::Array(vec![Document::Null, Document::Bool(true), Document::Double(0.5)]),
    );
    let doc = Document::Map(map);

    let bytes = doc.encode().unwrap();
    assert_eq!(Document::decode(&bytes).unwrap(), doc);
}

#[test]
fn decode_rejects_truncated_input() {
    let bytes = Document::from("a longer string value").encode().unwrap();
    Document::decode(&bytes[..bytes.len() - 3]).unwrap_err();
}

#[test]
fn typed_accessors() {
    assert_eq!(Document::from("x").as_str(), Some("x"));
    assert_eq!(Document::from(7u32).as_u32(), Some(7));
    assert_eq!(Document::from(7u32).as_u64(), Some(7));
    assert_eq!(Document::from(9u64).as_u64(), Some(9));
    assert_eq!(Document::from(9u64).as_u32(), None);
    assert_eq!(Document::Null.as_str(), None);
}

#[test]
fn encoded_len_matches_encoding() {
    let doc = Document::Array(vec![Document::from("abc"), Document::from(300u64)]);

    let bytes = doc.encode().unwrap();
    assert_eq!(doc.encoded_len().unwrap(), bytes.len());
    assert_eq!(doc.encode_into(vec![9]).unwrap()[1..], bytes[..]);
}
