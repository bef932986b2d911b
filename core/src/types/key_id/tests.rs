use super::*;

#[test]
fn key_id_next_increments() {
    let id = KeyId::new(41);
    assert_eq!(id.next(), Some(KeyId::new(42)));
}

#[test]
fn key_id_next_stops_at_max() {
    assert_eq!(KeyId::new(u32::MAX).next(), None);
}

#[test]
fn key_id_ordering_follows_inner_value() {
    let mut ids = vec![KeyId::new(3), KeyId::new(1), KeyId::new(2)];
    ids.sort();
    assert_eq!(ids, vec![KeyId::new(1), KeyId::new(2), KeyId::new(3)]);
}

#[test]
fn document_id_into_inner() {
    let id = DocumentId::new(7);
    assert_eq!(id.into_inner(), 7);
    assert_eq!(id.to_string(), "7");
}
