use dazzle_core::{CancellationToken, Document, IndexBuilder, IndexFile, KeyId, WriteError};
use tempfile::tempdir;

/// Verify every key, document, priority and metadata value survives a write.
#[test]
fn test_builder_round_trip() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("index.dzl");

    let mut builder = IndexBuilder::new();
    let doc1 = builder.insert("alpha", Document::from("doc1"), 0);
    let doc2 = builder.insert("beta", Document::from("doc2"), 1);
    builder.set_metadata_string("name", "round trip");
    builder.set_metadata_uint64("doc_ids", doc1.into_inner() + doc2.into_inner());
    builder.write(&path, &CancellationToken::new()).unwrap();

    let index = IndexFile::open(&path).unwrap();
    assert!(!index.case_sensitive());
    assert_eq!(
        index.keys().collect::<Vec<_>>(),
        vec![(KeyId::new(0), "alpha"), (KeyId::new(1), "beta")]
    );
    assert_eq!(index.priority(KeyId::new(0)), Some(0));
    assert_eq!(index.priority(KeyId::new(1)), Some(1));
    assert_eq!(
        index.document(KeyId::new(0)).unwrap(),
        Some(Document::from("doc1"))
    );
    assert_eq!(
        index.document(KeyId::new(1)).unwrap(),
        Some(Document::from("doc2"))
    );
    assert_eq!(index.metadata_string("name"), Some("round trip"));
    assert_eq!(
        index.metadata_uint64("doc_ids"),
        Some(doc1.into_inner() + doc2.into_inner())
    );
}

/// Verify a file answers the same queries the builder's keys would.
#[test]
fn test_query_after_write() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("index.dzl");

    let mut builder = IndexBuilder::new();
    for key in ["Gtk.Widget", "GtkWindow", "gdk_window_show", "g_object_ref"] {
        builder.insert(key, Document::Null, 0);
    }
    builder.write(&path, &CancellationToken::new()).unwrap();

    let index = IndexFile::open(&path).unwrap();
    let keys: Vec<_> = index
        .search("gw", 0)
        .unwrap()
        .into_iter()
        .map(|m| m.key)
        .collect();

    assert_eq!(keys.len(), 3);
    assert!(!keys.contains(&"g_object_ref"));
}

/// Verify structured documents keep their shape.
#[test]
fn test_nested_documents() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("index.dzl");

    let document = Document::Map(
        [
            ("line".to_string(), Document::from(12u32)),
            (
                "tags".to_string(),
                Document::Array(vec![Document::from("a"), Document::Bytes(vec![0, 1])]),
            ),
        ]
        .into_iter()
        .collect(),
    );
    let mut builder = IndexBuilder::new();
    builder.insert("nested", document.clone(), 0);
    builder.write(&path, &CancellationToken::new()).unwrap();

    let index = IndexFile::open(&path).unwrap();
    assert_eq!(index.document(KeyId::new(0)).unwrap(), Some(document));
}

/// Verify a cancelled async write reports cancellation and leaves nothing behind.
#[tokio::test]
async fn test_async_write_cancelled() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("index.dzl");

    let mut builder = IndexBuilder::new();
    for i in 0..5000 {
        builder.insert(&format!("key-{i:05}"), Document::from(i as u32), 0);
    }

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = builder.write_async(path.clone(), cancel).await;

    assert!(matches!(result, Err(WriteError::Cancelled)));
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

/// Verify an async write produces the same file contents as a blocking one.
#[tokio::test(flavor = "multi_thread")]
async fn test_async_write_matches_blocking() {
    let tmp = tempdir().unwrap();
    let blocking = tmp.path().join("blocking.dzl");
    let background = tmp.path().join("background.dzl");

    let mut builder = IndexBuilder::new();
    builder.insert("alpha", Document::from("doc1"), 0);
    builder.insert("beta", Document::from("doc2"), 1);

    builder.write(&blocking, &CancellationToken::new()).unwrap();
    builder
        .write_async(background.clone(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        std::fs::read(&blocking).unwrap(),
        std::fs::read(&background).unwrap()
    );
}
