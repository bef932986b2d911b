//! Writes an index of 9000 keys and runs a few queries against it.
//!
//! Run with: `cargo run -q --example bulk_keys -p dazzle_core -- [path]`

use dazzle_core::{CancellationToken, Document, IndexBuilder, IndexFile};
use std::path::PathBuf;
use std::time::Instant;

const KEY_COUNT: usize = 9000;
const QUERIES: [&str; 3] = ["bk05", "key-0042", "k9"];

fn main() {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("bulk_keys.dzl"));
    println!("Using index path: {}", path.display());

    let mut builder = IndexBuilder::new();
    builder.set_metadata_string("generator", "bulk_keys");
    builder.set_metadata_uint32("key_count", KEY_COUNT as u32);

    for i in 0..KEY_COUNT {
        let key = format!("bulk/key-{:05}", i);
        builder.insert(&key, Document::from(format!("Content for key {}", i)), (i % 7) as u32);
    }

    let started = Instant::now();
    builder
        .write(&path, &CancellationToken::new())
        .expect("Failed to write index");
    println!("Wrote {} keys in {:?}", KEY_COUNT, started.elapsed());

    let index = IndexFile::open(&path).expect("Failed to open index");
    for query in QUERIES {
        let started = Instant::now();
        let matches = index.search(query, 5).expect("Failed to query index");
        println!("\n{:?} ({:?}):", query, started.elapsed());
        for m in matches {
            println!("  {:<20} score={:.5} priority={}", m.key, m.score, m.priority);
        }
    }
}
