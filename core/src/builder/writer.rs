//! Serialization of a [`Corpus`] into the binary index format.

use super::Corpus;
use super::error::WriteError;
use crate::dictionary::KeyDictionary;
use crate::format::{
    CHECKSUM_OFFSET, COUNT_LEN, DOCUMENT_RECORD_LEN, DocumentRecord, FLAG_CASE_SENSITIVE,
    HEADER_LEN, KEY_RECORD_LEN, POSTING_LEN, POSTINGS_RECORD_LEN, Header, KeyRecord,
    PostingsRecord, Section, SectionKind, checksum, encode_posting,
};
use crate::types::{Document, DocumentId};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;

static NULL_DOCUMENT: Document = Document::Null;

/// Polled between chunks of work; a `true` aborts the write.
pub(super) trait Interrupt {
    fn is_interrupted(&self) -> bool;
}

impl Interrupt for CancellationToken {
    fn is_interrupted(&self) -> bool {
        self.is_cancelled()
    }
}

/// Payload and priority chosen for one dictionary key.
#[derive(Debug, Clone, Copy)]
struct Slot {
    document_id: DocumentId,
    priority: u32,
}

pub(super) fn write_index<I: Interrupt + ?Sized>(
    corpus: &Corpus,
    path: &Path,
    chunk_size: usize,
    cancel: &I,
) -> Result<(), WriteError> {
    let chunk_size = chunk_size.max(1);
    let result = write_to_temp(corpus, path, chunk_size, cancel);
    match &result {
        Ok(bytes) => log::debug!(
            "wrote index {} ({} entries, {} bytes)",
            path.display(),
            corpus.entries.len(),
            bytes
        ),
        Err(WriteError::Cancelled) => log::debug!("index write to {} cancelled", path.display()),
        Err(e) => log::debug!("index write to {} failed: {}", path.display(), e),
    }
    result.map(|_| ())
}

fn write_to_temp<I: Interrupt + ?Sized>(
    corpus: &Corpus,
    path: &Path,
    chunk_size: usize,
    cancel: &I,
) -> Result<u64, WriteError> {
    check(cancel)?;
    let (dictionary, slots) = build_dictionary(corpus, cancel, chunk_size)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // Dropping the temp file on any early return deletes it.
    let mut tmp = create_temp(dir)?;

    let total = {
        let mut out = BufWriter::new(tmp.as_file_mut());
        out.write_all(&[0u8; HEADER_LEN])?;

        let mut body = HashingWriter::new(out, HEADER_LEN as u64);
        let mut header = Header {
            flags: if corpus.case_sensitive {
                FLAG_CASE_SENSITIVE
            } else {
                0
            },
            ..Header::default()
        };

        let sections = Sections {
            corpus,
            dictionary: &dictionary,
            slots: &slots,
            chunk_size,
            cancel,
        };
        sections.write_all(&mut body, &mut header)?;

        let (mut out, body_digest, total) = body.finish();
        header.checksum = checksum(&header.encode()[..CHECKSUM_OFFSET], &body_digest);
        out.seek(SeekFrom::Start(0))?;
        out.write_all(&header.encode())?;
        out.flush()?;
        total
    };

    check(cancel)?;
    if let Ok(existing) = std::fs::metadata(path) {
        tmp.as_file().set_permissions(existing.permissions())?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(total)
}

/// Temp file next to the destination, created with the mode a plain new file
/// would get.
fn create_temp(dir: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".dazzle-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

/// Folds all entries into a dictionary with dense ids.
fn build_dictionary<I: Interrupt + ?Sized>(
    corpus: &Corpus,
    cancel: &I,
    chunk_size: usize,
) -> Result<(KeyDictionary, Vec<Slot>), WriteError> {
    let mut dictionary = KeyDictionary::with_compact_threshold(corpus.case_sensitive, usize::MAX);
    let mut slots: Vec<Slot> = Vec::new();

    dictionary.begin_deferred();
    for (i, entry) in corpus.entries.iter().enumerate() {
        if i % chunk_size == 0 {
            check(cancel)?;
        }
        let slot = Slot {
            document_id: entry.document_id,
            priority: entry.priority,
        };
        let index = dictionary.add_key(&entry.key).index();
        if index == slots.len() {
            slots.push(slot);
        } else {
            slots[index] = slot;
        }
    }
    dictionary.finish_deferred();

    log::trace!(
        "folded {} entries into {} keys",
        corpus.entries.len(),
        dictionary.len()
    );
    Ok((dictionary, slots))
}

struct Sections<'a, I: ?Sized> {
    corpus: &'a Corpus,
    dictionary: &'a KeyDictionary,
    slots: &'a [Slot],
    chunk_size: usize,
    cancel: &'a I,
}

impl<I: Interrupt + ?Sized> Sections<'_, I> {
    fn write_all<W: Write>(
        &self,
        out: &mut HashingWriter<W>,
        header: &mut Header,
    ) -> Result<(), WriteError> {
        let section = self.write_metadata(out)?;
        header.set_section(SectionKind::Metadata, section);

        check(self.cancel)?;
        let section = self.write_keys(out)?;
        header.set_section(SectionKind::Keys, section);

        check(self.cancel)?;
        let section = self.write_postings(out)?;
        header.set_section(SectionKind::Postings, section);

        check(self.cancel)?;
        let (index, data) = self.write_documents(out)?;
        header.set_section(SectionKind::DocumentIndex, index);
        header.set_section(SectionKind::DocumentData, data);
        Ok(())
    }

    fn write_metadata<W: Write>(&self, out: &mut HashingWriter<W>) -> Result<Section, WriteError> {
        let start = out.position();
        let bytes = postcard::to_allocvec(&self.corpus.metadata)?;
        out.write_all(&bytes)?;
        log::trace!("metadata section: {} bytes", bytes.len());
        Ok(out.section_since(start))
    }

    fn write_keys<W: Write>(&self, out: &mut HashingWriter<W>) -> Result<Section, WriteError> {
        let start = out.position();
        let count = self.dictionary.len();
        out.write_all(&to_u32(count)?.to_le_bytes())?;

        let mut text_offset = start + (COUNT_LEN + count * KEY_RECORD_LEN) as u64;
        for (i, (id, text)) in self.dictionary.iter().enumerate() {
            self.checkpoint(i)?;
            let record = KeyRecord {
                text_offset,
                text_len: to_u32(text.len())?,
                priority: self.slots[id.index()].priority,
            };
            out.write_all(&record.encode())?;
            text_offset += text.len() as u64;
        }

        for (i, (_, text)) in self.dictionary.iter().enumerate() {
            self.checkpoint(i)?;
            out.write_all(text.as_bytes())?;
        }

        log::trace!("key section: {} keys", count);
        Ok(out.section_since(start))
    }

    fn write_postings<W: Write>(&self, out: &mut HashingWriter<W>) -> Result<Section, WriteError> {
        let start = out.position();
        let lists: Vec<_> = self.dictionary.raw_postings().collect();
        out.write_all(&to_u32(lists.len())?.to_le_bytes())?;

        let mut offset = start + (COUNT_LEN + lists.len() * POSTINGS_RECORD_LEN) as u64;
        for (ch, list) in &lists {
            let record = PostingsRecord {
                codepoint: u32::from(*ch),
                len: to_u32(list.len())?,
                offset,
            };
            out.write_all(&record.encode())?;
            offset += (list.len() * POSTING_LEN) as u64;
        }

        let mut written = 0usize;
        for (_, list) in &lists {
            for posting in *list {
                self.checkpoint(written)?;
                out.write_all(&encode_posting(*posting))?;
                written += 1;
            }
        }

        log::trace!(
            "postings section: {} codepoints, {} postings",
            lists.len(),
            written
        );
        Ok(out.section_since(start))
    }

    /// Writes the document index, then streams the payloads one at a time.
    fn write_documents<W: Write>(
        &self,
        out: &mut HashingWriter<W>,
    ) -> Result<(Section, Section), WriteError> {
        let count = self.dictionary.len();
        let index_start = out.position();
        out.write_all(&to_u32(count)?.to_le_bytes())?;

        let mut offset = index_start + (COUNT_LEN + count * DOCUMENT_RECORD_LEN) as u64;
        for (i, document) in self.documents().enumerate() {
            self.checkpoint(i)?;
            let len = document.encoded_len()?;
            let record = DocumentRecord {
                offset,
                len: to_u32(len)?,
            };
            out.write_all(&record.encode())?;
            offset += len as u64;
        }
        let index = out.section_since(index_start);

        check(self.cancel)?;
        let data_start = out.position();
        let mut buf = Vec::new();
        for (i, document) in self.documents().enumerate() {
            self.checkpoint(i)?;
            buf.clear();
            buf = document.encode_into(buf)?;
            out.write_all(&buf)?;
        }
        let data = out.section_since(data_start);

        log::trace!("document sections: {} documents, {} bytes", count, data.len);
        Ok((index, data))
    }

    /// Document of every key in id order.
    fn documents(&self) -> impl Iterator<Item = &Document> + '_ {
        self.dictionary.iter().map(|(id, _)| {
            let slot = self.slots[id.index()];
            self.corpus
                .documents
                .get(&slot.document_id)
                .unwrap_or(&NULL_DOCUMENT)
        })
    }

    fn checkpoint(&self, record: usize) -> Result<(), WriteError> {
        if record % self.chunk_size == 0 {
            check(self.cancel)?;
        }
        Ok(())
    }
}

fn check<I: Interrupt + ?Sized>(cancel: &I) -> Result<(), WriteError> {
    if cancel.is_interrupted() {
        return Err(WriteError::Cancelled);
    }
    Ok(())
}

fn to_u32(n: usize) -> Result<u32, WriteError> {
    u32::try_from(n).map_err(|_| {
        WriteError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "index section exceeds the format's limits",
        ))
    })
}

/// Hashes everything written through it and tracks the absolute position.
struct HashingWriter<W> {
    inner: W,
    hasher: blake3::Hasher,
    position: u64,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W, position: u64) -> Self {
        Self {
            inner,
            hasher: blake3::Hasher::new(),
            position,
        }
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn section_since(&self, start: u64) -> Section {
        Section {
            offset: start,
            len: self.position - start,
        }
    }

    fn finish(self) -> (W, [u8; 32], u64) {
        (self.inner, *self.hasher.finalize().as_bytes(), self.position)
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.position += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
