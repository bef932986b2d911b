//! Read side of the binary index format.
//!
//! An [`IndexFile`] keeps the file bytes and answers queries straight from the
//! tables, without rebuilding a dictionary. Every offset is bounds-checked
//! once at load so the accessors can slice without further validation.

use crate::dictionary::Posting;
use crate::format::{
    CHECKSUM_OFFSET, COUNT_LEN, DOCUMENT_RECORD_LEN, DocumentRecord, HEADER_LEN, Header,
    KEY_RECORD_LEN, KeyRecord, POSTING_LEN, POSTINGS_RECORD_LEN, PostingsRecord, Section,
    SectionKind, checksum, decode_posting, read_u32,
};
use crate::matching::{self, PostingList, Ranked};
use crate::types::{Document, KeyId};
use error::ReadError;
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;

pub mod error {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum ReadError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Not an index file")]
        BadMagic,

        #[error("Unsupported index version {0}")]
        UnsupportedVersion(u32),

        #[error("Index file is truncated or malformed")]
        Truncated,

        #[error("Index checksum mismatch")]
        ChecksumMismatch,

        #[error("Key text is not valid UTF-8")]
        InvalidUtf8,

        #[error("Decode error: {0}")]
        Decode(#[from] postcard::Error),
    }
}

/// One ranked hit from [`IndexFile::search`].
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMatch<'a> {
    pub key: &'a str,
    pub key_id: KeyId,
    pub score: f32,
    pub priority: u32,
}

impl Ranked for IndexMatch<'_> {
    fn score(&self) -> f32 {
        self.score
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn key_id(&self) -> KeyId {
        self.key_id
    }
}

#[derive(Debug, Clone)]
pub struct IndexFile {
    bytes: Vec<u8>,
    case_sensitive: bool,
    metadata: BTreeMap<String, Document>,
    keys: Vec<KeyRecord>,
    postings: Vec<PostingsRecord>,
    documents: Vec<DocumentRecord>,
}

impl IndexFile {
    pub fn open(path: &Path) -> Result<Self, ReadError> {
        let bytes = std::fs::read(path)?;
        let index = Self::from_bytes(bytes)?;
        log::debug!("opened index {} ({} keys)", path.display(), index.len());
        Ok(index)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ReadError> {
        let header = Header::decode(&bytes)?;
        let body_digest = blake3::hash(&bytes[HEADER_LEN..]);
        if checksum(&bytes[..CHECKSUM_OFFSET], body_digest.as_bytes()) != header.checksum {
            return Err(ReadError::ChecksumMismatch);
        }

        let file_len = bytes.len() as u64;
        for section in &header.sections {
            let end = section.end().ok_or(ReadError::Truncated)?;
            if section.offset < HEADER_LEN as u64 || end > file_len {
                return Err(ReadError::Truncated);
            }
        }

        let metadata = postcard::from_bytes(slice(&bytes, header.section(SectionKind::Metadata))?)?;

        let keys_section = header.section(SectionKind::Keys);
        let keys = read_table(&bytes, keys_section, KEY_RECORD_LEN, KeyRecord::decode)?;
        for record in &keys {
            let text = slice_range(&bytes, keys_section, record.text_offset, record.text_len.into())?;
            std::str::from_utf8(text).map_err(|_| ReadError::InvalidUtf8)?;
        }

        let postings_section = header.section(SectionKind::Postings);
        let postings = read_table(
            &bytes,
            postings_section,
            POSTINGS_RECORD_LEN,
            PostingsRecord::decode,
        )?;
        for record in &postings {
            let len = u64::from(record.len) * POSTING_LEN as u64;
            slice_range(&bytes, postings_section, record.offset, len)?;
        }

        let documents = read_table(
            &bytes,
            header.section(SectionKind::DocumentIndex),
            DOCUMENT_RECORD_LEN,
            DocumentRecord::decode,
        )?;
        if documents.len() != keys.len() {
            return Err(ReadError::Truncated);
        }
        let data_section = header.section(SectionKind::DocumentData);
        for record in &documents {
            slice_range(&bytes, data_section, record.offset, record.len.into())?;
        }

        Ok(Self {
            case_sensitive: header.case_sensitive(),
            bytes,
            metadata,
            keys,
            postings,
            documents,
        })
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Metadata.
impl IndexFile {
    pub fn metadata(&self, key: &str) -> Option<&Document> {
        self.metadata.get(key)
    }

    pub fn metadata_string(&self, key: &str) -> Option<&str> {
        self.metadata(key).and_then(Document::as_str)
    }

    pub fn metadata_uint32(&self, key: &str) -> Option<u32> {
        self.metadata(key).and_then(Document::as_u32)
    }

    pub fn metadata_uint64(&self, key: &str) -> Option<u64> {
        self.metadata(key).and_then(Document::as_u64)
    }
}

/// Keys and documents.
impl IndexFile {
    pub fn key(&self, key_id: KeyId) -> Option<&str> {
        let record = self.keys.get(key_id.index())?;
        let start = usize::try_from(record.text_offset).ok()?;
        let text = self.bytes.get(start..start + record.text_len as usize)?;
        std::str::from_utf8(text).ok()
    }

    pub fn priority(&self, key_id: KeyId) -> Option<u32> {
        self.keys.get(key_id.index()).map(|record| record.priority)
    }

    /// Decodes the document stored for a key. `Ok(None)` for unknown ids.
    pub fn document(&self, key_id: KeyId) -> Result<Option<Document>, ReadError> {
        let Some(record) = self.documents.get(key_id.index()) else {
            return Ok(None);
        };
        let start = usize::try_from(record.offset).map_err(|_| ReadError::Truncated)?;
        let bytes = self
            .bytes
            .get(start..start + record.len as usize)
            .ok_or(ReadError::Truncated)?;
        Ok(Some(Document::decode(bytes)?))
    }

    /// Ids and texts of every key in id order.
    pub fn keys(&self) -> impl Iterator<Item = (KeyId, &str)> + '_ {
        (0..self.keys.len() as u32)
            .map(KeyId::new)
            .filter_map(|id| self.key(id).map(|text| (id, text)))
    }
}

/// Queries.
impl IndexFile {
    /// Postings of `ch`, folded per the file's mode.
    pub fn postings(&self, ch: char) -> FilePostings<'_> {
        let codepoint = u32::from(matching::fold_char(ch, self.case_sensitive));
        let found = self
            .postings
            .binary_search_by_key(&codepoint, |record| record.codepoint)
            .ok()
            .map(|i| self.postings[i]);

        let bytes = found
            .and_then(|record| {
                let start = usize::try_from(record.offset).ok()?;
                self.bytes
                    .get(start..start + record.len as usize * POSTING_LEN)
            })
            .unwrap_or(&[]);
        FilePostings { bytes }
    }

    /// Ranked keys containing `query` as a subsequence.
    ///
    /// Same rules as the in-memory index: an empty query lists keys in id
    /// order with a zero score, `max_matches == 0` means no limit.
    pub fn search(&self, query: &str, max_matches: usize) -> Result<Vec<IndexMatch<'_>>, ReadError> {
        if query.is_empty() {
            let limit = if max_matches == 0 { usize::MAX } else { max_matches };
            return self
                .keys()
                .take(limit)
                .map(|(key_id, key)| self.hit(key_id, key, 0.0))
                .collect();
        }

        let tables: Vec<FilePostings<'_>> = query.chars().map(|ch| self.postings(ch)).collect();
        let key_count = self.keys.len();
        let candidates = matching::collect_candidates(&tables, |id| id.index() < key_count);

        let mut matches = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let key = self.key(candidate.key_id).ok_or(ReadError::Truncated)?;
            let score = matching::score(key, query, &candidate.positions, self.case_sensitive);
            matches.push(self.hit(candidate.key_id, key, score)?);
        }

        matching::rank(&mut matches, max_matches);
        Ok(matches)
    }

    fn hit<'a>(&self, key_id: KeyId, key: &'a str, score: f32) -> Result<IndexMatch<'a>, ReadError> {
        Ok(IndexMatch {
            key,
            key_id,
            score,
            priority: self.priority(key_id).ok_or(ReadError::Truncated)?,
        })
    }
}

/// Postings list of one codepoint inside an [`IndexFile`].
#[derive(Debug, Clone, Copy)]
pub struct FilePostings<'a> {
    bytes: &'a [u8],
}

impl FilePostings<'_> {
    pub fn iter(&self) -> impl Iterator<Item = Posting> + '_ {
        (0..PostingList::len(self)).map(move |i| self.get(i))
    }
}

impl PostingList for FilePostings<'_> {
    fn len(&self) -> usize {
        self.bytes.len() / POSTING_LEN
    }

    fn get(&self, index: usize) -> Posting {
        decode_posting(&self.bytes[index * POSTING_LEN..])
    }
}

fn slice(bytes: &[u8], section: Section) -> Result<&[u8], ReadError> {
    let start = usize::try_from(section.offset).map_err(|_| ReadError::Truncated)?;
    let end = section.end().ok_or(ReadError::Truncated)?;
    let end = usize::try_from(end).map_err(|_| ReadError::Truncated)?;
    bytes.get(start..end).ok_or(ReadError::Truncated)
}

/// Checks that `offset..offset + len` lies inside `section`.
fn slice_range(bytes: &[u8], section: Section, offset: u64, len: u64) -> Result<&[u8], ReadError> {
    let end = offset.checked_add(len).ok_or(ReadError::Truncated)?;
    let section_end = section.end().ok_or(ReadError::Truncated)?;
    if offset < section.offset || end > section_end {
        return Err(ReadError::Truncated);
    }
    let range: Range<usize> = usize::try_from(offset).map_err(|_| ReadError::Truncated)?
        ..usize::try_from(end).map_err(|_| ReadError::Truncated)?;
    bytes.get(range).ok_or(ReadError::Truncated)
}

/// Decodes the fixed-width records of a counted table.
fn read_table<T>(
    bytes: &[u8],
    section: Section,
    record_len: usize,
    decode: impl Fn(&[u8], usize) -> Result<T, ReadError>,
) -> Result<Vec<T>, ReadError> {
    let table = slice(bytes, section)?;
    let count = read_u32(table, 0)? as usize;
    let records_len = count
        .checked_mul(record_len)
        .and_then(|n| n.checked_add(COUNT_LEN))
        .ok_or(ReadError::Truncated)?;
    if records_len > table.len() {
        return Err(ReadError::Truncated);
    }

    (0..count)
        .map(|i| decode(table, COUNT_LEN + i * record_len))
        .collect()
}
