//! On-disk layout of an index file.
//!
//! All integers are little-endian and all offsets are absolute. Every table
//! is a count followed by fixed-width records so readers can index or binary
//! search without decoding what comes before.
//!
//! ```text
//! header        magic, version, flags, 5 × (offset, len), checksum
//! metadata      postcard(BTreeMap<String, Document>)
//! keys          count, count × KeyRecord, UTF-8 text heap
//! postings      count, count × PostingsRecord (by codepoint), posting lists
//! doc index     count, count × DocumentRecord (by key id)
//! doc data      postcard(Document) payloads
//! ```
//!
//! The checksum is `blake3(header[..CHECKSUM_OFFSET] ++ blake3(body))`, so it
//! covers the flags and the section table as well as every body byte.

use crate::dictionary::Posting;
use crate::reader::error::ReadError;
use crate::types::KeyId;

pub(crate) const MAGIC: [u8; 8] = *b"DZLFUZZY";
pub(crate) const VERSION: u32 = 1;
pub(crate) const FLAG_CASE_SENSITIVE: u32 = 1;

pub(crate) const SECTION_COUNT: usize = 5;
pub(crate) const CHECKSUM_LEN: usize = 32;
pub(crate) const CHECKSUM_OFFSET: usize = 8 + 4 + 4 + SECTION_COUNT * 16;
pub(crate) const HEADER_LEN: usize = CHECKSUM_OFFSET + CHECKSUM_LEN;

pub(crate) const COUNT_LEN: usize = 4;
pub(crate) const KEY_RECORD_LEN: usize = 16;
pub(crate) const POSTINGS_RECORD_LEN: usize = 16;
pub(crate) const POSTING_LEN: usize = 8;
pub(crate) const DOCUMENT_RECORD_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SectionKind {
    Metadata = 0,
    Keys = 1,
    Postings = 2,
    DocumentIndex = 3,
    DocumentData = 4,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Section {
    pub offset: u64,
    pub len: u64,
}

impl Section {
    /// `None` when the header claims a range past `u64::MAX`.
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.len)
    }
}

/// Checksum over the header fields before the checksum and the body digest.
pub(crate) fn checksum(
    header_prefix: &[u8],
    body_digest: &[u8; CHECKSUM_LEN],
) -> [u8; CHECKSUM_LEN] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(header_prefix);
    hasher.update(body_digest);
    *hasher.finalize().as_bytes()
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Header {
    pub flags: u32,
    pub sections: [Section; SECTION_COUNT],
    pub checksum: [u8; CHECKSUM_LEN],
}

impl Header {
    pub fn case_sensitive(&self) -> bool {
        self.flags & FLAG_CASE_SENSITIVE != 0
    }

    pub fn section(&self, kind: SectionKind) -> Section {
        self.sections[kind as usize]
    }

    pub fn set_section(&mut self, kind: SectionKind, section: Section) {
        self.sections[kind as usize] = section;
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..8].copy_from_slice(&MAGIC);
        out[8..12].copy_from_slice(&VERSION.to_le_bytes());
        out[12..16].copy_from_slice(&self.flags.to_le_bytes());

        let mut at = 16;
        for section in &self.sections {
            out[at..at + 8].copy_from_slice(&section.offset.to_le_bytes());
            out[at + 8..at + 16].copy_from_slice(&section.len.to_le_bytes());
            at += 16;
        }
        out[at..at + CHECKSUM_LEN].copy_from_slice(&self.checksum);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ReadError> {
        if bytes.len() < HEADER_LEN {
            return Err(ReadError::Truncated);
        }
        if bytes[..8] != MAGIC {
            return Err(ReadError::BadMagic);
        }
        let version = read_u32(bytes, 8)?;
        if version != VERSION {
            return Err(ReadError::UnsupportedVersion(version));
        }

        let mut header = Header {
            flags: read_u32(bytes, 12)?,
            ..Header::default()
        };
        let mut at = 16;
        for section in header.sections.iter_mut() {
            section.offset = read_u64(bytes, at)?;
            section.len = read_u64(bytes, at + 8)?;
            at += 16;
        }
        header.checksum.copy_from_slice(&bytes[at..at + CHECKSUM_LEN]);
        Ok(header)
    }
}

/// Location of one key's text and its priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct KeyRecord {
    pub text_offset: u64,
    pub text_len: u32,
    pub priority: u32,
}

impl KeyRecord {
    pub fn encode(&self) -> [u8; KEY_RECORD_LEN] {
        let mut out = [0u8; KEY_RECORD_LEN];
        out[..8].copy_from_slice(&self.text_offset.to_le_bytes());
        out[8..12].copy_from_slice(&self.text_len.to_le_bytes());
        out[12..16].copy_from_slice(&self.priority.to_le_bytes());
        out
    }

    pub fn decode(bytes: &[u8], at: usize) -> Result<Self, ReadError> {
        Ok(Self {
            text_offset: read_u64(bytes, at)?,
            text_len: read_u32(bytes, at + 8)?,
            priority: read_u32(bytes, at + 12)?,
        })
    }
}

/// Directory entry of one codepoint's posting list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PostingsRecord {
    pub codepoint: u32,
    pub len: u32,
    pub offset: u64,
}

impl PostingsRecord {
    pub fn encode(&self) -> [u8; POSTINGS_RECORD_LEN] {
        let mut out = [0u8; POSTINGS_RECORD_LEN];
        out[..4].copy_from_slice(&self.codepoint.to_le_bytes());
        out[4..8].copy_from_slice(&self.len.to_le_bytes());
        out[8..16].copy_from_slice(&self.offset.to_le_bytes());
        out
    }

    pub fn decode(bytes: &[u8], at: usize) -> Result<Self, ReadError> {
        Ok(Self {
            codepoint: read_u32(bytes, at)?,
            len: read_u32(bytes, at + 4)?,
            offset: read_u64(bytes, at + 8)?,
        })
    }
}

/// Location of one key's encoded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DocumentRecord {
    pub offset: u64,
    pub len: u32,
}

impl DocumentRecord {
    pub fn encode(&self) -> [u8; DOCUMENT_RECORD_LEN] {
        let mut out = [0u8; DOCUMENT_RECORD_LEN];
        out[..8].copy_from_slice(&self.offset.to_le_bytes());
        out[8..12].copy_from_slice(&self.len.to_le_bytes());
        out
    }

    pub fn decode(bytes: &[u8], at: usize) -> Result<Self, ReadError> {
        Ok(Self {
            offset: read_u64(bytes, at)?,
            len: read_u32(bytes, at + 8)?,
        })
    }
}

pub(crate) fn encode_posting(posting: Posting) -> [u8; POSTING_LEN] {
    let mut out = [0u8; POSTING_LEN];
    out[..4].copy_from_slice(&posting.key_id.into_inner().to_le_bytes());
    out[4..8].copy_from_slice(&posting.offset.to_le_bytes());
    out
}

/// Decodes the posting at the start of `raw`.
///
/// Panics if `raw` is shorter than [`POSTING_LEN`]; callers slice from
/// validated tables.
pub(crate) fn decode_posting(raw: &[u8]) -> Posting {
    let key_id = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
    let offset = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);
    Posting::new(KeyId::new(key_id), offset)
}

pub(crate) fn read_u32(bytes: &[u8], at: usize) -> Result<u32, ReadError> {
    let chunk = bytes
        .get(at..at + 4)
        .and_then(|b| <[u8; 4]>::try_from(b).ok())
        .ok_or(ReadError::Truncated)?;
    Ok(u32::from_le_bytes(chunk))
}

pub(crate) fn read_u64(bytes: &[u8], at: usize) -> Result<u64, ReadError> {
    let chunk = bytes
        .get(at..at + 8)
        .and_then(|b| <[u8; 8]>::try_from(b).ok())
        .ok_or(ReadError::Truncated)?;
    Ok(u64::from_le_bytes(chunk))
}

#[cfg(test)]
mod tests;
