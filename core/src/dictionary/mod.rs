//! Key dictionary: unique key strings plus the per-character inverted index.
//!
//! Design:
//! - Keys are deduplicated on their folded text and addressed by [`KeyId`].
//! - Every folded codepoint owns a postings list of `(key_id, offset)`,
//!   sorted so lookups can binary search.
//! - Removal is tombstone-based: the key text goes away immediately, its
//!   postings are hidden and purged in one pass once enough tombstones pile
//!   up.
//! - While deferred (bulk insert), postings are appended unsorted and only
//!   the touched lists are sorted when the deferred section ends.

use crate::matching::{PostingList, fold, fold_char};
use crate::types::{FuzzyConfig, KeyId};
use std::collections::{BTreeMap, HashMap, HashSet};

/// One occurrence of a codepoint in a key.
///
/// Ordering is `(key_id, offset)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Posting {
    pub key_id: KeyId,
    pub offset: u32,
}

impl Posting {
    pub const fn new(key_id: KeyId, offset: u32) -> Self {
        Self { key_id, offset }
    }
}

#[derive(Debug, Clone)]
pub struct KeyDictionary {
    case_sensitive: bool,
    /// Original text of every live key.
    texts: BTreeMap<KeyId, String>,
    /// Folded text to id.
    ids: HashMap<String, KeyId>,
    postings: BTreeMap<char, Vec<Posting>>,
    tombstones: HashSet<KeyId>,
    compact_threshold: usize,
    next_id: u32,
    deferred: bool,
    unsorted: HashSet<char>,
}

impl KeyDictionary {
    pub fn new(case_sensitive: bool) -> Self {
        Self::with_compact_threshold(case_sensitive, FuzzyConfig::default().compact_threshold)
    }

    pub fn with_compact_threshold(case_sensitive: bool, compact_threshold: usize) -> Self {
        Self {
            case_sensitive,
            texts: BTreeMap::new(),
            ids: HashMap::new(),
            postings: BTreeMap::new(),
            tombstones: HashSet::new(),
            compact_threshold,
            next_id: 0,
            deferred: false,
            unsorted: HashSet::new(),
        }
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Key operations.
impl KeyDictionary {
    /// Registers `text` and returns its id.
    ///
    /// Returns the existing id when the folded text is already present; the
    /// stored text is left untouched in that case.
    ///
    /// # Panics
    ///
    /// After `u32::MAX` distinct keys.
    pub fn add_key(&mut self, text: &str) -> KeyId {
        let folded = fold(text, self.case_sensitive);
        if let Some(&id) = self.ids.get(&folded) {
            return id;
        }

        let id = KeyId::new(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .expect("key id space exhausted");

        for (offset, ch) in folded.chars().enumerate() {
            let posting = Posting::new(id, offset as u32);
            let list = self.postings.entry(ch).or_default();

            if self.deferred {
                list.push(posting);
                self.unsorted.insert(ch);
            } else {
                let at = list.partition_point(|p| *p < posting);
                list.insert(at, posting);
            }
        }

        self.ids.insert(folded, id);
        self.texts.insert(id, text.to_string());
        id
    }

    /// Removes a key and hides its postings. Unknown ids are ignored.
    pub fn remove_key(&mut self, key_id: KeyId) -> bool {
        let Some(text) = self.texts.remove(&key_id) else {
            return false;
        };
        self.ids.remove(&fold(&text, self.case_sensitive));
        self.tombstones.insert(key_id);

        if !self.deferred {
            self.compact_if_needed();
        }
        true
    }

    pub fn lookup(&self, text: &str) -> Option<KeyId> {
        self.ids.get(&fold(text, self.case_sensitive)).copied()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.lookup(text).is_some()
    }

    pub fn is_live(&self, key_id: KeyId) -> bool {
        self.texts.contains_key(&key_id)
    }

    /// Original (unfolded) text of a live key.
    pub fn get_text(&self, key_id: KeyId) -> Option<&str> {
        self.texts.get(&key_id).map(String::as_str)
    }

    /// Live keys in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (KeyId, &str)> + '_ {
        self.texts.iter().map(|(id, text)| (*id, text.as_str()))
    }
}

/// Postings operations.
impl KeyDictionary {
    /// Sorted postings of `ch`, folded per the dictionary's mode.
    ///
    /// Empty if the codepoint was never indexed.
    pub fn get_postings(&self, ch: char) -> Postings<'_> {
        debug_assert!(!self.deferred, "postings queried during a deferred section");

        let ch = fold_char(ch, self.case_sensitive);
        Postings {
            items: self.postings.get(&ch).map(Vec::as_slice).unwrap_or(&[]),
            tombstones: &self.tombstones,
        }
    }

    /// Every postings list in codepoint order, tombstoned entries included.
    pub(crate) fn raw_postings(&self) -> impl Iterator<Item = (char, &[Posting])> + '_ {
        self.postings.iter().map(|(ch, list)| (*ch, list.as_slice()))
    }

    pub fn is_deferred(&self) -> bool {
        self.deferred
    }

    /// Stops keeping postings sorted on every insert.
    pub fn begin_deferred(&mut self) {
        self.deferred = true;
    }

    /// Sorts the lists touched since [`begin_deferred`](Self::begin_deferred)
    /// and compacts if needed.
    pub fn finish_deferred(&mut self) {
        if !self.deferred {
            return;
        }
        self.deferred = false;

        let touched = self.unsorted.len();
        for ch in self.unsorted.drain() {
            if let Some(list) = self.postings.get_mut(&ch) {
                list.sort_unstable();
            }
        }
        log::debug!("sorted {} postings lists after deferred insert", touched);

        self.compact_if_needed();
    }

    fn compact_if_needed(&mut self) {
        if self.tombstones.len() > self.compact_threshold {
            self.compact();
        }
    }

    /// Physically removes the postings of every removed key.
    pub fn compact(&mut self) {
        if self.tombstones.is_empty() {
            return;
        }

        let tombstones = &self.tombstones;
        let mut purged = 0usize;
        self.postings.retain(|_, list| {
            let before = list.len();
            list.retain(|p| !tombstones.contains(&p.key_id));
            purged += before - list.len();
            !list.is_empty()
        });

        log::debug!(
            "compacted {} postings of {} removed keys",
            purged,
            self.tombstones.len()
        );
        self.tombstones.clear();
    }

    #[cfg(test)]
    pub(crate) fn tombstone_count(&self) -> usize {
        self.tombstones.len()
    }
}

/// Borrowed view of one codepoint's postings.
///
/// [`iter`](Postings::iter) skips removed keys. The [`PostingList`] impl
/// exposes the raw sorted slice for binary search; callers filter removed
/// keys themselves.
#[derive(Debug, Clone, Copy)]
pub struct Postings<'a> {
    items: &'a [Posting],
    tombstones: &'a HashSet<KeyId>,
}

impl<'a> Postings<'a> {
    pub fn iter(&self) -> impl Iterator<Item = Posting> + 'a {
        let tombstones = self.tombstones;
        self.items
            .iter()
            .copied()
            .filter(move |p| !tombstones.contains(&p.key_id))
    }

    pub fn to_vec(&self) -> Vec<Posting> {
        self.iter().collect()
    }
}

impl PostingList for Postings<'_> {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn get(&self, index: usize) -> Posting {
        self.items[index]
    }

    fn lower_bound(&self, target: Posting) -> usize {
        self.items.partition_point(|p| *p < target)
    }
}
