//! Case folding, subsequence matching and scoring.
//!
//! The mutable index, the index file reader and the highlighter all bind
//! query characters the same way: each query character takes the earliest
//! position after the previous binding (greedy leftmost), starting from the
//! first occurrence of the first query character. Scores are computed from
//! those positions, so a highlighted result always shows why it ranked where
//! it did.

use crate::dictionary::Posting;
use crate::types::KeyId;
use std::cmp::Ordering;

/// Upper bound of the penalty charged for matches that start late.
const LEADING_PENALTY_MAX: u32 = 16;
const LEADING_PENALTY_PER_CHAR: u32 = 4;
const BOUNDARY_BONUS: f32 = 0.25;
const EXACT_CASE_BONUS: f32 = 0.10;

/// Folds a single codepoint.
///
/// Folding is 1:1 on codepoints so character offsets agree between the
/// folded and original text.
#[inline]
pub fn fold_char(ch: char, case_sensitive: bool) -> char {
    if case_sensitive {
        ch
    } else {
        ch.to_lowercase().next().unwrap_or(ch)
    }
}

pub fn fold(text: &str, case_sensitive: bool) -> String {
    text.chars().map(|ch| fold_char(ch, case_sensitive)).collect()
}

/// Read access to postings sorted by `(key_id, offset)`.
pub trait PostingList {
    fn len(&self) -> usize;

    fn get(&self, index: usize) -> Posting;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the first posting that is not less than `target`.
    fn lower_bound(&self, target: Posting) -> usize {
        let (mut lo, mut hi) = (0, self.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.get(mid) < target {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }
}

impl PostingList for [Posting] {
    fn len(&self) -> usize {
        <[Posting]>::len(self)
    }

    fn get(&self, index: usize) -> Posting {
        self[index]
    }

    fn lower_bound(&self, target: Posting) -> usize {
        self.partition_point(|p| *p < target)
    }
}

impl<T: PostingList + ?Sized> PostingList for &T {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, index: usize) -> Posting {
        (**self).get(index)
    }

    fn lower_bound(&self, target: Posting) -> usize {
        (**self).lower_bound(target)
    }
}

/// A key that contains the whole query, with one bound offset per query
/// character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub key_id: KeyId,
    pub positions: Vec<u32>,
}

/// Finds every live key containing the query as a subsequence.
///
/// `tables[i]` holds the postings of the i-th query character. Only keys
/// present in `tables[0]` are visited; each one is extended through the
/// following tables by binary search.
pub fn collect_candidates<L: PostingList>(
    tables: &[L],
    mut is_live: impl FnMut(KeyId) -> bool,
) -> Vec<Candidate> {
    let Some((first, rest)) = tables.split_first() else {
        return Vec::new();
    };
    if rest.iter().any(|table| table.is_empty()) {
        return Vec::new();
    }

    let mut candidates = Vec::new();
    let mut i = 0;

    while i < first.len() {
        let head = first.get(i);

        if is_live(head.key_id) {
            if let Some(positions) = extend(rest, head) {
                candidates.push(Candidate {
                    key_id: head.key_id,
                    positions,
                });
            }
        }

        // Postings within a key are sorted by offset, so the first one seen is
        // the leftmost start; skip the rest of this key.
        match head.key_id.next() {
            Some(next) => i = first.lower_bound(Posting::new(next, 0)),
            None => break,
        }
    }

    candidates
}

fn extend<L: PostingList>(tables: &[L], head: Posting) -> Option<Vec<u32>> {
    let mut positions = Vec::with_capacity(tables.len() + 1);
    positions.push(head.offset);

    let mut prev = head;
    for table in tables {
        let target = Posting::new(prev.key_id, prev.offset.checked_add(1)?);
        let j = table.lower_bound(target);
        if j >= table.len() {
            return None;
        }
        let found = table.get(j);
        if found.key_id != head.key_id {
            return None;
        }
        positions.push(found.offset);
        prev = found;
    }

    Some(positions)
}

/// Greedy leftmost positions of `query` inside `text`, or `None` when the
/// query is not a subsequence of the text.
///
/// An empty query matches with no positions.
pub fn greedy_positions(text: &str, query: &str, case_sensitive: bool) -> Option<Vec<u32>> {
    let mut needle = query
        .chars()
        .map(|ch| fold_char(ch, case_sensitive))
        .peekable();
    let mut positions = Vec::new();

    for (offset, ch) in text.chars().enumerate() {
        let Some(&want) = needle.peek() else {
            break;
        };
        if fold_char(ch, case_sensitive) == want {
            positions.push(u32::try_from(offset).ok()?);
            needle.next();
        }
    }

    needle.peek().is_none().then_some(positions)
}

/// Scores a match of `query` in `text` at the given positions.
///
/// Higher is better. With everything else fixed the score strictly decreases
/// as the total gap between consecutive positions grows. Matches on word
/// boundaries and with the exact case of the query get a bonus.
pub fn score(text: &str, query: &str, positions: &[u32], case_sensitive: bool) -> f32 {
    let Some(&start) = positions.first() else {
        return 0.0;
    };

    let chars: Vec<char> = text.chars().collect();
    let gap: u64 = positions
        .windows(2)
        .map(|w| u64::from(w[1].saturating_sub(w[0]).saturating_sub(1)))
        .sum();
    let lead = start
        .saturating_mul(LEADING_PENALTY_PER_CHAR)
        .min(LEADING_PENALTY_MAX);
    let denominator = (chars.len() as u64 + gap + u64::from(lead)).max(1);
    let base = 1.0 / denominator as f32;

    let mut boundary = 0u32;
    let mut exact = 0u32;
    for (&pos, wanted) in positions.iter().zip(query.chars()) {
        let idx = pos as usize;
        let Some(&ch) = chars.get(idx) else {
            continue;
        };
        if is_word_boundary(&chars, idx) {
            boundary += 1;
        }
        if case_sensitive || ch == wanted {
            exact += 1;
        }
    }

    let n = positions.len() as f32;
    base * (1.0 + BOUNDARY_BONUS * boundary as f32 / n + EXACT_CASE_BONUS * exact as f32 / n)
}

fn is_word_boundary(chars: &[char], idx: usize) -> bool {
    let Some(prev) = idx.checked_sub(1).and_then(|i| chars.get(i)) else {
        return true;
    };
    let ch = chars[idx];
    !prev.is_alphanumeric() || (prev.is_lowercase() && ch.is_uppercase())
}

/// Something that can be placed in a ranked result list.
pub trait Ranked {
    fn score(&self) -> f32;
    fn priority(&self) -> u32;
    fn key_id(&self) -> KeyId;
}

/// Score descending, then priority ascending, then key id ascending.
pub fn compare_ranked<T: Ranked>(a: &T, b: &T) -> Ordering {
    b.score()
        .total_cmp(&a.score())
        .then_with(|| a.priority().cmp(&b.priority()))
        .then_with(|| a.key_id().cmp(&b.key_id()))
}

/// Sorts `items` by rank and keeps at most `max_matches` of them.
///
/// `max_matches == 0` keeps everything.
pub fn rank<T: Ranked>(items: &mut Vec<T>, max_matches: usize) {
    items.sort_by(compare_ranked);
    if max_matches > 0 {
        items.truncate(max_matches);
    }
}

#[cfg(test)]
mod tests;
