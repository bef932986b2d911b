use nutype::nutype;

/// Identifier of a key inside a dictionary.
///
/// Ids are handed out in increasing order and never reused, so postings can
/// be kept sorted by appending.
#[nutype(
    const_fn,
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Display,
        Into,
        Serialize,
        Deserialize,
    )
)]
pub struct KeyId(u32);

impl KeyId {
    pub const MIN: KeyId = KeyId::new(0);

    /// The id following this one, or `None` at `u32::MAX`.
    pub fn next(self) -> Option<KeyId> {
        self.into_inner().checked_add(1).map(KeyId::new)
    }

    pub(crate) fn index(self) -> usize {
        self.into_inner() as usize
    }
}

/// Identifier handed out by [`IndexBuilder::insert`](crate::IndexBuilder::insert).
#[nutype(
    const_fn,
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Display,
        Into,
        Serialize,
        Deserialize,
    )
)]
pub struct DocumentId(u64);

#[cfg(test)]
mod tests;
