//! The `headers` module holds the ordered header lists of a request and its response.
//!
//! Lookups scan the list in order and compare keys ASCII case-insensitively over the length
//! of the key being looked up. A lookup key that is a prefix of a stored key therefore
//! matches that stored key (`X-Fo` finds `X-Foo`). Server modules written against this
//! list rely on that behaviour, so it is kept, but new code should pass full header names.

use std::collections::HashMap;

/// Simple macro to create a header entry from a key and value
#[macro_export]
macro_rules! h {
    ($key:expr, $value:expr) => {
        $crate::headers::HeaderEntry::new($key, $value)
    };
}

/// Single header line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    /// Presence marker maintained by the runtime. Entries added from scripts are set to 1.
    pub hash: usize,
    /// Header name as received or set
    pub key: Vec<u8>,
    /// Header value
    pub value: Vec<u8>,
}

impl HeaderEntry {
    /// Creates a present header entry
    pub fn new<K: AsRef<[u8]>, V: AsRef<[u8]>>(key: K, value: V) -> HeaderEntry {
        HeaderEntry {
            hash: 1,
            key: key.as_ref().to_vec(),
            value: value.as_ref().to_vec(),
        }
    }

    /// If the stored key starts with `key`, ignoring ASCII case
    pub fn key_matches(&self, key: &[u8]) -> bool {
        self.key.len() >= key.len() && self.key[..key.len()].eq_ignore_ascii_case(key)
    }
}

/// What a write does when no existing entry matches the key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderPolicy {
    /// Only existing entries are replaced; request headers are fixed by the client
    ReplaceOnly,
    /// Missing entries are appended; scripts may add outbound headers
    ReplaceOrInsert,
}

impl HeaderPolicy {
    fn inserts(self) -> bool {
        self == HeaderPolicy::ReplaceOrInsert
    }
}

/// Ordered header list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderList {
    entries: Vec<HeaderEntry>,
}

impl HeaderList {
    /// Creates an empty list
    pub fn new() -> HeaderList {
        HeaderList::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// If the list has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends an entry without looking for an existing one. Used by the runtime when it
    /// parses the header block.
    pub fn push(&mut self, entry: HeaderEntry) {
        self.entries.push(entry);
    }

    /// Entries in wire order
    pub fn iter(&self) -> impl Iterator<Item = &HeaderEntry> {
        self.entries.iter()
    }

    /// Returns the value of the first entry whose key matches
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        // linear scan, header lists are short
        self.entries
            .iter()
            .find(|entry| entry.key_matches(key))
            .map(|entry| entry.value.as_slice())
    }

    /// Returns the value of the first entry whose key equals `key`, ignoring ASCII case
    pub fn get_exact(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|entry| entry.key.eq_ignore_ascii_case(key))
            .map(|entry| entry.value.as_slice())
    }

    /// Replaces the value of the first matching entry, leaving its key untouched. When no
    /// entry matches and `insert_if_absent` is set, a new entry is appended at the end.
    pub fn set_or_update(&mut self, key: &[u8], value: &[u8], insert_if_absent: bool) {
        match self.entries.iter_mut().find(|entry| entry.key_matches(key)) {
            Some(entry) => entry.value = value.to_vec(),
            None => {
                if insert_if_absent {
                    self.entries.push(HeaderEntry::new(key, value));
                } else {
                    trace!(
                        "no header matching '{}', leaving list unchanged",
                        String::from_utf8_lossy(key)
                    );
                }
            }
        }
    }

    /// Writes a header following the given policy
    pub fn set_with_policy(&mut self, key: &[u8], value: &[u8], policy: HeaderPolicy) {
        self.set_or_update(key, value, policy.inserts());
    }

    /// Copies every entry into a map keyed by the exact header name. Later entries overwrite
    /// earlier ones with the same key.
    pub fn snapshot_to_map(&self) -> HashMap<Vec<u8>, Vec<u8>> {
        self.entries
            .iter()
            .map(|entry| (entry.key.clone(), entry.value.clone()))
            .collect()
    }
}

impl From<Vec<HeaderEntry>> for HeaderList {
    fn from(entries: Vec<HeaderEntry>) -> Self {
        HeaderList { entries }
    }
}
