//! Signature module.
//!
//! This module decides whether an item from the reference side of a
//! restore is already present on the target side, without any
//! persistent identifier to compare. Identity is approximated by
//! normalized metadata keys, hashed and collected into a set.

use log::trace;
use std::collections::HashSet;

use crate::Item;

/// Sentinel replacing the subject in keys of subject-less items, so
/// that every item produces at least one non-empty key.
pub const NO_SUBJECT: &str = "[NO_SUBJECT]";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Represents a matching strategy: the set of identity keys derived
/// from one item. Two items sharing any key are considered the same
/// item. Swapping the strategy changes what "already present" means
/// without touching the restore engine.
pub trait ItemSignature {
    fn keys(&self, item: &Item) -> Vec<String>;
}

/// The default strategy, built from item metadata only.
///
/// The primary key combines the normalized subject, the receipt
/// timestamp at second precision and the sender address (or display
/// name when the address is missing). The secondary key combines
/// the normalized subject with the byte size, and is only emitted
/// when it differs from the primary: it catches items that lack
/// both timestamp and sender.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MetadataSignature;

impl MetadataSignature {
    fn subject_key(item: &Item) -> String {
        match &item.subject {
            Some(subject) => subject.trim().to_lowercase(),
            None => NO_SUBJECT.into(),
        }
    }
}

impl ItemSignature for MetadataSignature {
    fn keys(&self, item: &Item) -> Vec<String> {
        let subject = Self::subject_key(item);

        let timestamp = item
            .received_at
            .map(|date| date.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default();

        let sender = item
            .sender
            .as_ref()
            .and_then(|sender| sender.addr.as_ref().or(sender.name.as_ref()))
            .map(|sender| sender.to_lowercase())
            .unwrap_or_default();

        let primary = format!("{}|{}|{}", subject, timestamp, sender);
        let secondary = format!("{}|{}", subject, item.size);

        let mut keys = vec![primary];
        if secondary != keys[0] {
            keys.push(secondary);
        }
        keys
    }
}

/// Represents the set of identity keys found on the target side of
/// one folder pair.
///
/// This is a membership oracle only: it answers "is some item with
/// this key present", never "how many". When two reference items
/// collide on the same key while the target holds a single physical
/// match, both read as present and the second one is not restored.
/// That imprecision is part of the matching contract, callers must
/// not compensate for it.
#[derive(Debug, Default)]
pub struct SignatureIndex {
    keys: HashSet<String>,
}

impl SignatureIndex {
    /// Builds the index in one pass over the target items.
    /// Duplicate keys collapse silently.
    pub fn build(signature: &dyn ItemSignature, items: &[Item]) -> Self {
        let mut index = Self::default();
        for item in items {
            for key in signature.keys(item) {
                if !key.is_empty() {
                    index.keys.insert(digest(&key));
                }
            }
        }
        trace!("signature index: {} keys", index.keys.len());
        index
    }

    /// Returns true when any key of the given item is known to the
    /// index.
    pub fn contains(&self, signature: &dyn ItemSignature, item: &Item) -> bool {
        signature
            .keys(item)
            .iter()
            .any(|key| self.keys.contains(&digest(key)))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn digest(key: &str) -> String {
    format!("{:x}", md5::compute(key))
}
