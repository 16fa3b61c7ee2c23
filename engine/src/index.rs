use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::corpus::DocId;
use crate::synonyms::SynonymTable;

/// Borrowed view of one token's postings. Consumers match on the shape rather
/// than sniffing container types.
#[derive(Debug, Clone, Copy)]
pub enum Postings<'a> {
    /// Occurrence offsets per document (free-text fields).
    Positional(&'a BTreeMap<DocId, Vec<u32>>),
    /// Plain membership (categorical fields).
    Membership(&'a BTreeSet<DocId>),
}

/// Inverted index over one field. Free-text fields keep 0-based, strictly
/// increasing occurrence positions per document; categorical fields keep only
/// document membership.
///
/// Ordered maps throughout: rebuilding from the same corpus serializes to
/// byte-identical artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldIndex {
    Positional(BTreeMap<String, BTreeMap<DocId, Vec<u32>>>),
    Membership(BTreeMap<String, BTreeSet<DocId>>),
}

impl FieldIndex {
    pub fn is_positional(&self) -> bool {
        matches!(self, FieldIndex::Positional(_))
    }

    pub fn postings(&self, token: &str) -> Option<Postings<'_>> {
        match self {
            FieldIndex::Positional(by_token) => by_token.get(token).map(Postings::Positional),
            FieldIndex::Membership(by_token) => by_token.get(token).map(Postings::Membership),
        }
    }

    /// Count of occurrences of `token` in `doc`: recorded positions for
    /// positional fields, 1/0 membership for categorical fields.
    pub fn term_frequency(&self, token: &str, doc: &str) -> usize {
        match self.postings(token) {
            Some(Postings::Positional(by_doc)) => by_doc.get(doc).map_or(0, Vec::len),
            Some(Postings::Membership(docs)) => usize::from(docs.contains(doc)),
            None => 0,
        }
    }

    /// Number of documents holding `token` in this field.
    pub fn doc_frequency(&self, token: &str) -> usize {
        match self.postings(token) {
            Some(Postings::Positional(by_doc)) => by_doc.len(),
            Some(Postings::Membership(docs)) => docs.len(),
            None => 0,
        }
    }

    pub fn contains(&self, token: &str, doc: &str) -> bool {
        self.term_frequency(token, doc) > 0
    }

    /// Distinct documents appearing anywhere in this field's index.
    pub fn distinct_docs(&self) -> usize {
        let mut docs: BTreeSet<&str> = BTreeSet::new();
        match self {
            FieldIndex::Positional(by_token) => {
                for by_doc in by_token.values() {
                    docs.extend(by_doc.keys().map(String::as_str));
                }
            }
            FieldIndex::Membership(by_token) => {
                for members in by_token.values() {
                    docs.extend(members.iter().map(String::as_str));
                }
            }
        }
        docs.len()
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = (&str, Postings<'_>)> + '_> {
        match self {
            FieldIndex::Positional(by_token) => Box::new(
                by_token
                    .iter()
                    .map(|(t, p)| (t.as_str(), Postings::Positional(p))),
            ),
            FieldIndex::Membership(by_token) => Box::new(
                by_token
                    .iter()
                    .map(|(t, d)| (t.as_str(), Postings::Membership(d))),
            ),
        }
    }
}

/// Per-document review aggregate. All three fields are zero for a document
/// without reviews.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewStats {
    pub total_reviews: u32,
    pub mean_mark: f64,
    pub last_rating: u8,
}

impl ReviewStats {
    pub const NONE: ReviewStats = ReviewStats {
        total_reviews: 0,
        mean_mark: 0.0,
        last_rating: 0,
    };
}

/// The complete read-only index set for one corpus snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexBundle {
    pub title: FieldIndex,
    pub description: FieldIndex,
    pub brand: FieldIndex,
    pub origin: FieldIndex,
    pub reviews: BTreeMap<DocId, ReviewStats>,
    pub synonyms: SynonymTable,
}

impl IndexBundle {
    /// The four field indices consulted for candidate retrieval and exact
    /// matching, in a fixed order.
    pub fn token_fields(&self) -> [&FieldIndex; 4] {
        [&self.title, &self.description, &self.brand, &self.origin]
    }
}
