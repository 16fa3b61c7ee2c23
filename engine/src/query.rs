use std::collections::BTreeSet;

use crate::corpus::DocId;
use crate::index::{IndexBundle, Postings};
use crate::synonyms::SynonymTable;
use crate::tokenizer::tokenize;

/// Candidate retrieval semantics for one search call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Union: documents matching at least one token in any field.
    #[default]
    Any,
    /// Intersection: documents matching every token (in whichever field).
    All,
}

/// Tokenize a raw query with stemming enabled and expand origin-related
/// tokens through the synonym table. Expansion is additive: the canonical key
/// joins the set and the original token stays. Multi-word canonicals also
/// contribute their constituent words, since the categorical indices are
/// keyed by single tokens.
pub fn prepare_query(query: &str, synonyms: &SynonymTable) -> BTreeSet<String> {
    let tokens = tokenize(query, true);
    let mut expanded: BTreeSet<String> = tokens.iter().cloned().collect();
    for token in &tokens {
        if let Some(canonical) = synonyms.resolve(token) {
            expanded.insert(canonical.to_string());
            for word in canonical.split_whitespace() {
                expanded.insert(word.to_string());
            }
        }
    }
    expanded
}

fn collect_docs(token: &str, bundle: &IndexBundle, into: &mut BTreeSet<DocId>) {
    for index in bundle.token_fields() {
        match index.postings(token) {
            Some(Postings::Positional(by_doc)) => into.extend(by_doc.keys().cloned()),
            Some(Postings::Membership(docs)) => into.extend(docs.iter().cloned()),
            None => {}
        }
    }
}

/// OR retrieval: union of every token's matches across all four field
/// indices. A token absent everywhere contributes nothing.
pub fn docs_matching_any(tokens: &BTreeSet<String>, bundle: &IndexBundle) -> BTreeSet<DocId> {
    let mut found = BTreeSet::new();
    for token in tokens {
        collect_docs(token, bundle, &mut found);
    }
    found
}

/// AND retrieval: each token's per-field union is intersected with the
/// running result. The first token seeds the result; a token absent from
/// every index collapses the intersection to empty, and it stays empty.
pub fn docs_matching_all(tokens: &BTreeSet<String>, bundle: &IndexBundle) -> BTreeSet<DocId> {
    let mut result: Option<BTreeSet<DocId>> = None;
    for token in tokens {
        let mut token_docs = BTreeSet::new();
        collect_docs(token, bundle, &mut token_docs);
        result = Some(match result {
            None => token_docs,
            Some(acc) => acc.intersection(&token_docs).cloned().collect(),
        });
        if result.as_ref().map_or(false, BTreeSet::is_empty) {
            break;
        }
    }
    result.unwrap_or_default()
}

pub fn retrieve(tokens: &BTreeSet<String>, bundle: &IndexBundle, mode: MatchMode) -> BTreeSet<DocId> {
    match mode {
        MatchMode::Any => docs_matching_any(tokens, bundle),
        MatchMode::All => docs_matching_all(tokens, bundle),
    }
}
