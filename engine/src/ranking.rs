use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::corpus::DocId;
use crate::index::{FieldIndex, IndexBundle, Postings};

/// Weights of the four ranking signals. A signal left unspecified in an
/// override weighs zero, so `Default` is all-zero; the serving default lives
/// in [`DEFAULT_WEIGHTS`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    pub bm25_title: f64,
    pub bm25_description: f64,
    pub exact_match: f64,
    pub reviews: f64,
}

/// The one place the serving weight configuration is defined.
pub const DEFAULT_WEIGHTS: RankingWeights = RankingWeights {
    bm25_title: 2.0,
    bm25_description: 1.0,
    exact_match: 1.5,
    reviews: 0.7,
};

/// BM25 parameters. `total_docs` overrides the collection size otherwise
/// inferred from the field index itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
    pub total_docs: Option<usize>,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Bm25Params {
            k1: 1.2,
            b: 0.75,
            total_docs: None,
        }
    }
}

/// Per-field statistics needed by BM25, computed once per field index.
///
/// For positional fields the document length is reconstructed from postings
/// as max recorded position + 1, and the average is taken over documents with
/// at least one posting. Membership fields have no length notion, so both
/// lengths are fixed at 1 and the length penalty vanishes.
#[derive(Debug, Clone)]
struct FieldStats {
    total_docs: usize,
    doc_lens: HashMap<DocId, u32>,
    avg_len: f64,
    positional: bool,
}

impl FieldStats {
    fn compute(index: &FieldIndex, total_docs_override: Option<usize>) -> Self {
        let mut docs: BTreeSet<&str> = BTreeSet::new();
        let mut doc_lens: HashMap<DocId, u32> = HashMap::new();
        for (_, postings) in index.iter() {
            match postings {
                Postings::Positional(by_doc) => {
                    for (doc, positions) in by_doc {
                        docs.insert(doc.as_str());
                        if let Some(&last) = positions.last() {
                            let len = last + 1;
                            let entry = doc_lens.entry(doc.clone()).or_insert(0);
                            if len > *entry {
                                *entry = len;
                            }
                        }
                    }
                }
                Postings::Membership(members) => {
                    docs.extend(members.iter().map(String::as_str));
                }
            }
        }
        let positional = index.is_positional();
        let avg_len = if positional {
            if doc_lens.is_empty() {
                0.0
            } else {
                doc_lens.values().map(|&l| f64::from(l)).sum::<f64>() / doc_lens.len() as f64
            }
        } else {
            1.0
        };
        FieldStats {
            total_docs: total_docs_override.unwrap_or(docs.len()),
            doc_lens,
            avg_len,
            positional,
        }
    }

    fn doc_len(&self, doc: &str) -> f64 {
        if self.positional {
            self.doc_lens.get(doc).map_or(0.0, |&l| f64::from(l))
        } else {
            1.0
        }
    }
}

fn idf(total_docs: usize, df: usize) -> f64 {
    let n = total_docs as f64;
    let df = df as f64;
    (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
}

fn bm25_with_stats(
    tokens: &BTreeSet<String>,
    doc: &str,
    index: &FieldIndex,
    stats: &FieldStats,
    params: &Bm25Params,
) -> f64 {
    if stats.avg_len <= 0.0 {
        return 0.0;
    }
    let mut score = 0.0;
    for token in tokens {
        let tf = index.term_frequency(token, doc) as f64;
        if tf <= 0.0 {
            continue;
        }
        let df = index.doc_frequency(token);
        if df == 0 {
            continue;
        }
        let doc_len = stats.doc_len(doc);
        let norm = 1.0 - params.b + params.b * doc_len / stats.avg_len;
        score += idf(stats.total_docs, df) * (tf * (params.k1 + 1.0)) / (tf + params.k1 * norm);
    }
    score
}

/// BM25 of one document for a token set over a single field index, using only
/// the index (no access to raw text). Tokens with zero term frequency
/// contribute nothing; an empty field scores zero.
pub fn bm25_score(
    tokens: &BTreeSet<String>,
    doc: &str,
    index: &FieldIndex,
    params: &Bm25Params,
) -> f64 {
    let stats = FieldStats::compute(index, params.total_docs);
    bm25_with_stats(tokens, doc, index, &stats, params)
}

/// Fraction of distinct query tokens that match the document in any of the
/// four field indices. Zero for an empty token set.
pub fn exact_match_score(tokens: &BTreeSet<String>, doc: &str, bundle: &IndexBundle) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }
    let matched = tokens
        .iter()
        .filter(|token| {
            bundle
                .token_fields()
                .iter()
                .any(|index| index.contains(token.as_str(), doc))
        })
        .count();
    matched as f64 / tokens.len() as f64
}

/// The document's mean review mark, or zero when it has no aggregate entry.
pub fn reviews_score(doc: &str, bundle: &IndexBundle) -> f64 {
    bundle.reviews.get(doc).map_or(0.0, |stats| stats.mean_mark)
}

/// Scores candidates with the weighted linear model. Field statistics are
/// computed once at construction and shared across candidates.
pub struct Ranker<'a> {
    bundle: &'a IndexBundle,
    weights: RankingWeights,
    params: Bm25Params,
    title_stats: FieldStats,
    description_stats: FieldStats,
}

impl<'a> Ranker<'a> {
    pub fn new(bundle: &'a IndexBundle, weights: RankingWeights, params: Bm25Params) -> Self {
        Ranker {
            title_stats: FieldStats::compute(&bundle.title, params.total_docs),
            description_stats: FieldStats::compute(&bundle.description, params.total_docs),
            bundle,
            weights,
            params,
        }
    }

    /// Weighted linear combination of BM25(title), BM25(description), the
    /// exact-match ratio, and the review signal.
    pub fn score(&self, tokens: &BTreeSet<String>, doc: &str) -> f64 {
        let w = &self.weights;
        w.bm25_title
            * bm25_with_stats(tokens, doc, &self.bundle.title, &self.title_stats, &self.params)
            + w.bm25_description
                * bm25_with_stats(
                    tokens,
                    doc,
                    &self.bundle.description,
                    &self.description_stats,
                    &self.params,
                )
            + w.exact_match * exact_match_score(tokens, doc, self.bundle)
            + w.reviews * reviews_score(doc, self.bundle)
    }

    /// Score and sort candidates, descending. Equal scores order by ascending
    /// document id, so the output is reproducible. Truncates to `top_k` when
    /// given.
    pub fn rank(
        &self,
        tokens: &BTreeSet<String>,
        candidates: &BTreeSet<DocId>,
        top_k: Option<usize>,
    ) -> Vec<(DocId, f64)> {
        let mut scored: Vec<(DocId, f64)> = candidates
            .iter()
            .map(|doc| (doc.clone(), self.score(tokens, doc)))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        if let Some(k) = top_k {
            scored.truncate(k);
        }
        scored
    }
}
