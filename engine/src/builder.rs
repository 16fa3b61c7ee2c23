use anyhow::{bail, Result};
use std::collections::{BTreeMap, BTreeSet};
use time::macros::format_description;
use time::Date;

use crate::corpus::{DocId, Product};
use crate::index::{FieldIndex, IndexBundle, ReviewStats};
use crate::synonyms::SynonymTable;
use crate::tokenizer::tokenize;

/// Feature name indexed into the brand index by default.
pub const BRAND_FEATURE: &str = "brand";
/// Feature name indexed into the origin index by default.
pub const ORIGIN_FEATURE: &str = "made in";

/// Build a positional index over one free-text field. Tokenization runs
/// without stemming; positions are the 0-based offsets in the token sequence,
/// recorded in increasing order.
fn positional_index<F>(products: &[Product], field: F) -> FieldIndex
where
    F: Fn(&Product) -> &str,
{
    let mut by_token: BTreeMap<String, BTreeMap<DocId, Vec<u32>>> = BTreeMap::new();
    for product in products {
        let tokens = tokenize(field(product), false);
        for (pos, token) in tokens.iter().enumerate() {
            by_token
                .entry(token.clone())
                .or_default()
                .entry(product.url.clone())
                .or_default()
                .push(pos as u32);
        }
    }
    FieldIndex::Positional(by_token)
}

/// Build a membership index over one categorical feature. The feature's text
/// value is tokenized and each distinct token maps to the documents carrying
/// it; no positions are kept.
pub fn build_feature_index(products: &[Product], feature: &str) -> FieldIndex {
    let mut by_token: BTreeMap<String, BTreeSet<DocId>> = BTreeMap::new();
    for product in products {
        let value = product
            .product_features
            .get(feature)
            .map(String::as_str)
            .unwrap_or("");
        for token in tokenize(value, false) {
            by_token.entry(token).or_default().insert(product.url.clone());
        }
    }
    FieldIndex::Membership(by_token)
}

pub fn build_title_index(products: &[Product]) -> FieldIndex {
    positional_index(products, |p| &p.title)
}

pub fn build_description_index(products: &[Product]) -> FieldIndex {
    positional_index(products, |p| &p.description)
}

/// Aggregate reviews per document. A document without reviews gets all-zero
/// stats. `last_rating` comes from the review with the most recent date; when
/// dates tie, the earliest-listed review wins. An unparsable date aborts the
/// whole build, since a silently dropped review would corrupt `mean_mark`.
pub fn build_reviews_aggregate(products: &[Product]) -> Result<BTreeMap<DocId, ReviewStats>> {
    let date_format = format_description!("[year]-[month]-[day]");
    let mut aggregate = BTreeMap::new();
    for product in products {
        if product.product_reviews.is_empty() {
            aggregate.insert(product.url.clone(), ReviewStats::NONE);
            continue;
        }
        let mut sum = 0u64;
        let mut latest: Option<(Date, u8)> = None;
        for review in &product.product_reviews {
            let date = match Date::parse(&review.date, &date_format) {
                Ok(d) => d,
                Err(_) => bail!(
                    "unparsable review date {:?} for document {}",
                    review.date,
                    product.url
                ),
            };
            sum += u64::from(review.rating);
            match latest {
                Some((best, _)) if date <= best => {}
                _ => latest = Some((date, review.rating)),
            }
        }
        let total = product.product_reviews.len();
        aggregate.insert(
            product.url.clone(),
            ReviewStats {
                total_reviews: total as u32,
                mean_mark: sum as f64 / total as f64,
                last_rating: latest.map(|(_, rating)| rating).unwrap_or(0),
            },
        );
    }
    Ok(aggregate)
}

/// Build the full index set for a corpus snapshot. Pure batch transform: the
/// same corpus always yields the same bundle.
pub fn build_bundle(
    products: &[Product],
    brand_feature: &str,
    origin_feature: &str,
    synonyms: SynonymTable,
) -> Result<IndexBundle> {
    let title = build_title_index(products);
    let description = build_description_index(products);
    let brand = build_feature_index(products, brand_feature);
    let origin = build_feature_index(products, origin_feature);
    let reviews = build_reviews_aggregate(products)?;
    tracing::info!(num_docs = products.len(), "index bundle built");
    Ok(IndexBundle {
        title,
        description,
        brand,
        origin,
        reviews,
        synonyms,
    })
}
