use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use crate::corpus::{self, DocId, Product};
use crate::index::IndexBundle;
use crate::persist::{self, IndexPaths};
use crate::query::{prepare_query, retrieve, MatchMode};
use crate::ranking::{Bm25Params, Ranker, RankingWeights, DEFAULT_WEIGHTS};

/// A full product record annotated with its ranking score.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub product: Product,
    #[serde(rename = "_score")]
    pub score: f64,
}

/// Per-call overrides for ranking configuration.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub top_k: Option<usize>,
    pub weights: Option<RankingWeights>,
    pub bm25: Option<Bm25Params>,
}

/// The search façade. Owns the immutable index bundle and the preloaded
/// id -> product map, so serving a query touches no disk. Retrieval mode is
/// fixed at construction; weights and BM25 parameters can be overridden per
/// call.
pub struct SearchEngine {
    bundle: IndexBundle,
    products: HashMap<DocId, Product>,
    mode: MatchMode,
    weights: RankingWeights,
    params: Bm25Params,
}

impl SearchEngine {
    pub fn new(bundle: IndexBundle, products: Vec<Product>, mode: MatchMode) -> Self {
        let products = products.into_iter().map(|p| (p.url.clone(), p)).collect();
        SearchEngine {
            bundle,
            products,
            mode,
            weights: DEFAULT_WEIGHTS,
            params: Bm25Params::default(),
        }
    }

    /// Load the index bundle and the corpus from disk. A missing artifact is
    /// a fatal error; the engine refuses to serve on partial indices.
    pub fn load<P, Q>(index_dir: P, products_path: Q, mode: MatchMode) -> Result<Self>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let paths = IndexPaths::new(index_dir);
        let bundle = persist::load_bundle(&paths)?;
        let meta = persist::load_meta(&paths)?;
        let products = corpus::read_products(products_path.as_ref())?;
        tracing::info!(
            num_docs = meta.num_docs,
            products = products.len(),
            "search engine loaded"
        );
        Ok(Self::new(bundle, products, mode))
    }

    pub fn with_weights(mut self, weights: RankingWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_bm25_params(mut self, params: Bm25Params) -> Self {
        self.params = params;
        self
    }

    pub fn bundle(&self) -> &IndexBundle {
        &self.bundle
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.get(id)
    }

    pub fn search(&self, query: &str, top_k: Option<usize>) -> Vec<SearchHit> {
        self.search_with(
            query,
            &SearchOptions {
                top_k,
                ..SearchOptions::default()
            },
        )
    }

    /// Prepare the query, retrieve candidates, rank, and hydrate ranked ids
    /// back into full records. An id that no longer resolves to a record is
    /// skipped rather than failing the search.
    pub fn search_with(&self, query: &str, opts: &SearchOptions) -> Vec<SearchHit> {
        let tokens = prepare_query(query, &self.bundle.synonyms);
        let candidates = retrieve(&tokens, &self.bundle, self.mode);
        let ranker = Ranker::new(
            &self.bundle,
            opts.weights.unwrap_or(self.weights),
            opts.bm25.unwrap_or(self.params),
        );
        let ranked = ranker.rank(&tokens, &candidates, opts.top_k);
        ranked
            .into_iter()
            .filter_map(|(id, score)| {
                self.products.get(&id).map(|product| SearchHit {
                    product: product.clone(),
                    score,
                })
            })
            .collect()
    }
}
