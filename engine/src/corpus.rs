use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A document is identified by its canonical URL.
pub type DocId = String;

lazy_static! {
    static ref PRODUCT_URL: Regex =
        Regex::new(r"/product/(?P<id>\d+)(?:\?variant=(?P<variant>[A-Za-z0-9_-]+))?")
            .expect("valid regex");
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub rating: u8,
    /// Calendar date in `YYYY-MM-DD` form.
    #[serde(default)]
    pub date: String,
}

/// One corpus record. Every field except `url` defaults to empty when absent
/// from the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub url: DocId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub product_features: BTreeMap<String, String>,
    #[serde(default)]
    pub product_reviews: Vec<Review>,
}

impl Product {
    /// Fill `id` and `variant` from the URL path when the record did not carry
    /// them explicitly.
    fn derive_identity(&mut self) {
        if let Some(caps) = PRODUCT_URL.captures(&self.url) {
            if self.id.is_none() {
                self.id = caps.name("id").map(|m| m.as_str().to_string());
            }
            if self.variant.is_none() {
                self.variant = caps.name("variant").map(|m| m.as_str().to_string());
            }
        }
    }
}

/// Read a newline-delimited JSON corpus. Blank lines are skipped; a record
/// without a `url` is rejected since the URL is the document identity.
pub fn read_products(path: &Path) -> Result<Vec<Product>> {
    let f = File::open(path).with_context(|| format!("opening corpus {}", path.display()))?;
    let reader = BufReader::new(f);
    let mut products = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut product: Product = serde_json::from_str(&line)
            .with_context(|| format!("corpus record at {}:{}", path.display(), lineno + 1))?;
        product.derive_identity();
        products.push(product);
    }
    Ok(products)
}
