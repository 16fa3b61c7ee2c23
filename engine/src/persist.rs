use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::corpus::DocId;
use crate::index::{FieldIndex, IndexBundle, ReviewStats};
use crate::synonyms::SynonymTable;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
}

/// Locations of the index artifacts inside one index directory.
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
    fn title_index(&self) -> PathBuf {
        self.root.join("title_index.json")
    }
    fn description_index(&self) -> PathBuf {
        self.root.join("description_index.json")
    }
    fn brand_index(&self) -> PathBuf {
        self.root.join("brand_index.json")
    }
    fn origin_index(&self) -> PathBuf {
        self.root.join("origin_index.json")
    }
    fn reviews_index(&self) -> PathBuf {
        self.root.join("reviews_index.json")
    }
    fn origin_synonyms(&self) -> PathBuf {
        self.root.join("origin_synonyms.json")
    }
    fn meta(&self) -> PathBuf {
        self.root.join("meta.json")
    }
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let json = serde_json::to_string(value)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let mut f =
        File::open(path).with_context(|| format!("missing index artifact {}", path.display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let value = serde_json::from_str(&buf)
        .with_context(|| format!("malformed index artifact {}", path.display()))?;
    Ok(value)
}

/// Write all six index artifacts. Serialization iterates ordered maps, so the
/// bytes on disk are a pure function of the bundle.
pub fn save_bundle(paths: &IndexPaths, bundle: &IndexBundle) -> Result<()> {
    create_dir_all(&paths.root)?;
    save_json(&paths.title_index(), &bundle.title)?;
    save_json(&paths.description_index(), &bundle.description)?;
    save_json(&paths.brand_index(), &bundle.brand)?;
    save_json(&paths.origin_index(), &bundle.origin)?;
    save_json(&paths.reviews_index(), &bundle.reviews)?;
    save_json(&paths.origin_synonyms(), bundle.synonyms.entries())?;
    Ok(())
}

/// Load all six artifacts. Any missing or malformed file fails the load: the
/// engine cannot serve correctly with partial indices.
pub fn load_bundle(paths: &IndexPaths) -> Result<IndexBundle> {
    let title: BTreeMap<String, BTreeMap<DocId, Vec<u32>>> = load_json(&paths.title_index())?;
    let description: BTreeMap<String, BTreeMap<DocId, Vec<u32>>> =
        load_json(&paths.description_index())?;
    let brand: BTreeMap<String, BTreeSet<DocId>> = load_json(&paths.brand_index())?;
    let origin: BTreeMap<String, BTreeSet<DocId>> = load_json(&paths.origin_index())?;
    let reviews: BTreeMap<DocId, ReviewStats> = load_json(&paths.reviews_index())?;
    let synonyms: BTreeMap<String, BTreeSet<String>> = load_json(&paths.origin_synonyms())?;
    Ok(IndexBundle {
        title: FieldIndex::Positional(title),
        description: FieldIndex::Positional(description),
        brand: FieldIndex::Membership(brand),
        origin: FieldIndex::Membership(origin),
        reviews,
        synonyms: SynonymTable::new(synonyms),
    })
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    load_json(&paths.meta())
}
