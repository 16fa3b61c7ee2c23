use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use engine::builder::{build_bundle, BRAND_FEATURE, ORIGIN_FEATURE};
use engine::corpus::{read_products, Product};
use engine::persist::{save_bundle, save_meta, IndexPaths, MetaFile};
use engine::synonyms::{default_origin_synonyms, SynonymTable};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build product search index artifacts from a JSONL corpus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build all index artifacts from a products JSONL file or directory
    Build {
        /// Input path (JSONL file, or directory scanned for .jsonl files)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Feature name indexed into the brand index
        #[arg(long, default_value = BRAND_FEATURE)]
        brand_feature: String,
        /// Feature name indexed into the origin index
        #[arg(long, default_value = ORIGIN_FEATURE)]
        origin_feature: String,
        /// Synonym table JSON (canonical -> aliases); built-in origin table if omitted
        #[arg(long)]
        synonyms: Option<String>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            brand_feature,
            origin_feature,
            synonyms,
        } => build(
            &input,
            &output,
            &brand_feature,
            &origin_feature,
            synonyms.as_deref(),
        ),
    }
}

fn collect_corpus(input: &Path) -> Result<Vec<Product>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("jsonl") {
                files.push(p.to_path_buf());
            }
        }
        // deterministic ingest order regardless of directory walk order
        files.sort();
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        bail!("input path {} does not exist", input.display());
    }

    let mut products = Vec::new();
    for file in files {
        products.extend(read_products(&file)?);
    }
    Ok(products)
}

fn load_synonyms(path: Option<&str>) -> Result<SynonymTable> {
    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)?;
            let entries: BTreeMap<String, BTreeSet<String>> = serde_json::from_str(&raw)?;
            Ok(SynonymTable::new(entries))
        }
        None => Ok(default_origin_synonyms()),
    }
}

fn build(
    input: &str,
    output: &str,
    brand_feature: &str,
    origin_feature: &str,
    synonyms_path: Option<&str>,
) -> Result<()> {
    let products = collect_corpus(Path::new(input))?;
    tracing::info!(num_docs = products.len(), "corpus parsed");

    let synonyms = load_synonyms(synonyms_path)?;
    let bundle = build_bundle(&products, brand_feature, origin_feature, synonyms)?;

    let paths = IndexPaths::new(output);
    save_bundle(&paths, &bundle)?;
    let meta = MetaFile {
        num_docs: products.len() as u32,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        version: 1,
    };
    save_meta(&paths, &meta)?;

    tracing::info!(output, "index build complete");
    Ok(())
}
