use std::collections::BTreeMap;
use std::fs;

use engine::builder::{
    build_bundle, build_description_index, build_feature_index, build_reviews_aggregate,
    build_title_index,
};
use engine::corpus::{Product, Review};
use engine::persist::{load_bundle, save_bundle, IndexPaths};
use engine::synonyms::default_origin_synonyms;
use engine::FieldIndex;

fn product(url: &str, title: &str, description: &str) -> Product {
    Product {
        url: url.into(),
        id: None,
        variant: None,
        title: title.into(),
        description: description.into(),
        product_features: BTreeMap::new(),
        product_reviews: Vec::new(),
    }
}

fn review(rating: u8, date: &str) -> Review {
    Review {
        rating,
        date: date.into(),
    }
}

#[test]
fn positions_match_token_occurrences() {
    let products = vec![product("https://x/product/1", "red shoes red", "")];
    let index = build_title_index(&products);
    match &index {
        FieldIndex::Positional(by_token) => {
            assert_eq!(by_token["red"]["https://x/product/1"], vec![0, 2]);
            assert_eq!(by_token["shoes"]["https://x/product/1"], vec![1]);
        }
        FieldIndex::Membership(_) => panic!("title index must be positional"),
    }
}

#[test]
fn positions_are_strictly_increasing() {
    let products = vec![product(
        "https://x/product/1",
        "",
        "red red red shoes red shoes",
    )];
    let index = build_description_index(&products);
    if let FieldIndex::Positional(by_token) = &index {
        for by_doc in by_token.values() {
            for positions in by_doc.values() {
                assert!(positions.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }
}

#[test]
fn feature_index_is_set_based() {
    let mut p = product("https://x/product/1", "", "");
    p.product_features
        .insert("brand".into(), "AcmeCo".into());
    let index = build_feature_index(&[p], "brand");
    match &index {
        FieldIndex::Membership(by_token) => {
            assert!(by_token["acmeco"].contains("https://x/product/1"));
        }
        FieldIndex::Positional(_) => panic!("feature index must be membership"),
    }
}

#[test]
fn missing_feature_indexes_nothing() {
    let p = product("https://x/product/1", "", "");
    let index = build_feature_index(&[p], "brand");
    match &index {
        FieldIndex::Membership(by_token) => assert!(by_token.is_empty()),
        FieldIndex::Positional(_) => panic!("feature index must be membership"),
    }
}

#[test]
fn reviews_aggregate_mean_and_last_rating() {
    // mean of 5 and 2 is 3.5; the most recent review carries rating 2
    let mut p = product("https://x/product/1", "", "");
    p.product_reviews = vec![review(5, "2024-01-01"), review(2, "2024-06-01")];
    let aggregate = build_reviews_aggregate(&[p]).unwrap();
    let stats = &aggregate["https://x/product/1"];
    assert_eq!(stats.total_reviews, 2);
    assert!((stats.mean_mark - 3.5).abs() < 1e-9);
    assert_eq!(stats.last_rating, 2);
}

#[test]
fn zero_reviews_means_all_zero_stats() {
    let p = product("https://x/product/1", "", "");
    let aggregate = build_reviews_aggregate(&[p]).unwrap();
    let stats = &aggregate["https://x/product/1"];
    assert_eq!(stats.total_reviews, 0);
    assert_eq!(stats.mean_mark, 0.0);
    assert_eq!(stats.last_rating, 0);
}

#[test]
fn date_ties_keep_the_earliest_listed_review() {
    let mut p = product("https://x/product/1", "", "");
    p.product_reviews = vec![review(4, "2024-03-01"), review(1, "2024-03-01")];
    let aggregate = build_reviews_aggregate(&[p]).unwrap();
    assert_eq!(aggregate["https://x/product/1"].last_rating, 4);
}

#[test]
fn unparsable_review_date_fails_the_build() {
    let mut p = product("https://x/product/1", "", "");
    p.product_reviews = vec![review(5, "not-a-date")];
    assert!(build_reviews_aggregate(&[p]).is_err());
}

fn sample_corpus() -> Vec<Product> {
    let mut a = product(
        "https://shop/product/1",
        "Red Shoes",
        "Comfortable red shoes for running",
    );
    a.product_features.insert("brand".into(), "AcmeCo".into());
    a.product_features
        .insert("made in".into(), "United States".into());
    a.product_reviews = vec![review(5, "2024-01-01"), review(2, "2024-06-01")];
    let mut b = product("https://shop/product/2", "Blue Hat", "A warm wool hat");
    b.product_features.insert("brand".into(), "Zenith".into());
    vec![a, b]
}

#[test]
fn rebuild_is_byte_identical() {
    let products = sample_corpus();
    let first = build_bundle(&products, "brand", "made in", default_origin_synonyms()).unwrap();
    let second = build_bundle(&products, "brand", "made in", default_origin_synonyms()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let paths_a = IndexPaths::new(dir.path().join("a"));
    let paths_b = IndexPaths::new(dir.path().join("b"));
    save_bundle(&paths_a, &first).unwrap();
    save_bundle(&paths_b, &second).unwrap();

    for name in [
        "title_index.json",
        "description_index.json",
        "brand_index.json",
        "origin_index.json",
        "reviews_index.json",
        "origin_synonyms.json",
    ] {
        let a = fs::read(dir.path().join("a").join(name)).unwrap();
        let b = fs::read(dir.path().join("b").join(name)).unwrap();
        assert_eq!(a, b, "artifact {name} differs between rebuilds");
    }
}

#[test]
fn bundle_round_trips_through_disk() {
    let products = sample_corpus();
    let bundle = build_bundle(&products, "brand", "made in", default_origin_synonyms()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    save_bundle(&paths, &bundle).unwrap();
    let loaded = load_bundle(&paths).unwrap();
    assert_eq!(loaded, bundle);
}

#[test]
fn load_fails_on_missing_artifact() {
    let products = sample_corpus();
    let bundle = build_bundle(&products, "brand", "made in", default_origin_synonyms()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    save_bundle(&paths, &bundle).unwrap();
    fs::remove_file(dir.path().join("origin_index.json")).unwrap();
    assert!(load_bundle(&paths).is_err());
}
