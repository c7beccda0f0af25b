use serde_json::json;
use std::collections::BTreeMap;

use ragkit_core::traits::VectorIndex;
use ragkit_core::types::{Meta, MetadataFilter};
use ragkit_embed::HashingEmbedder;
use ragkit_vector::MemoryVectorIndex;

fn index_with_docs() -> MemoryVectorIndex {
    let index = MemoryVectorIndex::new(Box::new(HashingEmbedder::default()));
    let mut chunks = BTreeMap::new();
    chunks.insert(
        "policies".to_string(),
        vec!["refund policy for returned items".to_string(), "warranty covers manufacturing defects".to_string()],
    );
    chunks.insert("shipping".to_string(), vec!["carrier shipping schedule and tracking".to_string()]);

    let mut meta = BTreeMap::new();
    let mut policies = Meta::new();
    policies.insert("source".into(), json!("policies.pdf"));
    policies.insert("page".into(), json!(2));
    meta.insert("policies".to_string(), policies);

    index.upsert_chunks(&chunks, &meta).expect("upsert");
    index
}

#[test]
fn search_returns_chunk_ids_with_registry_metadata() {
    let index = index_with_docs();
    assert_eq!(index.len(), 3);

    let hits = index.search("what is the refund policy", 2, None).expect("search");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].chunk_id, "policies::chunk_0");
    assert!(hits[0].score >= hits[1].score);

    let meta = &hits[0].metadata;
    assert_eq!(meta.get("source"), Some(&json!("policies.pdf")));
    assert_eq!(meta.get("page"), Some(&json!(2)));
    assert_eq!(meta.get("doc_id"), Some(&json!("policies")));
    assert_eq!(meta.get("local_index"), Some(&json!(0)));
}

#[test]
fn filter_restricts_candidates() {
    let index = index_with_docs();
    let filter = MetadataFilter::new().require("doc_id", "shipping");
    let hits = index.search("refund policy", 5, Some(&filter)).expect("search");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk_id, "shipping::chunk_0");
}

#[test]
fn upsert_replaces_existing_chunks() {
    let index = index_with_docs();
    let mut chunks = BTreeMap::new();
    chunks.insert("shipping".to_string(), vec!["express delivery options".to_string()]);
    index.upsert_chunks(&chunks, &BTreeMap::new()).expect("upsert");

    assert_eq!(index.len(), 3);
    let hits = index.search("express delivery", 1, None).expect("search");
    assert_eq!(hits[0].chunk_id, "shipping::chunk_0");
}

#[test]
fn zero_top_k_returns_nothing() {
    let index = index_with_docs();
    assert!(index.search("refund", 0, None).expect("search").is_empty());
}
