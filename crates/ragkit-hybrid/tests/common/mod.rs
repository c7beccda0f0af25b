#![allow(dead_code)]

use ragkit_core::chunker::ChunkerConfig;
use ragkit_core::types::Document;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn chunker() -> ChunkerConfig {
    ChunkerConfig { max_tokens: 200, overlap: 50, min_tokens: 20 }
}

/// Ten tokens; sentence 25 of every store document states the refund policy.
pub fn sentence(doc: usize, i: usize, topic: &str) -> String {
    format!("Sentence{i} of document {doc} covers the {topic} here today.")
}

/// 500 words, three chunks with `chunker()`; the refund sentence lands in chunk 1.
pub fn store_document(doc: usize) -> Document {
    let text = (0..50)
        .map(|i| sentence(doc, i, if i == 25 { "refund policy" } else { "shipping schedule" }))
        .collect::<Vec<_>>()
        .join(" ");
    Document::new(format!("store-{doc}"), text)
        .with_source(format!("store-{doc}.pdf"))
        .with_page(doc as u32 + 1)
}

pub fn store_documents() -> Vec<Document> {
    (0..3).map(store_document).collect()
}
