//! Citation-annotated context for a downstream generator.

use serde_json::Value;

use ragkit_core::types::{Meta, RetrievalResult};

pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

fn meta_str(meta: &Meta, key: &str) -> Option<String> {
    match meta.get(key)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// `[source, p. page]`; the page clause is dropped when unknown and `doc_id`
/// stands in for an empty source.
pub fn format_citation(meta: &Meta) -> String {
    let source = meta_str(meta, "source")
        .or_else(|| meta_str(meta, "doc_id"))
        .unwrap_or_default();
    match meta_str(meta, "page") {
        Some(page) => format!("[{source}, p. {page}]"),
        None => format!("[{source}]"),
    }
}

fn citation_for(result: &RetrievalResult) -> String {
    if result.metadata.contains_key("doc_id") {
        return format_citation(&result.metadata);
    }
    let mut meta = result.metadata.clone();
    meta.insert("doc_id".into(), Value::from(result.doc_id.clone()));
    format_citation(&meta)
}

pub fn build_cited_context(results: &[RetrievalResult]) -> String {
    results
        .iter()
        .map(|r| format!("{}\n{}", r.text, citation_for(r)))
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}
