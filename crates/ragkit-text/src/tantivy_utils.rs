use tantivy::schema::{Schema, TextFieldIndexing, TextOptions, IndexRecordOption, STORED};
use tantivy::tokenizer::{TextAnalyzer, WhitespaceTokenizer, RemoveLongFilter};
use tantivy::Index;

/// Analyzer for pre-tokenized text: terms arrive lowercased and space separated.
pub const TERMS_TOKENIZER: &str = "ragkit_terms";
pub const ORDINAL_FIELD: &str = "ordinal";
pub const TERMS_FIELD: &str = "terms";

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	let _ordinal_field = schema_builder.add_u64_field(ORDINAL_FIELD, STORED);
	let terms_indexing = TextFieldIndexing::default().set_tokenizer(TERMS_TOKENIZER).set_index_option(IndexRecordOption::WithFreqs);
	let terms_options = TextOptions::default().set_indexing_options(terms_indexing);
	let _terms_field = schema_builder.add_text_field(TERMS_FIELD, terms_options);
	schema_builder.build()
}

pub fn register_tokenizer(index: &Index) {
	let tokenizer = TextAnalyzer::builder(WhitespaceTokenizer::default())
		.filter(RemoveLongFilter::limit(255))
		.build();
	index.tokenizers().register(TERMS_TOKENIZER, tokenizer);
}
