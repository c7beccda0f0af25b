use std::collections::HashSet;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, TantivyError, Term};
use tracing::{debug, info};

use ragkit_core::error::{Error, Result};
use ragkit_core::tokenize::tokenize;
use ragkit_core::types::LexicalHit;

use crate::tantivy_utils::{build_schema, register_tokenizer, ORDINAL_FIELD, TERMS_FIELD};

fn lexical_error(err: TantivyError) -> Error { Error::Lexical(err.to_string()) }

/// Okapi BM25 over a fixed, ordered list of chunk texts.
///
/// Hit `index` values are positions in the list given to [`Bm25Index::build`].
pub struct Bm25Index {
	reader: IndexReader,
	ordinal_field: Field,
	terms_field: Field,
	len: usize,
}

impl Bm25Index {
	pub fn build<I, S>(chunks: I) -> Result<Self>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let schema = build_schema();
		let index = Index::create_in_ram(schema.clone());
		register_tokenizer(&index);
		let ordinal_field = schema.get_field(ORDINAL_FIELD).map_err(lexical_error)?;
		let terms_field = schema.get_field(TERMS_FIELD).map_err(lexical_error)?;

		// One indexing thread keeps every document in insertion order in a single segment.
		let mut index_writer: IndexWriter = index.writer_with_num_threads(1, 50_000_000).map_err(lexical_error)?;
		let mut len = 0usize;
		for (ordinal, chunk) in chunks.into_iter().enumerate() {
			let terms = tokenize(chunk.as_ref()).join(" ");
			index_writer.add_document(doc!(ordinal_field => ordinal as u64, terms_field => terms)).map_err(lexical_error)?;
			len += 1;
		}
		if len == 0 {
			return Err(Error::EmptyCorpus("BM25 index needs at least one chunk".into()));
		}
		index_writer.commit().map_err(lexical_error)?;

		let reader: IndexReader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into().map_err(lexical_error)?;
		info!(chunks = len, "bm25 index built");
		Ok(Self { reader, ordinal_field, terms_field, len })
	}

	pub fn len(&self) -> usize { self.len }

	pub fn is_empty(&self) -> bool { self.len == 0 }

	/// Top `top_k` chunks by BM25, highest first, ties by corpus position.
	///
	/// Chunks sharing no term with the query score 0.0 and fill the remaining
	/// slots in corpus order, so up to `min(top_k, len)` hits come back.
	pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<LexicalHit>> {
		if self.len == 0 {
			return Err(Error::EmptyCorpus("BM25 index has no chunks".into()));
		}
		if top_k == 0 { return Ok(Vec::new()); }
		let top_k = top_k.min(self.len);

		let mut hits = self.matching(query, top_k)?;
		hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.index.cmp(&b.index)));
		let matched = hits.len();

		if hits.len() < top_k {
			let seen: HashSet<usize> = hits.iter().map(|h| h.index).collect();
			let padding = (0..self.len).filter(|i| !seen.contains(i)).take(top_k - hits.len());
			hits.extend(padding.map(|index| LexicalHit { index, score: 0.0 }));
		}
		debug!(matched, returned = hits.len(), "bm25 search");
		Ok(hits)
	}

	fn matching(&self, query: &str, top_k: usize) -> Result<Vec<LexicalHit>> {
		let clauses: Vec<(Occur, Box<dyn Query>)> = tokenize(query)
			.iter()
			.map(|token| {
				let term = Term::from_field_text(self.terms_field, token);
				(Occur::Should, Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)) as Box<dyn Query>)
			})
			.collect();
		if clauses.is_empty() { return Ok(Vec::new()); }

		let searcher = self.reader.searcher();
		let query = BooleanQuery::new(clauses);
		let top_docs = searcher.search(&query, &TopDocs::with_limit(top_k)).map_err(lexical_error)?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr).map_err(lexical_error)?;
			let ordinal = doc
				.get_first(self.ordinal_field)
				.and_then(|v| v.as_u64())
				.ok_or_else(|| Error::Lexical("indexed chunk is missing its ordinal".into()))?;
			hits.push(LexicalHit { index: ordinal as usize, score });
		}
		Ok(hits)
	}
}
