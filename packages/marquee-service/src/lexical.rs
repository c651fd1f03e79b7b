use std::{sync::Arc, time::Duration};

use marquee_storage::{CatalogIndex, Hit};

use crate::{
	Error, Result,
	retrieval::{bounded, validate_hits},
	router::RetrievalRequest,
};

/// Runs text, fuzzy, prefix, and category requests against the index.
pub struct LexicalMatcher {
	index: Arc<dyn CatalogIndex>,
	timeout: Duration,
}
impl LexicalMatcher {
	pub fn new(index: Arc<dyn CatalogIndex>, timeout: Duration) -> Self {
		Self { index, timeout }
	}

	/// Returns validated hits in index relevance order. Blank text is rejected before the index
	/// is called.
	pub async fn run(&self, request: &RetrievalRequest) -> Result<Vec<Hit>> {
		let strategy = request.strategy();
		let hits = match request {
			RetrievalRequest::Text(query) => {
				ensure_text(&query.text)?;
				bounded(strategy, self.timeout, self.index.text(query)).await?
			},
			RetrievalRequest::Fuzzy(query) => {
				ensure_text(&query.text)?;
				bounded(strategy, self.timeout, self.index.fuzzy(query)).await?
			},
			RetrievalRequest::Prefix { query, display_limit } => {
				ensure_text(&query.text)?;

				let hits = bounded(strategy, self.timeout, self.index.autocomplete(query)).await?;
				let mut hits = validate_hits(strategy, hits);

				hits.truncate(*display_limit as usize);

				return Ok(hits);
			},
			RetrievalRequest::Category(query) => {
				ensure_text(&query.text)?;
				bounded(strategy, self.timeout, self.index.category(query)).await?
			},
			RetrievalRequest::Recent(_) | RetrievalRequest::Semantic(_) =>
				return Err(Error::invalid_query(format!(
					"{strategy} is not a lexical strategy."
				))),
		};

		Ok(validate_hits(strategy, hits))
	}
}

fn ensure_text(text: &str) -> Result<()> {
	if text.trim().is_empty() {
		return Err(Error::invalid_query("Search text must be non-empty."));
	}

	Ok(())
}
