//! Page sources behind the browse feed and the search view's similar section.

use std::{sync::Arc, time::Duration};

use marquee_domain::{CatalogItem, query::page_skip};
use marquee_storage::{BoxFuture, CatalogIndex, RecentQuery};

use crate::{
	Result,
	accumulator::{PageSource, SourcePage},
	retrieval::bounded,
	router::{SemanticRequest, Strategy},
	semantic::SemanticRanker,
};

/// Chronological scan: year descending, undated last.
pub struct BrowseSource {
	index: Arc<dyn CatalogIndex>,
	timeout: Duration,
}
impl BrowseSource {
	pub fn new(index: Arc<dyn CatalogIndex>, timeout: Duration) -> Self {
		Self { index, timeout }
	}
}
impl PageSource for BrowseSource {
	fn strategy(&self) -> Strategy {
		Strategy::Browse
	}

	fn fetch<'a>(&'a self, page: u32, page_size: u32) -> BoxFuture<'a, Result<SourcePage>> {
		Box::pin(async move {
			let query = RecentQuery { skip: page_skip(page, page_size), limit: page_size };
			let recent = bounded(Strategy::Browse, self.timeout, self.index.recent(query)).await?;
			let raw_count = recent.items.len();
			let items: Vec<CatalogItem> = recent
				.items
				.into_iter()
				.filter(|item| {
					let keep = item.is_well_formed();

					if !keep {
						tracing::warn!(item_id = %item.id, "Dropping malformed browse item.");
					}

					keep
				})
				.collect();

			Ok(SourcePage { items, raw_count, total: Some(recent.total) })
		})
	}
}

/// Semantic neighbours of a fixed text, windowed page by page out of the candidate pool.
pub struct SimilarSource {
	ranker: Arc<SemanticRanker>,
	text: String,
	candidate_k: u32,
}
impl SimilarSource {
	pub fn new(ranker: Arc<SemanticRanker>, text: impl Into<String>, candidate_k: u32) -> Self {
		Self { ranker, text: text.into(), candidate_k }
	}
}
impl PageSource for SimilarSource {
	fn strategy(&self) -> Strategy {
		Strategy::Semantic
	}

	fn fetch<'a>(&'a self, page: u32, page_size: u32) -> BoxFuture<'a, Result<SourcePage>> {
		Box::pin(async move {
			let request = SemanticRequest {
				text: self.text.clone(),
				candidate_k: self.candidate_k,
				skip: page_skip(page, page_size),
				limit: page_size,
			};
			let window = self.ranker.rank(&request).await?;

			Ok(SourcePage {
				raw_count: window.hits.len(),
				items: window.hits.into_iter().map(|hit| hit.item).collect(),
				total: Some(window.candidates as u64),
			})
		})
	}
}
