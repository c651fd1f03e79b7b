pub mod accumulator;
pub mod combined;
pub mod embedding;
pub mod feed;
pub mod lexical;
pub mod router;
pub mod semantic;

mod error;
mod retrieval;

pub use accumulator::{FeedAccumulator, FeedStatus, PageSource, SourcePage};
pub use combined::{CombinedPage, SearchStatus, SearchView, SectionIssue};
pub use embedding::EmbeddingPipeline;
pub use error::{Error, FailureCause, Result};
pub use router::{RetrievalRequest, SemanticRequest, Strategy};

use std::{sync::Arc, time::Duration};

use serde::Serialize;

use marquee_config::Search;
use marquee_domain::{CatalogItem, Query, QueryMode, ResultPage, Suggestion, page::total_pages};
use marquee_storage::{CatalogIndex, Hit};

use crate::{
	feed::{BrowseSource, SimilarSource},
	lexical::LexicalMatcher,
	semantic::SemanticRanker,
};

/// One stateless browse window, shaped like the catalog listing page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowsePage {
	pub items: Vec<CatalogItem>,
	pub current_page: u32,
	pub total_pages: u64,
	pub total_items: u64,
}

pub struct CatalogService {
	search: Search,
	index: Arc<dyn CatalogIndex>,
	pipeline: Arc<EmbeddingPipeline>,
	lexical: LexicalMatcher,
	semantic: Arc<SemanticRanker>,
}
impl CatalogService {
	pub fn new(search: Search, index: Arc<dyn CatalogIndex>, pipeline: Arc<EmbeddingPipeline>) -> Self {
		let timeout = Duration::from_millis(search.retrieval_timeout_ms);
		let lexical = LexicalMatcher::new(Arc::clone(&index), timeout);
		let semantic =
			Arc::new(SemanticRanker::new(Arc::clone(&index), Arc::clone(&pipeline), timeout));

		Self { search, index, pipeline, lexical, semantic }
	}

	pub fn search_config(&self) -> &Search {
		&self.search
	}

	pub fn pipeline(&self) -> &EmbeddingPipeline {
		&self.pipeline
	}

	fn timeout(&self) -> Duration {
		Duration::from_millis(self.search.retrieval_timeout_ms)
	}

	fn browse_source(&self) -> BrowseSource {
		BrowseSource::new(Arc::clone(&self.index), self.timeout())
	}

	fn similar_source(&self, text: &str) -> SimilarSource {
		SimilarSource::new(Arc::clone(&self.semantic), text, self.search.semantic.candidate_k)
	}

	/// `None` selects the configured default; larger sizes are capped.
	pub fn browse_page_size(&self, requested: Option<u32>) -> Result<u32> {
		match requested {
			Some(0) => Err(Error::invalid_query("pageSize must be 1 or greater.")),
			Some(size) => Ok(size.min(self.search.browse.max_page_size)),
			None => Ok(self.search.browse.default_page_size),
		}
	}

	pub async fn browse(&self, page: u32, page_size: Option<u32>) -> Result<BrowsePage> {
		let page_size = self.browse_page_size(page_size)?;
		let query = Query::browse(page, page_size);

		router::route(&query, &self.search)?;

		let source = self.browse_source().fetch(page, page_size).await?;
		let total = source.total.unwrap_or(source.items.len() as u64);

		Ok(BrowsePage {
			items: source.items,
			current_page: page,
			total_pages: total_pages(total, page_size),
			total_items: total,
		})
	}

	/// Text shorter than `search.autocomplete.min_chars` yields no suggestions.
	pub async fn autocomplete(&self, text: &str) -> Result<Vec<Suggestion>> {
		let query = Query::new(QueryMode::Autocomplete, text);

		if query.text().chars().count() < self.search.autocomplete.min_chars as usize {
			return Ok(Vec::new());
		}

		let hits = self.run_lexical(&query).await?;

		Ok(hits.iter().map(|hit| Suggestion::from(&hit.item)).collect())
	}

	pub async fn fuzzy(&self, text: &str) -> Result<Vec<CatalogItem>> {
		let hits = self.run_lexical(&Query::new(QueryMode::FuzzySearch, text)).await?;

		Ok(into_items(hits))
	}

	pub async fn text_search(&self, text: &str) -> Result<Vec<CatalogItem>> {
		let hits = self.run_lexical(&Query::new(QueryMode::TextSearch, text)).await?;

		Ok(into_items(hits))
	}

	pub async fn category(&self, text: &str) -> Result<Vec<CatalogItem>> {
		let hits = self.run_lexical(&Query::new(QueryMode::CategoryFilter, text)).await?;

		Ok(into_items(hits))
	}

	/// One fixed-size page of semantic neighbours. Blank text never reaches the model or the
	/// index.
	pub async fn semantic(&self, text: &str, page: u32) -> Result<Vec<CatalogItem>> {
		let query = Query::new(QueryMode::SemanticSearch, text)
			.with_page(page, self.search.semantic.page_size);
		let mut items = Vec::new();

		for request in router::route(&query, &self.search)? {
			if let RetrievalRequest::Semantic(semantic) = request {
				items.extend(into_items(self.semantic.rank(&semantic).await?.hits));
			}
		}

		Ok(items)
	}

	pub async fn get_item(&self, id: &str) -> Result<CatalogItem> {
		let item = self
			.index
			.get(id)
			.await
			.map_err(|err| Error::Storage { message: err.to_string() })?;

		item.ok_or_else(|| Error::NotFound { message: format!("No catalog item with id {id:?}.") })
	}

	/// Starts a browse feed and loads its first page.
	pub async fn open_browse(&self, page_size: Option<u32>) -> Result<(FeedAccumulator, ResultPage)> {
		let page_size = self.browse_page_size(page_size)?;
		let query = Query::browse(1, page_size);

		router::route(&query, &self.search)?;

		let mut feed = FeedAccumulator::new(query);
		let page = feed.fetch_next(&self.browse_source()).await?;

		Ok((feed, page))
	}

	pub async fn more_browse(&self, feed: &mut FeedAccumulator) -> Result<ResultPage> {
		feed.fetch_next(&self.browse_source()).await
	}

	/// Runs the fuzzy matches and the first similar page concurrently. A failure in either
	/// section degrades that section only.
	pub async fn open_search(&self, text: &str) -> Result<(SearchView, CombinedPage)> {
		let query = Query::new(QueryMode::CombinedSearch, text)
			.with_page(1, self.search.semantic.page_size);
		let requests = router::route(&query, &self.search)?;
		let normalized = query.text();
		let mut similar = FeedAccumulator::new(
			Query::new(QueryMode::SemanticSearch, normalized.clone())
				.with_page(1, self.search.semantic.page_size),
		);
		let similar_source = self.similar_source(&normalized);
		let page = similar.begin()?;
		let lexical = async {
			let mut items = Vec::new();

			for request in requests.iter().filter(|request| request.strategy() == Strategy::Fuzzy) {
				items.extend(into_items(self.lexical.run(request).await?));
			}

			Ok::<_, Error>(items)
		};
		let semantic = similar_source.fetch(page, self.search.semantic.page_size);
		let (lexical, semantic) = tokio::join!(lexical, semantic);
		let semantic = similar.complete(page, semantic);
		let combined = combined::merge_combined(lexical, semantic, self.search.semantic.page_size)?;
		let view = SearchView { text: normalized, matches: combined.matches.clone(), similar };

		Ok((view, combined))
	}

	/// Next page of the view's similar section.
	pub async fn more_similar(&self, view: &mut SearchView) -> Result<ResultPage> {
		let source = self.similar_source(&view.text);

		view.similar.fetch_next(&source).await
	}

	/// Single-strategy lexical retrieval for one routed query.
	async fn run_lexical(&self, query: &Query) -> Result<Vec<Hit>> {
		let mut hits = Vec::new();

		for request in router::route(query, &self.search)? {
			hits.extend(self.lexical.run(&request).await?);
		}

		Ok(hits)
	}
}

fn into_items(hits: Vec<Hit>) -> Vec<CatalogItem> {
	hits.into_iter().map(|hit| hit.item).collect()
}
