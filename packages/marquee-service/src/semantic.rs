use std::{sync::Arc, time::Duration};

use marquee_storage::{CatalogIndex, Hit, KnnQuery, index::sort_hits};

use crate::{
	Error, Result,
	embedding::EmbeddingPipeline,
	retrieval::{bounded, validate_hits},
	router::{SemanticRequest, Strategy},
};

/// One window of semantic hits plus the size of the candidate pool it was cut from.
#[derive(Debug, Clone)]
pub struct SemanticWindow {
	pub hits: Vec<Hit>,
	pub candidates: usize,
}

pub struct SemanticRanker {
	index: Arc<dyn CatalogIndex>,
	pipeline: Arc<EmbeddingPipeline>,
	timeout: Duration,
}
impl SemanticRanker {
	pub fn new(
		index: Arc<dyn CatalogIndex>,
		pipeline: Arc<EmbeddingPipeline>,
		timeout: Duration,
	) -> Self {
		Self { index, pipeline, timeout }
	}

	/// Embeds the text, fetches `candidate_k` neighbours, orders them by similarity (ties by
	/// insertion order), and returns the requested window.
	pub async fn rank(&self, request: &SemanticRequest) -> Result<SemanticWindow> {
		if request.text.trim().is_empty() {
			return Err(Error::invalid_query("Semantic search text must be non-empty."));
		}

		let vector = self.pipeline.embed(&request.text).await?;
		let query = KnnQuery { vector, k: request.candidate_k };
		let hits = bounded(Strategy::Semantic, self.timeout, self.index.knn(&query)).await?;
		let mut hits = validate_hits(Strategy::Semantic, hits);

		sort_hits(&mut hits);

		let candidates = hits.len();
		let skip = usize::try_from(request.skip).unwrap_or(usize::MAX);
		let hits = hits.into_iter().skip(skip).take(request.limit as usize).collect();

		Ok(SemanticWindow { hits, candidates })
	}
}
