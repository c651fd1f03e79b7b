//! Query-time text embedding with a load-once model and a bounded query memo.

use std::{
	collections::VecDeque,
	sync::{Arc, Mutex},
};

use ahash::AHashMap;
use tokio::sync::OnceCell;

use marquee_config::EmbeddingProviderConfig;
use marquee_domain::query::normalize_text;
use marquee_providers::{ConfiguredLoader, EmbeddingModel, ModelLoader};

use crate::{Error, Result};

type MemoKey = [u8; 32];

/// Process-wide embedding entry point. Holds the model once it has loaded; a failed load is
/// retried by the next caller.
pub struct EmbeddingPipeline {
	loader: Arc<dyn ModelLoader>,
	model: OnceCell<Arc<dyn EmbeddingModel>>,
	dimensions: usize,
	memo: Mutex<QueryMemo>,
}
impl EmbeddingPipeline {
	pub fn new(loader: Arc<dyn ModelLoader>, dimensions: usize, memo_capacity: usize) -> Self {
		Self {
			loader,
			model: OnceCell::new(),
			dimensions,
			memo: Mutex::new(QueryMemo::new(memo_capacity)),
		}
	}

	pub fn from_config(cfg: &EmbeddingProviderConfig) -> Self {
		Self::new(
			Arc::new(ConfiguredLoader::new(cfg)),
			cfg.dimensions as usize,
			cfg.query_cache_capacity as usize,
		)
	}

	pub fn dimensions(&self) -> usize {
		self.dimensions
	}

	pub fn is_loaded(&self) -> bool {
		self.model.initialized()
	}

	/// Returns the unit-length vector for `text`. Equivalent spellings (width, spacing) share a
	/// vector.
	pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
		let normalized = normalize_text(text);

		if normalized.is_empty() {
			return Err(Error::EmbeddingUnavailable {
				message: "Cannot embed empty text.".to_string(),
			});
		}

		let key = *blake3::hash(normalized.as_bytes()).as_bytes();

		if let Some(vector) = self.lock_memo().get(&key) {
			return Ok(vector);
		}

		let model = self.model().await?;
		let raw = model.embed(&normalized).await?;
		let vector = unit_vector(raw, self.dimensions)?;

		self.lock_memo().insert(key, vector.clone());

		Ok(vector)
	}

	async fn model(&self) -> Result<&Arc<dyn EmbeddingModel>> {
		self.model
			.get_or_try_init(|| async {
				tracing::info!(dimensions = self.dimensions, "Loading embedding model.");

				let model = self.loader.load().await.inspect_err(|err| {
					tracing::warn!(error = %err, "Embedding model failed to load.");
				})?;

				if model.dimensions() != self.dimensions {
					return Err(Error::EmbeddingUnavailable {
						message: format!(
							"Embedding model produces {} dimensions; expected {}.",
							model.dimensions(),
							self.dimensions
						),
					});
				}

				Ok(model)
			})
			.await
	}

	fn lock_memo(&self) -> std::sync::MutexGuard<'_, QueryMemo> {
		self.memo.lock().unwrap_or_else(|err| err.into_inner())
	}
}

/// Scales `raw` to unit L2 norm, rejecting wrong-length, non-finite, or zero vectors.
pub fn unit_vector(mut raw: Vec<f32>, dimensions: usize) -> Result<Vec<f32>> {
	if raw.len() != dimensions {
		return Err(Error::EmbeddingUnavailable {
			message: format!("Embedding has {} dimensions; expected {dimensions}.", raw.len()),
		});
	}
	if raw.iter().any(|value| !value.is_finite()) {
		return Err(Error::EmbeddingUnavailable {
			message: "Embedding contains non-finite values.".to_string(),
		});
	}

	let norm = raw.iter().map(|value| value * value).sum::<f32>().sqrt();

	if norm == 0.0 {
		return Err(Error::EmbeddingUnavailable {
			message: "Embedding is a zero vector.".to_string(),
		});
	}

	for value in &mut raw {
		*value /= norm;
	}

	Ok(raw)
}

/// First-in-first-out memo of query vectors. Capacity 0 disables it.
struct QueryMemo {
	capacity: usize,
	vectors: AHashMap<MemoKey, Vec<f32>>,
	order: VecDeque<MemoKey>,
}
impl QueryMemo {
	fn new(capacity: usize) -> Self {
		Self { capacity, vectors: AHashMap::new(), order: VecDeque::new() }
	}

	fn get(&self, key: &MemoKey) -> Option<Vec<f32>> {
		self.vectors.get(key).cloned()
	}

	fn insert(&mut self, key: MemoKey, vector: Vec<f32>) {
		if self.capacity == 0 || self.vectors.contains_key(&key) {
			return;
		}

		while self.order.len() >= self.capacity {
			let Some(oldest) = self.order.pop_front() else {
				break;
			};

			self.vectors.remove(&oldest);
		}

		self.order.push_back(key);
		self.vectors.insert(key, vector);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unit_vector_normalizes() {
		let vector = unit_vector(vec![3.0, 4.0], 2).expect("normalize failed");

		assert_eq!(vector, vec![0.6, 0.8]);
	}

	#[test]
	fn unit_vector_rejects_zero_and_wrong_length() {
		assert!(unit_vector(vec![0.0, 0.0], 2).is_err());
		assert!(unit_vector(vec![1.0], 2).is_err());
		assert!(unit_vector(vec![f32::NAN, 1.0], 2).is_err());
	}

	#[test]
	fn memo_evicts_oldest_first() {
		let mut memo = QueryMemo::new(2);

		memo.insert([1; 32], vec![1.0]);
		memo.insert([2; 32], vec![2.0]);
		memo.insert([3; 32], vec![3.0]);

		assert!(memo.get(&[1; 32]).is_none());
		assert_eq!(memo.get(&[3; 32]), Some(vec![3.0]));
	}

	#[test]
	fn zero_capacity_memo_stores_nothing() {
		let mut memo = QueryMemo::new(0);

		memo.insert([1; 32], vec![1.0]);

		assert!(memo.get(&[1; 32]).is_none());
	}
}
