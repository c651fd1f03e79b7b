use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use unicode_segmentation::UnicodeSegmentation;

use marquee_providers::{BoxFuture, EmbeddingModel, Error, ModelLoader, Result};

/// Feature-hashing encoder: each lowercase word adds +1 or -1 to one hashed slot, so texts
/// sharing words point in similar directions. Deterministic and model-free.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
	dimensions: usize,
}
impl HashEmbedder {
	pub fn new(dimensions: usize) -> Self {
		Self { dimensions }
	}

	pub fn vector(&self, text: &str) -> Vec<f32> {
		let mut out = vec![0.0; self.dimensions];

		for word in text.unicode_words() {
			let digest = blake3::hash(word.to_lowercase().as_bytes());
			let bytes = digest.as_bytes();
			let slot = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize
				% self.dimensions;
			let sign = if bytes[4] & 1 == 0 { 1.0 } else { -1.0 };

			out[slot] += sign;
		}

		out
	}
}
impl EmbeddingModel for HashEmbedder {
	fn dimensions(&self) -> usize {
		self.dimensions
	}

	fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>>> {
		Box::pin(async move { Ok(self.vector(text)) })
	}
}

/// Returns the same vector for every input; useful for zero or wrong-length outputs.
#[derive(Debug, Clone)]
pub struct FixedEmbedder {
	pub vector: Vec<f32>,
}
impl EmbeddingModel for FixedEmbedder {
	fn dimensions(&self) -> usize {
		self.vector.len()
	}

	fn embed<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<Vec<f32>>> {
		Box::pin(async move { Ok(self.vector.clone()) })
	}
}

/// Wraps a model and counts loads and embed calls. The first `failures` loads fail.
pub struct CountingLoader {
	model: Arc<dyn EmbeddingModel>,
	delay: Duration,
	failures: AtomicUsize,
	loads: Arc<AtomicUsize>,
	embeds: Arc<AtomicUsize>,
}
impl CountingLoader {
	pub fn new(model: impl EmbeddingModel + 'static) -> Self {
		Self {
			model: Arc::new(model),
			delay: Duration::ZERO,
			failures: AtomicUsize::new(0),
			loads: Arc::new(AtomicUsize::new(0)),
			embeds: Arc::new(AtomicUsize::new(0)),
		}
	}

	/// Makes each load sleep first, widening the window for concurrent first use.
	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = delay;

		self
	}

	pub fn failing_first(self, failures: usize) -> Self {
		self.failures.store(failures, Ordering::SeqCst);

		self
	}

	/// Successful and failed load attempts so far.
	pub fn loads(&self) -> Arc<AtomicUsize> {
		Arc::clone(&self.loads)
	}

	pub fn embeds(&self) -> Arc<AtomicUsize> {
		Arc::clone(&self.embeds)
	}
}
impl ModelLoader for CountingLoader {
	fn load(&self) -> BoxFuture<'_, Result<Arc<dyn EmbeddingModel>>> {
		Box::pin(async move {
			self.loads.fetch_add(1, Ordering::SeqCst);

			if !self.delay.is_zero() {
				tokio::time::sleep(self.delay).await;
			}

			let failing = self
				.failures
				.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
				.is_ok();

			if failing {
				return Err(Error::InvalidConfig { message: "Injected model load failure.".to_string() });
			}

			Ok(Arc::new(Counted { inner: Arc::clone(&self.model), embeds: Arc::clone(&self.embeds) })
				as Arc<dyn EmbeddingModel>)
		})
	}
}

struct Counted {
	inner: Arc<dyn EmbeddingModel>,
	embeds: Arc<AtomicUsize>,
}
impl EmbeddingModel for Counted {
	fn dimensions(&self) -> usize {
		self.inner.dimensions()
	}

	fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>>> {
		self.embeds.fetch_add(1, Ordering::SeqCst);

		self.inner.embed(text)
	}
}
