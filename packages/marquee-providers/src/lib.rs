pub mod embedding;
pub mod minilm;

mod error;

pub use error::{Error, Result};

use std::{future::Future, pin::Pin, sync::Arc};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};
use serde_json::{Map, Value};

use marquee_config::{EmbeddingBackend, EmbeddingProviderConfig};

use crate::{embedding::HttpEmbedder, minilm::LocalEncoder};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A loaded text encoder. Vectors are returned raw; callers normalize.
pub trait EmbeddingModel: Send + Sync {
	fn dimensions(&self) -> usize;

	fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>>>;
}

/// Produces the encoder on first use. Loading may be slow and may fail.
pub trait ModelLoader: Send + Sync {
	fn load(&self) -> BoxFuture<'_, Result<Arc<dyn EmbeddingModel>>>;
}

/// Loads whichever backend `providers.embedding.backend` selects.
pub struct ConfiguredLoader {
	cfg: EmbeddingProviderConfig,
}
impl ConfiguredLoader {
	pub fn new(cfg: &EmbeddingProviderConfig) -> Self {
		Self { cfg: cfg.clone() }
	}
}
impl ModelLoader for ConfiguredLoader {
	fn load(&self) -> BoxFuture<'_, Result<Arc<dyn EmbeddingModel>>> {
		Box::pin(async move {
			match self.cfg.backend {
				EmbeddingBackend::Local => {
					let Some(local) = self.cfg.local.clone() else {
						return Err(Error::InvalidConfig {
							message: "providers.embedding.local is required when backend is local."
								.to_string(),
						});
					};
					let encoder = LocalEncoder::load(local).await?;

					Ok(Arc::new(encoder) as Arc<dyn EmbeddingModel>)
				},
				EmbeddingBackend::Http => {
					let Some(http) = self.cfg.http.as_ref() else {
						return Err(Error::InvalidConfig {
							message: "providers.embedding.http is required when backend is http."
								.to_string(),
						});
					};
					let embedder =
						HttpEmbedder::new(http, self.cfg.dimensions, self.cfg.timeout_ms)?;

					tracing::info!(
						provider_id = %http.provider_id,
						model = %embedder.model(),
						"Configured HTTP embedding provider."
					);

					Ok(Arc::new(embedder) as Arc<dyn EmbeddingModel>)
				},
			}
		})
	}
}

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}
