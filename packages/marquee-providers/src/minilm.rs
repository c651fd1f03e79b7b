//! Local sentence-transformers MiniLM encoder.
//!
//! Expects the `all-MiniLM-L6-v2` directory layout: `config.json`, `tokenizer.json`, and
//! `model.safetensors`. Inference is synchronous and CPU-bound; async callers should run it on
//! the blocking pool.

use std::{
	fs,
	path::{Path, PathBuf},
	sync::Arc,
};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use tokenizers::{Tokenizer, TruncationParams};

use crate::{BoxFuture, EmbeddingModel, Error, Result};

pub const CONFIG_FILE: &str = "config.json";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const WEIGHTS_FILE: &str = "model.safetensors";

pub struct MiniLm {
	model: BertModel,
	tokenizer: Tokenizer,
	device: Device,
	hidden_size: usize,
}
impl MiniLm {
	pub fn load(cfg: &marquee_config::LocalEmbedding) -> Result<Self> {
		let device = Device::Cpu;
		let config_raw = read_model_file(&cfg.model_dir.join(CONFIG_FILE))?;
		let config: Config = serde_json::from_slice(&config_raw)?;
		let weights = read_model_file(&cfg.model_dir.join(WEIGHTS_FILE))?;
		let vb = VarBuilder::from_buffered_safetensors(weights, DTYPE, &device)?;
		let model = BertModel::load(vb, &config)?;
		let mut tokenizer = Tokenizer::from_file(cfg.model_dir.join(TOKENIZER_FILE))
			.map_err(|err| Error::Tokenizer { message: err.to_string() })?;

		tokenizer
			.with_truncation(Some(TruncationParams {
				max_length: cfg.max_tokens as usize,
				..Default::default()
			}))
			.map_err(|err| Error::Tokenizer { message: err.to_string() })?;

		tracing::info!(
			model_dir = %cfg.model_dir.display(),
			hidden_size = config.hidden_size,
			max_tokens = cfg.max_tokens,
			"Loaded local MiniLM encoder."
		);

		Ok(Self { model, tokenizer, device, hidden_size: config.hidden_size })
	}

	pub fn dimensions(&self) -> usize {
		self.hidden_size
	}

	/// Encodes `text` and mean-pools the last hidden state under the attention mask. The
	/// vector is returned as produced by the model, without normalization.
	pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
		let encoding = self
			.tokenizer
			.encode(text, true)
			.map_err(|err| Error::Tokenizer { message: err.to_string() })?;
		let ids = encoding.get_ids();

		if ids.is_empty() {
			return Err(Error::Tokenizer { message: "Input produced no tokens.".to_string() });
		}

		let input_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
		let type_ids = input_ids.zeros_like()?;
		let mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;
		let hidden = self.model.forward(&input_ids, &type_ids, Some(&mask))?;
		let pooled = mean_pool(&hidden, &mask)?;

		Ok(pooled.squeeze(0)?.to_vec1::<f32>()?)
	}
}

/// Async front for [`MiniLm`]; loading and inference run on the blocking pool.
pub struct LocalEncoder {
	inner: Arc<MiniLm>,
}
impl LocalEncoder {
	pub async fn load(cfg: marquee_config::LocalEmbedding) -> Result<Self> {
		let model = tokio::task::spawn_blocking(move || MiniLm::load(&cfg)).await??;

		Ok(Self { inner: Arc::new(model) })
	}
}
impl EmbeddingModel for LocalEncoder {
	fn dimensions(&self) -> usize {
		self.inner.dimensions()
	}

	fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>>> {
		let model = Arc::clone(&self.inner);
		let text = text.to_string();

		Box::pin(async move { tokio::task::spawn_blocking(move || model.embed(&text)).await? })
	}
}

/// `hidden` is `(batch, tokens, dim)`, `mask` is `(batch, tokens)`.
fn mean_pool(hidden: &Tensor, mask: &Tensor) -> Result<Tensor> {
	let mask = mask.to_dtype(DType::F32)?.unsqueeze(2)?;
	let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
	let counts = mask.sum(1)?;

	Ok(summed.broadcast_div(&counts)?)
}

fn read_model_file(path: &Path) -> Result<Vec<u8>> {
	fs::read(path).map_err(|err| Error::ReadModel { path: PathBuf::from(path), source: err })
}
