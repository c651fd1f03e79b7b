use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	#[serde(default = "default_max_open_views")]
	pub max_open_views: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
	Postgres,
	Memory,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub backend: StorageBackend,
	pub postgres: Option<Postgres>,
	pub qdrant: Option<Qdrant>,
	pub memory: Option<MemoryIndex>,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct MemoryIndex {
	/// Optional. JSON array of catalog items loaded at start-up; an empty index is used when
	/// unset.
	pub seed_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
	Local,
	Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub backend: EmbeddingBackend,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default = "default_query_cache_capacity")]
	pub query_cache_capacity: u32,
	pub local: Option<LocalEmbedding>,
	pub http: Option<HttpEmbedding>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalEmbedding {
	/// Directory holding `config.json`, `tokenizer.json`, and `model.safetensors`.
	pub model_dir: PathBuf,
	#[serde(default = "default_local_max_tokens")]
	pub max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpEmbedding {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Search {
	pub retrieval_timeout_ms: u64,
	pub browse: SearchBrowse,
	pub autocomplete: SearchAutocomplete,
	pub fuzzy: SearchFuzzy,
	pub semantic: SearchSemantic,
	pub category: SearchCategory,
	pub text: SearchText,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			retrieval_timeout_ms: 3_000,
			browse: Default::default(),
			autocomplete: Default::default(),
			fuzzy: Default::default(),
			semantic: Default::default(),
			category: Default::default(),
			text: Default::default(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchBrowse {
	pub default_page_size: u32,
	pub max_page_size: u32,
}
impl Default for SearchBrowse {
	fn default() -> Self {
		Self { default_page_size: 10, max_page_size: 100 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchAutocomplete {
	pub min_chars: u32,
	pub candidate_limit: u32,
	pub display_limit: u32,
}
impl Default for SearchAutocomplete {
	fn default() -> Self {
		Self { min_chars: 2, candidate_limit: 20, display_limit: 7 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchFuzzy {
	pub max_edits: u32,
	pub prefix_length: u32,
	pub max_expansions: u32,
	pub limit: u32,
}
impl Default for SearchFuzzy {
	fn default() -> Self {
		Self { max_edits: 2, prefix_length: 1, max_expansions: 10, limit: 20 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSemantic {
	pub candidate_k: u32,
	pub page_size: u32,
}
impl Default for SearchSemantic {
	fn default() -> Self {
		Self { candidate_k: 50, page_size: 10 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchCategory {
	pub limit: u32,
	/// Lowercase extensions without the leading dot.
	pub poster_extensions: Vec<String>,
}
impl Default for SearchCategory {
	fn default() -> Self {
		Self { limit: 20, poster_extensions: vec!["jpg".to_string()] }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchText {
	pub limit: u32,
}
impl Default for SearchText {
	fn default() -> Self {
		Self { limit: 20 }
	}
}

fn default_max_open_views() -> u32 {
	1_024
}

fn default_query_cache_capacity() -> u32 {
	512
}

fn default_local_max_tokens() -> u32 {
	256
}
