mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingBackend, EmbeddingProviderConfig, HttpEmbedding, LocalEmbedding, MemoryIndex,
	Postgres, Providers, Qdrant, Search, SearchAutocomplete, SearchBrowse, SearchCategory,
	SearchFuzzy, SearchSemantic, SearchText, Service, Storage, StorageBackend,
};

use std::{fs, path::Path};

/// Largest edit distance the fuzzy matcher accepts; larger values make title matching
/// indiscriminate.
pub const MAX_FUZZY_EDITS: u32 = 2;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.max_open_views == 0 {
		return Err(Error::Validation {
			message: "service.max_open_views must be greater than zero.".to_string(),
		});
	}

	validate_storage(cfg)?;
	validate_embedding(cfg)?;
	validate_search(cfg)?;

	Ok(())
}

fn validate_storage(cfg: &Config) -> Result<()> {
	match cfg.storage.backend {
		StorageBackend::Postgres => {
			let Some(postgres) = cfg.storage.postgres.as_ref() else {
				return Err(Error::Validation {
					message: "storage.postgres is required when storage.backend is postgres."
						.to_string(),
				});
			};
			let Some(qdrant) = cfg.storage.qdrant.as_ref() else {
				return Err(Error::Validation {
					message: "storage.qdrant is required when storage.backend is postgres."
						.to_string(),
				});
			};

			if postgres.dsn.trim().is_empty() {
				return Err(Error::Validation {
					message: "storage.postgres.dsn must be non-empty.".to_string(),
				});
			}
			if postgres.pool_max_conns == 0 {
				return Err(Error::Validation {
					message: "storage.postgres.pool_max_conns must be greater than zero."
						.to_string(),
				});
			}
			if qdrant.collection.trim().is_empty() {
				return Err(Error::Validation {
					message: "storage.qdrant.collection must be non-empty.".to_string(),
				});
			}
			if qdrant.vector_dim != cfg.providers.embedding.dimensions {
				return Err(Error::Validation {
					message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
						.to_string(),
				});
			}
		},
		StorageBackend::Memory =>
			if cfg.storage.memory.is_none() {
				return Err(Error::Validation {
					message: "storage.memory is required when storage.backend is memory."
						.to_string(),
				});
			},
	}

	Ok(())
}

fn validate_embedding(cfg: &Config) -> Result<()> {
	let embedding = &cfg.providers.embedding;

	if embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if embedding.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.timeout_ms must be greater than zero.".to_string(),
		});
	}

	match embedding.backend {
		EmbeddingBackend::Local => {
			let Some(local) = embedding.local.as_ref() else {
				return Err(Error::Validation {
					message: "providers.embedding.local is required when backend is local."
						.to_string(),
				});
			};

			if local.max_tokens == 0 {
				return Err(Error::Validation {
					message: "providers.embedding.local.max_tokens must be greater than zero."
						.to_string(),
				});
			}
		},
		EmbeddingBackend::Http => {
			let Some(http) = embedding.http.as_ref() else {
				return Err(Error::Validation {
					message: "providers.embedding.http is required when backend is http."
						.to_string(),
				});
			};

			for (label, value) in [
				("providers.embedding.http.api_base", &http.api_base),
				("providers.embedding.http.api_key", &http.api_key),
				("providers.embedding.http.model", &http.model),
			] {
				if value.trim().is_empty() {
					return Err(Error::Validation { message: format!("{label} must be non-empty.") });
				}
			}
			if http.default_headers.values().any(|value| !value.is_string()) {
				return Err(Error::Validation {
					message: "providers.embedding.http.default_headers values must be strings."
						.to_string(),
				});
			}
		},
	}

	Ok(())
}

fn validate_search(cfg: &Config) -> Result<()> {
	let search = &cfg.search;

	if search.retrieval_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "search.retrieval_timeout_ms must be greater than zero.".to_string(),
		});
	}

	for (label, value) in [
		("search.browse.default_page_size", search.browse.default_page_size),
		("search.browse.max_page_size", search.browse.max_page_size),
		("search.autocomplete.candidate_limit", search.autocomplete.candidate_limit),
		("search.autocomplete.display_limit", search.autocomplete.display_limit),
		("search.fuzzy.max_expansions", search.fuzzy.max_expansions),
		("search.fuzzy.limit", search.fuzzy.limit),
		("search.semantic.candidate_k", search.semantic.candidate_k),
		("search.semantic.page_size", search.semantic.page_size),
		("search.category.limit", search.category.limit),
		("search.text.limit", search.text.limit),
	] {
		if value == 0 {
			return Err(Error::Validation { message: format!("{label} must be greater than zero.") });
		}
	}

	if search.browse.default_page_size > search.browse.max_page_size {
		return Err(Error::Validation {
			message: "search.browse.default_page_size must not exceed search.browse.max_page_size."
				.to_string(),
		});
	}
	if search.autocomplete.display_limit > search.autocomplete.candidate_limit {
		return Err(Error::Validation {
			message: "search.autocomplete.display_limit must not exceed search.autocomplete.candidate_limit."
				.to_string(),
		});
	}
	if search.fuzzy.max_edits > MAX_FUZZY_EDITS {
		return Err(Error::Validation {
			message: format!("search.fuzzy.max_edits must be {MAX_FUZZY_EDITS} or less."),
		});
	}
	if search.semantic.page_size > search.semantic.candidate_k {
		return Err(Error::Validation {
			message: "search.semantic.page_size must not exceed search.semantic.candidate_k."
				.to_string(),
		});
	}
	if search.category.poster_extensions.is_empty() {
		return Err(Error::Validation {
			message: "search.category.poster_extensions must be non-empty.".to_string(),
		});
	}
	if search
		.category
		.poster_extensions
		.iter()
		.any(|ext| ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()))
	{
		return Err(Error::Validation {
			message:
				"search.category.poster_extensions entries must be alphanumeric without a leading dot."
					.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for ext in &mut cfg.search.category.poster_extensions {
		*ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
	}

	if let Some(memory) = cfg.storage.memory.as_mut()
		&& memory.seed_path.as_deref().map(|path| path.as_os_str().is_empty()).unwrap_or(false)
	{
		memory.seed_path = None;
	}
	if let Some(http) = cfg.providers.embedding.http.as_mut() {
		http.api_base = http.api_base.trim_end_matches('/').to_string();
	}
}
