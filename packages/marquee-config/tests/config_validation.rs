use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use marquee_config::{Config, EmbeddingBackend, StorageBackend};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml_with(edit: impl FnOnce(&mut toml::Table)) -> String {
	let mut value: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let root = value.as_table_mut().expect("Template config must be a table.");

	edit(root);

	toml::to_string(&value).expect("Failed to render template config.")
}

fn table_mut<'a>(root: &'a mut toml::Table, path: &[&str]) -> &'a mut toml::Table {
	let mut current = root;

	for key in path {
		current = current
			.get_mut(*key)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{key}]."));
	}

	current
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("marquee_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> marquee_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = marquee_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn base_config() -> Config {
	load_payload(SAMPLE_CONFIG_TEMPLATE_TOML.to_string()).expect("Failed to load base config.")
}

#[test]
fn sample_config_loads_and_normalizes() {
	let cfg = base_config();

	assert_eq!(cfg.storage.backend, StorageBackend::Postgres);
	assert_eq!(cfg.providers.embedding.backend, EmbeddingBackend::Http);
	assert_eq!(cfg.search.category.poster_extensions, vec!["jpg".to_string()]);
	assert_eq!(
		cfg.providers.embedding.http.as_ref().map(|http| http.api_base.as_str()),
		Some("http://127.0.0.1:8088")
	);
	assert_eq!(cfg.search.autocomplete.display_limit, 7);
	assert_eq!(cfg.search.semantic.candidate_k, 50);
}

#[test]
fn search_section_defaults_when_omitted() {
	let payload = sample_toml_with(|root| {
		root.remove("search");
	});
	let cfg = load_payload(payload).expect("Config without [search] must load.");

	assert_eq!(cfg.search.retrieval_timeout_ms, 3_000);
	assert_eq!(cfg.search.browse.default_page_size, 10);
	assert_eq!(cfg.search.autocomplete.candidate_limit, 20);
	assert_eq!(cfg.search.fuzzy.max_edits, 2);
	assert_eq!(cfg.search.fuzzy.prefix_length, 1);
	assert_eq!(cfg.search.fuzzy.max_expansions, 10);
	assert_eq!(cfg.search.semantic.page_size, 10);
	assert_eq!(cfg.search.text.limit, 20);
}

#[test]
fn vector_dim_must_match_embedding_dimensions() {
	let payload = sample_toml_with(|root| {
		table_mut(root, &["storage", "qdrant"]).insert("vector_dim".to_string(), Value::Integer(768));
	});
	let err = load_payload(payload).expect_err("Expected dimension mismatch error.");

	assert!(
		err.to_string()
			.contains("providers.embedding.dimensions must match storage.qdrant.vector_dim."),
		"Unexpected error: {err}"
	);
}

#[test]
fn postgres_backend_requires_qdrant_section() {
	let payload = sample_toml_with(|root| {
		table_mut(root, &["storage"]).remove("qdrant");
	});
	let err = load_payload(payload).expect_err("Expected missing qdrant error.");

	assert!(
		err.to_string().contains("storage.qdrant is required when storage.backend is postgres."),
		"Unexpected error: {err}"
	);
}

#[test]
fn memory_backend_requires_memory_section() {
	let payload = sample_toml_with(|root| {
		table_mut(root, &["storage"])
			.insert("backend".to_string(), Value::String("memory".to_string()));
	});
	let err = load_payload(payload).expect_err("Expected missing memory section error.");

	assert!(
		err.to_string().contains("storage.memory is required when storage.backend is memory."),
		"Unexpected error: {err}"
	);
}

#[test]
fn display_limit_must_not_exceed_candidate_limit() {
	let mut cfg = base_config();

	cfg.search.autocomplete.display_limit = 25;

	let err = marquee_config::validate(&cfg).expect_err("Expected display limit error.");

	assert!(
		err.to_string().contains("search.autocomplete.display_limit must not exceed"),
		"Unexpected error: {err}"
	);
}

#[test]
fn fuzzy_edits_are_bounded() {
	let mut cfg = base_config();

	cfg.search.fuzzy.max_edits = 3;

	let err = marquee_config::validate(&cfg).expect_err("Expected max_edits error.");

	assert!(
		err.to_string().contains("search.fuzzy.max_edits must be 2 or less."),
		"Unexpected error: {err}"
	);
}

#[test]
fn zero_limits_are_rejected() {
	let mut cfg = base_config();

	cfg.search.semantic.candidate_k = 0;

	let err = marquee_config::validate(&cfg).expect_err("Expected candidate_k error.");

	assert!(
		err.to_string().contains("search.semantic.candidate_k must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn http_backend_requires_api_key() {
	let payload = sample_toml_with(|root| {
		table_mut(root, &["providers", "embedding", "http"])
			.insert("api_key".to_string(), Value::String("  ".to_string()));
	});
	let err = load_payload(payload).expect_err("Expected api_key error.");

	assert!(
		err.to_string().contains("providers.embedding.http.api_key must be non-empty."),
		"Unexpected error: {err}"
	);
}

#[test]
fn local_backend_requires_local_section() {
	let payload = sample_toml_with(|root| {
		table_mut(root, &["providers", "embedding"])
			.insert("backend".to_string(), Value::String("local".to_string()));
	});
	let err = load_payload(payload).expect_err("Expected missing local section error.");

	assert!(
		err.to_string().contains("providers.embedding.local is required when backend is local."),
		"Unexpected error: {err}"
	);
}

#[test]
fn missing_file_reports_path() {
	let path = env::temp_dir().join("marquee_config_missing_file.toml");
	let err = marquee_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, marquee_config::Error::ReadConfig { .. }));
}
