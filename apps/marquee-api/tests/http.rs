use std::sync::Arc;

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::{Map, Value};
use tower::util::ServiceExt;

use marquee_api::{routes, state::AppState};
use marquee_config::{
	Config, EmbeddingBackend, EmbeddingProviderConfig, HttpEmbedding, MemoryIndex, Providers,
	Search, Service, Storage, StorageBackend,
};
use marquee_domain::EMBEDDING_DIM;
use marquee_service::{CatalogService, EmbeddingPipeline};
use marquee_storage::{CatalogIndex, memory::MemoryCatalogIndex};
use marquee_testkit::{
	catalog,
	embedder::{CountingLoader, HashEmbedder},
	index::{FaultyIndex, Faults},
};

fn memory_index() -> Arc<dyn CatalogIndex> {
	Arc::new(MemoryCatalogIndex::new(catalog::embedded_catalog()))
}

fn app_over(index: Arc<dyn CatalogIndex>) -> Router {
	let loader = CountingLoader::new(HashEmbedder::new(EMBEDDING_DIM));
	let pipeline = Arc::new(EmbeddingPipeline::new(Arc::new(loader), EMBEDDING_DIM, 16));
	let service = CatalogService::new(Search::default(), index, pipeline);

	routes::router(AppState::with_service(service, 8))
}

fn app() -> Router {
	app_over(memory_index())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
	let mut request = Request::builder().method(method).uri(uri);
	let body = match body {
		Some(json) => {
			request = request.header("content-type", "application/json");

			Body::from(json.to_string())
		},
		None => Body::empty(),
	};
	let response = app
		.clone()
		.oneshot(request.body(body).expect("Failed to build request."))
		.await
		.expect("Failed to call router.");
	let status = response.status();
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json = if bytes.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&bytes).expect("Failed to parse response.")
	};

	(status, json)
}

fn ids(value: &Value) -> Vec<String> {
	value
		.as_array()
		.expect("Expected a JSON array.")
		.iter()
		.map(|item| item["id"].as_str().expect("Item must carry an id.").to_string())
		.collect()
}

#[tokio::test]
async fn health_ok() {
	let (status, _) = send(&app(), "GET", "/health", None).await;

	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn browse_returns_listing_page() {
	let (status, json) = send(&app(), "GET", "/catalog/browse?page=1&pageSize=10", None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["currentPage"], 1);
	assert_eq!(json["totalPages"], 3);
	assert_eq!(json["totalItems"], 25);
	assert_eq!(ids(&json["items"])[..3], ["m02", "m22", "m09"]);
	assert!(json["items"][0].get("embedding").is_none());
}

#[tokio::test]
async fn browse_rejects_page_zero() {
	let (status, json) = send(&app(), "GET", "/catalog/browse?page=0", None).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "INVALID_QUERY");
}

#[tokio::test]
async fn autocomplete_accepts_text_alias() {
	let app = app();
	let (status, json) = send(&app, "GET", "/catalog/autocomplete?t=mat", None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(ids(&json), ["m18", "m02", "m01", "m03"]);
	assert_eq!(json[0]["title"], "Matilda");
	assert!(json[0].get("fullPlot").is_none());

	let (_, short) = send(&app, "GET", "/catalog/autocomplete?text=m", None).await;

	assert_eq!(short, serde_json::json!([]));
}

#[tokio::test]
async fn lexical_endpoints_return_empty_for_blank_text() {
	let app = app();

	for (method, uri) in [
		("POST", "/catalog/fuzzy?text=%20%20"),
		("GET", "/catalog/category?text="),
		("GET", "/catalog/search"),
		("GET", "/catalog/autocomplete?t=%09"),
	] {
		let (status, json) = send(&app, method, uri, None).await;

		assert_eq!(status, StatusCode::OK, "{uri}");
		assert_eq!(json, serde_json::json!([]), "{uri}");
	}
}

#[tokio::test]
async fn fuzzy_category_and_text_search() {
	let app = app();
	let (_, fuzzy) = send(&app, "POST", "/catalog/fuzzy?text=Matrx", None).await;

	assert_eq!(ids(&fuzzy), ["m01", "m03"]);

	let (_, category) = send(&app, "GET", "/catalog/category?text=sci-fi", None).await;

	assert_eq!(ids(&category).len(), 10);

	let (_, text) = send(&app, "GET", "/catalog/search?t=heist", None).await;

	assert_eq!(ids(&text)[0], "m24");
}

#[tokio::test]
async fn blank_semantic_query_is_rejected_without_index_calls() {
	let index = Arc::new(FaultyIndex::new(memory_index()));
	let app = app_over(Arc::clone(&index) as Arc<dyn CatalogIndex>);
	let (status, json) = send(&app, "GET", "/catalog/semantic?query=%20&page=1", None).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "INVALID_QUERY");
	assert_eq!(index.calls(), 0);
}

#[tokio::test]
async fn semantic_returns_fixed_size_page() {
	let (status, json) =
		send(&app(), "GET", "/catalog/semantic?query=space%20heist&page=1", None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["results"].as_array().map(Vec::len), Some(10));
}

#[tokio::test]
async fn get_item_and_not_found() {
	let app = app();
	let (status, json) = send(&app, "GET", "/catalog/m01", None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["title"], "The Matrix");

	let (status, json) = send(&app, "GET", "/catalog/missing", None).await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(json["error_code"], "NOT_FOUND");
}

#[tokio::test]
async fn failed_single_strategy_reports_retrieval_failure() {
	let index = FaultyIndex::new(memory_index()).failing(Faults { lexical: true, ..Faults::default() });
	let app = app_over(Arc::new(index));
	let (status, json) = send(&app, "POST", "/catalog/fuzzy?text=matrix", None).await;

	assert_eq!(status, StatusCode::BAD_GATEWAY);
	assert_eq!(json["error_code"], "RETRIEVAL_FAILED");
	assert_eq!(json["fields"][0], "fuzzy");
}

#[tokio::test]
async fn browse_view_pages_until_closed() {
	let app = app();
	let (status, opened) =
		send(&app, "POST", "/views/browse", Some(serde_json::json!({ "pageSize": 10 }))).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(opened["status"], "loaded");
	assert_eq!(opened["feed"]["items"].as_array().map(Vec::len), Some(10));
	assert_eq!(opened["feed"]["hasMore"], true);

	let view_id = opened["viewId"].as_str().expect("Expected a view id.").to_string();
	let (status, more) = send(&app, "POST", &format!("/views/{view_id}/more"), None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(more["feed"]["page"], 2);
	assert_eq!(more["feed"]["items"].as_array().map(Vec::len), Some(20));
	assert!(more.get("similar").is_none());

	let (status, _) = send(&app, "DELETE", &format!("/views/{view_id}"), None).await;

	assert_eq!(status, StatusCode::NO_CONTENT);

	let (status, json) = send(&app, "POST", &format!("/views/{view_id}/more"), None).await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(json["error_code"], "NOT_FOUND");

	let (status, _) = send(&app, "DELETE", "/views/not-a-view", None).await;

	assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn browse_view_accepts_missing_body() {
	let (status, opened) = send(&app(), "POST", "/views/browse", None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(opened["feed"]["pageSize"], 10);
}

#[tokio::test]
async fn search_view_combines_sections() {
	let app = app();
	let (status, opened) =
		send(&app, "POST", "/views/search", Some(serde_json::json!({ "text": "matrix" }))).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(opened["status"], "ok");
	assert_eq!(ids(&opened["matches"]), ["m01", "m03"]);
	assert_eq!(opened["similar"]["items"].as_array().map(Vec::len), Some(10));
	assert_eq!(opened["issues"], serde_json::json!([]));

	let view_id = opened["viewId"].as_str().expect("Expected a view id.").to_string();
	let (_, more) = send(&app, "POST", &format!("/views/{view_id}/more"), None).await;

	assert_eq!(more["similar"]["page"], 2);
	assert_eq!(more["similar"]["items"].as_array().map(Vec::len), Some(20));
}

#[tokio::test]
async fn search_view_degrades_failed_section() {
	let index = FaultyIndex::new(memory_index()).failing(Faults { knn: true, ..Faults::default() });
	let app = app_over(Arc::new(index));
	let (status, opened) =
		send(&app, "POST", "/views/search", Some(serde_json::json!({ "text": "matrix" }))).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(opened["status"], "degraded");
	assert_eq!(opened["issues"][0]["strategy"], "semantic");
	assert_eq!(ids(&opened["matches"]), ["m01", "m03"]);
}

#[tokio::test]
async fn search_view_rejects_blank_text() {
	let (status, json) =
		send(&app(), "POST", "/views/search", Some(serde_json::json!({ "text": "  " }))).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "INVALID_QUERY");
}

#[tokio::test]
async fn state_loads_memory_backend_from_seed_file() {
	let seed = catalog::write_seed_file(&catalog::embedded_catalog());
	let config = Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
			max_open_views: 4,
		},
		storage: Storage {
			backend: StorageBackend::Memory,
			postgres: None,
			qdrant: None,
			memory: Some(MemoryIndex { seed_path: Some(seed.clone()) }),
		},
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				backend: EmbeddingBackend::Http,
				dimensions: EMBEDDING_DIM as u32,
				timeout_ms: 1_000,
				query_cache_capacity: 16,
				local: None,
				http: Some(HttpEmbedding {
					provider_id: "test".to_string(),
					api_base: "http://127.0.0.1:1".to_string(),
					api_key: "test-key".to_string(),
					path: "/v1/embeddings".to_string(),
					model: "test".to_string(),
					default_headers: Map::new(),
				}),
			},
		},
		search: Search::default(),
	};
	let state = AppState::new(config).await.expect("Failed to initialize app state.");
	let app = routes::router(state);
	let (status, json) = send(&app, "GET", "/catalog/browse", None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["totalItems"], 25);

	let (status, json) = send(&app, "GET", "/catalog/semantic?query=matrix", None).await;

	assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
	assert_eq!(json["error_code"], "EMBEDDING_UNAVAILABLE");

	std::fs::remove_file(&seed).expect("Failed to remove seed file.");
}
