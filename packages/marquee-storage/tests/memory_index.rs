use marquee_domain::CatalogItem;
use marquee_storage::{
	CatalogIndex, CategoryQuery, FuzzyQuery, KnnQuery, PrefixQuery, RecentQuery, TextQuery,
	memory::MemoryCatalogIndex,
};
use marquee_testkit::{catalog, embedder::HashEmbedder};

fn index() -> MemoryCatalogIndex {
	MemoryCatalogIndex::new(catalog::embedded_catalog())
}

fn ids(items: impl IntoIterator<Item = CatalogItem>) -> Vec<String> {
	items.into_iter().map(|item| item.id).collect()
}

fn fuzzy(text: &str) -> FuzzyQuery {
	FuzzyQuery {
		text: text.to_string(),
		max_edits: 2,
		prefix_length: 1,
		max_expansions: 10,
		limit: 20,
	}
}

#[tokio::test]
async fn recent_orders_by_year_then_insertion() {
	let index = index();
	let page = index.recent(RecentQuery { skip: 0, limit: 10 }).await.expect("recent failed");

	assert_eq!(page.total, 25);
	assert_eq!(
		ids(page.items),
		vec!["m02", "m22", "m09", "m12", "m23", "m06", "m11", "m05", "m14", "m17"]
	);

	let last = index.recent(RecentQuery { skip: 20, limit: 10 }).await.expect("recent failed");

	assert_eq!(ids(last.items), vec!["m08", "m16", "m21", "m24", "m25"]);
}

#[tokio::test]
async fn fuzzy_tolerates_one_edit_with_matching_prefix() {
	let hits = index().fuzzy(&fuzzy("Matrx")).await.expect("fuzzy failed");

	assert_eq!(ids(hits.into_iter().map(|hit| hit.item)), vec!["m01", "m03"]);
}

#[tokio::test]
async fn fuzzy_rejects_three_edits_with_different_first_letter() {
	let hits = index().fuzzy(&fuzzy("Natrjy")).await.expect("fuzzy failed");

	assert!(hits.is_empty());
}

#[tokio::test]
async fn fuzzy_expansion_is_bounded() {
	let mut query = fuzzy("ma");

	query.max_expansions = 1;

	let hits = index().fuzzy(&query).await.expect("fuzzy failed");

	// "mad", "man", and "max" tie at one edit; spelling order keeps "mad".
	assert_eq!(ids(hits.into_iter().map(|hit| hit.item)), vec!["m12"]);
}

#[tokio::test]
async fn autocomplete_ranks_title_prefix_before_word_prefix() {
	let hits = index()
		.autocomplete(&PrefixQuery { text: "mat".to_string(), limit: 20 })
		.await
		.expect("autocomplete failed");

	assert_eq!(ids(hits.into_iter().map(|hit| hit.item)), vec!["m18", "m02", "m01", "m03"]);
}

#[tokio::test]
async fn category_matches_genre_and_requires_jpg_poster() {
	let hits = index()
		.category(&CategoryQuery {
			text: "SCI-FI".to_string(),
			poster_extensions: vec!["jpg".to_string()],
			limit: 20,
		})
		.await
		.expect("category failed");
	let found = ids(hits.into_iter().map(|hit| hit.item));

	assert_eq!(found, vec!["m01", "m03", "m05", "m06", "m08", "m14", "m15", "m19", "m21", "m23"]);
	assert!(!found.contains(&"m09".to_string()), "png poster must be filtered");
	assert!(!found.contains(&"m11".to_string()), "missing poster must be filtered");
}

#[tokio::test]
async fn category_text_is_literal() {
	let hits = index()
		.category(&CategoryQuery {
			text: ".*".to_string(),
			poster_extensions: vec!["jpg".to_string()],
			limit: 20,
		})
		.await
		.expect("category failed");

	assert!(hits.is_empty());
}

#[tokio::test]
async fn text_search_prefers_title_matches() {
	let hits = index()
		.text(&TextQuery { text: "heist".to_string(), limit: 20 })
		.await
		.expect("text failed");
	let found = ids(hits.into_iter().map(|hit| hit.item));

	assert_eq!(found.first().map(String::as_str), Some("m24"));
	assert!(found.contains(&"m04".to_string()));
	assert!(found.contains(&"m22".to_string()));
}

#[tokio::test]
async fn knn_ranks_the_source_text_first() {
	let index = index();
	let alien = catalog::sample_catalog().into_iter().find(|item| item.id == "m08").expect("m08");
	let vector = HashEmbedder::new(384).vector(&catalog::embedding_text(&alien));
	let hits = index.knn(&KnnQuery { vector, k: 5 }).await.expect("knn failed");

	assert_eq!(hits.len(), 5);
	assert_eq!(hits[0].item.id, "m08");
	assert!((hits[0].score - 1.0).abs() < 1e-5);
	assert!(hits.windows(2).all(|pair| pair[0].score >= pair[1].score));
}

#[tokio::test]
async fn knn_ties_follow_insertion_order() {
	let index = MemoryCatalogIndex::new(catalog::tied_catalog(&["m05", "m01", "m09", "m02"], "twin"));
	let vector = HashEmbedder::new(384).vector("twin");
	let hits = index.knn(&KnnQuery { vector, k: 3 }).await.expect("knn failed");

	assert!(hits.windows(2).all(|pair| pair[0].score == pair[1].score));
	assert_eq!(ids(hits.into_iter().map(|hit| hit.item)), vec!["m05", "m01", "m09"]);
}

#[tokio::test]
async fn knn_rejects_zero_vector() {
	let result = index().knn(&KnnQuery { vector: vec![0.0; 384], k: 5 }).await;

	assert!(result.is_err());
}

#[tokio::test]
async fn get_returns_item_by_id() {
	let index = index();
	let item = index.get("m05").await.expect("get failed").expect("m05 must exist");

	assert_eq!(item.title, "Inception");
	assert!(index.get("missing").await.expect("get failed").is_none());
}

#[tokio::test]
async fn duplicate_ids_keep_first_document() {
	let mut items = catalog::sample_catalog();
	let mut copy = items[0].clone();

	copy.title = "Imposter".to_string();
	items.push(copy);

	let index = MemoryCatalogIndex::new(items);

	assert_eq!(index.len(), 25);
	let kept = index.get("m01").await.expect("get failed").expect("m01 must exist");

	assert_eq!(kept.title, "The Matrix");
}

#[test]
fn seed_file_round_trips_embeddings() {
	let path = catalog::write_seed_file(&catalog::embedded_catalog());
	let index = MemoryCatalogIndex::from_seed_file(&path).expect("Failed to load seed.");

	std::fs::remove_file(&path).expect("Failed to remove seed file.");

	assert_eq!(index.len(), 25);
}

#[test]
fn missing_seed_file_is_reported() {
	let path = std::env::temp_dir().join("marquee_missing_seed.json");
	let err = MemoryCatalogIndex::from_seed_file(&path).err().expect("Expected error.");

	assert!(matches!(err, marquee_storage::Error::ReadSeed { .. }));
}
