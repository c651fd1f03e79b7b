use marquee_domain::{
	CatalogItem, Poster, Query, QueryMode, ResultPage, Suggestion,
	page::{is_short_page, total_pages},
};

#[test]
fn catalog_item_accepts_source_document_shape() {
	let json = serde_json::json!({
		"_id": "573a1398f29313caabceb515",
		"title": "The Matrix",
		"year": "1999è",
		"genres": ["Action", " Sci-Fi ", "action", ""],
		"poster": "https://m.media-amazon.com/images/matrix.jpg",
		"fullplot": "A hacker learns the nature of his reality.",
		"rating": 8.7,
		"plot_embedding_384": [0.1, 0.2]
	});
	let item: CatalogItem = serde_json::from_value(json).expect("Failed to parse catalog item.");

	assert_eq!(item.id, "573a1398f29313caabceb515");
	assert_eq!(item.year, Some(1999));
	assert_eq!(item.genres, vec!["Action".to_string(), "Sci-Fi".to_string()]);
	assert_eq!(item.full_plot.as_deref(), Some("A hacker learns the nature of his reality."));
	assert_eq!(item.embedding.as_ref().map(Vec::len), Some(2));
	assert!(item.is_well_formed());
}

#[test]
fn poster_sentinels_collapse_to_unavailable() {
	for raw in [
		serde_json::json!("N/A"),
		serde_json::json!("unavailable"),
		serde_json::json!(""),
		serde_json::Value::Null,
	] {
		let poster: Poster = serde_json::from_value(raw).expect("Failed to parse poster.");

		assert_eq!(poster, Poster::Unavailable);
	}

	let rendered = serde_json::to_value(Poster::Unavailable).expect("Failed to render poster.");

	assert_eq!(rendered, "unavailable");
}

#[test]
fn serialized_item_omits_embedding_and_uses_camel_case() {
	let item = CatalogItem {
		id: "m1".to_string(),
		title: "Materialist".to_string(),
		year: Some(2025),
		genres: vec!["Romance".to_string()],
		poster: Poster::Unavailable,
		full_plot: Some("A matchmaker weighs two suitors.".to_string()),
		rating: None,
		embedding: Some(vec![0.0; 384]),
	};
	let json = serde_json::to_value(&item).expect("Failed to render item.");

	assert!(json.get("embedding").is_none());
	assert_eq!(json["fullPlot"], "A matchmaker weighs two suitors.");
	assert_eq!(json["poster"], "unavailable");
	assert!(json.get("rating").is_none());

	let suggestion = Suggestion::from(&item);

	assert_eq!(suggestion.title, "Materialist");
	assert_eq!(suggestion.year, Some(2025));
}

#[test]
fn integer_year_is_accepted() {
	let json = serde_json::json!({ "id": "x", "title": "Heat", "year": 1995 });
	let item: CatalogItem = serde_json::from_value(json).expect("Failed to parse catalog item.");

	assert_eq!(item.year, Some(1995));
	assert!(item.genres.is_empty());
	assert_eq!(item.poster, Poster::Unavailable);
}

#[test]
fn blank_title_is_not_well_formed() {
	let json = serde_json::json!({ "id": "x", "title": "   " });
	let item: CatalogItem = serde_json::from_value(json).expect("Failed to parse catalog item.");

	assert!(!item.is_well_formed());
}

#[test]
fn query_text_is_normalized_and_blank_detected() {
	let query = Query::new(QueryMode::SemanticSearch, "  space   heist ");

	assert_eq!(query.text(), "space heist");
	assert!(!query.is_blank());
	assert!(Query::new(QueryMode::FuzzySearch, " \t\n").is_blank());
	assert!(QueryMode::FuzzySearch.requires_text());
	assert!(!QueryMode::Browse.requires_text());
}

#[test]
fn browse_query_windows_by_page() {
	let query = Query::browse(3, 10);

	assert_eq!(query.skip(), 20);
	assert_eq!(query.mode.as_str(), "browse");
}

#[test]
fn short_page_and_total_pages() {
	assert!(is_short_page(9, 10));
	assert!(!is_short_page(10, 10));
	assert_eq!(total_pages(21, 10), 3);
	assert_eq!(total_pages(0, 10), 0);

	let page = ResultPage::empty(10);

	assert!(!page.has_more);
	assert_eq!(page.total_available, 0);
}
