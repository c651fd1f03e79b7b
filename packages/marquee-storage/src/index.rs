//! Query contract every catalog index adapter implements.

use std::{future::Future, pin::Pin};

use marquee_domain::CatalogItem;
use unicode_segmentation::UnicodeSegmentation;

use crate::Result;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Wildcard full-text match over title, plot, and genres.
#[derive(Debug, Clone)]
pub struct TextQuery {
	pub text: String,
	pub limit: u32,
}

/// Edit-distance match against title words.
#[derive(Debug, Clone)]
pub struct FuzzyQuery {
	pub text: String,
	pub max_edits: u32,
	/// Leading characters that must match exactly before edits are counted.
	pub prefix_length: u32,
	/// Cap on the distinct title words each query term may expand to.
	pub max_expansions: u32,
	pub limit: u32,
}

/// Prefix match against the title and the start of each title word.
#[derive(Debug, Clone)]
pub struct PrefixQuery {
	pub text: String,
	pub limit: u32,
}

/// Case-insensitive substring match against genres or title. `text` is a literal, never a
/// pattern. Items must carry a poster ending in one of `poster_extensions`.
#[derive(Debug, Clone)]
pub struct CategoryQuery {
	pub text: String,
	pub poster_extensions: Vec<String>,
	pub limit: u32,
}

#[derive(Debug, Clone)]
pub struct KnnQuery {
	pub vector: Vec<f32>,
	pub k: u32,
}

/// Chronological window: year descending, undated items last, ties by insertion order.
#[derive(Debug, Clone, Copy)]
pub struct RecentQuery {
	pub skip: u64,
	pub limit: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
	pub item: CatalogItem,
	/// Adapter-specific relevance; only the order is meaningful, except for k-NN hits where it
	/// is the cosine similarity.
	pub score: f32,
	/// Catalog insertion order, used to break score ties.
	pub ordinal: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecentPage {
	pub items: Vec<CatalogItem>,
	pub total: u64,
}

pub trait CatalogIndex: Send + Sync {
	fn text<'a>(&'a self, query: &'a TextQuery) -> BoxFuture<'a, Result<Vec<Hit>>>;

	fn fuzzy<'a>(&'a self, query: &'a FuzzyQuery) -> BoxFuture<'a, Result<Vec<Hit>>>;

	fn autocomplete<'a>(&'a self, query: &'a PrefixQuery) -> BoxFuture<'a, Result<Vec<Hit>>>;

	fn category<'a>(&'a self, query: &'a CategoryQuery) -> BoxFuture<'a, Result<Vec<Hit>>>;

	/// Nearest neighbours by cosine similarity, most similar first.
	fn knn<'a>(&'a self, query: &'a KnnQuery) -> BoxFuture<'a, Result<Vec<Hit>>>;

	fn recent<'a>(&'a self, query: RecentQuery) -> BoxFuture<'a, Result<RecentPage>>;

	fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<CatalogItem>>>;
}

/// Lowercases `raw` and escapes `LIKE` metacharacters so it matches literally.
pub fn escape_like(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());

	for c in raw.to_lowercase().chars() {
		if matches!(c, '%' | '_' | '\\') {
			out.push('\\');
		}

		out.push(c);
	}

	out
}

/// Lowercase word tokens of `text`, in order, punctuation dropped.
pub fn terms(text: &str) -> Vec<String> {
	text.unicode_words().map(str::to_lowercase).collect()
}

/// Most similar first; equal scores fall back to insertion order.
pub fn sort_hits(hits: &mut [Hit]) {
	hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.ordinal.cmp(&b.ordinal)));
}
