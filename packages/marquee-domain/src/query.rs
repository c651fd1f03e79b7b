use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
	Browse,
	Autocomplete,
	FuzzySearch,
	SemanticSearch,
	CategoryFilter,
	TextSearch,
	/// The search-results view: a fuzzy section plus a semantic "similar" section.
	CombinedSearch,
}
impl QueryMode {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Browse => "browse",
			Self::Autocomplete => "autocomplete",
			Self::FuzzySearch => "fuzzy_search",
			Self::SemanticSearch => "semantic_search",
			Self::CategoryFilter => "category_filter",
			Self::TextSearch => "text_search",
			Self::CombinedSearch => "combined_search",
		}
	}

	pub fn requires_text(self) -> bool {
		!matches!(self, Self::Browse)
	}
}

/// One user-issued discovery request. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
	pub raw_text: String,
	pub mode: QueryMode,
	pub page: u32,
	pub page_size: u32,
}
impl Query {
	pub fn new(mode: QueryMode, raw_text: impl Into<String>) -> Self {
		Self { raw_text: raw_text.into(), mode, page: 1, page_size: DEFAULT_PAGE_SIZE }
	}

	pub fn browse(page: u32, page_size: u32) -> Self {
		Self { raw_text: String::new(), mode: QueryMode::Browse, page, page_size }
	}

	pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
		self.page = page;
		self.page_size = page_size;

		self
	}

	pub fn text(&self) -> String {
		normalize_text(&self.raw_text)
	}

	pub fn is_blank(&self) -> bool {
		is_blank(&self.raw_text)
	}

	/// Number of items before this page in a `page_size` window.
	pub fn skip(&self) -> u64 {
		page_skip(self.page, self.page_size)
	}
}

/// NFKC-normalizes `raw`, trims it, and collapses inner whitespace runs to one space.
pub fn normalize_text(raw: &str) -> String {
	let composed: String = raw.nfkc().collect();
	let mut out = String::with_capacity(composed.len());

	for word in composed.split_whitespace() {
		if !out.is_empty() {
			out.push(' ');
		}

		out.push_str(word);
	}

	out
}

pub fn is_blank(raw: &str) -> bool {
	raw.chars().all(char::is_whitespace)
}

pub fn page_skip(page: u32, page_size: u32) -> u64 {
	u64::from(page.saturating_sub(1)) * u64::from(page_size)
}
