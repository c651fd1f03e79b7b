//! Classifies a [`Query`] into the retrieval requests that answer it.

use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use marquee_config::Search;
use marquee_domain::{Query, QueryMode};
use marquee_storage::{CategoryQuery, FuzzyQuery, PrefixQuery, RecentQuery, TextQuery};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
	Browse,
	Autocomplete,
	Fuzzy,
	Semantic,
	Category,
	Text,
}
impl Strategy {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Browse => "browse",
			Self::Autocomplete => "autocomplete",
			Self::Fuzzy => "fuzzy",
			Self::Semantic => "semantic",
			Self::Category => "category",
			Self::Text => "text",
		}
	}
}
impl Display for Strategy {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Embed `text`, take the `candidate_k` nearest items, then window `skip..skip + limit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticRequest {
	pub text: String,
	pub candidate_k: u32,
	pub skip: u64,
	pub limit: u32,
}

#[derive(Debug, Clone)]
pub enum RetrievalRequest {
	Recent(RecentQuery),
	Prefix { query: PrefixQuery, display_limit: u32 },
	Fuzzy(FuzzyQuery),
	Semantic(SemanticRequest),
	Category(CategoryQuery),
	Text(TextQuery),
}
impl RetrievalRequest {
	pub fn strategy(&self) -> Strategy {
		match self {
			Self::Recent(_) => Strategy::Browse,
			Self::Prefix { .. } => Strategy::Autocomplete,
			Self::Fuzzy(_) => Strategy::Fuzzy,
			Self::Semantic(_) => Strategy::Semantic,
			Self::Category(_) => Strategy::Category,
			Self::Text(_) => Strategy::Text,
		}
	}
}

pub fn route(query: &Query, search: &Search) -> Result<Vec<RetrievalRequest>> {
	if query.page == 0 {
		return Err(Error::invalid_query("page must be 1 or greater."));
	}
	if query.page_size == 0 {
		return Err(Error::invalid_query("pageSize must be 1 or greater."));
	}
	if query.mode.requires_text() && query.is_blank() {
		return Err(Error::invalid_query(format!(
			"{} requires non-empty text.",
			query.mode.as_str()
		)));
	}

	let text = query.text();
	let requests = match query.mode {
		QueryMode::Browse => vec![RetrievalRequest::Recent(RecentQuery {
			skip: query.skip(),
			limit: query.page_size,
		})],
		QueryMode::Autocomplete => vec![RetrievalRequest::Prefix {
			query: PrefixQuery { text, limit: search.autocomplete.candidate_limit },
			display_limit: search.autocomplete.display_limit,
		}],
		QueryMode::FuzzySearch => vec![fuzzy_request(text, search)],
		QueryMode::SemanticSearch => vec![semantic_request(text, query, search)],
		QueryMode::CategoryFilter => vec![RetrievalRequest::Category(CategoryQuery {
			text,
			poster_extensions: search.category.poster_extensions.clone(),
			limit: search.category.limit,
		})],
		QueryMode::TextSearch =>
			vec![RetrievalRequest::Text(TextQuery { text, limit: search.text.limit })],
		QueryMode::CombinedSearch =>
			vec![fuzzy_request(text.clone(), search), semantic_request(text, query, search)],
	};

	Ok(requests)
}

fn fuzzy_request(text: String, search: &Search) -> RetrievalRequest {
	RetrievalRequest::Fuzzy(FuzzyQuery {
		text,
		max_edits: search.fuzzy.max_edits,
		prefix_length: search.fuzzy.prefix_length,
		max_expansions: search.fuzzy.max_expansions,
		limit: search.fuzzy.limit,
	})
}

fn semantic_request(text: String, query: &Query, search: &Search) -> RetrievalRequest {
	RetrievalRequest::Semantic(SemanticRequest {
		text,
		candidate_k: search.semantic.candidate_k,
		skip: query.skip(),
		limit: query.page_size,
	})
}
