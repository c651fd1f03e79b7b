//! The search-results view: a lexical "matches" section and a semantic "similar" section.

use serde::Serialize;

use marquee_domain::{CatalogItem, ResultPage};

use crate::{Error, Result, accumulator::FeedAccumulator, router::Strategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
	Ok,
	/// At least one section failed and rendered empty.
	Degraded,
	/// Every section failed.
	Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionIssue {
	pub strategy: Strategy,
	pub cause: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedPage {
	pub matches: Vec<CatalogItem>,
	pub similar: ResultPage,
	pub issues: Vec<SectionIssue>,
	pub status: SearchStatus,
}

/// Open search view. The similar section keeps its own cursor and seen ids; the matches
/// section is fixed once the view opens.
#[derive(Debug)]
pub struct SearchView {
	pub text: String,
	pub matches: Vec<CatalogItem>,
	pub similar: FeedAccumulator,
}

/// Joins the two section outcomes. A failed section becomes empty with a recorded issue;
/// lexical matches are never deduplicated against similar items. Accumulator conflicts are
/// bugs and are returned instead of degraded.
pub fn merge_combined(
	lexical: Result<Vec<CatalogItem>>,
	semantic: Result<ResultPage>,
	similar_page_size: u32,
) -> Result<CombinedPage> {
	let mut issues = Vec::new();
	let matches = match lexical {
		Ok(items) => items,
		Err(err) => degrade(Strategy::Fuzzy, err, &mut issues)?.unwrap_or_default(),
	};
	let similar = match semantic {
		Ok(page) => page,
		Err(err) => degrade(Strategy::Semantic, err, &mut issues)?
			.unwrap_or_else(|| ResultPage::empty(similar_page_size)),
	};
	let status = match issues.len() {
		0 => SearchStatus::Ok,
		1 => SearchStatus::Degraded,
		_ => SearchStatus::Unavailable,
	};

	if status == SearchStatus::Unavailable {
		tracing::warn!("Every search strategy failed.");
	}

	Ok(CombinedPage { matches, similar, issues, status })
}

fn degrade<T>(strategy: Strategy, err: Error, issues: &mut Vec<SectionIssue>) -> Result<Option<T>> {
	if let Error::AccumulatorConflict { .. } = err {
		return Err(err);
	}

	tracing::warn!(strategy = %strategy, error = %err, "Search section degraded to no results.");

	issues.push(SectionIssue { strategy, cause: err.to_string() });

	Ok(None)
}

#[cfg(test)]
mod tests {
	use marquee_domain::Poster;

	use super::*;
	use crate::FailureCause;

	fn item(id: &str) -> CatalogItem {
		CatalogItem {
			id: id.to_string(),
			title: id.to_uppercase(),
			year: None,
			genres: Vec::new(),
			poster: Poster::Unavailable,
			full_plot: None,
			rating: None,
			embedding: None,
		}
	}

	fn similar(ids: &[&str]) -> ResultPage {
		ResultPage {
			items: ids.iter().map(|id| item(id)).collect(),
			page: 1,
			page_size: 10,
			total_available: ids.len() as u64,
			has_more: false,
		}
	}

	fn timeout(strategy: Strategy) -> Error {
		Error::RetrievalFailed { strategy, cause: FailureCause::Timeout }
	}

	#[test]
	fn sections_are_not_cross_deduplicated() {
		let page = merge_combined(Ok(vec![item("a"), item("b")]), Ok(similar(&["b", "c"])), 10)
			.expect("merge failed");

		assert_eq!(page.status, SearchStatus::Ok);
		assert_eq!(page.matches.len(), 2);
		assert_eq!(page.similar.items.len(), 2);
	}

	#[test]
	fn one_failed_section_degrades() {
		let page = merge_combined(Ok(vec![item("a")]), Err(timeout(Strategy::Semantic)), 10)
			.expect("merge failed");

		assert_eq!(page.status, SearchStatus::Degraded);
		assert_eq!(page.matches.len(), 1);
		assert!(page.similar.items.is_empty());
		assert_eq!(page.issues[0].strategy, Strategy::Semantic);
	}

	#[test]
	fn all_failed_sections_are_unavailable() {
		let page = merge_combined(
			Err(timeout(Strategy::Fuzzy)),
			Err(Error::EmbeddingUnavailable { message: "model missing".to_string() }),
			10,
		)
		.expect("merge failed");

		assert_eq!(page.status, SearchStatus::Unavailable);
		assert_eq!(page.issues.len(), 2);
	}

	#[test]
	fn conflicts_are_not_degraded() {
		let result = merge_combined(
			Ok(Vec::new()),
			Err(Error::AccumulatorConflict { message: "bug".to_string() }),
			10,
		);

		assert!(matches!(result, Err(Error::AccumulatorConflict { .. })));
	}

	#[test]
	fn combined_page_renders_status_and_issues() {
		let page = merge_combined(Err(timeout(Strategy::Fuzzy)), Ok(similar(&["a"])), 10)
			.expect("merge failed");
		let json = serde_json::to_value(&page).expect("Failed to render page.");

		assert_eq!(json["status"], "degraded");
		assert_eq!(json["issues"][0]["strategy"], "fuzzy");
		assert_eq!(json["similar"]["hasMore"], false);
	}
}
