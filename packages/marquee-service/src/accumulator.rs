//! Idempotent "load more" accumulation over a paged source.
//!
//! Status moves Idle -> Loading -> Loaded or Failed. A failed fetch leaves the cursor where it
//! was, so the next fetch retries the same page. A page with fewer raw hits than the page size
//! ends the feed.

use ahash::AHashSet;
use serde::Serialize;

use marquee_domain::{CatalogItem, Query, ResultPage, page::is_short_page};
use marquee_storage::BoxFuture;

use crate::{Error, Result, router::Strategy};

/// One page as the source returned it.
#[derive(Debug, Clone, Default)]
pub struct SourcePage {
	pub items: Vec<CatalogItem>,
	/// Hits the source returned before validation; drives the short-page rule.
	pub raw_count: usize,
	/// Total the source reports, when it knows one.
	pub total: Option<u64>,
}

pub trait PageSource: Send + Sync {
	fn strategy(&self) -> Strategy;

	/// `page` is 1-based.
	fn fetch<'a>(&'a self, page: u32, page_size: u32) -> BoxFuture<'a, Result<SourcePage>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedStatus {
	Idle,
	Loading,
	Loaded,
	Failed,
}

#[derive(Debug)]
pub struct FeedAccumulator {
	query: Query,
	seen_ids: AHashSet<String>,
	items: Vec<CatalogItem>,
	next_page: u32,
	total_available: u64,
	has_more: bool,
	status: FeedStatus,
	in_flight: Option<u32>,
}
impl FeedAccumulator {
	pub fn new(query: Query) -> Self {
		Self {
			query,
			seen_ids: AHashSet::new(),
			items: Vec::new(),
			next_page: 1,
			total_available: 0,
			has_more: true,
			status: FeedStatus::Idle,
			in_flight: None,
		}
	}

	/// Clears everything and starts over at page 1. Valid from any status; a completion for a
	/// fetch begun before the reset is rejected.
	pub fn reset(&mut self, query: Query) {
		*self = Self::new(query);
	}

	pub fn query(&self) -> &Query {
		&self.query
	}

	pub fn status(&self) -> FeedStatus {
		self.status
	}

	pub fn next_page(&self) -> u32 {
		self.next_page
	}

	pub fn items(&self) -> &[CatalogItem] {
		&self.items
	}

	pub fn has_more(&self) -> bool {
		self.has_more
	}

	/// Marks a fetch of `next_page` as in flight and returns that page number.
	pub fn begin(&mut self) -> Result<u32> {
		if let Some(page) = self.in_flight {
			return Err(Error::AccumulatorConflict {
				message: format!("Page {page} is already being fetched."),
			});
		}

		self.status = FeedStatus::Loading;
		self.in_flight = Some(self.next_page);

		Ok(self.next_page)
	}

	/// Applies the outcome of the fetch started by [`Self::begin`] for `page`.
	pub fn complete(&mut self, page: u32, outcome: Result<SourcePage>) -> Result<ResultPage> {
		match self.in_flight {
			Some(expected) if expected == page && expected == self.next_page => {},
			Some(expected) =>
				return Err(Error::AccumulatorConflict {
					message: format!("Completed page {page} while page {expected} is in flight."),
				}),
			None =>
				return Err(Error::AccumulatorConflict {
					message: format!("Completed page {page} with no fetch in flight."),
				}),
		}

		self.in_flight = None;

		let source = match outcome {
			Ok(source) => source,
			Err(err) => {
				self.status = FeedStatus::Failed;

				return Err(err);
			},
		};

		for item in source.items {
			if self.seen_ids.insert(item.id.clone()) {
				self.items.push(item);
			}
		}

		self.next_page += 1;
		self.has_more = !is_short_page(source.raw_count, self.query.page_size);
		self.total_available =
			source.total.unwrap_or(0).max(self.total_available).max(self.items.len() as u64);
		self.status = FeedStatus::Loaded;

		Ok(self.snapshot())
	}

	/// Fetches the page under the cursor and merges it. Also fetches when `has_more` is false,
	/// so a feed that grew since can still be extended.
	///
	/// Dropping the returned future mid-fetch leaves the feed `Failed` with the cursor in place.
	pub async fn fetch_next(&mut self, source: &dyn PageSource) -> Result<ResultPage> {
		if let Some(page) = self.in_flight {
			return Err(Error::AccumulatorConflict {
				message: format!("Page {page} is already being fetched."),
			});
		}

		let page = self.next_page;
		let page_size = self.query.page_size;
		let outcome = {
			let mut pending = PendingFetch { status: &mut self.status, settled: false };

			*pending.status = FeedStatus::Loading;

			let outcome = source.fetch(page, page_size).await;

			pending.settled = true;

			outcome
		};

		if let Err(err) = &outcome {
			tracing::warn!(
				strategy = %source.strategy(),
				page,
				error = %err,
				"Feed page fetch failed; cursor kept."
			);
		}

		self.in_flight = Some(page);
		self.complete(page, outcome)
	}

	/// Everything accumulated so far. `page` is the last page merged.
	pub fn snapshot(&self) -> ResultPage {
		ResultPage {
			items: self.items.clone(),
			page: self.next_page - 1,
			page_size: self.query.page_size,
			total_available: self.total_available,
			has_more: self.has_more,
		}
	}
}

/// Marks the feed `Failed` if a fetch is dropped before its outcome arrives.
struct PendingFetch<'a> {
	status: &'a mut FeedStatus,
	settled: bool,
}
impl Drop for PendingFetch<'_> {
	fn drop(&mut self) {
		if !self.settled {
			*self.status = FeedStatus::Failed;
		}
	}
}
