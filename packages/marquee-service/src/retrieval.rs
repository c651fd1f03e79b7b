use std::{future::Future, time::Duration};

use ahash::AHashSet;
use tokio::time;

use marquee_storage::Hit;

use crate::{Error, FailureCause, Result, router::Strategy};

/// Runs one index call under the retrieval deadline.
pub(crate) async fn bounded<T, F>(strategy: Strategy, timeout: Duration, call: F) -> Result<T>
where
	F: Future<Output = marquee_storage::Result<T>>,
{
	match time::timeout(timeout, call).await {
		Ok(Ok(value)) => Ok(value),
		Ok(Err(err)) => {
			tracing::warn!(strategy = %strategy, error = %err, "Index call failed.");

			Err(Error::RetrievalFailed {
				strategy,
				cause: FailureCause::Index { message: err.to_string() },
			})
		},
		Err(_) => {
			tracing::warn!(
				strategy = %strategy,
				timeout_ms = timeout.as_millis() as u64,
				"Index call timed out."
			);

			Err(Error::RetrievalFailed { strategy, cause: FailureCause::Timeout })
		},
	}
}

/// Drops hits without an id or title and collapses repeated ids to their first occurrence.
pub fn validate_hits(strategy: Strategy, hits: Vec<Hit>) -> Vec<Hit> {
	let mut seen = AHashSet::with_capacity(hits.len());

	hits.into_iter()
		.filter(|hit| {
			if !hit.item.is_well_formed() {
				tracing::warn!(strategy = %strategy, item_id = %hit.item.id, "Dropping malformed hit.");

				return false;
			}

			seen.insert(hit.item.id.clone())
		})
		.collect()
}
