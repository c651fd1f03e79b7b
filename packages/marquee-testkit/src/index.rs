use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use marquee_domain::CatalogItem;
use marquee_storage::{
	BoxFuture, CatalogIndex, CategoryQuery, Error, FuzzyQuery, Hit, KnnQuery, PrefixQuery,
	RecentPage, RecentQuery, Result, TextQuery,
};

/// Which capabilities of a [`FaultyIndex`] fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
	/// Text, fuzzy, prefix, and category queries.
	pub lexical: bool,
	pub knn: bool,
	pub recent: bool,
	pub get: bool,
}
impl Faults {
	pub fn all() -> Self {
		Self { lexical: true, knn: true, recent: true, get: true }
	}
}

/// Delegating index wrapper that counts calls and can inject delay or failures.
pub struct FaultyIndex {
	inner: Arc<dyn CatalogIndex>,
	faults: Faults,
	delay: Duration,
	calls: AtomicUsize,
}
impl FaultyIndex {
	pub fn new(inner: Arc<dyn CatalogIndex>) -> Self {
		Self { inner, faults: Faults::default(), delay: Duration::ZERO, calls: AtomicUsize::new(0) }
	}

	pub fn failing(mut self, faults: Faults) -> Self {
		self.faults = faults;

		self
	}

	pub fn delayed(mut self, delay: Duration) -> Self {
		self.delay = delay;

		self
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	async fn enter(&self, fail: bool, capability: &str) -> Result<()> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		if !self.delay.is_zero() {
			tokio::time::sleep(self.delay).await;
		}
		if fail {
			return Err(Error::InvalidArgument(format!("Injected {capability} failure.")));
		}

		Ok(())
	}
}
impl CatalogIndex for FaultyIndex {
	fn text<'a>(&'a self, query: &'a TextQuery) -> BoxFuture<'a, Result<Vec<Hit>>> {
		Box::pin(async move {
			self.enter(self.faults.lexical, "text").await?;
			self.inner.text(query).await
		})
	}

	fn fuzzy<'a>(&'a self, query: &'a FuzzyQuery) -> BoxFuture<'a, Result<Vec<Hit>>> {
		Box::pin(async move {
			self.enter(self.faults.lexical, "fuzzy").await?;
			self.inner.fuzzy(query).await
		})
	}

	fn autocomplete<'a>(&'a self, query: &'a PrefixQuery) -> BoxFuture<'a, Result<Vec<Hit>>> {
		Box::pin(async move {
			self.enter(self.faults.lexical, "autocomplete").await?;
			self.inner.autocomplete(query).await
		})
	}

	fn category<'a>(&'a self, query: &'a CategoryQuery) -> BoxFuture<'a, Result<Vec<Hit>>> {
		Box::pin(async move {
			self.enter(self.faults.lexical, "category").await?;
			self.inner.category(query).await
		})
	}

	fn knn<'a>(&'a self, query: &'a KnnQuery) -> BoxFuture<'a, Result<Vec<Hit>>> {
		Box::pin(async move {
			self.enter(self.faults.knn, "knn").await?;
			self.inner.knn(query).await
		})
	}

	fn recent<'a>(&'a self, query: RecentQuery) -> BoxFuture<'a, Result<RecentPage>> {
		Box::pin(async move {
			self.enter(self.faults.recent, "recent").await?;
			self.inner.recent(query).await
		})
	}

	fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<CatalogItem>>> {
		Box::pin(async move {
			self.enter(self.faults.get, "get").await?;
			self.inner.get(id).await
		})
	}
}
