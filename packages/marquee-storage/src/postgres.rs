use std::collections::HashMap;

use marquee_domain::CatalogItem;

use crate::{
	BoxFuture, CatalogIndex, CategoryQuery, FuzzyQuery, Hit, KnnQuery, PrefixQuery, RecentPage,
	RecentQuery, Result, TextQuery,
	db::Db,
	index::{self, terms},
	models::{CatalogRow, ScoredRow},
	qdrant::QdrantStore,
	queries,
};

/// Catalog documents in Postgres, vectors in Qdrant.
pub struct PgCatalogIndex {
	db: Db,
	qdrant: QdrantStore,
}
impl PgCatalogIndex {
	pub fn new(db: Db, qdrant: QdrantStore) -> Self {
		Self { db, qdrant }
	}

	/// Connects both stores and makes sure the table and collection exist.
	pub async fn connect(
		postgres: &marquee_config::Postgres,
		qdrant: &marquee_config::Qdrant,
	) -> Result<Self> {
		let db = Db::connect(postgres).await?;

		db.ensure_schema().await?;

		let qdrant = QdrantStore::new(qdrant)?;

		qdrant.ensure_collection().await?;

		Ok(Self::new(db, qdrant))
	}

	pub fn db(&self) -> &Db {
		&self.db
	}

	pub fn qdrant(&self) -> &QdrantStore {
		&self.qdrant
	}

	async fn knn_hits(&self, query: &KnnQuery) -> Result<Vec<Hit>> {
		let neighbours = self.qdrant.nearest(&query.vector, query.k).await?;
		let ids: Vec<String> = neighbours.iter().map(|(id, _)| id.clone()).collect();
		let mut rows: HashMap<String, CatalogRow> = queries::items_by_ids(&self.db, &ids)
			.await?
			.into_iter()
			.map(|row| (row.item_id.clone(), row))
			.collect();
		let mut hits = Vec::with_capacity(neighbours.len());

		for (item_id, score) in neighbours {
			let Some(row) = rows.remove(&item_id) else {
				tracing::warn!(item_id = %item_id, "Vector hit has no catalog row.");

				continue;
			};
			let ordinal = row.ordinal();

			hits.push(Hit { item: row.into_item(), score, ordinal });
		}

		index::sort_hits(&mut hits);

		Ok(hits)
	}
}
impl CatalogIndex for PgCatalogIndex {
	fn text<'a>(&'a self, query: &'a TextQuery) -> BoxFuture<'a, Result<Vec<Hit>>> {
		Box::pin(async move {
			let rows = queries::text_search(&self.db, &query.text, query.limit).await?;

			Ok(rows.into_iter().map(ScoredRow::into_hit).collect())
		})
	}

	fn fuzzy<'a>(&'a self, query: &'a FuzzyQuery) -> BoxFuture<'a, Result<Vec<Hit>>> {
		Box::pin(async move {
			let rows = queries::fuzzy_search(
				&self.db,
				&terms(&query.text),
				query.max_edits,
				query.prefix_length,
				query.max_expansions,
				query.limit,
			)
			.await?;

			Ok(rows.into_iter().map(ScoredRow::into_hit).collect())
		})
	}

	fn autocomplete<'a>(&'a self, query: &'a PrefixQuery) -> BoxFuture<'a, Result<Vec<Hit>>> {
		Box::pin(async move {
			let rows = queries::prefix_search(&self.db, &query.text, query.limit).await?;

			Ok(rows.into_iter().map(ScoredRow::into_hit).collect())
		})
	}

	fn category<'a>(&'a self, query: &'a CategoryQuery) -> BoxFuture<'a, Result<Vec<Hit>>> {
		Box::pin(async move {
			let rows = queries::category_search(
				&self.db,
				&query.text,
				&query.poster_extensions,
				query.limit,
			)
			.await?;

			Ok(rows.into_iter().map(ScoredRow::into_hit).collect())
		})
	}

	fn knn<'a>(&'a self, query: &'a KnnQuery) -> BoxFuture<'a, Result<Vec<Hit>>> {
		Box::pin(self.knn_hits(query))
	}

	fn recent<'a>(&'a self, query: RecentQuery) -> BoxFuture<'a, Result<RecentPage>> {
		Box::pin(async move {
			let rows = queries::recent_items(&self.db, query.skip, query.limit).await?;
			let total = queries::count_items(&self.db).await?;

			Ok(RecentPage { items: rows.into_iter().map(CatalogRow::into_item).collect(), total })
		})
	}

	fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<CatalogItem>>> {
		Box::pin(async move {
			let row = queries::get_item(&self.db, id).await?;

			Ok(row.map(CatalogRow::into_item))
		})
	}
}
