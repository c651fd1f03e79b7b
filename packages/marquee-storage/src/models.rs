use marquee_domain::{CatalogItem, Poster, catalog::dedup_genres};

use crate::Hit;

#[derive(Debug, sqlx::FromRow)]
pub struct CatalogRow {
	pub item_id: String,
	pub seq: i64,
	pub title: String,
	pub year: Option<i32>,
	pub genres: Vec<String>,
	pub poster: Option<String>,
	pub full_plot: Option<String>,
	pub rating: Option<f32>,
}
impl CatalogRow {
	pub fn ordinal(&self) -> u64 {
		u64::try_from(self.seq).unwrap_or_default()
	}

	pub fn into_item(self) -> CatalogItem {
		CatalogItem {
			id: self.item_id,
			title: self.title,
			year: self.year,
			genres: dedup_genres(self.genres),
			poster: Poster::from_raw(self.poster.as_deref()),
			full_plot: self.full_plot,
			rating: self.rating,
			embedding: None,
		}
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct ScoredRow {
	#[sqlx(flatten)]
	pub row: CatalogRow,
	pub score: f32,
}
impl ScoredRow {
	pub fn into_hit(self) -> Hit {
		let ordinal = self.row.ordinal();

		Hit { item: self.row.into_item(), score: self.score, ordinal }
	}
}
