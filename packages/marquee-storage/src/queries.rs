use marquee_domain::CatalogItem;

use crate::{
	Result,
	db::Db,
	index::escape_like,
	models::{CatalogRow, ScoredRow},
};

pub async fn upsert_item(db: &Db, item: &CatalogItem) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO catalog_items (item_id, title, year, genres, poster, full_plot, rating)
VALUES ($1, $2, $3, $4, $5, $6, $7)
ON CONFLICT (item_id) DO UPDATE
SET
	title = EXCLUDED.title,
	year = EXCLUDED.year,
	genres = EXCLUDED.genres,
	poster = EXCLUDED.poster,
	full_plot = EXCLUDED.full_plot,
	rating = EXCLUDED.rating",
	)
	.bind(item.id.as_str())
	.bind(item.title.as_str())
	.bind(item.year)
	.bind(&item.genres)
	.bind(item.poster.url())
	.bind(item.full_plot.as_deref())
	.bind(item.rating)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn get_item(db: &Db, item_id: &str) -> Result<Option<CatalogRow>> {
	let row = sqlx::query_as::<_, CatalogRow>(
		"\
SELECT item_id, seq, title, year, genres, poster, full_plot, rating
FROM catalog_items
WHERE item_id = $1",
	)
	.bind(item_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(row)
}

pub async fn items_by_ids(db: &Db, item_ids: &[String]) -> Result<Vec<CatalogRow>> {
	if item_ids.is_empty() {
		return Ok(Vec::new());
	}

	let rows = sqlx::query_as::<_, CatalogRow>(
		"\
SELECT item_id, seq, title, year, genres, poster, full_plot, rating
FROM catalog_items
WHERE item_id = ANY($1)",
	)
	.bind(item_ids)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn recent_items(db: &Db, skip: u64, limit: u32) -> Result<Vec<CatalogRow>> {
	let rows = sqlx::query_as::<_, CatalogRow>(
		"\
SELECT item_id, seq, title, year, genres, poster, full_plot, rating
FROM catalog_items
ORDER BY year DESC NULLS LAST, seq ASC
OFFSET $1
LIMIT $2",
	)
	.bind(i64::try_from(skip).unwrap_or(i64::MAX))
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn count_items(db: &Db) -> Result<u64> {
	let count: i64 =
		sqlx::query_scalar("SELECT count(*) FROM catalog_items").fetch_one(&db.pool).await?;

	Ok(u64::try_from(count).unwrap_or_default())
}

/// Full-text relevance over title and plot, plus literal title or genre containment.
pub async fn text_search(db: &Db, text: &str, limit: u32) -> Result<Vec<ScoredRow>> {
	let rows = sqlx::query_as::<_, ScoredRow>(
		"\
WITH q AS (
	SELECT plainto_tsquery('simple', $1) AS tsq, '%' || $2 || '%' AS pattern
)
SELECT
	c.item_id,
	c.seq,
	c.title,
	c.year,
	c.genres,
	c.poster,
	c.full_plot,
	c.rating,
	(
		ts_rank(c.search_tsv, q.tsq)
		+ CASE WHEN lower(c.title) LIKE q.pattern ESCAPE '\\' THEN 1 ELSE 0 END
	)::real AS score
FROM catalog_items c, q
WHERE c.search_tsv @@ q.tsq
	OR lower(c.title) LIKE q.pattern ESCAPE '\\'
	OR EXISTS (SELECT 1 FROM unnest(c.genres) AS g(genre) WHERE lower(g.genre) LIKE q.pattern ESCAPE '\\')
ORDER BY score DESC, c.seq ASC
LIMIT $3",
	)
	.bind(text)
	.bind(escape_like(text))
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Expands each lowercase term to the closest distinct title words sharing its first
/// `prefix_length` characters, then scores items by their best expansion per term.
pub async fn fuzzy_search(
	db: &Db,
	terms: &[String],
	max_edits: u32,
	prefix_length: u32,
	max_expansions: u32,
	limit: u32,
) -> Result<Vec<ScoredRow>> {
	if terms.is_empty() {
		return Ok(Vec::new());
	}

	let rows = sqlx::query_as::<_, ScoredRow>(
		"\
WITH terms AS (
	SELECT t.term, t.pos
	FROM unnest($1::text[]) WITH ORDINALITY AS t(term, pos)
),
words AS (
	SELECT DISTINCT w.word
	FROM catalog_items c,
		regexp_split_to_table(lower(c.title), '[^[:alnum:]]+') AS w(word)
	WHERE w.word <> ''
),
candidates AS (
	SELECT t.pos, w.word, levenshtein(t.term, w.word) AS distance
	FROM terms t
	JOIN words w ON left(w.word, $3) = left(t.term, $3)
),
expansions AS (
	SELECT pos, word, distance
	FROM (
		SELECT
			pos,
			word,
			distance,
			row_number() OVER (PARTITION BY pos ORDER BY distance ASC, word ASC) AS rank
		FROM candidates
		WHERE distance <= $2
	) ranked
	WHERE rank <= $4
),
scored AS (
	SELECT best.item_id, sum(best.score)::real AS score
	FROM (
		SELECT c.item_id, e.pos, max(1.0 / (1 + e.distance)) AS score
		FROM catalog_items c
		JOIN expansions e
			ON e.word = ANY (regexp_split_to_array(lower(c.title), '[^[:alnum:]]+'))
		GROUP BY c.item_id, e.pos
	) best
	GROUP BY best.item_id
)
SELECT
	c.item_id,
	c.seq,
	c.title,
	c.year,
	c.genres,
	c.poster,
	c.full_plot,
	c.rating,
	s.score
FROM scored s
JOIN catalog_items c ON c.item_id = s.item_id
ORDER BY s.score DESC, c.seq ASC
LIMIT $5",
	)
	.bind(terms)
	.bind(i32::try_from(max_edits).unwrap_or(i32::MAX))
	.bind(i32::try_from(prefix_length).unwrap_or(i32::MAX))
	.bind(i64::from(max_expansions))
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Whole-title prefix matches rank above word-start matches; trigram similarity breaks ties.
pub async fn prefix_search(db: &Db, text: &str, limit: u32) -> Result<Vec<ScoredRow>> {
	let rows = sqlx::query_as::<_, ScoredRow>(
		"\
SELECT
	item_id,
	seq,
	title,
	year,
	genres,
	poster,
	full_plot,
	rating,
	(CASE WHEN lower(title) LIKE ($1 || '%') ESCAPE '\\' THEN 2 ELSE 1 END)::real AS score
FROM catalog_items
WHERE lower(title) LIKE ($1 || '%') ESCAPE '\\'
	OR lower(title) LIKE ('% ' || $1 || '%') ESCAPE '\\'
ORDER BY score DESC, similarity(lower(title), $2) DESC, seq ASC
LIMIT $3",
	)
	.bind(escape_like(text))
	.bind(text.to_lowercase())
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn category_search(
	db: &Db,
	text: &str,
	poster_extensions: &[String],
	limit: u32,
) -> Result<Vec<ScoredRow>> {
	let suffixes: Vec<String> =
		poster_extensions.iter().map(|ext| format!("%.{}", escape_like(ext))).collect();
	let rows = sqlx::query_as::<_, ScoredRow>(
		"\
SELECT
	item_id,
	seq,
	title,
	year,
	genres,
	poster,
	full_plot,
	rating,
	1::real AS score
FROM catalog_items
WHERE (
		lower(title) LIKE ('%' || $1 || '%') ESCAPE '\\'
		OR EXISTS (
			SELECT 1
			FROM unnest(genres) AS g(genre)
			WHERE lower(g.genre) LIKE ('%' || $1 || '%') ESCAPE '\\'
		)
	)
	AND poster IS NOT NULL
	AND lower(split_part(split_part(poster, '?', 1), '#', 1)) LIKE ANY ($2)
ORDER BY seq ASC
LIMIT $3",
	)
	.bind(escape_like(text))
	.bind(&suffixes)
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}
