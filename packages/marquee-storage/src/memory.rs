//! In-process catalog index over a JSON seed file.

use std::{
	collections::{BTreeSet, HashMap},
	fs,
	path::Path,
};

use unicode_segmentation::UnicodeSegmentation;

use marquee_domain::CatalogItem;

use crate::{
	BoxFuture, CatalogIndex, CategoryQuery, Error, FuzzyQuery, Hit, KnnQuery, PrefixQuery,
	RecentPage, RecentQuery, Result, TextQuery,
	index::{self, terms},
};

struct Entry {
	item: CatalogItem,
	ordinal: u64,
	title: String,
	title_words: Vec<String>,
	plot_words: Vec<String>,
	genres: Vec<String>,
}

pub struct MemoryCatalogIndex {
	entries: Vec<Entry>,
	by_id: HashMap<String, usize>,
	/// Distinct lowercase title words, the fuzzy expansion dictionary.
	vocabulary: BTreeSet<String>,
	/// Entry positions in chronological scan order.
	recent_order: Vec<usize>,
}
impl MemoryCatalogIndex {
	/// Builds the index in the given insertion order. Repeated ids keep their first document.
	pub fn new(items: Vec<CatalogItem>) -> Self {
		let mut entries = Vec::with_capacity(items.len());
		let mut by_id = HashMap::with_capacity(items.len());
		let mut vocabulary = BTreeSet::new();

		for item in items {
			if by_id.contains_key(&item.id) {
				tracing::warn!(item_id = %item.id, "Skipping duplicate catalog item.");

				continue;
			}

			let title_words = terms(&item.title);

			vocabulary.extend(title_words.iter().cloned());
			by_id.insert(item.id.clone(), entries.len());
			entries.push(Entry {
				ordinal: entries.len() as u64,
				title: item.title.to_lowercase(),
				title_words,
				plot_words: item.full_plot.as_deref().map(terms).unwrap_or_default(),
				genres: item.genres.iter().map(|genre| genre.to_lowercase()).collect(),
				item,
			});
		}

		let mut recent_order: Vec<usize> = (0..entries.len()).collect();

		recent_order.sort_by(|&a, &b| {
			let (a, b) = (&entries[a], &entries[b]);

			match (a.item.year, b.item.year) {
				(Some(x), Some(y)) => y.cmp(&x),
				(Some(_), None) => std::cmp::Ordering::Less,
				(None, Some(_)) => std::cmp::Ordering::Greater,
				(None, None) => std::cmp::Ordering::Equal,
			}
			.then(a.ordinal.cmp(&b.ordinal))
		});

		Self { entries, by_id, vocabulary, recent_order }
	}

	pub fn from_seed_file(path: &Path) -> Result<Self> {
		let raw = fs::read(path)
			.map_err(|err| Error::ReadSeed { path: path.to_path_buf(), source: err })?;
		let items: Vec<CatalogItem> = serde_json::from_slice(&raw)
			.map_err(|err| Error::ParseSeed { path: path.to_path_buf(), source: err })?;
		let index = Self::new(items);

		tracing::info!(path = %path.display(), items = index.len(), "Loaded catalog seed.");

		Ok(index)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	fn hit(entry: &Entry, score: f32) -> Hit {
		Hit { item: entry.item.clone(), score, ordinal: entry.ordinal }
	}

	fn text_hits(&self, query: &TextQuery) -> Vec<Hit> {
		let query_terms = terms(&query.text);

		if query_terms.is_empty() {
			return Vec::new();
		}

		let phrase = query.text.to_lowercase();
		let mut hits = Vec::new();

		for entry in &self.entries {
			let mut score = 0.0;

			for term in &query_terms {
				score += 2.0 * entry.title_words.iter().filter(|word| *word == term).count() as f32;
				score += entry.plot_words.iter().filter(|word| *word == term).count() as f32;
				score += entry.genres.iter().filter(|genre| *genre == term).count() as f32;
			}

			if entry.title.contains(&phrase) {
				score += 1.0;
			}
			if score > 0.0 {
				hits.push(Self::hit(entry, score));
			}
		}

		index::sort_hits(&mut hits);
		hits.truncate(query.limit as usize);

		hits
	}

	/// Closest dictionary words for `term`, as `word -> distance`.
	fn expansions(&self, term: &str, query: &FuzzyQuery) -> HashMap<&str, usize> {
		let prefix_len = query.prefix_length as usize;
		let prefix: String = term.chars().take(prefix_len).collect();
		let mut candidates: Vec<(usize, &str)> = self
			.vocabulary
			.iter()
			.filter(|word| word.chars().take(prefix_len).eq(prefix.chars()))
			.map(|word| (strsim::levenshtein(term, word), word.as_str()))
			.filter(|(distance, _)| *distance <= query.max_edits as usize)
			.collect();

		candidates.sort();
		candidates.truncate(query.max_expansions as usize);

		candidates.into_iter().map(|(distance, word)| (word, distance)).collect()
	}

	fn fuzzy_hits(&self, query: &FuzzyQuery) -> Vec<Hit> {
		let expansions: Vec<HashMap<&str, usize>> =
			terms(&query.text).iter().map(|term| self.expansions(term, query)).collect();
		let mut hits = Vec::new();

		for entry in &self.entries {
			let score: f32 = expansions
				.iter()
				.filter_map(|expansion| {
					entry
						.title_words
						.iter()
						.filter_map(|word| expansion.get(word.as_str()))
						.min()
						.map(|distance| 1.0 / (1.0 + *distance as f32))
				})
				.sum();

			if score > 0.0 {
				hits.push(Self::hit(entry, score));
			}
		}

		index::sort_hits(&mut hits);
		hits.truncate(query.limit as usize);

		hits
	}

	fn prefix_hits(&self, query: &PrefixQuery) -> Vec<Hit> {
		let needle = query.text.to_lowercase();

		if needle.trim().is_empty() {
			return Vec::new();
		}

		let mut hits = Vec::new();

		for entry in &self.entries {
			let score = if entry.title.starts_with(&needle) {
				2.0
			} else if entry
				.title
				.unicode_word_indices()
				.any(|(start, _)| entry.title[start..].starts_with(&needle))
			{
				1.0
			} else {
				continue;
			};

			hits.push(Self::hit(entry, score));
		}

		hits.sort_by(|a, b| {
			b.score
				.total_cmp(&a.score)
				.then(a.item.title.chars().count().cmp(&b.item.title.chars().count()))
				.then(a.ordinal.cmp(&b.ordinal))
		});
		hits.truncate(query.limit as usize);

		hits
	}

	fn category_hits(&self, query: &CategoryQuery) -> Vec<Hit> {
		let needle = query.text.to_lowercase();

		self.entries
			.iter()
			.filter(|entry| {
				entry.title.contains(&needle)
					|| entry.genres.iter().any(|genre| genre.contains(&needle))
			})
			.filter(|entry| entry.item.poster.has_image_extension(&query.poster_extensions))
			.take(query.limit as usize)
			.map(|entry| Self::hit(entry, 1.0))
			.collect()
	}

	fn knn_hits(&self, query: &KnnQuery) -> Result<Vec<Hit>> {
		let query_norm = norm(&query.vector);

		if query.vector.is_empty() || query_norm == 0.0 {
			return Err(Error::InvalidArgument("Query vector must be non-empty and non-zero.".to_string()));
		}

		let mut hits = Vec::new();

		for entry in &self.entries {
			let Some(embedding) = entry.item.embedding.as_deref() else {
				continue;
			};

			if embedding.len() != query.vector.len() {
				continue;
			}

			let item_norm = norm(embedding);

			if item_norm == 0.0 {
				continue;
			}

			let dot: f32 = embedding.iter().zip(&query.vector).map(|(a, b)| a * b).sum();

			hits.push(Self::hit(entry, dot / (item_norm * query_norm)));
		}

		index::sort_hits(&mut hits);
		hits.truncate(query.k as usize);

		Ok(hits)
	}

	fn recent_page(&self, query: RecentQuery) -> RecentPage {
		let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
		let items = self
			.recent_order
			.iter()
			.skip(skip)
			.take(query.limit as usize)
			.map(|&position| self.entries[position].item.clone())
			.collect();

		RecentPage { items, total: self.entries.len() as u64 }
	}
}
impl CatalogIndex for MemoryCatalogIndex {
	fn text<'a>(&'a self, query: &'a TextQuery) -> BoxFuture<'a, Result<Vec<Hit>>> {
		Box::pin(async move { Ok(self.text_hits(query)) })
	}

	fn fuzzy<'a>(&'a self, query: &'a FuzzyQuery) -> BoxFuture<'a, Result<Vec<Hit>>> {
		Box::pin(async move { Ok(self.fuzzy_hits(query)) })
	}

	fn autocomplete<'a>(&'a self, query: &'a PrefixQuery) -> BoxFuture<'a, Result<Vec<Hit>>> {
		Box::pin(async move { Ok(self.prefix_hits(query)) })
	}

	fn category<'a>(&'a self, query: &'a CategoryQuery) -> BoxFuture<'a, Result<Vec<Hit>>> {
		Box::pin(async move { Ok(self.category_hits(query)) })
	}

	fn knn<'a>(&'a self, query: &'a KnnQuery) -> BoxFuture<'a, Result<Vec<Hit>>> {
		Box::pin(async move { self.knn_hits(query) })
	}

	fn recent<'a>(&'a self, query: RecentQuery) -> BoxFuture<'a, Result<RecentPage>> {
		Box::pin(async move { Ok(self.recent_page(query)) })
	}

	fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<CatalogItem>>> {
		Box::pin(async move {
			Ok(self.by_id.get(id).map(|&position| self.entries[position].item.clone()))
		})
	}
}

fn norm(vector: &[f32]) -> f32 {
	vector.iter().map(|v| v * v).sum::<f32>().sqrt()
}
