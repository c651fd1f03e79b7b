use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Dimension of the catalog embedding space (all-MiniLM-L6-v2).
pub const EMBEDDING_DIM: usize = 384;
pub const POSTER_UNAVAILABLE: &str = "unavailable";

const POSTER_SENTINELS: [&str; 2] = ["n/a", POSTER_UNAVAILABLE];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
	#[serde(alias = "_id")]
	pub id: String,
	pub title: String,
	#[serde(default, deserialize_with = "deserialize_year")]
	pub year: Option<i32>,
	#[serde(default, deserialize_with = "deserialize_genres")]
	pub genres: Vec<String>,
	#[serde(default)]
	pub poster: Poster,
	#[serde(default, alias = "fullplot", skip_serializing_if = "Option::is_none")]
	pub full_plot: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rating: Option<f32>,
	#[serde(default, alias = "plot_embedding_384", skip_serializing)]
	pub embedding: Option<Vec<f32>>,
}
impl CatalogItem {
	/// Items without an id or a title cannot be displayed or deduplicated.
	pub fn is_well_formed(&self) -> bool {
		!self.id.trim().is_empty() && !self.title.trim().is_empty()
	}
}

/// Compact projection used by the autocomplete dropdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
	pub id: String,
	pub title: String,
	pub poster: Poster,
	pub year: Option<i32>,
}
impl From<&CatalogItem> for Suggestion {
	fn from(item: &CatalogItem) -> Self {
		Self {
			id: item.id.clone(),
			title: item.title.clone(),
			poster: item.poster.clone(),
			year: item.year,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Poster {
	Url(String),
	#[default]
	Unavailable,
}
impl Poster {
	pub fn from_raw(raw: Option<&str>) -> Self {
		let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
			return Self::Unavailable;
		};

		if POSTER_SENTINELS.iter().any(|sentinel| value.eq_ignore_ascii_case(sentinel)) {
			return Self::Unavailable;
		}

		Self::Url(value.to_string())
	}

	pub fn url(&self) -> Option<&str> {
		match self {
			Self::Url(url) => Some(url.as_str()),
			Self::Unavailable => None,
		}
	}

	/// True when the poster exists and its path ends in one of `extensions`
	/// (lowercase, without the dot). Query strings and fragments are ignored.
	pub fn has_image_extension(&self, extensions: &[String]) -> bool {
		let Some(url) = self.url() else {
			return false;
		};
		let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();

		extensions.iter().any(|ext| {
			path.strip_suffix(ext.as_str()).map(|rest| rest.ends_with('.')).unwrap_or(false)
		})
	}
}
impl Serialize for Poster {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(self.url().unwrap_or(POSTER_UNAVAILABLE))
	}
}
impl<'de> Deserialize<'de> for Poster {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = Option::<String>::deserialize(deserializer)?;

		Ok(Self::from_raw(raw.as_deref()))
	}
}

/// Parses the leading digits of a year. Catalog data mixes numbers with strings such as
/// `"2014"` or `"1995è"`.
pub fn parse_year(raw: &str) -> Option<i32> {
	let digits: String = raw.trim().chars().take_while(|c| c.is_ascii_digit()).collect();

	if digits.is_empty() || digits.len() > 4 {
		return None;
	}

	digits.parse().ok()
}

fn deserialize_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum RawYear {
		Int(i64),
		Float(f64),
		Text(String),
	}

	let year = match Option::<RawYear>::deserialize(deserializer)? {
		None => None,
		Some(RawYear::Int(value)) => i32::try_from(value).ok(),
		Some(RawYear::Float(value)) if value.is_finite() => Some(value.trunc() as i32),
		Some(RawYear::Float(_)) => None,
		Some(RawYear::Text(text)) => parse_year(&text),
	};

	Ok(year)
}

fn deserialize_genres<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default();

	Ok(dedup_genres(raw))
}

/// Trims genre labels and drops blanks and case-insensitive repeats, keeping first-seen order.
pub fn dedup_genres(raw: Vec<String>) -> Vec<String> {
	let mut out: Vec<String> = Vec::with_capacity(raw.len());

	for genre in raw {
		let genre = genre.trim();

		if genre.is_empty() || out.iter().any(|seen| seen.eq_ignore_ascii_case(genre)) {
			continue;
		}

		out.push(genre.to_string());
	}

	out
}
