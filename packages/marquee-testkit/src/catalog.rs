//! Fixed sample catalog shared by storage, service, and API tests.
//!
//! Browse order (year descending, undated last) puts 10 items on page 1, 10 on page 2, and 5
//! on page 3.

use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
};

use marquee_domain::{CatalogItem, EMBEDDING_DIM, Poster};

use crate::embedder::HashEmbedder;

struct Sample {
	id: &'static str,
	title: &'static str,
	year: Option<i32>,
	genres: &'static [&'static str],
	poster: &'static str,
	plot: &'static str,
}

const SAMPLES: &[Sample] = &[
	Sample {
		id: "m01",
		title: "The Matrix",
		year: Some(1999),
		genres: &["Action", "Sci-Fi"],
		poster: "https://img.example/posters/matrix.jpg",
		plot: "A computer hacker discovers reality is a simulation and joins a rebellion against the machines.",
	},
	Sample {
		id: "m02",
		title: "Materialist",
		year: Some(2025),
		genres: &["Romance", "Drama"],
		poster: "https://img.example/posters/materialist.jpg",
		plot: "A New York matchmaker weighs a perfect match against an imperfect ex.",
	},
	Sample {
		id: "m03",
		title: "The Matrix Reloaded",
		year: Some(2003),
		genres: &["Action", "Sci-Fi"],
		poster: "https://img.example/posters/reloaded.jpg",
		plot: "Neo and the rebels race to defend Zion from the machine army.",
	},
	Sample {
		id: "m04",
		title: "Heat",
		year: Some(1995),
		genres: &["Crime", "Thriller"],
		poster: "https://img.example/posters/heat.jpg",
		plot: "A detective hunts a crew of professional thieves planning one last bank heist.",
	},
	Sample {
		id: "m05",
		title: "Inception",
		year: Some(2010),
		genres: &["Sci-Fi", "Thriller"],
		poster: "https://img.example/posters/inception.jpg",
		plot: "A thief who steals secrets through dream sharing is offered a chance to plant an idea.",
	},
	Sample {
		id: "m06",
		title: "Interstellar",
		year: Some(2014),
		genres: &["Sci-Fi", "Drama"],
		poster: "https://img.example/posters/interstellar.jpg",
		plot: "Explorers travel through a wormhole in space to find a new home for humanity.",
	},
	Sample {
		id: "m07",
		title: "Ocean's Eleven",
		year: Some(2001),
		genres: &["Crime", "Comedy"],
		poster: "https://img.example/posters/oceans.jpg",
		plot: "A charming thief assembles a crew to rob three Las Vegas casinos in one night heist.",
	},
	Sample {
		id: "m08",
		title: "Alien",
		year: Some(1979),
		genres: &["Horror", "Sci-Fi"],
		poster: "https://img.example/posters/alien.jpg",
		plot: "The crew of a space freighter is hunted by a deadly alien creature.",
	},
	Sample {
		id: "m09",
		title: "Arrival",
		year: Some(2016),
		genres: &["Sci-Fi", "Drama"],
		poster: "https://img.example/posters/arrival.png",
		plot: "A linguist works to communicate with alien visitors before global war breaks out.",
	},
	Sample {
		id: "m10",
		title: "The Thomas Crown Affair",
		year: Some(1999),
		genres: &["Crime", "Romance"],
		poster: "https://img.example/posters/crown.jpg",
		plot: "A billionaire art thief plays a game of seduction with the insurance investigator chasing him.",
	},
	Sample {
		id: "m11",
		title: "Gravity",
		year: Some(2013),
		genres: &["Sci-Fi", "Thriller"],
		poster: "N/A",
		plot: "Two astronauts are stranded in space after debris destroys their shuttle.",
	},
	Sample {
		id: "m12",
		title: "Mad Max: Fury Road",
		year: Some(2015),
		genres: &["Action"],
		poster: "https://img.example/posters/furyroad.jpg",
		plot: "In a desert wasteland a drifter and a rebel warrior flee a tyrant.",
	},
	Sample {
		id: "m13",
		title: "The Italian Job",
		year: Some(2003),
		genres: &["Crime", "Action"],
		poster: "https://img.example/posters/italianjob.jpg",
		plot: "A crew of thieves plots revenge on a former partner with a gold heist in Los Angeles.",
	},
	Sample {
		id: "m14",
		title: "Moon",
		year: Some(2009),
		genres: &["Sci-Fi", "Drama"],
		poster: "https://img.example/posters/moon.jpg",
		plot: "A lone worker on a lunar base nears the end of his contract and makes a strange discovery.",
	},
	Sample {
		id: "m15",
		title: "Blade Runner",
		year: Some(1982),
		genres: &["Sci-Fi", "Thriller"],
		poster: "https://img.example/posters/bladerunner.jpg",
		plot: "A blade runner must pursue and retire four replicants who stole a ship in space.",
	},
	Sample {
		id: "m16",
		title: "Casablanca",
		year: Some(1942),
		genres: &["Drama", "Romance"],
		poster: "https://img.example/posters/casablanca.jpg",
		plot: "A cafe owner in wartime Morocco must choose between love and helping a resistance leader escape.",
	},
	Sample {
		id: "m17",
		title: "Inside Man",
		year: Some(2006),
		genres: &["Crime", "Thriller"],
		poster: "https://img.example/posters/insideman.jpg",
		plot: "A detective negotiates with a bank robber during a tense hostage heist.",
	},
	Sample {
		id: "m18",
		title: "Matilda",
		year: Some(1996),
		genres: &["Comedy", "Family"],
		poster: "https://img.example/posters/matilda.jpg",
		plot: "A gifted girl uses her powers against cruel adults.",
	},
	Sample {
		id: "m19",
		title: "Solaris",
		year: Some(2002),
		genres: &["Sci-Fi", "Drama"],
		poster: "https://img.example/posters/solaris.jpg",
		plot: "A psychologist is sent to a space station orbiting a mysterious ocean planet.",
	},
	Sample {
		id: "m20",
		title: "Sneakers",
		year: Some(1992),
		genres: &["Comedy", "Crime"],
		poster: "https://img.example/posters/sneakers.jpg",
		plot: "A team of security experts is blackmailed into stealing a code breaking device.",
	},
	Sample {
		id: "m21",
		title: "Metropolis",
		year: Some(1927),
		genres: &["Drama", "Sci-Fi"],
		poster: "https://img.example/posters/metropolis.jpg",
		plot: "In a futuristic city a wealthy son falls for a worker prophet.",
	},
	Sample {
		id: "m22",
		title: "Baby Driver",
		year: Some(2017),
		genres: &["Action", "Crime"],
		poster: "https://img.example/posters/babydriver.jpg",
		plot: "A young getaway driver is coerced into a doomed heist.",
	},
	Sample {
		id: "m23",
		title: "The Martian",
		year: Some(2015),
		genres: &["Sci-Fi", "Adventure"],
		poster: "https://img.example/posters/martian.jpg",
		plot: "An astronaut stranded on Mars must survive until rescue.",
	},
	Sample {
		id: "m24",
		title: "Untitled Heist Project",
		year: None,
		genres: &["Crime"],
		poster: "N/A",
		plot: "A crew plans a heist.",
	},
	Sample {
		id: "m25",
		title: "Lost Reel",
		year: None,
		genres: &["Drama"],
		poster: "https://img.example/posters/lostreel.jpg",
		plot: "A film archivist finds footage of an unmade movie.",
	},
];

/// Sample items in insertion order, without embeddings.
pub fn sample_catalog() -> Vec<CatalogItem> {
	SAMPLES
		.iter()
		.map(|sample| CatalogItem {
			id: sample.id.to_string(),
			title: sample.title.to_string(),
			year: sample.year,
			genres: sample.genres.iter().map(|genre| genre.to_string()).collect(),
			poster: Poster::from_raw(Some(sample.poster)),
			full_plot: Some(sample.plot.to_string()),
			rating: None,
			embedding: None,
		})
		.collect()
}

/// Sample items carrying [`HashEmbedder`] vectors of [`embedding_text`].
pub fn embedded_catalog() -> Vec<CatalogItem> {
	let embedder = HashEmbedder::new(EMBEDDING_DIM);

	sample_catalog()
		.into_iter()
		.map(|mut item| {
			item.embedding = Some(embedder.vector(&embedding_text(&item)));

			item
		})
		.collect()
}

/// The samples named by `ids`, inserted in that order, all sharing the embedding of `text`.
/// Every k-NN score ties, so results can only be told apart by insertion order.
pub fn tied_catalog(ids: &[&str], text: &str) -> Vec<CatalogItem> {
	let vector = HashEmbedder::new(EMBEDDING_DIM).vector(text);
	let samples = sample_catalog();

	ids.iter()
		.filter_map(|id| samples.iter().find(|item| item.id == *id).cloned())
		.map(|mut item| {
			item.embedding = Some(vector.clone());

			item
		})
		.collect()
}

/// The text each sample item was embedded from. Querying with it ranks that item first.
pub fn embedding_text(item: &CatalogItem) -> String {
	format!("{} {}", item.title, item.full_plot.as_deref().unwrap_or_default())
}

/// Writes `items` as a JSON seed file in the temp directory and returns its path.
pub fn write_seed_file(items: &[CatalogItem]) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let name = format!(
		"marquee_seed_{}_{}_{ordinal}.json",
		std::process::id(),
		uuid::Uuid::new_v4().simple()
	);
	let path = env::temp_dir().join(name);
	// `embedding` is skipped by `Serialize`, so write it back under its source-document name.
	let docs: Vec<serde_json::Value> = items
		.iter()
		.map(|item| {
			let mut doc = serde_json::to_value(item).unwrap_or_default();

			if let (Some(object), Some(embedding)) = (doc.as_object_mut(), item.embedding.as_ref()) {
				object.insert("plot_embedding_384".to_string(), serde_json::json!(embedding));
			}

			doc
		})
		.collect();
	let payload = serde_json::to_vec(&docs).unwrap_or_default();

	fs::write(&path, payload).unwrap_or_else(|err| panic!("Failed to write seed file: {err}."));

	path
}
