pub mod catalog;
pub mod embedder;
pub mod index;

mod database;
mod error;

pub use database::TestDatabase;
pub use error::{Error, Result};

use std::env;

pub fn env_dsn() -> Option<String> {
	env::var("MARQUEE_PG_DSN").ok()
}

pub fn env_qdrant_url() -> Option<String> {
	env::var("MARQUEE_QDRANT_URL").ok()
}
