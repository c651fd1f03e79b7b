pub mod db;
pub mod index;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod qdrant;
pub mod queries;
pub mod schema;

mod error;

pub use error::Error;
pub use index::{
	BoxFuture, CatalogIndex, CategoryQuery, FuzzyQuery, Hit, KnnQuery, PrefixQuery, RecentPage,
	RecentQuery, TextQuery,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;
