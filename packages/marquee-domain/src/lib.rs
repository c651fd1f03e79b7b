pub mod catalog;
pub mod page;
pub mod query;

pub use catalog::{CatalogItem, EMBEDDING_DIM, Poster, Suggestion};
pub use page::ResultPage;
pub use query::{Query, QueryMode};
