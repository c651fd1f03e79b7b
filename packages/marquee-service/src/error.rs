use std::fmt::{self, Display, Formatter};

use crate::router::Strategy;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid query: {message}")]
	InvalidQuery { message: String },
	#[error("Embedding unavailable: {message}")]
	EmbeddingUnavailable { message: String },
	#[error("Retrieval failed for {strategy}: {cause}")]
	RetrievalFailed { strategy: Strategy, cause: FailureCause },
	#[error("Accumulator conflict: {message}")]
	AccumulatorConflict { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	pub(crate) fn invalid_query(message: impl Into<String>) -> Self {
		Self::InvalidQuery { message: message.into() }
	}
}
impl From<marquee_providers::Error> for Error {
	fn from(err: marquee_providers::Error) -> Self {
		Self::EmbeddingUnavailable { message: err.to_string() }
	}
}

/// Why one retrieval strategy produced no result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
	Timeout,
	Index { message: String },
}
impl Display for FailureCause {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Timeout => f.write_str("index call timed out"),
			Self::Index { message } => f.write_str(message),
		}
	}
}
