use std::collections::HashMap;

use qdrant_client::qdrant::{
	CollectionExistsRequest, CreateCollectionBuilder, Distance, Query, QueryPointsBuilder, Value,
	VectorParamsBuilder, value::Kind,
};
use uuid::Uuid;

use crate::{Error, Result};

/// Payload key holding the catalog item id of each point.
pub const ITEM_ID_KEY: &str = "item_id";

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &marquee_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	pub async fn ensure_collection(&self) -> Result<()> {
		let exists = self
			.client
			.collection_exists(CollectionExistsRequest { collection_name: self.collection.clone() })
			.await?;

		if exists {
			return Ok(());
		}

		self.client
			.create_collection(
				CreateCollectionBuilder::new(self.collection.as_str()).vectors_config(
					VectorParamsBuilder::new(u64::from(self.vector_dim), Distance::Cosine),
				),
			)
			.await?;

		tracing::info!(collection = %self.collection, "Created Qdrant collection.");

		Ok(())
	}

	/// Returns `(item_id, cosine similarity)` pairs, most similar first.
	pub async fn nearest(&self, vector: &[f32], k: u32) -> Result<Vec<(String, f32)>> {
		if vector.len() != self.vector_dim as usize {
			return Err(Error::InvalidArgument(format!(
				"Query vector has {} dimensions; collection expects {}.",
				vector.len(),
				self.vector_dim
			)));
		}

		let search = QueryPointsBuilder::new(self.collection.as_str())
			.query(Query::new_nearest(vector.to_vec()))
			.limit(u64::from(k))
			.with_payload(true);
		let response = self.client.query(search).await?;
		let mut out = Vec::with_capacity(response.result.len());

		for point in response.result {
			let Some(item_id) = payload_string(&point.payload, ITEM_ID_KEY) else {
				tracing::warn!(collection = %self.collection, "Qdrant point is missing item_id payload.");

				continue;
			};

			out.push((item_id, point.score));
		}

		Ok(out)
	}
}

/// Stable point id for a catalog item, so re-indexing overwrites rather than duplicates.
pub fn point_id(item_id: &str) -> Uuid {
	Uuid::new_v5(&Uuid::NAMESPACE_OID, item_id.as_bytes())
}

pub fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.to_string()),
		_ => None,
	}
}
