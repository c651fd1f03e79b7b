use std::sync::Arc;

use color_eyre::eyre;

use marquee_config::{Config, StorageBackend};
use marquee_service::{CatalogService, EmbeddingPipeline};
use marquee_storage::{CatalogIndex, memory::MemoryCatalogIndex, postgres::PgCatalogIndex};

use crate::views::ViewRegistry;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<CatalogService>,
	pub views: Arc<ViewRegistry>,
}
impl AppState {
	pub async fn new(config: Config) -> color_eyre::Result<Self> {
		let index = open_index(&config).await?;
		let pipeline = Arc::new(EmbeddingPipeline::from_config(&config.providers.embedding));
		let service = CatalogService::new(config.search, index, pipeline);

		Ok(Self::with_service(service, config.service.max_open_views as usize))
	}

	pub fn with_service(service: CatalogService, max_open_views: usize) -> Self {
		Self { service: Arc::new(service), views: Arc::new(ViewRegistry::new(max_open_views)) }
	}
}

async fn open_index(config: &Config) -> color_eyre::Result<Arc<dyn CatalogIndex>> {
	match config.storage.backend {
		StorageBackend::Postgres => {
			let (Some(postgres), Some(qdrant)) =
				(config.storage.postgres.as_ref(), config.storage.qdrant.as_ref())
			else {
				return Err(eyre::eyre!("storage.postgres and storage.qdrant must be set."));
			};
			let index = PgCatalogIndex::connect(postgres, qdrant).await?;

			tracing::info!(collection = %qdrant.collection, "Catalog index connected.");

			Ok(Arc::new(index))
		},
		StorageBackend::Memory => {
			let seed = config.storage.memory.as_ref().and_then(|memory| memory.seed_path.as_ref());
			let index = match seed {
				Some(path) => MemoryCatalogIndex::from_seed_file(path)?,
				None => MemoryCatalogIndex::new(Vec::new()),
			};

			tracing::info!(items = index.len(), "In-memory catalog index loaded.");

			Ok(Arc::new(index))
		},
	}
}
