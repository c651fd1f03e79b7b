use std::{str::FromStr, thread, time::Duration};

use qdrant_client::{Qdrant, qdrant::CollectionExistsRequest};
use sqlx::{
	ConnectOptions, Connection,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

use crate::{Error, Result};

/// A scratch catalog: one Postgres database plus one Qdrant collection of the same name.
/// Both are removed by [`TestDatabase::cleanup`], or on drop when a test panics first.
pub struct TestDatabase {
	name: String,
	dsn: String,
	maintenance: PgConnectOptions,
	cleaned: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| Error::Message(format!("Invalid MARQUEE_PG_DSN: {err}.")))?;
		let maintenance = base.clone().database("postgres");
		let name = format!("marquee_test_{}", Uuid::new_v4().simple());
		let mut conn = PgConnection::connect_with(&maintenance).await?;

		sqlx::query(&format!(r#"CREATE DATABASE "{name}""#)).execute(&mut conn).await?;

		let dsn = base.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, maintenance, cleaned: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	/// Qdrant collection paired with this database.
	pub fn collection(&self) -> &str {
		&self.name
	}

	pub async fn cleanup(mut self) -> Result<()> {
		let dropped = drop_database(&self.name, &self.maintenance).await;
		let deleted = delete_collection(&self.name).await;

		self.cleaned = true;

		dropped.and(deleted)
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}

		let name = self.name.clone();
		let maintenance = self.maintenance.clone();
		// The test's runtime may already be gone; clean up on a private one.
		let worker = thread::spawn(move || {
			let Ok(runtime) = Builder::new_current_thread().enable_all().build() else {
				eprintln!("Skipping cleanup of test catalog {name}; no runtime.");

				return;
			};
			let result = runtime.block_on(async {
				drop_database(&name, &maintenance).await.and(delete_collection(&name).await)
			});

			if let Err(err) = result {
				eprintln!("Test catalog cleanup failed: {err}.");
			}
		});

		let _ = worker.join();
	}
}

async fn drop_database(name: &str, maintenance: &PgConnectOptions) -> Result<()> {
	let mut conn = PgConnection::connect_with(maintenance).await?;

	sqlx::query(&format!(r#"DROP DATABASE IF EXISTS "{name}" WITH (FORCE)"#))
		.execute(&mut conn)
		.await?;

	Ok(())
}

async fn delete_collection(name: &str) -> Result<()> {
	let Some(url) = crate::env_qdrant_url() else {
		return Ok(());
	};
	let client = Qdrant::from_url(&url).build()?;

	let request = CollectionExistsRequest { collection_name: name.to_string() };

	if !client.collection_exists(request).await? {
		return Ok(());
	}

	tokio::time::timeout(Duration::from_secs(10), client.delete_collection(name.to_string()))
		.await
		.map_err(|_| Error::Message(format!("Timed out deleting Qdrant collection {name:?}.")))??;

	Ok(())
}
