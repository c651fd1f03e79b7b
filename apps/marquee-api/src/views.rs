//! Open feed views. Each view owns its accumulator; the registry evicts the oldest view once
//! `capacity` views are open.

use std::{
	collections::{HashMap, VecDeque},
	sync::{Arc, Mutex, MutexGuard},
};

use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use marquee_service::{FeedAccumulator, SearchView};

pub enum View {
	Browse(FeedAccumulator),
	Search(SearchView),
}

pub type SharedView = Arc<AsyncMutex<View>>;

pub struct ViewRegistry {
	capacity: usize,
	inner: Mutex<Views>,
}

#[derive(Default)]
struct Views {
	by_id: HashMap<Uuid, SharedView>,
	order: VecDeque<Uuid>,
}

impl ViewRegistry {
	pub fn new(capacity: usize) -> Self {
		Self { capacity: capacity.max(1), inner: Mutex::new(Views::default()) }
	}

	pub fn insert(&self, view: View) -> Uuid {
		let id = Uuid::new_v4();
		let mut views = self.lock();

		while views.order.len() >= self.capacity {
			let Some(oldest) = views.order.pop_front() else {
				break;
			};

			views.by_id.remove(&oldest);
			tracing::debug!(view_id = %oldest, "Evicted oldest open view.");
		}

		views.by_id.insert(id, Arc::new(AsyncMutex::new(view)));
		views.order.push_back(id);

		id
	}

	pub fn get(&self, id: &Uuid) -> Option<SharedView> {
		self.lock().by_id.get(id).cloned()
	}

	/// Returns false when the view was unknown or already evicted.
	pub fn remove(&self, id: &Uuid) -> bool {
		let mut views = self.lock();

		if views.by_id.remove(id).is_none() {
			return false;
		}

		views.order.retain(|open| open != id);

		true
	}

	pub fn len(&self) -> usize {
		self.lock().by_id.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn lock(&self) -> MutexGuard<'_, Views> {
		self.inner.lock().unwrap_or_else(|err| err.into_inner())
	}
}
