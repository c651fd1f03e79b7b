use serde::{Deserialize, Serialize};

use crate::catalog::CatalogItem;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage {
	pub items: Vec<CatalogItem>,
	pub page: u32,
	pub page_size: u32,
	/// May be an estimate; sources without a count report what they have seen so far.
	pub total_available: u64,
	pub has_more: bool,
}
impl ResultPage {
	pub fn empty(page_size: u32) -> Self {
		Self { items: Vec::new(), page: 0, page_size, total_available: 0, has_more: false }
	}
}

pub fn total_pages(total: u64, page_size: u32) -> u64 {
	if page_size == 0 {
		return 0;
	}

	total.div_ceil(u64::from(page_size))
}

/// A page holding fewer than `page_size` raw hits ends the feed, whatever the total says.
pub fn is_short_page(returned: usize, page_size: u32) -> bool {
	(returned as u64) < u64::from(page_size)
}
