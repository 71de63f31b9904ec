use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::LineItem;

/// Aggregated result of one cart-acquisition request.
///
/// Item order is lookup order. The subtotal is always recomputed from the
/// items here — page-reported totals are never trusted, and the direct
/// URL-extraction strategy never sees a page total at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartResult {
    pub items: Vec<LineItem>,
    pub subtotal: f64,
    pub item_count: usize,
    pub generated_at: DateTime<Utc>,
}

impl CartResult {
    pub fn from_items(items: Vec<LineItem>) -> Self {
        let subtotal = items.iter().map(|i| i.line_total).sum();
        let item_count = items.len();
        Self {
            items,
            subtotal,
            item_count,
            generated_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::from_items(Vec::new())
    }
}
