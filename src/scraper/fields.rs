//! Field extraction from loaded product pages and cart item elements.
//!
//! Every field walks its locator chain through [`resolve_first`]; an
//! exhausted chain is never an error — the field falls back to a
//! deterministic placeholder so a lookup always produces a structurally
//! complete record.

use tracing::debug;

use crate::browser::{ElementHandle, PageHandle};
use crate::config::ScrapeConfig;
use crate::domain::{is_valid_identifier, LineItem};
use crate::normalizer::{normalize_price, normalize_quantity};
use crate::scraper::behavior;
use crate::scraper::locators::{
    self, resolve_first, COMPOSITE_ID_DELIMITER, ITEM_COMPOSITE_ID_ATTR, ITEM_ID_ATTR,
};

/// Titles at or below this length are rejected as non-titles (icon glyphs,
/// ellipses, stray whitespace).
const MIN_TITLE_LEN: usize = 3;

pub struct FieldExtractor {
    config: ScrapeConfig,
}

impl FieldExtractor {
    pub fn new(config: ScrapeConfig) -> Self {
        Self { config }
    }

    /// Extract a line item from a loaded product page.
    ///
    /// Waits (bounded) for the title element before extracting to avoid
    /// racing the render; on timeout it pauses briefly and proceeds anyway —
    /// partial or placeholder data beats aborting.
    pub async fn extract_product_fields(
        &self,
        page: &dyn PageHandle,
        identifier: &str,
    ) -> LineItem {
        let title_selector = locators::PRODUCT_TITLE[0].selector;
        if !page.wait_for(title_selector, self.config.title_wait()).await {
            debug!(identifier, "Title element did not appear, extracting anyway");
            behavior::pause(1.5, 3.0).await;
        }

        let root = page.as_queryable();
        let title = resolve_first(root, locators::PRODUCT_TITLE, accept_title)
            .await
            .unwrap_or_else(|| LineItem::placeholder_title(identifier));
        let price = resolve_first(root, locators::PRODUCT_PRICE, accept_price)
            .await
            .unwrap_or(0.0);
        let image = resolve_first(root, locators::PRODUCT_IMAGE, accept_raw).await;

        LineItem::new(
            identifier,
            &title,
            price,
            1,
            image,
            self.config.product_url(identifier),
        )
    }

    /// Extract a line item from one cart item element.
    ///
    /// An element yielding no canonical identifier is discarded (`None`) and
    /// not retried.
    pub async fn extract_cart_item_fields(&self, element: &dyn ElementHandle) -> Option<LineItem> {
        let identifier = cart_item_identifier(element).await?;
        let root = element.as_queryable();

        let title = resolve_first(root, locators::CART_TITLE, accept_title)
            .await
            .unwrap_or_else(|| LineItem::placeholder_title(&identifier));
        let price = resolve_first(root, locators::CART_PRICE, accept_price)
            .await
            .unwrap_or(0.0);
        let quantity = resolve_first(root, locators::CART_QUANTITY, |raw| normalize_quantity(raw))
            .await
            .unwrap_or(1);
        let image = resolve_first(root, locators::CART_IMAGE, accept_raw).await;

        Some(LineItem::new(
            &identifier,
            &title,
            price,
            quantity,
            image,
            self.config.product_url(&identifier),
        ))
    }
}

/// Identifier from the dedicated attribute, else the first segment of the
/// composite item id. Non-canonical results discard the element.
async fn cart_item_identifier(element: &dyn ElementHandle) -> Option<String> {
    let raw = match element.attribute(ITEM_ID_ATTR).await {
        Some(id) if !id.trim().is_empty() => id,
        _ => {
            let composite = element.attribute(ITEM_COMPOSITE_ID_ATTR).await?;
            composite
                .split(COMPOSITE_ID_DELIMITER)
                .next()
                .unwrap_or_default()
                .to_string()
        }
    };
    let identifier = raw.trim().to_uppercase();
    is_valid_identifier(&identifier).then_some(identifier)
}

fn accept_title(raw: &str) -> Option<String> {
    (raw.chars().count() > MIN_TITLE_LEN).then(|| raw.to_string())
}

fn accept_price(raw: &str) -> Option<f64> {
    let price = normalize_price(raw);
    (price > 0.0).then_some(price)
}

fn accept_raw(raw: &str) -> Option<String> {
    Some(raw.to_string())
}
