//! Locator chains for the storefront's product and cart page layouts.
//!
//! Each field is extracted by walking an ordered list of candidate locators
//! from most-specific to most-generic; the first one that resolves to an
//! element and yields an acceptable value wins and the rest are not tried.
//! Chain order is part of the extraction contract — real pages satisfy the
//! earlier, stricter locators more reliably, and reordering silently changes
//! accuracy. These tables track a historical page layout and are best-effort
//! by nature; their hit rate is surfaced through the orchestrator's logs.

use crate::browser::{ElementHandle, Queryable};

#[derive(Debug, Clone, Copy)]
pub enum LocatorSource {
    /// Element inner text.
    Text,
    /// Named attribute.
    Attribute(&'static str),
    /// Named attribute, falling back to inner text when absent or blank.
    AttributeThenText(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct Locator {
    pub selector: &'static str,
    pub source: LocatorSource,
}

impl Locator {
    pub const fn text(selector: &'static str) -> Self {
        Self {
            selector,
            source: LocatorSource::Text,
        }
    }

    pub const fn attr(selector: &'static str, name: &'static str) -> Self {
        Self {
            selector,
            source: LocatorSource::Attribute(name),
        }
    }

    pub const fn attr_or_text(selector: &'static str, name: &'static str) -> Self {
        Self {
            selector,
            source: LocatorSource::AttributeThenText(name),
        }
    }
}

// Product page chains.

pub const PRODUCT_TITLE: &[Locator] = &[Locator::text("#productTitle")];

pub const PRODUCT_PRICE: &[Locator] = &[
    Locator::text(".a-price .a-offscreen"),
    Locator::text("#priceblock_ourprice"),
    Locator::text("#priceblock_dealprice"),
    Locator::text("span.a-price-whole"),
];

pub const PRODUCT_IMAGE: &[Locator] = &[
    Locator::attr("#landingImage", "src"),
    Locator::attr("#imgBlkFront", "src"),
];

// Cart page chains.

pub const CART_ITEM_CONTAINERS: &[&str] = &[
    "div[data-asin]",
    ".sc-list-item",
    ".a-section.a-spacing-mini",
    "[data-item-id]",
];

pub const CART_TITLE: &[Locator] = &[
    Locator::text(".sc-product-title"),
    Locator::text(".a-truncate-cut"),
    Locator::text("span.a-size-medium"),
    Locator::text(r#"a[href*="/dp/"]"#),
];

pub const CART_PRICE: &[Locator] = &[
    Locator::text(".sc-product-price"),
    Locator::text(".a-price .a-offscreen"),
    Locator::text("span.a-price-whole"),
];

pub const CART_QUANTITY: &[Locator] = &[
    Locator::attr_or_text(r#"select[name*="quantity"] option[selected]"#, "value"),
    Locator::attr_or_text(r#"input[name*="quantity"]"#, "value"),
    Locator::attr_or_text(".sc-quantity-textfield input", "value"),
];

pub const CART_IMAGE: &[Locator] = &[Locator::attr("img", "src")];

/// Identifier attributes on cart item containers. `data-asin` carries the
/// identifier directly; `data-item-id` is a composite whose first segment is
/// the identifier.
pub const ITEM_ID_ATTR: &str = "data-asin";
pub const ITEM_COMPOSITE_ID_ATTR: &str = "data-item-id";
pub const COMPOSITE_ID_DELIMITER: char = '|';

/// Walk a locator chain: the first locator that resolves to an element AND
/// whose non-empty value passes `accept` wins; remaining locators are not
/// consulted.
pub async fn resolve_first<T>(
    root: &dyn Queryable,
    locators: &[Locator],
    accept: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    for locator in locators {
        let Some(element) = root.query(locator.selector).await else {
            continue;
        };
        let Some(raw) = raw_value(element.as_ref(), locator.source).await else {
            continue;
        };
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        if let Some(value) = accept(raw) {
            return Some(value);
        }
    }
    None
}

async fn raw_value(element: &dyn ElementHandle, source: LocatorSource) -> Option<String> {
    match source {
        LocatorSource::Text => element.text().await,
        LocatorSource::Attribute(name) => element.attribute(name).await,
        LocatorSource::AttributeThenText(name) => match element.attribute(name).await {
            Some(value) if !value.trim().is_empty() => Some(value),
            _ => element.text().await,
        },
    }
}
