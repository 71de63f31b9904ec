//! Product identifier extraction from storefront URLs and raw markup.
//!
//! Cart-share URLs carry their contents in the query string
//! (`ID.1=B07ZPKN6YR&QTY.1=2&ID.2=...`), which makes them resolvable without
//! any navigation — the cheapest and least block-prone strategy, so these
//! parsers run before the browser is ever touched.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::domain::is_valid_identifier;

/// Known product-page path shapes, most common first. First match wins.
static PRODUCT_PATH_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)/dp/([A-Z0-9]{10})",
        r"(?i)/gp/product/([A-Z0-9]{10})",
        r"(?i)/ASIN/([A-Z0-9]{10})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern"))
    .collect()
});

static CART_URL_IDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)ID\.\d+=([A-Z0-9]{10})").expect("static pattern"));

static MARKUP_IDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)data-asin="([A-Z0-9]{10})""#).expect("static pattern"));

/// Extract a single product identifier from a product-page URL.
pub fn extract_identifier(url: &str) -> Option<String> {
    PRODUCT_PATH_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(url)
            .map(|caps| caps[1].to_uppercase())
    })
}

/// Extract the identifier → requested-quantity map from a cart-share URL.
///
/// Scans the query string for every `ID.<n>` parameter and pairs it with the
/// `QTY.<n>` parameter carrying the same literal index token. Indices may
/// have gaps or arrive out of order. A missing, non-positive, or unparseable
/// quantity defaults to 1. Entries keep first-seen order; a duplicate
/// identifier overwrites its quantity in place (last wins).
///
/// Returns an empty map for an unparseable URL or one with no usable `ID.<n>`
/// parameters — malformed input is an empty result, not an error.
pub fn extract_cart_map(cart_url: &str) -> Vec<(String, u32)> {
    let Ok(url) = Url::parse(cart_url) else {
        return Vec::new();
    };

    let mut quantities: HashMap<String, u32> = HashMap::new();
    for (key, value) in url.query_pairs() {
        if let Some(index) = indexed_param(&key, "QTY") {
            let qty = value.trim().parse::<u32>().ok().filter(|q| *q > 0);
            quantities.insert(index, qty.unwrap_or(1));
        }
    }

    let mut map: Vec<(String, u32)> = Vec::new();
    for (key, value) in url.query_pairs() {
        let Some(index) = indexed_param(&key, "ID") else {
            continue;
        };
        let identifier = value.trim().to_uppercase();
        if !is_valid_identifier(&identifier) {
            continue;
        }
        let quantity = quantities.get(&index).copied().unwrap_or(1);
        match map.iter_mut().find(|(id, _)| *id == identifier) {
            Some(entry) => entry.1 = quantity,
            None => map.push((identifier, quantity)),
        }
    }

    map
}

/// Every identifier embedded in a cart URL, quantities ignored.
///
/// Used when the cart page itself cannot be read (blocked or timed out) but
/// the URL still names its contents. Deduplicated, first-seen order.
pub fn fallback_identifiers(cart_url: &str) -> Vec<String> {
    dedup_matches(&CART_URL_IDS, cart_url)
}

/// Identifier tokens embedded in raw page markup.
///
/// The last-resort path when a cart page renders but none of the structured
/// item containers match. Deduplicated, first-seen order.
pub fn identifiers_in_markup(html: &str) -> Vec<String> {
    dedup_matches(&MARKUP_IDS, html)
}

/// Matches `<prefix>.<n>` query keys, returning the literal index token.
fn indexed_param(key: &str, prefix: &str) -> Option<String> {
    let (head, index) = key.split_once('.')?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let is_index = !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit());
    is_index.then(|| index.to_string())
}

fn dedup_matches(pattern: &Regex, haystack: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for caps in pattern.captures_iter(haystack) {
        let id = caps[1].to_uppercase();
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}
