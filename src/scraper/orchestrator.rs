//! Cart-acquisition workflow.
//!
//! Strategy order for a cart URL: resolve identifiers and quantities from
//! the URL parameters without any navigation (cheapest, least block-prone),
//! then fall back to scraping the live cart page, then fall back to treating
//! whatever identifier tokens survive (in the URL or the markup) as a plain
//! lookup list. Per-item lookups degrade to placeholder records instead of
//! failing the batch — present, degraded data beats an absent record.

use tracing::{debug, info, warn};

use crate::app::{CartgrabError, Result};
use crate::browser::{EngineLauncher, PageHandle, SessionManager};
use crate::config::ScrapeConfig;
use crate::domain::{CartResult, LineItem};
use crate::identifiers;
use crate::scraper::behavior;
use crate::scraper::fields::FieldExtractor;
use crate::scraper::locators;

pub struct CartOrchestrator {
    session: SessionManager,
    extractor: FieldExtractor,
    config: ScrapeConfig,
}

/// What reading the live cart page concluded, decided while the page is
/// still open; any follow-up lookups run after it is closed.
enum CartPageOutcome {
    Items(Vec<LineItem>),
    Lookup(Vec<String>),
    Empty,
}

impl CartOrchestrator {
    pub fn new(launcher: Box<dyn EngineLauncher>, config: ScrapeConfig) -> Self {
        Self {
            session: SessionManager::new(launcher, config.clone()),
            extractor: FieldExtractor::new(config.clone()),
            config,
        }
    }

    /// Resolve a shared cart URL into a [`CartResult`].
    pub async fn scrape_cart_url(&mut self, cart_url: &str) -> Result<CartResult> {
        info!(url = %ellipsize(cart_url, 80), "Resolving cart URL");

        let map = identifiers::extract_cart_map(cart_url);
        if !map.is_empty() {
            info!(
                count = map.len(),
                "Resolved cart contents from URL parameters, skipping page scrape"
            );
            return self.lookup_with_quantities(&map).await;
        }

        self.scrape_cart_page(cart_url).await
    }

    /// Look up a batch of identifiers at quantity 1 each.
    pub async fn lookup_identifiers(&mut self, ids: &[String]) -> Result<CartResult> {
        let map: Vec<(String, u32)> = ids.iter().map(|id| (id.clone(), 1)).collect();
        self.lookup_with_quantities(&map).await
    }

    /// Release the browser session. Idempotent; never raises.
    pub async fn close(&mut self) {
        self.session.close().await;
    }

    async fn scrape_cart_page(&mut self, cart_url: &str) -> Result<CartResult> {
        info!("No identifiers in URL parameters, scraping cart page");

        let mut page = self.session.new_page().await?;
        let outcome = self.read_cart_page(page.as_ref(), cart_url).await;
        page.close().await;

        match outcome {
            Ok(CartPageOutcome::Items(items)) => Ok(CartResult::from_items(items)),
            Ok(CartPageOutcome::Lookup(ids)) => self.lookup_identifiers(&ids).await,
            Ok(CartPageOutcome::Empty) => Ok(CartResult::empty()),
            Err(CartgrabError::NavigationTimeout(timeout)) => {
                let ids = identifiers::fallback_identifiers(cart_url);
                if ids.is_empty() {
                    return Err(CartgrabError::NavigationTimeout(timeout));
                }
                warn!(
                    count = ids.len(),
                    "Cart page load timed out, falling back to URL identifiers"
                );
                self.lookup_identifiers(&ids).await
            }
            Err(e) => Err(e),
        }
    }

    async fn read_cart_page(
        &self,
        page: &dyn PageHandle,
        cart_url: &str,
    ) -> Result<CartPageOutcome> {
        behavior::simulate_human(page).await;
        page.goto(cart_url, self.config.nav_timeout()).await?;
        behavior::pause(2.0, 4.0).await;

        if let Some(url) = page.current_url().await {
            debug!(%url, "Cart page loaded");
        }

        let html = page.content().await?;
        if let Some(reason) = self.classify_blocked(&html) {
            warn!(reason, "Cart page blocked, falling back to URL identifiers");
            let ids = identifiers::fallback_identifiers(cart_url);
            return Ok(if ids.is_empty() {
                CartPageOutcome::Empty
            } else {
                CartPageOutcome::Lookup(ids)
            });
        }

        let mut elements = Vec::new();
        for &selector in locators::CART_ITEM_CONTAINERS {
            elements = page.query_all(selector).await;
            if !elements.is_empty() {
                info!(selector, count = elements.len(), "Found cart item containers");
                break;
            }
        }

        if elements.is_empty() {
            let ids = identifiers::identifiers_in_markup(&html);
            return Ok(if ids.is_empty() {
                CartPageOutcome::Empty
            } else {
                info!(
                    count = ids.len(),
                    "No structured cart items, found identifier tokens in markup"
                );
                CartPageOutcome::Lookup(ids)
            });
        }

        let mut items = Vec::new();
        for element in &elements {
            match self.extractor.extract_cart_item_fields(element.as_ref()).await {
                Some(item) => items.push(item),
                None => debug!("Skipped cart element with no identifier"),
            }
        }
        Ok(CartPageOutcome::Items(items))
    }

    /// Per-item lookup loop. One fresh page per identifier, closed on every
    /// exit path; unconditional randomized pacing between identifiers; any
    /// failure after page acquisition yields a placeholder so the caller
    /// always gets one record per requested identifier. Session bring-up
    /// failure is the one fatal error and propagates.
    async fn lookup_with_quantities(&mut self, map: &[(String, u32)]) -> Result<CartResult> {
        let batch = if map.len() > self.config.max_batch_size {
            warn!(
                requested = map.len(),
                cap = self.config.max_batch_size,
                dropped = map.len() - self.config.max_batch_size,
                "Batch exceeds cap, excess identifiers dropped"
            );
            &map[..self.config.max_batch_size]
        } else {
            map
        };

        let mut items = Vec::with_capacity(batch.len());
        for (i, (identifier, quantity)) in batch.iter().enumerate() {
            let identifier = identifier.to_uppercase();
            let mut page = self.session.new_page().await?;
            let outcome = self.lookup_on_page(page.as_ref(), &identifier).await;
            page.close().await;

            let item = match outcome {
                Ok(item) => item.with_quantity(*quantity),
                Err(e) => {
                    warn!(%identifier, error = %e, "Lookup failed, emitting placeholder");
                    LineItem::placeholder(&identifier, *quantity, self.config.product_url(&identifier))
                }
            };
            items.push(item);

            if i + 1 < batch.len() {
                behavior::pace(&self.config).await;
            }
        }

        let placeholders = items.iter().filter(|item| item.unit_price == 0.0).count();
        let result = CartResult::from_items(items);
        info!(
            items = result.item_count,
            placeholders,
            subtotal = result.subtotal,
            "Batch lookup complete"
        );
        Ok(result)
    }

    async fn lookup_on_page(&self, page: &dyn PageHandle, identifier: &str) -> Result<LineItem> {
        info!(identifier, "Looking up product");
        behavior::simulate_human(page).await;
        page.goto(&self.config.product_url(identifier), self.config.nav_timeout())
            .await?;
        Ok(self.extractor.extract_product_fields(page, identifier).await)
    }

    /// A blocked response is a body too short to be a real page or one
    /// carrying a known error/robot-check marker.
    fn classify_blocked<'a>(&'a self, html: &str) -> Option<&'a str> {
        if html.len() < self.config.min_page_length {
            return Some("body below minimum length");
        }
        self.config
            .block_markers
            .iter()
            .find(|marker| html.contains(marker.as_str()))
            .map(|marker| marker.as_str())
    }
}

fn ellipsize(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{truncated}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{FakeElement, FakeLauncher, FakePageSpec};
    use std::collections::HashMap;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    const BASE: &str = "https://www.amazon.com";

    fn product_url(id: &str) -> String {
        format!("{BASE}/dp/{id}")
    }

    fn orchestrator(
        catalog: HashMap<String, FakePageSpec>,
    ) -> (CartOrchestrator, FakeLauncher) {
        let launcher = FakeLauncher::new(catalog);
        let clone = launcher.clone();
        (
            CartOrchestrator::new(Box::new(launcher), ScrapeConfig::default()),
            clone,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_failure_yields_placeholder() {
        let ids: Vec<String> = ["B000000AAA", "B000000BBB", "B000000CCC"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let catalog = HashMap::from([
            (product_url("B000000AAA"), FakePageSpec::product("First Product", "$10.00")),
            (product_url("B000000BBB"), FakePageSpec::failing()),
            (product_url("B000000CCC"), FakePageSpec::product("Third Product", "$7.50")),
        ]);
        let (mut orch, _) = orchestrator(catalog);

        let result = orch.lookup_identifiers(&ids).await.unwrap();
        orch.close().await;

        assert_eq!(result.item_count, 3);
        assert_eq!(result.items[0].unit_price, 10.00);
        assert_eq!(result.items[1].unit_price, 0.0);
        assert_eq!(result.items[1].title, "Product B000000BBB");
        assert_eq!(result.items[2].unit_price, 7.50);
        assert_eq!(result.subtotal, 17.50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_yields_placeholder() {
        let ids = vec!["B000000AAA".to_string()];
        let catalog = HashMap::from([(product_url("B000000AAA"), FakePageSpec::timing_out())]);
        let (mut orch, launcher) = orchestrator(catalog);

        let result = orch.lookup_identifiers(&ids).await.unwrap();
        assert_eq!(result.item_count, 1);
        assert_eq!(result.items[0].unit_price, 0.0);
        // The page is still closed on the failure path
        assert_eq!(launcher.stats.pages_opened.load(Ordering::SeqCst), 1);
        assert_eq!(launcher.stats.pages_closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cart_url_with_parameters_skips_page_scrape() {
        let cart_url = format!(
            "{BASE}/gp/aws/cart/add.html?ID.1=B000000AAA&QTY.1=2&ID.2=B000000BBB&QTY.2=1"
        );
        let catalog = HashMap::from([
            (product_url("B000000AAA"), FakePageSpec::product("First Product", "$10.00")),
            (product_url("B000000BBB"), FakePageSpec::product("Second Product", "$5.00")),
        ]);
        let (mut orch, launcher) = orchestrator(catalog);

        let result = orch.scrape_cart_url(&cart_url).await.unwrap();

        assert_eq!(result.item_count, 2);
        assert_eq!(result.items[0].identifier, "B000000AAA");
        assert_eq!(result.items[0].quantity, 2);
        assert_eq!(result.items[0].line_total, 20.00);
        assert_eq!(result.items[1].identifier, "B000000BBB");
        assert_eq!(result.items[1].quantity, 1);
        assert_eq!(result.items[1].line_total, 5.00);
        assert_eq!(result.subtotal, 25.00);
        // Only the two product pages were visited, never the cart URL
        assert_eq!(
            launcher.stats.goto_urls(),
            vec![product_url("B000000AAA"), product_url("B000000BBB")]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_between_lookups() {
        let ids: Vec<String> = ["B000000AAA", "B000000BBB", "B000000CCC"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let catalog: HashMap<String, FakePageSpec> = ids
            .iter()
            .map(|id| (product_url(id), FakePageSpec::product("Some Product", "$1.00")))
            .collect();
        let (mut orch, launcher) = orchestrator(catalog);

        orch.lookup_identifiers(&ids).await.unwrap();

        let config = ScrapeConfig::default();
        let delay_min = Duration::from_secs_f64(config.delay_min_secs);
        // Pacing plus the pointer-simulation pause (at most 1.5s) bound the
        // gap from above under the paused clock
        let gap_max = Duration::from_secs_f64(config.delay_max_secs + 1.5);
        let log = launcher.stats.goto_log.lock().unwrap();
        assert_eq!(log.len(), 3);
        // N lookups observe at least N-1 inter-request delays
        for pair in log.windows(2) {
            let gap = pair[1].1 - pair[0].1;
            assert!(gap >= delay_min, "inter-request gap {gap:?} below {delay_min:?}");
            assert!(gap <= gap_max, "inter-request gap {gap:?} above {gap_max:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_capped_at_max_size() {
        let ids: Vec<String> = (0..15).map(|i| format!("B00000{i:04}")).collect();
        let (mut orch, _) = orchestrator(HashMap::new());

        let result = orch.lookup_identifiers(&ids).await.unwrap();
        assert_eq!(result.item_count, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cart_page_scrape_with_structured_items() {
        let cart_url = format!("{BASE}/gp/cart/view.html");
        let item_element = FakeElement::default()
            .attr("data-asin", "B000000AAA")
            .child(".sc-product-title", FakeElement::with_text("First Product"))
            .child(".sc-product-price", FakeElement::with_text("$12.00"))
            .child(
                r#"select[name*="quantity"] option[selected]"#,
                FakeElement::default().attr("value", "2"),
            );
        let orphan_element = FakeElement::default()
            .child(".sc-product-price", FakeElement::with_text("$99.00"));
        let cart_page = FakePageSpec::default()
            .content(&"x".repeat(6000))
            .list("div[data-asin]", vec![item_element, orphan_element]);
        let (mut orch, _) = orchestrator(HashMap::from([(cart_url.clone(), cart_page)]));

        let result = orch.scrape_cart_url(&cart_url).await.unwrap();

        // The orphan element has no identifier and is dropped
        assert_eq!(result.item_count, 1);
        assert_eq!(result.items[0].identifier, "B000000AAA");
        assert_eq!(result.items[0].quantity, 2);
        assert_eq!(result.subtotal, 24.00);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_cart_page_falls_back_to_url_identifiers() {
        // The identifier hides inside another parameter's value: the query
        // map sees no ID.<n> key, but the raw-token fallback scan finds it.
        let cart_url = format!("{BASE}/gp/cart/view.html?note=ID.1=B000000AAA");
        let blocked = FakePageSpec::default().content("Something went wrong");
        let catalog = HashMap::from([
            (cart_url.clone(), blocked),
            (product_url("B000000AAA"), FakePageSpec::product("First Product", "$10.00")),
        ]);
        let (mut orch, _) = orchestrator(catalog);

        let result = orch.scrape_cart_url(&cart_url).await.unwrap();
        assert_eq!(result.item_count, 1);
        assert_eq!(result.items[0].identifier, "B000000AAA");
        assert_eq!(result.subtotal, 10.00);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreadable_cart_page_with_no_identifiers_is_empty() {
        let cart_url = format!("{BASE}/gp/cart/view.html");
        let blocked = FakePageSpec::default().content("Something went wrong");
        let (mut orch, _) = orchestrator(HashMap::from([(cart_url.clone(), blocked)]));

        let result = orch.scrape_cart_url(&cart_url).await.unwrap();
        assert_eq!(result.item_count, 0);
        assert_eq!(result.subtotal, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_markup_identifiers_fallback() {
        let cart_url = format!("{BASE}/gp/cart/view.html");
        let html = format!(
            "{}<div data-asin=\"B000000AAA\"></div>",
            "x".repeat(6000)
        );
        let cart_page = FakePageSpec::default().content(&html);
        let catalog = HashMap::from([
            (cart_url.clone(), cart_page),
            (product_url("B000000AAA"), FakePageSpec::product("First Product", "$10.00")),
        ]);
        let (mut orch, _) = orchestrator(catalog);

        let result = orch.scrape_cart_url(&cart_url).await.unwrap();
        assert_eq!(result.item_count, 1);
        assert_eq!(result.items[0].unit_price, 10.00);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cart_page_timeout_without_url_identifiers_surfaces() {
        let cart_url = format!("{BASE}/gp/cart/view.html");
        let (mut orch, _) =
            orchestrator(HashMap::from([(cart_url.clone(), FakePageSpec::timing_out())]));

        let err = orch.scrape_cart_url(&cart_url).await.unwrap_err();
        assert!(matches!(err, CartgrabError::NavigationTimeout(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cart_page_timeout_with_url_identifiers_falls_back() {
        let cart_url = format!("{BASE}/gp/cart/view.html?src=ID.1=B000000AAA");
        let catalog = HashMap::from([
            (cart_url.clone(), FakePageSpec::timing_out()),
            (product_url("B000000AAA"), FakePageSpec::product("First Product", "$10.00")),
        ]);
        let (mut orch, _) = orchestrator(catalog);

        let result = orch.scrape_cart_url(&cart_url).await.unwrap();
        assert_eq!(result.item_count, 1);
        assert_eq!(result.items[0].identifier, "B000000AAA");
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_page_closed() {
        let ids: Vec<String> = ["B000000AAA", "B000000BBB"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let catalog = HashMap::from([
            (product_url("B000000AAA"), FakePageSpec::product("First Product", "$10.00")),
            (product_url("B000000BBB"), FakePageSpec::failing()),
        ]);
        let (mut orch, launcher) = orchestrator(catalog);

        orch.lookup_identifiers(&ids).await.unwrap();
        orch.close().await;

        assert_eq!(launcher.stats.pages_opened.load(Ordering::SeqCst), 2);
        assert_eq!(launcher.stats.pages_closed.load(Ordering::SeqCst), 2);
    }
}
