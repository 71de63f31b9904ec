use tracing::warn;

use crate::app::{CartgrabError, Result};
use crate::browser::ChromeLauncher;
use crate::config::ScrapeConfig;
use crate::domain::{is_valid_identifier, CartResult};
use crate::identifiers::extract_identifier;
use crate::scraper::CartOrchestrator;

/// Look up a list of products and print the result as JSON.
///
/// Each argument is either a bare 10-character identifier or a product-page
/// URL the identifier can be extracted from.
pub async fn lookup(config: ScrapeConfig, identifiers: &[String]) -> Result<()> {
    let mut ids = Vec::new();
    for raw in identifiers {
        let id = raw.trim().to_uppercase();
        if is_valid_identifier(&id) {
            ids.push(id);
        } else if let Some(id) = extract_identifier(raw) {
            ids.push(id);
        } else {
            warn!(identifier = %raw, "Skipping malformed identifier");
        }
    }
    if ids.is_empty() {
        return Err(CartgrabError::Other("No valid identifiers given".into()));
    }

    let mut orchestrator = CartOrchestrator::new(Box::new(ChromeLauncher), config);
    let result = orchestrator.lookup_identifiers(&ids).await;
    orchestrator.close().await;
    print_result(&result?)
}

/// Resolve a shared cart URL and print the result as JSON.
pub async fn cart(config: ScrapeConfig, url: &str) -> Result<()> {
    url::Url::parse(url)?;

    let mut orchestrator = CartOrchestrator::new(Box::new(ChromeLauncher), config);
    let result = orchestrator.scrape_cart_url(url).await;
    orchestrator.close().await;
    print_result(&result?)
}

fn print_result(result: &CartResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| CartgrabError::Other(format!("Failed to serialize result: {e}")))?;
    println!("{json}");
    Ok(())
}
