//! # cartgrab
//!
//! Headless-browser product and cart lookup for a retail storefront, used as
//! a fallback data source when the paid catalog API is unavailable.
//!
//! ## Architecture
//!
//! ```text
//! identifiers/cart URL → orchestrator → session → page fields → CartResult
//! ```
//!
//! - [`identifiers`]: resolves identifiers and quantities from URLs without
//!   touching the browser — always the preferred strategy
//! - [`browser`]: engine capability traits, the chromiumoxide implementation,
//!   and the session lifecycle
//! - [`scraper`]: locator chains, field extraction, behavior simulation, and
//!   the cart-lookup orchestrator
//! - [`normalizer`]: pure price/quantity text normalization
//!
//! ## Quick Start
//!
//! ```bash
//! # Look up products by identifier
//! cartgrab lookup B07ZPKN6YR B00006IE7F
//!
//! # Resolve a shared cart URL
//! cartgrab cart "https://www.amazon.com/gp/aws/cart/add.html?ID.1=B07ZPKN6YR&QTY.1=2"
//! ```

/// Error type and `Result` alias.
pub mod app;

/// Browser engine capability traits, the chromiumoxide implementation, and
/// the session manager.
///
/// - [`SessionManager`](browser::SessionManager): lazy bring-up, rebuild on
///   disconnect, idempotent close
/// - [`ChromeLauncher`](browser::ChromeLauncher): chromiumoxide engine with
///   anti-detection launch configuration
pub mod browser;

/// Command-line interface using clap.
///
/// - `lookup <IDENTIFIER>...` - Look up products by identifier
/// - `cart <URL>` - Resolve a shared cart URL
pub mod cli;

/// Scraper configuration loaded from `~/.config/cartgrab/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`LineItem`](domain::LineItem): one product line with enforced invariants
/// - [`CartResult`](domain::CartResult): ordered items + recomputed subtotal
pub mod domain;

/// Product identifier extraction from storefront URLs and raw markup.
pub mod identifiers;

/// Pure price and quantity normalization.
pub mod normalizer;

/// Locator chains, field extraction, behavior simulation, and the
/// cart-lookup orchestrator.
///
/// - [`CartOrchestrator`](scraper::CartOrchestrator): the top-level workflow
/// - [`FieldExtractor`](scraper::FieldExtractor): first-success-wins locator
///   chain walking
pub mod scraper;
