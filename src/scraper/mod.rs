//! Cart and product extraction over a live browser session.
//!
//! # Architecture
//!
//! ```text
//! cart URL ──► identifiers (no navigation) ──► per-item lookup ─┐
//!     │                                            ▲            │
//!     └──► cart page scrape ──► fallback ids ──────┘            ▼
//!                                                          CartResult
//! ```
//!
//! The orchestrator prefers strategies that avoid navigation entirely, falls
//! back to live page scraping, and degrades per item rather than per batch.
//! Field extraction walks ordered locator chains ([`locators`]); pacing and
//! pointer simulation ([`behavior`]) run unconditionally around every page
//! visit.
//!
//! # Usage
//!
//! ```rust,ignore
//! use cartgrab::browser::ChromeLauncher;
//! use cartgrab::config::ScrapeConfig;
//! use cartgrab::scraper::CartOrchestrator;
//!
//! let mut orchestrator = CartOrchestrator::new(Box::new(ChromeLauncher), ScrapeConfig::default());
//! let result = orchestrator.scrape_cart_url(&url).await?;
//! orchestrator.close().await;
//! ```

pub mod behavior;
pub mod fields;
pub mod locators;
mod orchestrator;

pub use fields::FieldExtractor;
pub use locators::{Locator, LocatorSource};
pub use orchestrator::CartOrchestrator;
