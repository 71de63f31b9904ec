//! Browser engine abstraction and session lifecycle.
//!
//! The extraction core never talks to a concrete browser directly: it is
//! written against the small capability surface below (launch an engine,
//! open a fingerprinted context, open pages, query elements), so the
//! chromiumoxide implementation in [`chrome`] and the scripted fake used by
//! tests are interchangeable.
//!
//! Selector resolution deliberately cannot fail: [`Queryable::query`] returns
//! `None` for anything that does not resolve, because a missing element is an
//! expected outcome on every page this system ever loads.

pub mod chrome;
pub mod session;

#[cfg(test)]
pub(crate) mod fake;

pub use chrome::ChromeLauncher;
pub use session::SessionManager;

use std::time::Duration;

use async_trait::async_trait;

use crate::app::Result;

/// Fingerprint settings applied to a browsing context for its lifetime.
#[derive(Debug, Clone)]
pub struct ContextOptions {
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub locale: String,
    pub timezone: String,
}

/// Launches fresh browser engine instances.
///
/// Injected into the session manager so the orchestrator can run against any
/// engine honoring the capability contract.
#[async_trait]
pub trait EngineLauncher: Send + Sync {
    async fn launch(&self, headless: bool) -> Result<Box<dyn BrowserEngine>>;
}

/// A running browser engine instance.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    async fn new_context(&self, options: &ContextOptions) -> Result<Box<dyn BrowsingContext>>;

    /// Whether the engine process is still reachable. Checked before every
    /// page acquisition; a disconnected engine is torn down and relaunched.
    fn is_connected(&self) -> bool;

    async fn close(&mut self) -> Result<()>;
}

/// A browsing context carrying one fingerprint profile.
#[async_trait]
pub trait BrowsingContext: Send + Sync {
    async fn new_page(&self) -> Result<Box<dyn PageHandle>>;

    async fn close(&mut self) -> Result<()>;
}

/// Anything elements can be resolved against: a page or another element.
#[async_trait]
pub trait Queryable: Send + Sync {
    /// Resolve a CSS selector to its first match. Resolution failure is
    /// `None`, never an error.
    async fn query(&self, selector: &str) -> Option<Box<dyn ElementHandle>>;
}

/// One open page. Pages are short-lived: one per product lookup, closed on
/// every exit path.
#[async_trait]
pub trait PageHandle: Queryable {
    /// Navigate and wait for the load to settle, bounded by `timeout`.
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Full page markup.
    async fn content(&self) -> Result<String>;

    /// URL the page ended up on, if known.
    async fn current_url(&self) -> Option<String>;

    /// Resolve a CSS selector to all matches; empty on failure.
    async fn query_all(&self, selector: &str) -> Vec<Box<dyn ElementHandle>>;

    /// Wait for a selector to appear. Returns whether it did within `timeout`.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> bool;

    /// Dispatch a pointer move to the given viewport coordinates.
    async fn move_mouse(&self, x: f64, y: f64) -> Result<()>;

    /// Close the page. Never raises; failures are logged and swallowed.
    async fn close(&mut self);

    fn as_queryable(&self) -> &dyn Queryable;
}

/// A resolved element.
#[async_trait]
pub trait ElementHandle: Queryable {
    /// Rendered text content, `None` when unavailable.
    async fn text(&self) -> Option<String>;

    /// Attribute value, `None` when absent or unavailable.
    async fn attribute(&self, name: &str) -> Option<String>;

    fn as_queryable(&self) -> &dyn Queryable;
}
