//! Scripted in-memory engine for exercising the extraction core without a
//! browser. Pages are declared up front as URL → element maps; the fake
//! records launches, page churn, per-selector query counts, and navigation
//! timestamps so tests can assert on lifecycle and pacing behavior.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::app::{CartgrabError, Result};
use crate::browser::{
    BrowserEngine, BrowsingContext, ContextOptions, ElementHandle, EngineLauncher, PageHandle,
    Queryable,
};

/// Scripted element: text, attributes, and nested children by selector.
#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub text: Option<String>,
    pub attrs: HashMap<String, String>,
    pub children: HashMap<String, FakeElement>,
}

impl FakeElement {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn child(mut self, selector: &str, child: FakeElement) -> Self {
        self.children.insert(selector.to_string(), child);
        self
    }
}

/// Scripted page, reached by navigating to its URL.
#[derive(Debug, Clone, Default)]
pub struct FakePageSpec {
    pub elements: HashMap<String, FakeElement>,
    pub lists: HashMap<String, Vec<FakeElement>>,
    pub content: String,
    pub fail_goto: bool,
    pub timeout_goto: bool,
}

impl FakePageSpec {
    pub fn element(mut self, selector: &str, element: FakeElement) -> Self {
        self.elements.insert(selector.to_string(), element);
        self
    }

    pub fn list(mut self, selector: &str, elements: Vec<FakeElement>) -> Self {
        self.lists.insert(selector.to_string(), elements);
        self
    }

    pub fn content(mut self, html: &str) -> Self {
        self.content = html.to_string();
        self
    }

    /// A product page answering the first-choice title and price locators.
    pub fn product(title: &str, price: &str) -> Self {
        Self::default()
            .element("#productTitle", FakeElement::with_text(title))
            .element(".a-price .a-offscreen", FakeElement::with_text(price))
    }

    pub fn failing() -> Self {
        Self {
            fail_goto: true,
            ..Default::default()
        }
    }

    pub fn timing_out() -> Self {
        Self {
            timeout_goto: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeStats {
    pub launches: AtomicUsize,
    pub pages_opened: AtomicUsize,
    pub pages_closed: AtomicUsize,
    pub query_counts: Mutex<HashMap<String, usize>>,
    pub goto_log: Mutex<Vec<(String, tokio::time::Instant)>>,
    pub context_user_agents: Mutex<Vec<String>>,
}

impl FakeStats {
    pub fn query_count(&self, selector: &str) -> usize {
        *self
            .query_counts
            .lock()
            .unwrap()
            .get(selector)
            .unwrap_or(&0)
    }

    pub fn goto_urls(&self) -> Vec<String> {
        self.goto_log
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    fn record_query(&self, selector: &str) {
        *self
            .query_counts
            .lock()
            .unwrap()
            .entry(selector.to_string())
            .or_insert(0) += 1;
    }
}

#[derive(Clone)]
pub struct FakeLauncher {
    pub catalog: Arc<HashMap<String, FakePageSpec>>,
    pub stats: Arc<FakeStats>,
    pub connected: Arc<AtomicBool>,
    pub fail_launch: bool,
}

impl FakeLauncher {
    pub fn new(catalog: HashMap<String, FakePageSpec>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            stats: Arc::new(FakeStats::default()),
            connected: Arc::new(AtomicBool::new(true)),
            fail_launch: false,
        }
    }
}

#[async_trait]
impl EngineLauncher for FakeLauncher {
    async fn launch(&self, _headless: bool) -> Result<Box<dyn BrowserEngine>> {
        if self.fail_launch {
            return Err(CartgrabError::Session("scripted launch failure".into()));
        }
        self.stats.launches.fetch_add(1, Ordering::SeqCst);
        self.connected.store(true, Ordering::SeqCst);
        Ok(Box::new(FakeEngine {
            catalog: self.catalog.clone(),
            stats: self.stats.clone(),
            connected: self.connected.clone(),
        }))
    }
}

pub struct FakeEngine {
    catalog: Arc<HashMap<String, FakePageSpec>>,
    stats: Arc<FakeStats>,
    connected: Arc<AtomicBool>,
}

#[async_trait]
impl BrowserEngine for FakeEngine {
    async fn new_context(&self, options: &ContextOptions) -> Result<Box<dyn BrowsingContext>> {
        self.stats
            .context_user_agents
            .lock()
            .unwrap()
            .push(options.user_agent.clone());
        Ok(Box::new(FakeContext {
            catalog: self.catalog.clone(),
            stats: self.stats.clone(),
        }))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn close(&mut self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakeContext {
    catalog: Arc<HashMap<String, FakePageSpec>>,
    stats: Arc<FakeStats>,
}

#[async_trait]
impl BrowsingContext for FakeContext {
    async fn new_page(&self) -> Result<Box<dyn PageHandle>> {
        self.stats.pages_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakePage {
            catalog: self.catalog.clone(),
            stats: self.stats.clone(),
            current: Mutex::new(FakePageSpec::default()),
            url: Mutex::new(None),
        }))
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

pub struct FakePage {
    catalog: Arc<HashMap<String, FakePageSpec>>,
    stats: Arc<FakeStats>,
    current: Mutex<FakePageSpec>,
    url: Mutex<Option<String>>,
}

#[async_trait]
impl Queryable for FakePage {
    async fn query(&self, selector: &str) -> Option<Box<dyn ElementHandle>> {
        self.stats.record_query(selector);
        let element = self.current.lock().unwrap().elements.get(selector).cloned();
        element.map(|element| {
            Box::new(FakeElementHandle {
                element,
                stats: self.stats.clone(),
            }) as Box<dyn ElementHandle>
        })
    }
}

#[async_trait]
impl PageHandle for FakePage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        self.stats
            .goto_log
            .lock()
            .unwrap()
            .push((url.to_string(), tokio::time::Instant::now()));

        let spec = self.catalog.get(url).cloned().unwrap_or_default();
        if spec.timeout_goto {
            return Err(CartgrabError::NavigationTimeout(timeout));
        }
        if spec.fail_goto {
            return Err(CartgrabError::Navigation(format!(
                "scripted navigation failure: {url}"
            )));
        }
        *self.current.lock().unwrap() = spec;
        *self.url.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        Ok(self.current.lock().unwrap().content.clone())
    }

    async fn current_url(&self) -> Option<String> {
        self.url.lock().unwrap().clone()
    }

    async fn query_all(&self, selector: &str) -> Vec<Box<dyn ElementHandle>> {
        self.stats.record_query(selector);
        let elements = self
            .current
            .lock()
            .unwrap()
            .lists
            .get(selector)
            .cloned()
            .unwrap_or_default();
        elements
            .into_iter()
            .map(|element| {
                Box::new(FakeElementHandle {
                    element,
                    stats: self.stats.clone(),
                }) as Box<dyn ElementHandle>
            })
            .collect()
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> bool {
        self.current.lock().unwrap().elements.contains_key(selector)
    }

    async fn move_mouse(&self, _x: f64, _y: f64) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) {
        self.stats.pages_closed.fetch_add(1, Ordering::SeqCst);
    }

    fn as_queryable(&self) -> &dyn Queryable {
        self
    }
}

pub struct FakeElementHandle {
    element: FakeElement,
    stats: Arc<FakeStats>,
}

impl FakeElementHandle {
    /// Wrap a scripted element directly, for tests that exercise
    /// element-level extraction without a page.
    pub fn standalone(element: FakeElement) -> Self {
        Self {
            element,
            stats: Arc::new(FakeStats::default()),
        }
    }
}

#[async_trait]
impl Queryable for FakeElementHandle {
    async fn query(&self, selector: &str) -> Option<Box<dyn ElementHandle>> {
        self.stats.record_query(selector);
        self.element.children.get(selector).cloned().map(|element| {
            Box::new(FakeElementHandle {
                element,
                stats: self.stats.clone(),
            }) as Box<dyn ElementHandle>
        })
    }
}

#[async_trait]
impl ElementHandle for FakeElementHandle {
    async fn text(&self) -> Option<String> {
        self.element.text.clone()
    }

    async fn attribute(&self, name: &str) -> Option<String> {
        self.element.attrs.get(name).cloned()
    }

    fn as_queryable(&self) -> &dyn Queryable {
        self
    }
}
