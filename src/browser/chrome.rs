//! chromiumoxide implementation of the browser capability contract.
//!
//! Launches headless Chrome/Chromium over CDP with an anti-automation
//! argument set, applies the context fingerprint (user agent, viewport,
//! locale, timezone) through CDP overrides on every new page, and registers
//! a navigator-normalization script before any navigation. The fingerprint
//! script is an external stealth capability: invoked here, never redesigned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetLocaleOverrideParams, SetTimezoneOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType,
};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::app::{CartgrabError, Result};
use crate::browser::{
    BrowserEngine, BrowsingContext, ContextOptions, ElementHandle, EngineLauncher, PageHandle,
    Queryable,
};

/// Polling interval for [`PageHandle::wait_for`].
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

const LAUNCH_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--disable-software-rasterizer",
    "--disable-blink-features=AutomationControlled",
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-background-networking",
];

/// Navigator fingerprint normalization, registered before any document loads.
const FINGERPRINT_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', {
    get: () => undefined,
    configurable: true
});
window.chrome = window.chrome || {
    runtime: {},
    loadTimes: function() {},
    csi: function() {},
    app: {}
};
Object.defineProperty(navigator, 'languages', {
    get: () => ['en-US', 'en'],
    configurable: true
});
"#;

/// Launches chromiumoxide-driven Chrome engines.
pub struct ChromeLauncher;

#[async_trait]
impl EngineLauncher for ChromeLauncher {
    async fn launch(&self, headless: bool) -> Result<Box<dyn BrowserEngine>> {
        let mut builder = BrowserConfig::builder();
        for arg in LAUNCH_ARGS {
            builder = builder.arg(*arg);
        }
        if !headless {
            builder = builder.with_head();
        }

        let config = builder
            .build()
            .map_err(|e| CartgrabError::Session(format!("Failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            CartgrabError::Session(format!(
                "Failed to launch browser: {e}. Is Chrome or Chromium installed and in PATH?"
            ))
        })?;

        // The handler task drives all CDP traffic; when its stream ends the
        // engine process is gone and the session manager must rebuild.
        let connected = Arc::new(AtomicBool::new(true));
        let flag = connected.clone();
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
            flag.store(false, Ordering::SeqCst);
        });

        Ok(Box::new(ChromeEngine {
            browser: Arc::new(Mutex::new(browser)),
            connected,
            closed: false,
        }))
    }
}

pub struct ChromeEngine {
    browser: Arc<Mutex<Browser>>,
    connected: Arc<AtomicBool>,
    closed: bool,
}

#[async_trait]
impl BrowserEngine for ChromeEngine {
    async fn new_context(&self, options: &ContextOptions) -> Result<Box<dyn BrowsingContext>> {
        Ok(Box::new(ChromeContext {
            browser: self.browser.clone(),
            options: options.clone(),
        }))
    }

    fn is_connected(&self) -> bool {
        !self.closed && self.connected.load(Ordering::SeqCst)
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.connected.store(false, Ordering::SeqCst);
        let mut browser = self.browser.lock().await;
        browser
            .close()
            .await
            .map_err(|e| CartgrabError::Session(format!("Failed to close browser: {e}")))?;
        Ok(())
    }
}

/// One fingerprint profile over the shared engine. The profile is applied
/// per page through CDP overrides, so every page opened here carries the
/// same user agent, viewport, locale, and timezone.
pub struct ChromeContext {
    browser: Arc<Mutex<Browser>>,
    options: ContextOptions,
}

impl ChromeContext {
    async fn apply_fingerprint(&self, page: &Page) -> Result<()> {
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
            FINGERPRINT_SCRIPT,
        ))
        .await
        .map_err(|e| CartgrabError::Session(format!("Failed to register init script: {e}")))?;

        let user_agent = SetUserAgentOverrideParams::builder()
            .user_agent(self.options.user_agent.as_str())
            .accept_language(self.options.locale.as_str())
            .build()
            .map_err(CartgrabError::Session)?;
        page.execute(user_agent)
            .await
            .map_err(|e| CartgrabError::Session(format!("Failed to set user agent: {e}")))?;

        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(self.options.viewport_width as i64)
            .height(self.options.viewport_height as i64)
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(CartgrabError::Session)?;
        page.execute(metrics)
            .await
            .map_err(|e| CartgrabError::Session(format!("Failed to set viewport: {e}")))?;

        page.execute(SetTimezoneOverrideParams {
            timezone_id: self.options.timezone.clone(),
        })
        .await
        .map_err(|e| CartgrabError::Session(format!("Failed to set timezone: {e}")))?;

        let locale = SetLocaleOverrideParams::builder()
            .locale(self.options.locale.as_str())
            .build();
        page.execute(locale)
            .await
            .map_err(|e| CartgrabError::Session(format!("Failed to set locale: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl BrowsingContext for ChromeContext {
    async fn new_page(&self) -> Result<Box<dyn PageHandle>> {
        let page = {
            let browser = self.browser.lock().await;
            browser
                .new_page("about:blank")
                .await
                .map_err(|e| CartgrabError::Session(format!("Failed to create page: {e}")))?
        };
        self.apply_fingerprint(&page).await?;
        debug!(user_agent = %self.options.user_agent, "Page created");
        Ok(Box::new(ChromePage { page }))
    }

    async fn close(&mut self) -> Result<()> {
        // Pages are closed individually and the engine owns the process;
        // the profile itself holds no CDP resources.
        Ok(())
    }
}

pub struct ChromePage {
    page: Page,
}

#[async_trait]
impl Queryable for ChromePage {
    async fn query(&self, selector: &str) -> Option<Box<dyn ElementHandle>> {
        match self.page.find_element(selector).await {
            Ok(element) => Some(Box::new(ChromeElement { element })),
            Err(_) => None,
        }
    }
}

#[async_trait]
impl PageHandle for ChromePage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        let navigation = async {
            self.page
                .goto(url)
                .await
                .map_err(|e| CartgrabError::Navigation(format!("{url}: {e}")))?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| CartgrabError::Navigation(format!("{url}: {e}")))?;
            Ok(())
        };

        match tokio::time::timeout(timeout, navigation).await {
            Ok(result) => result,
            Err(_) => Err(CartgrabError::NavigationTimeout(timeout)),
        }
    }

    async fn content(&self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| CartgrabError::Navigation(format!("Failed to read page content: {e}")))
    }

    async fn current_url(&self) -> Option<String> {
        self.page.url().await.ok().flatten()
    }

    async fn query_all(&self, selector: &str) -> Vec<Box<dyn ElementHandle>> {
        match self.page.find_elements(selector).await {
            Ok(elements) => elements
                .into_iter()
                .map(|element| Box::new(ChromeElement { element }) as Box<dyn ElementHandle>)
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }

    async fn move_mouse(&self, x: f64, y: f64) -> Result<()> {
        let params = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseMoved)
            .x(x)
            .y(y)
            .build()
            .map_err(CartgrabError::Session)?;
        self.page
            .execute(params)
            .await
            .map_err(|e| CartgrabError::Session(format!("Mouse move failed: {e}")))?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Err(e) = self.page.clone().close().await {
            debug!("Failed to close page: {e}");
        }
    }

    fn as_queryable(&self) -> &dyn Queryable {
        self
    }
}

pub struct ChromeElement {
    element: Element,
}

#[async_trait]
impl Queryable for ChromeElement {
    async fn query(&self, selector: &str) -> Option<Box<dyn ElementHandle>> {
        match self.element.find_element(selector).await {
            Ok(element) => Some(Box::new(ChromeElement { element })),
            Err(_) => None,
        }
    }
}

#[async_trait]
impl ElementHandle for ChromeElement {
    async fn text(&self) -> Option<String> {
        self.element.inner_text().await.ok().flatten()
    }

    async fn attribute(&self, name: &str) -> Option<String> {
        self.element.attribute(name).await.ok().flatten()
    }

    fn as_queryable(&self) -> &dyn Queryable {
        self
    }
}
