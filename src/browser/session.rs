//! Browser session lifecycle.
//!
//! One session = one engine process + one fingerprinted browsing context.
//! The session is created lazily on first use, rebuilt from scratch whenever
//! the engine reports itself disconnected, and explicitly closed by the
//! caller when its unit of work completes. Teardown is idempotent and never
//! raises.

use rand::Rng;
use tracing::{info, warn};

use crate::app::Result;
use crate::browser::{BrowserEngine, BrowsingContext, ContextOptions, EngineLauncher, PageHandle};
use crate::config::ScrapeConfig;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub struct SessionManager {
    launcher: Box<dyn EngineLauncher>,
    config: ScrapeConfig,
    engine: Option<Box<dyn BrowserEngine>>,
    context: Option<Box<dyn BrowsingContext>>,
}

impl SessionManager {
    pub fn new(launcher: Box<dyn EngineLauncher>, config: ScrapeConfig) -> Self {
        Self {
            launcher,
            config,
            engine: None,
            context: None,
        }
    }

    /// Bring the session up if it is not already. No-op when the engine is
    /// running and connected. Launch failure is fatal to the current call and
    /// propagates; retries across whole lookups belong to the caller.
    pub async fn ensure_ready(&mut self) -> Result<()> {
        if let Some(engine) = &self.engine {
            if engine.is_connected() {
                return Ok(());
            }
            info!("Browser engine disconnected, rebuilding session");
        }

        self.teardown().await;

        let engine = self.launcher.launch(self.config.headless).await?;
        let options = ContextOptions {
            user_agent: self.pick_user_agent(),
            viewport_width: self.config.viewport_width,
            viewport_height: self.config.viewport_height,
            locale: self.config.locale.clone(),
            timezone: self.config.timezone.clone(),
        };
        info!(user_agent = %options.user_agent, "Browser session ready");

        let context = engine.new_context(&options).await?;
        self.engine = Some(engine);
        self.context = Some(context);
        Ok(())
    }

    /// Open a fresh page in the current context. Pages are never reused
    /// across lookups — shared cookies and history between requests raise the
    /// block risk more than the extra page costs.
    pub async fn new_page(&mut self) -> Result<Box<dyn PageHandle>> {
        self.ensure_ready().await?;
        match &self.context {
            Some(context) => context.new_page().await,
            None => Err(crate::app::CartgrabError::Session(
                "browsing context missing after session bring-up".into(),
            )),
        }
    }

    /// Release the context and engine, in that order. Idempotent; teardown
    /// errors are logged at warn and swallowed.
    pub async fn close(&mut self) {
        self.teardown().await;
    }

    async fn teardown(&mut self) {
        if let Some(mut context) = self.context.take() {
            if let Err(e) = context.close().await {
                warn!("Failed to close browsing context: {e}");
            }
        }
        if let Some(mut engine) = self.engine.take() {
            if let Err(e) = engine.close().await {
                warn!("Failed to close browser engine: {e}");
            }
        }
    }

    fn pick_user_agent(&self) -> String {
        let pool = &self.config.user_agents;
        if pool.is_empty() {
            return DEFAULT_USER_AGENT.to_string();
        }
        let index = rand::rng().random_range(0..pool.len());
        pool[index].clone()
    }
}
