use crate::{Error, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat,
};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, Element, Page};
use futures::StreamExt;
use outreach_engine::session::{LocatorQuery, PageSession};
use outreach_engine::Error as EngineError;
use rand::Rng;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Keeps `navigator.webdriver` from advertising the automated session.
const WEBDRIVER_MASK: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

/// One exclusively-owned Chrome page, driven over CDP.
///
/// Implements the engine's [`PageSession`] capability contract; the
/// engine never sees chromiumoxide types besides the element handle.
pub struct BrowserSession {
    _browser: Browser,
    handler_task: JoinHandle<()>,
    page: Page,
    debug_dir: Option<PathBuf>,
}

impl BrowserSession {
    /// Connect to a Chrome instance exposing `debugging_port`.
    ///
    /// Retries the CDP handshake a few times; Chrome is often not ready
    /// the instant the process is up. When `debug_dir` is set,
    /// screenshots land there.
    pub async fn connect(debugging_port: u16, debug_dir: Option<PathBuf>) -> Result<Self> {
        let ws_url = format!("http://localhost:{}", debugging_port);

        let (browser, mut handler) = {
            let mut retries = 5;
            loop {
                tracing::debug!("Attempting CDP connection to {}...", ws_url);
                match Browser::connect(&ws_url).await {
                    Ok(result) => {
                        tracing::info!("CDP connection established");
                        break result;
                    }
                    Err(e) => {
                        retries -= 1;
                        if retries == 0 {
                            return Err(Error::Cdp(format!(
                                "Failed to connect to Chrome after 5 attempts: {}",
                                e
                            )));
                        }
                        tracing::info!(
                            "CDP connection attempt failed, retrying... ({} left)",
                            retries
                        );
                        tokio::time::sleep(Duration::from_millis(500)).await;
                    }
                }
            }
        };

        // The handler must run for any page command to complete.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler event error (continuing): {}", e);
                }
            }
        });

        // Chrome needs a moment to create its initial page.
        tokio::time::sleep(Duration::from_millis(500)).await;
        let page = match browser.pages().await?.into_iter().next() {
            Some(page) => page,
            None => browser.new_page("about:blank").await?,
        };

        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(WEBDRIVER_MASK))
            .await?;

        if let Some(dir) = &debug_dir {
            std::fs::create_dir_all(dir)?;
        }

        Ok(Self {
            _browser: browser,
            handler_task,
            page,
            debug_dir,
        })
    }

    /// URL of the current page, empty when Chrome has none to report.
    pub async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    pub(crate) fn page(&self) -> &Page {
        &self.page
    }

    async fn find_css(&self, css: &str) -> outreach_engine::Result<Vec<Element>> {
        self.page.find_elements(css).await.map_err(driver_err)
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

/// A dead websocket means the whole session is gone, not just this call.
fn driver_err(err: chromiumoxide::error::CdpError) -> EngineError {
    let text = err.to_string();
    if text.contains("WebSocket")
        || text.contains("websocket")
        || text.contains("connection closed")
    {
        EngineError::SessionLost(text)
    } else {
        EngineError::Driver(text)
    }
}

#[async_trait]
impl PageSession for BrowserSession {
    type Handle = Element;

    async fn navigate(&self, url: &str) -> outreach_engine::Result<()> {
        tracing::info!("Navigating to {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| EngineError::Navigation(e.to_string()))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| EngineError::Navigation(e.to_string()))?;

        // Let the page settle; profile pages hydrate their action bar
        // well after the navigation completes.
        let settle = rand::thread_rng().gen_range(3.0..5.0);
        tokio::time::sleep(Duration::from_secs_f64(settle)).await;
        Ok(())
    }

    async fn find_all(&self, query: &LocatorQuery) -> outreach_engine::Result<Vec<Element>> {
        match query {
            LocatorQuery::Css(css) => self.find_css(css).await,
            LocatorQuery::TextContains { css, needle } => {
                let needle = needle.to_lowercase();
                let mut matches = Vec::new();
                for element in self.find_css(css).await? {
                    if let Ok(Some(text)) = element.inner_text().await {
                        if text.to_lowercase().contains(&needle) {
                            matches.push(element);
                        }
                    }
                }
                Ok(matches)
            }
            LocatorQuery::AttributeContains { css, name, value } => {
                let value = value.to_lowercase();
                let mut matches = Vec::new();
                for element in self.find_css(css).await? {
                    if let Ok(Some(attr)) = element.attribute(name.clone()).await {
                        if attr.to_lowercase().contains(&value) {
                            matches.push(element);
                        }
                    }
                }
                Ok(matches)
            }
        }
    }

    async fn click(&self, handle: &Element) -> outreach_engine::Result<()> {
        handle.click().await.map_err(driver_err)?;
        // Give the UI a beat to react before the caller inspects it.
        tokio::time::sleep(Duration::from_millis(800)).await;
        Ok(())
    }

    async fn type_text(&self, handle: &Element, text: &str) -> outreach_engine::Result<()> {
        handle.click().await.map_err(driver_err)?;
        for ch in text.chars() {
            handle
                .type_str(ch.to_string())
                .await
                .map_err(driver_err)?;
            let pause = rand::thread_rng().gen_range(20..60);
            tokio::time::sleep(Duration::from_millis(pause)).await;
        }
        Ok(())
    }

    async fn page_text(&self) -> outreach_engine::Result<String> {
        let result = self
            .page
            .evaluate("document.body.innerText")
            .await
            .map_err(driver_err)?;
        result
            .into_value::<String>()
            .map_err(|e| EngineError::Driver(format!("page text: {}", e)))
    }

    async fn capture(&self, label: &str) {
        let Some(dir) = &self.debug_dir else {
            return;
        };

        let filename = format!("{}_{}.png", chrono::Local::now().format("%Y%m%d_%H%M%S"), label);
        let path = dir.join(filename);
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();

        match self.page.save_screenshot(params, &path).await {
            Ok(_) => tracing::debug!("Screenshot saved: {}", path.display()),
            Err(e) => tracing::warn!("Failed to take screenshot: {}", e),
        }
    }
}

// Full session behavior is exercised against a live Chrome by the CLI;
// the engine's scripted-session tests cover the decision logic.
