use crate::session::BrowserSession;
use crate::{Error, Result};
use chromiumoxide::Element;
use rand::Rng;
use std::time::Duration;

/// Credentials for the automated login flow.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

const LOGIN_READY_TIMEOUT: Duration = Duration::from_secs(20);
const POST_LOGIN_TIMEOUT: Duration = Duration::from_secs(30);

impl BrowserSession {
    /// Automated login with up to `attempts` tries.
    ///
    /// A security checkpoint stops immediately: retrying a challenge
    /// page only makes the account look worse.
    pub async fn automated_login(
        &self,
        login_url: &str,
        credentials: &Credentials,
        attempts: u32,
    ) -> Result<()> {
        for attempt in 1..=attempts {
            tracing::info!("Login attempt {}/{}", attempt, attempts);
            match self.try_login(login_url, credentials).await {
                Ok(()) => {
                    tracing::info!("Logged in");
                    return Ok(());
                }
                Err(Error::Login(reason)) if reason.contains("checkpoint") => {
                    return Err(Error::Login(reason));
                }
                Err(err) => tracing::warn!("Login attempt failed: {}", err),
            }
            tokio::time::sleep(Duration::from_secs(5)).await;
        }

        Err(Error::Login(format!(
            "no successful login after {} attempts; try --manual-login",
            attempts
        )))
    }

    async fn try_login(&self, login_url: &str, credentials: &Credentials) -> Result<()> {
        self.page().goto(login_url).await?;
        let _ = self.page().wait_for_navigation().await;

        let username = self.wait_for_field("input#username").await?;
        self.type_slowly(&username, &credentials.email).await?;

        let password = self.wait_for_field("input#password").await?;
        self.type_slowly(&password, &credentials.password).await?;

        let submit = self.page().find_element("button[type='submit']").await?;
        submit.click().await?;

        // Poll until the URL leaves the login page.
        let deadline = tokio::time::Instant::now() + POST_LOGIN_TIMEOUT;
        loop {
            let url = self.current_url().await?;
            if url.contains("checkpoint") {
                return Err(Error::Login(
                    "security checkpoint shown; complete it in the browser and rerun".to_string(),
                ));
            }
            if !url.is_empty() && !url.contains("login") {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(Error::Login(
                    "still on the login page after submitting".to_string(),
                ));
            }
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
    }

    /// Manual login: the operator signs in by hand while we poll the URL.
    pub async fn manual_login(&self, login_url: &str, timeout: Duration) -> Result<()> {
        self.page().goto(login_url).await?;
        tracing::info!(
            "Please log in manually in the browser window ({}s allowed)",
            timeout.as_secs()
        );

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let url = self.current_url().await?;
            if !url.is_empty() && !url.contains("login") {
                tracing::info!("Manual login complete");
                return Ok(());
            }

            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Err(Error::Login("manual login timed out".to_string()));
            }
            tracing::info!("Waiting for manual login... {}s remaining", remaining.as_secs());
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
    }

    async fn wait_for_field(&self, selector: &str) -> Result<Element> {
        let deadline = tokio::time::Instant::now() + LOGIN_READY_TIMEOUT;
        loop {
            if let Ok(element) = self.page().find_element(selector).await {
                return Ok(element);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(Error::Login(format!("field {} never appeared", selector)));
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }

    async fn type_slowly(&self, element: &Element, text: &str) -> Result<()> {
        element.click().await?;
        for ch in text.chars() {
            element.type_str(ch.to_string()).await?;
            let pause = rand::thread_rng().gen_range(100..200);
            tokio::time::sleep(Duration::from_millis(pause)).await;
        }
        Ok(())
    }
}
