//! Browser automation - chromedriver management and the session wrapper
//!
//! Each actor step opens one [`Session`] and quits it at the end. All DOM
//! lookups go through the `wait_for_*` helpers, which poll at a fixed
//! interval until the condition holds or the configured explicit timeout
//! elapses. A timeout is terminal: there is no retry with backoff.

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::ScenarioConfig;
use crate::error::{ScenarioError, ScenarioResult};
use crate::server::find_free_port;

/// Interval between condition polls
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Handle to a chromedriver process spawned for this run
pub struct ChromedriverHandle {
    child: Child,
    pub url: String,
}

impl ChromedriverHandle {
    /// Spawn chromedriver on a free port and wait until it answers
    pub async fn spawn() -> ScenarioResult<Self> {
        let port = find_free_port();
        let url = format!("http://127.0.0.1:{port}");

        info!("Spawning chromedriver on port {}", port);

        let child = Command::new("chromedriver")
            .arg(format!("--port={port}"))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ScenarioError::WebDriverStartup(format!("chromedriver: {e}")))?;

        let handle = ChromedriverHandle { child, url };
        handle.wait_for_ready(Duration::from_secs(10)).await?;
        Ok(handle)
    }

    async fn wait_for_ready(&self, timeout_duration: Duration) -> ScenarioResult<()> {
        let status_url = format!("{}/status", self.url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = Instant::now();
        while start.elapsed() < timeout_duration {
            if let Ok(resp) = client.get(&status_url).send().await {
                if resp.status().is_success() {
                    return Ok(());
                }
            }
            sleep(Duration::from_millis(100)).await;
        }

        Err(ScenarioError::WebDriverStartup(format!(
            "chromedriver did not answer on {status_url}"
        )))
    }
}

impl Drop for ChromedriverHandle {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// One browser session driven by an actor step
pub struct Session {
    client: Client,
    wait_timeout: Duration,
    step_pause: Duration,
}

impl Session {
    /// Open a new browser session against the given WebDriver endpoint
    pub async fn open(config: &ScenarioConfig, webdriver_url: &str) -> ScenarioResult<Self> {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-gpu".to_string(),
            "--window-size=1280,900".to_string(),
        ];
        if config.use_headless_browser {
            args.push("--headless=new".to_string());
        }

        let mut capabilities = serde_json::map::Map::new();
        capabilities.insert(
            "goog:chromeOptions".to_string(),
            serde_json::json!({
                "args": args,
                "prefs": {
                    "download.default_directory":
                        config.browser_download_folder.display().to_string(),
                    "download.prompt_for_download": false,
                },
            }),
        );

        let client = ClientBuilder::native()
            .capabilities(capabilities)
            .connect(webdriver_url)
            .await
            .map_err(|e| ScenarioError::NewSession(e.to_string()))?;

        Ok(Self {
            client,
            wait_timeout: config.explicit_wait_timeout,
            step_pause: config.wait_time_between_each_step,
        })
    }

    pub async fn goto(&self, url: &str) -> ScenarioResult<()> {
        debug!("Navigating to {}", url);
        self.client.goto(url).await?;
        Ok(())
    }

    pub async fn current_url(&self) -> ScenarioResult<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    /// Fixed pause after an action whose server-side effect is not
    /// immediately reflected in the DOM
    pub async fn pause(&self) {
        sleep(self.step_pause).await;
    }

    /// Wait until an element matching the selector exists
    pub async fn wait_for_element(&self, css: &str) -> ScenarioResult<Element> {
        let deadline = Instant::now() + self.wait_timeout;
        loop {
            if let Ok(element) = self.client.find(Locator::Css(css)).await {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(ScenarioError::Timeout {
                    condition: format!("element matching {css:?} to exist"),
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Wait until some element matching the selector contains the text
    pub async fn wait_for_element_with_text(
        &self,
        css: &str,
        expected_text: &str,
    ) -> ScenarioResult<Element> {
        let deadline = Instant::now() + self.wait_timeout;
        loop {
            if let Ok(elements) = self.client.find_all(Locator::Css(css)).await {
                for element in elements {
                    if let Ok(text) = element.text().await {
                        if text.contains(expected_text) {
                            return Ok(element);
                        }
                    }
                }
            }
            if Instant::now() >= deadline {
                return Err(ScenarioError::Timeout {
                    condition: format!(
                        "element matching {css:?} to contain text {expected_text:?}"
                    ),
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Wait until an element matching the selector has non-empty text
    pub async fn wait_for_non_empty_element(&self, css: &str) -> ScenarioResult<Element> {
        let deadline = Instant::now() + self.wait_timeout;
        loop {
            if let Ok(element) = self.client.find(Locator::Css(css)).await {
                if let Ok(text) = element.text().await {
                    if !text.trim().is_empty() {
                        return Ok(element);
                    }
                }
            }
            if Instant::now() >= deadline {
                return Err(ScenarioError::Timeout {
                    condition: format!("element matching {css:?} to have non-empty content"),
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Wait until a link whose text contains the label exists
    pub async fn wait_for_partial_link_text(&self, label: &str) -> ScenarioResult<Element> {
        let xpath = partial_link_text_xpath(label);
        let deadline = Instant::now() + self.wait_timeout;
        loop {
            if let Ok(element) = self.client.find(Locator::XPath(&xpath)).await {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(ScenarioError::Timeout {
                    condition: format!("link with partial text {label:?} to exist"),
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Wait for an input, clear it and type the value
    pub async fn fill(&self, css: &str, value: &str) -> ScenarioResult<()> {
        let field = self.wait_for_element(css).await?;
        field.click().await?;
        field.clear().await?;
        field.send_keys(value).await?;
        Ok(())
    }

    /// Close the session (explicit resource release at the end of a step)
    pub async fn quit(self) -> ScenarioResult<()> {
        self.client.close().await?;
        Ok(())
    }
}

/// Selector for a submit button in the page content, found by its value
pub fn button_in_page_content_by_value(value: &str) -> String {
    format!("#main input[type=submit][value=\"{value}\"]")
}

/// XPath for a link whose text contains the label
///
/// Labels are fixed strings chosen by this crate; none contain quotes.
fn partial_link_text_xpath(label: &str) -> String {
    format!("//a[contains(text(), '{label}')]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_selector_embeds_the_value() {
        assert_eq!(
            button_in_page_content_by_value("Generate and mail missing passwords"),
            "#main input[type=submit][value=\"Generate and mail missing passwords\"]"
        );
    }

    #[test]
    fn partial_link_xpath_embeds_the_label() {
        assert_eq!(
            partial_link_text_xpath("Credential management"),
            "//a[contains(text(), 'Credential management')]"
        );
    }
}
