use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::cdp::CdpClient;
use super::error::BrowserError;

const LOAD_EVENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Read-only questions the navigation driver asks the live page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// First 200 characters of the content area's `h1`, or null.
    HeadingText,
    /// Serialized `document.documentElement`.
    DocumentHtml,
    /// `window.location.href`.
    LocationHref,
}

impl Probe {
    pub fn expression(self) -> &'static str {
        match self {
            Self::HeadingText => {
                "(() => { const h = document.querySelector('main h1, article h1, .content h1'); \
                 return h ? h.textContent.substring(0, 200) : null; })()"
            }
            Self::DocumentHtml => "document.documentElement.outerHTML",
            Self::LocationHref => "window.location.href",
        }
    }
}

/// The narrow capability set the navigation driver needs from a browser tab.
#[async_trait]
pub trait PageSession: Send {
    /// Load `url` as a full navigation and wait for the load event.
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError>;

    async fn evaluate(&mut self, probe: Probe) -> Result<Value, BrowserError>;

    /// Click the in-app anchor whose href targets `fragment`.
    ///
    /// Returns `false` when no such anchor is on the page.
    async fn locate_and_activate(&mut self, fragment: &str) -> Result<bool, BrowserError>;

    /// Overwrite `location.hash`, bypassing the app's link handlers.
    async fn assign_fragment(&mut self, fragment: &str) -> Result<(), BrowserError>;
}

/// Page target reached over its own DevTools socket.
pub struct CdpPage {
    client: CdpClient,
}

impl CdpPage {
    pub async fn attach(ws_url: &str) -> Result<Self, BrowserError> {
        let client = CdpClient::connect(ws_url).await?;
        client.enable("Page").await?;
        client.enable("Runtime").await?;
        Ok(Self { client })
    }

    async fn run_script(&self, expression: &str) -> Result<Value, BrowserError> {
        let result = self
            .client
            .send(
                "Runtime.evaluate",
                serde_json::json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                }),
            )
            .await?;

        if let Some(details) = result.get("exceptionDetails") {
            let message = details
                .get("exception")
                .and_then(|exception| exception.get("description"))
                .or_else(|| details.get("text"))
                .and_then(Value::as_str)
                .unwrap_or("unknown exception")
                .to_string();
            return Err(BrowserError::JsException { message });
        }

        Ok(result
            .get("result")
            .and_then(|remote| remote.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }
}

#[async_trait]
impl PageSession for CdpPage {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        self.client.drain_events();
        let result = self
            .client
            .send("Page.navigate", serde_json::json!({ "url": url }))
            .await?;

        if let Some(reason) = result.get("errorText").and_then(Value::as_str) {
            return Err(BrowserError::NavigationFailed {
                url: url.to_string(),
                reason: reason.to_string(),
            });
        }

        if !self
            .client
            .wait_for_event("Page.loadEventFired", LOAD_EVENT_TIMEOUT)
            .await?
        {
            tracing::warn!(url, timeout = ?LOAD_EVENT_TIMEOUT, "load event not observed, continuing");
        }
        Ok(())
    }

    async fn evaluate(&mut self, probe: Probe) -> Result<Value, BrowserError> {
        self.run_script(probe.expression()).await
    }

    async fn locate_and_activate(&mut self, fragment: &str) -> Result<bool, BrowserError> {
        let clicked = self.run_script(&activate_script(fragment)).await?;
        Ok(clicked.as_bool().unwrap_or(false))
    }

    async fn assign_fragment(&mut self, fragment: &str) -> Result<(), BrowserError> {
        self.run_script(&assign_script(fragment)).await.map(|_| ())
    }
}

/// Script that clicks the anchor for `fragment`: an exact `#fragment` href
/// under `nav` first, then any anchor whose href contains it.
pub fn activate_script(fragment: &str) -> String {
    let needle = js_string(&format!("#{fragment}"));
    format!(
        "(() => {{ const needle = {needle}; \
         const anchors = Array.from(document.querySelectorAll('a[href]')); \
         const exact = anchors.find(a => a.closest('nav') && a.getAttribute('href') === needle); \
         const target = exact || anchors.find(a => (a.getAttribute('href') || '').includes(needle)); \
         if (!target) return false; target.click(); return true; }})()"
    )
}

pub fn assign_script(fragment: &str) -> String {
    format!("(() => {{ window.location.hash = {}; return true; }})()", js_string(fragment))
}

fn js_string(raw: &str) -> String {
    Value::String(raw.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::{activate_script, assign_script};

    #[test]
    fn fragment_is_embedded_as_a_js_string_literal() {
        let script = assign_script("s=intro&ss=a\"b");
        assert!(script.contains(r#"window.location.hash = "s=intro&ss=a\"b""#), "{script}");
    }

    #[test]
    fn activation_looks_for_the_hash_prefixed_fragment() {
        let script = activate_script("overview");
        assert!(script.contains(r##"const needle = "#overview";"##), "{script}");
        assert!(script.contains("target.click()"));
    }
}
