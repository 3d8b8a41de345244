//! Session attached to a single page target.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::SinkExt;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace};

use super::client::{PendingRequest, WsSink};
use super::error::CdpError;
use super::protocol::{CdpRequest, KeyEventType};

const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One attached page. Shares the browser WebSocket with the client;
/// every command carries this session's id.
pub struct PageSession {
    target_id: String,
    session_id: String,
    ws_tx: Arc<tokio::sync::Mutex<WsSink>>,
    pending: Arc<Mutex<HashMap<u64, PendingRequest>>>,
    request_id: Arc<AtomicU64>,
}

impl PageSession {
    pub(crate) fn new(
        target_id: String,
        session_id: String,
        ws_tx: Arc<tokio::sync::Mutex<WsSink>>,
        pending: Arc<Mutex<HashMap<u64, PendingRequest>>>,
        request_id: Arc<AtomicU64>,
    ) -> Self {
        Self {
            target_id,
            session_id,
            ws_tx,
            pending,
            request_id,
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Send a command to this page and wait for its response.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: Some(self.session_id.clone()),
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP session send: {}", json);

        let (tx, rx) = tokio::sync::oneshot::channel();
        self.pending.lock().insert(id, PendingRequest { tx });

        {
            let mut ws = self.ws_tx.lock().await;
            ws.send(Message::Text(json.into())).await?;
        }

        match tokio::time::timeout(COMMAND_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }

    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        self.call("Page.enable", None).await?;
        self.call("DOM.enable", None).await?;
        self.call("Runtime.enable", None).await?;
        debug!("Enabled CDP domains for session {}", self.session_id);
        Ok(())
    }

    // Navigation

    pub async fn navigate(&self, url: &str) -> Result<(), CdpError> {
        let result = self.call("Page.navigate", Some(json!({"url": url}))).await?;
        if let Some(error) = result.get("errorText") {
            return Err(CdpError::NavigationFailed(
                error.as_str().unwrap_or("Unknown error").to_string(),
            ));
        }
        self.wait_for_load().await?;
        debug!("Navigated to {}", url);
        Ok(())
    }

    pub async fn wait_for_load(&self) -> Result<(), CdpError> {
        let start = std::time::Instant::now();
        loop {
            let result = self.evaluate("document.readyState").await?;
            if let Some(state) = result.as_str() {
                if state == "complete" || state == "interactive" {
                    return Ok(());
                }
            }
            if start.elapsed() > COMMAND_TIMEOUT {
                return Err(CdpError::Timeout("Page load timeout".to_string()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    pub async fn url(&self) -> Result<String, CdpError> {
        let result = self.evaluate("window.location.href").await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }

    // JavaScript

    /// Evaluate an expression and return its value.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception["text"].as_str().unwrap_or("Unknown error");
            return Err(CdpError::JavaScript(text.to_string()));
        }
        Ok(result["result"]["value"].clone())
    }

    // DOM

    pub async fn query_selector(&self, selector: &str) -> Result<Option<i64>, CdpError> {
        let doc = self
            .call("DOM.getDocument", Some(json!({"depth": 1})))
            .await?;
        let root_id = doc["root"]["nodeId"]
            .as_i64()
            .ok_or_else(|| CdpError::InvalidResponse("Missing document root".to_string()))?;

        let result = self
            .call(
                "DOM.querySelector",
                Some(json!({"nodeId": root_id, "selector": selector})),
            )
            .await?;

        let node_id = result["nodeId"].as_i64().unwrap_or(0);
        Ok((node_id != 0).then_some(node_id))
    }

    pub async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<i64, CdpError> {
        let start = std::time::Instant::now();
        loop {
            if let Some(node_id) = self.query_selector(selector).await? {
                return Ok(node_id);
            }
            if start.elapsed() > timeout {
                return Err(CdpError::Timeout(format!(
                    "Waiting for selector '{}' timed out",
                    selector
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    pub async fn focus(&self, node_id: i64) -> Result<(), CdpError> {
        self.call("DOM.focus", Some(json!({"nodeId": node_id})))
            .await?;
        Ok(())
    }

    /// Click the center of an element.
    pub async fn click_selector(&self, selector: &str) -> Result<(), CdpError> {
        let node_id = self
            .query_selector(selector)
            .await?
            .ok_or_else(|| CdpError::ElementNotFound(selector.to_string()))?;

        let result = self
            .call("DOM.getBoxModel", Some(json!({"nodeId": node_id})))
            .await
            .map_err(|_| CdpError::ElementNotFound(format!("{} (not visible)", selector)))?;

        let quad: Vec<f64> = result["model"]["content"]
            .as_array()
            .map(|arr| arr.iter().filter_map(|v| v.as_f64()).collect())
            .unwrap_or_default();
        let (x, y) = quad_center(&quad);

        for event_type in ["mousePressed", "mouseReleased"] {
            self.call(
                "Input.dispatchMouseEvent",
                Some(json!({
                    "type": event_type,
                    "x": x,
                    "y": y,
                    "button": "left",
                    "clickCount": 1,
                })),
            )
            .await?;
        }
        debug!("Clicked '{}' at ({}, {})", selector, x, y);
        Ok(())
    }

    /// Attach local files to a file input.
    pub async fn set_file_input(&self, selector: &str, files: &[String]) -> Result<(), CdpError> {
        let node_id = self
            .query_selector(selector)
            .await?
            .ok_or_else(|| CdpError::ElementNotFound(selector.to_string()))?;
        self.call(
            "DOM.setFileInputFiles",
            Some(json!({"nodeId": node_id, "files": files})),
        )
        .await?;
        Ok(())
    }

    // Keyboard

    pub async fn type_text(&self, text: &str) -> Result<(), CdpError> {
        self.call("Input.insertText", Some(json!({"text": text})))
            .await?;
        trace!("Typed {} characters", text.len());
        Ok(())
    }

    /// Clear the focused input and type a value.
    pub async fn fill_focused(&self, value: &str) -> Result<(), CdpError> {
        self.key_event(KeyEventType::KeyDown, "a", Some(2)).await?;
        self.key_event(KeyEventType::KeyUp, "a", Some(2)).await?;
        self.type_text(value).await
    }

    pub async fn press_key(&self, key: &str) -> Result<(), CdpError> {
        self.key_event(KeyEventType::KeyDown, key, None).await?;
        self.key_event(KeyEventType::KeyUp, key, None).await
    }

    /// Press and hold a key. Some widget toolkits only commit an
    /// activation when the key stays down for a beat.
    pub async fn hold_key(&self, key: &str, hold: Duration) -> Result<(), CdpError> {
        self.key_event(KeyEventType::KeyDown, key, None).await?;
        tokio::time::sleep(hold).await;
        self.key_event(KeyEventType::KeyUp, key, None).await
    }

    async fn key_event(
        &self,
        event_type: KeyEventType,
        key: &str,
        modifiers: Option<i32>,
    ) -> Result<(), CdpError> {
        let mut params = json!({
            "type": event_type,
            "key": key,
        });
        if let Some(m) = modifiers {
            params["modifiers"] = json!(m);
        }
        self.call("Input.dispatchKeyEvent", Some(params)).await?;
        Ok(())
    }
}

fn quad_center(quad: &[f64]) -> (f64, f64) {
    if quad.len() >= 8 {
        let x = (quad[0] + quad[2] + quad[4] + quad[6]) / 4.0;
        let y = (quad[1] + quad[3] + quad[5] + quad[7]) / 4.0;
        (x, y)
    } else {
        (0.0, 0.0)
    }
}
