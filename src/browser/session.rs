use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::dom::document::NodeId;
use crate::dom::events::{DomEvent, WriteMode};
use crate::dom::page::{ComputedStyle, Page};
use crate::error::PageError;

/// How to start the bridge process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_node")]
    pub node: String,
    #[serde(default = "default_script")]
    pub script: PathBuf,
    #[serde(default = "default_headless")]
    pub headless: bool,
}

fn default_node() -> String {
    "node".to_string()
}

fn default_script() -> PathBuf {
    PathBuf::from("bridge/form_bridge.js")
}

fn default_headless() -> bool {
    true
}

impl Default for BrowserConfig {
    fn default() -> Self {
        BrowserConfig {
            node: default_node(),
            script: default_script(),
            headless: default_headless(),
        }
    }
}

/// Request sent to the bridge over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum BrowserRequest {
    Navigate { url: String },
    QueryAll {
        #[serde(skip_serializing_if = "Option::is_none")]
        scope: Option<usize>,
        selector: String,
    },
    Closest { node: usize, selector: String },
    Parent { node: usize },
    ById { id: String },
    Attr { node: usize, name: String },
    Text { node: usize },
    Value { node: usize },
    SetValue { node: usize, value: String, mode: WriteMode },
    ComputedStyle { node: usize },
    Dispatch {
        node: usize,
        event: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        key: Option<&'static str>,
    },
    Click { node: usize },
    Focus { node: usize },
    Blur { node: usize },
    Scroll { node: usize },
    Wait { duration_ms: u64 },
    Quit,
}

impl BrowserRequest {
    fn name(&self) -> &'static str {
        match self {
            BrowserRequest::Navigate { .. } => "navigate",
            BrowserRequest::QueryAll { .. } => "query_all",
            BrowserRequest::Closest { .. } => "closest",
            BrowserRequest::Parent { .. } => "parent",
            BrowserRequest::ById { .. } => "by_id",
            BrowserRequest::Attr { .. } => "attr",
            BrowserRequest::Text { .. } => "text",
            BrowserRequest::Value { .. } => "value",
            BrowserRequest::SetValue { .. } => "set_value",
            BrowserRequest::ComputedStyle { .. } => "computed_style",
            BrowserRequest::Dispatch { .. } => "dispatch",
            BrowserRequest::Click { .. } => "click",
            BrowserRequest::Focus { .. } => "focus",
            BrowserRequest::Blur { .. } => "blur",
            BrowserRequest::Scroll { .. } => "scroll",
            BrowserRequest::Wait { .. } => "wait",
            BrowserRequest::Quit => "quit",
        }
    }
}

/// Response received from the bridge over stdout (one JSON line).
#[derive(Debug, Deserialize)]
pub struct BrowserResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub ready: Option<bool>,
}

/// A live browser tab behind a long-lived Node.js bridge.
///
/// Commands go out as NDJSON on stdin and answers come back on stdout, one
/// line each. Node handles are integers minted by the bridge and stay valid
/// until the next navigation.
pub struct BrowserSession {
    child: Child,
    stdin: std::process::ChildStdin,
    reader: BufReader<std::process::ChildStdout>,
    script: String,
    closed: bool,
}

impl BrowserSession {
    pub fn launch(config: &BrowserConfig) -> Result<Self, PageError> {
        let script = config.script.display().to_string();
        let mut command = Command::new(&config.node);
        command.arg(&config.script);
        if !config.headless {
            command.arg("--headed");
        }
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| PageError::SubprocessSpawn {
                script: script.clone(),
                source: e,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| PageError::SessionIo(format!("Failed to capture stdin of {}", script)))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PageError::SessionIo(format!("Failed to capture stdout of {}", script)))?;
        let mut reader = BufReader::new(stdout);

        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(|e| PageError::SessionIo(format!("Failed to read ready signal: {}", e)))?;
        let response: BrowserResponse = serde_json::from_str(line.trim()).map_err(|e| PageError::JsonParse {
            context: format!("{} ready signal", script),
            source: e,
        })?;
        if !response.ok || response.ready != Some(true) {
            return Err(PageError::SessionProtocol {
                command: "launch".into(),
                error: format!("Did not receive ready signal from {}", script),
            });
        }

        debug!(target: "session", script = %script, "bridge ready");
        Ok(BrowserSession {
            child,
            stdin,
            reader,
            script,
            closed: false,
        })
    }

    fn send(&mut self, request: &BrowserRequest) -> Result<BrowserResponse, PageError> {
        let json = serde_json::to_string(request).map_err(|e| PageError::JsonSerialize {
            context: "BrowserRequest".into(),
            source: e,
        })?;

        writeln!(self.stdin, "{}", json)
            .and_then(|_| self.stdin.flush())
            .map_err(|e| PageError::SessionIo(format!("Failed to write to {}: {}", self.script, e)))?;

        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .map_err(|e| PageError::SessionIo(format!("Failed to read from {}: {}", self.script, e)))?;
        if line.trim().is_empty() {
            return Err(PageError::SessionIo(format!(
                "Empty response from {} (process may have died)",
                self.script
            )));
        }

        serde_json::from_str(line.trim()).map_err(|e| PageError::JsonParse {
            context: format!("{} response", self.script),
            source: e,
        })
    }

    /// Sends `request`, checks `ok`, and decodes `data` as `T`.
    fn call<T: DeserializeOwned>(&mut self, request: BrowserRequest) -> Result<T, PageError> {
        let response = self.send(&request)?;
        if !response.ok {
            return Err(PageError::SessionProtocol {
                command: request.name().into(),
                error: response.error.unwrap_or_else(|| "Unknown error".into()),
            });
        }
        serde_json::from_value(response.data.unwrap_or(Value::Null)).map_err(|e| PageError::JsonParse {
            context: format!("{} result", request.name()),
            source: e,
        })
    }

    fn call_unit(&mut self, request: BrowserRequest) -> Result<(), PageError> {
        let _: Value = self.call(request)?;
        Ok(())
    }

    pub fn navigate(&mut self, url: &str) -> Result<(), PageError> {
        self.call_unit(BrowserRequest::Navigate { url: url.to_string() })
    }

    pub fn quit(&mut self) -> Result<(), PageError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if let Err(e) = self.send(&BrowserRequest::Quit) {
            debug!(target: "session", error = %e, "bridge did not acknowledge quit");
        }
        if let Err(e) = self.child.wait() {
            warn!(target: "session", error = %e, "failed to reap bridge process");
        }
        Ok(())
    }
}

fn ids(raw: Vec<usize>) -> Vec<NodeId> {
    raw.into_iter().map(NodeId).collect()
}

impl Page for BrowserSession {
    fn query_all(&mut self, scope: Option<NodeId>, selector: &str) -> Result<Vec<NodeId>, PageError> {
        let raw: Vec<usize> = self.call(BrowserRequest::QueryAll {
            scope: scope.map(|s| s.0),
            selector: selector.to_string(),
        })?;
        Ok(ids(raw))
    }

    fn closest(&mut self, node: NodeId, selector: &str) -> Result<Option<NodeId>, PageError> {
        let raw: Option<usize> = self.call(BrowserRequest::Closest {
            node: node.0,
            selector: selector.to_string(),
        })?;
        Ok(raw.map(NodeId))
    }

    fn parent(&mut self, node: NodeId) -> Result<Option<NodeId>, PageError> {
        let raw: Option<usize> = self.call(BrowserRequest::Parent { node: node.0 })?;
        Ok(raw.map(NodeId))
    }

    fn element_by_id(&mut self, id: &str) -> Result<Option<NodeId>, PageError> {
        let raw: Option<usize> = self.call(BrowserRequest::ById { id: id.to_string() })?;
        Ok(raw.map(NodeId))
    }

    fn attr(&mut self, node: NodeId, name: &str) -> Result<Option<String>, PageError> {
        self.call(BrowserRequest::Attr {
            node: node.0,
            name: name.to_string(),
        })
    }

    fn text(&mut self, node: NodeId) -> Result<String, PageError> {
        let text: Option<String> = self.call(BrowserRequest::Text { node: node.0 })?;
        Ok(text.unwrap_or_default())
    }

    fn value(&mut self, node: NodeId) -> Result<String, PageError> {
        let value: Option<String> = self.call(BrowserRequest::Value { node: node.0 })?;
        Ok(value.unwrap_or_default())
    }

    fn set_value(&mut self, node: NodeId, value: &str, mode: WriteMode) -> Result<(), PageError> {
        self.call_unit(BrowserRequest::SetValue {
            node: node.0,
            value: value.to_string(),
            mode,
        })
    }

    fn computed_style(&mut self, node: NodeId) -> Result<ComputedStyle, PageError> {
        self.call(BrowserRequest::ComputedStyle { node: node.0 })
    }

    fn dispatch(&mut self, node: NodeId, event: DomEvent) -> Result<(), PageError> {
        self.call_unit(BrowserRequest::Dispatch {
            node: node.0,
            event: event.name(),
            key: event.key(),
        })
    }

    fn click(&mut self, node: NodeId) -> Result<(), PageError> {
        self.call_unit(BrowserRequest::Click { node: node.0 })
    }

    fn focus(&mut self, node: NodeId) -> Result<(), PageError> {
        self.call_unit(BrowserRequest::Focus { node: node.0 })
    }

    fn blur(&mut self, node: NodeId) -> Result<(), PageError> {
        self.call_unit(BrowserRequest::Blur { node: node.0 })
    }

    fn scroll_into_view(&mut self, node: NodeId) -> Result<(), PageError> {
        self.call_unit(BrowserRequest::Scroll { node: node.0 })
    }

    fn pause(&mut self, ms: u64) -> Result<(), PageError> {
        self.call_unit(BrowserRequest::Wait { duration_ms: ms })
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}
