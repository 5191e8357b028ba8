//! Playwright browser automation
//!
//! A single long-lived Node process hosts the browser. Rust talks to it over
//! stdin/stdout, one JSON object per line:
//!
//! ```text
//! > {"id":7,"op":"fill","page":2,"locator":{"segments":[...]},"value":"milk"}
//! < {"id":7,"ok":true,"value":null}
//! ```
//!
//! Every `new_page` opens a fresh browser context, so pages never share
//! storage.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use crate::page::{Browser, Key, Page};

/// Extra time allowed on top of the in-browser action timeout
const REQUEST_GRACE: Duration = Duration::from_secs(10);

const BRIDGE_SCRIPT: &str = r#"
const { createRequire } = require('module');
const readline = require('readline');

const playwright = createRequire(process.cwd() + '/')('playwright');

const env = process.env;
const kind = env.TODOMVC_E2E_BROWSER || 'chromium';
const headless = env.TODOMVC_E2E_HEADLESS !== 'false';
const viewport = {
  width: Number(env.TODOMVC_E2E_VIEWPORT_WIDTH || 1280),
  height: Number(env.TODOMVC_E2E_VIEWPORT_HEIGHT || 720),
};
const actionTimeout = Number(env.TODOMVC_E2E_ACTION_TIMEOUT_MS || 5000);

const pages = new Map();
let nextPage = 1;

function send(message) {
  process.stdout.write(JSON.stringify(message) + '\n');
}

function resolve(page, locator) {
  let current = page;
  for (const seg of locator.segments) {
    switch (seg.by) {
      case 'placeholder': current = current.getByPlaceholder(seg.text); break;
      case 'test_id': current = current.getByTestId(seg.id); break;
      case 'role':
        current = seg.name === undefined
          ? current.getByRole(seg.role)
          : current.getByRole(seg.role, { name: seg.name });
        break;
      case 'label': current = current.getByLabel(seg.text); break;
      case 'css': current = current.locator(seg.selector); break;
      default: throw new Error('unknown selector: ' + seg.by);
    }
    if (seg.nth !== undefined) current = current.nth(seg.nth);
  }
  return current;
}

function pageFor(req) {
  const entry = pages.get(req.page);
  if (!entry) throw new Error('no such page: ' + req.page);
  return entry.page;
}

async function handle(browser, req) {
  if (req.op === 'new_page') {
    const context = await browser.newContext({ viewport });
    context.setDefaultTimeout(actionTimeout);
    const page = await context.newPage();
    const id = nextPage++;
    pages.set(id, { context, page });
    return id;
  }
  if (req.op === 'close') {
    const entry = pages.get(req.page);
    if (entry) {
      pages.delete(req.page);
      await entry.context.close();
    }
    return null;
  }

  const page = pageFor(req);
  const target = () => resolve(page, req.locator);
  switch (req.op) {
    case 'goto': await page.goto(req.url); return null;
    case 'reload': await page.reload(); return null;
    case 'fill': await target().fill(req.value); return null;
    case 'press': await target().press(req.key); return null;
    case 'click': await target().click(); return null;
    case 'dblclick': await target().dblclick(); return null;
    case 'hover': await target().hover(); return null;
    case 'blur': await target().blur(); return null;
    case 'set_checked': await target().setChecked(req.checked); return null;
    case 'texts': return await target().allTextContents();
    case 'count': return await target().count();
    case 'class_names':
      return await target().evaluateAll(els => els.map(e => e.getAttribute('class') || ''));
    case 'input_value': return await target().inputValue();
    case 'is_visible': return await target().isVisible();
    case 'screenshot':
      await page.screenshot({ path: req.path, fullPage: req.full_page });
      return null;
    default: throw new Error('unknown op: ' + req.op);
  }
}

(async () => {
  const browser = await playwright[kind].launch({ headless });
  const input = readline.createInterface({ input: process.stdin });
  send({ ready: true });

  for await (const line of input) {
    if (!line.trim()) continue;
    const req = JSON.parse(line);
    if (req.op === 'shutdown') {
      send({ id: req.id, ok: true, value: null });
      break;
    }
    try {
      send({ id: req.id, ok: true, value: await handle(browser, req) ?? null });
    } catch (err) {
      send({ id: req.id, ok: false, error: String(err && err.message || err) });
    }
  }

  await browser.close();
  process.exit(0);
})().catch(err => {
  process.stderr.write(String(err && err.stack || err) + '\n');
  process.exit(1);
});
"#;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chromium => "chromium",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Webkit => "webkit",
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub browser: BrowserKind,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Node executable used to host the bridge
    pub node_binary: PathBuf,

    /// Directory whose `node_modules` provides `playwright`
    pub project_dir: PathBuf,

    /// Default timeout for individual browser actions
    pub action_timeout_ms: u64,

    /// How long to wait for the browser to come up
    pub launch_timeout: Duration,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: BrowserKind::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            node_binary: PathBuf::from("node"),
            project_dir: PathBuf::from("."),
            action_timeout_ms: 5000,
            launch_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
}

struct BridgeIo {
    writer: BufWriter<ChildStdin>,
    lines: Lines<BufReader<ChildStdout>>,
}

impl BridgeIo {
    /// Next parseable message; anything else on stdout is logged and skipped
    async fn read_response(&mut self) -> E2eResult<Response> {
        loop {
            let line = self
                .lines
                .next_line()
                .await?
                .ok_or_else(|| E2eError::Driver("Playwright bridge exited".to_string()))?;
            match serde_json::from_str::<Response>(&line) {
                Ok(response) => return Ok(response),
                Err(_) => debug!("[bridge stdout] {}", line),
            }
        }
    }
}

/// Connection to the Node process hosting the browser
struct Bridge {
    io: tokio::sync::Mutex<BridgeIo>,
    child: tokio::sync::Mutex<Child>,
    next_id: AtomicU64,
    request_timeout: Duration,
    _script_dir: tempfile::TempDir,
}

impl Bridge {
    fn build_request(id: u64, op: &str, page: Option<u64>, args: Value) -> Value {
        let mut request = match args {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        request.insert("id".to_string(), json!(id));
        request.insert("op".to_string(), json!(op));
        if let Some(page) = page {
            request.insert("page".to_string(), json!(page));
        }
        Value::Object(request)
    }

    async fn call(&self, op: &str, page: Option<u64>, args: Value) -> E2eResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = serde_json::to_string(&Self::build_request(id, op, page, args))?;
        debug!("bridge >>> {}", request);

        let mut io = self.io.lock().await;
        io.writer.write_all(request.as_bytes()).await?;
        io.writer.write_all(b"\n").await?;
        io.writer.flush().await?;

        let wait = async {
            loop {
                let response = io.read_response().await?;
                match response.id {
                    Some(rid) if rid == id => return Ok::<_, E2eError>(response),
                    // Late answer to a request that already timed out
                    other => warn!("Discarding bridge response {:?} while waiting for {}", other, id),
                }
            }
        };

        let response = tokio::time::timeout(self.request_timeout, wait)
            .await
            .map_err(|_| E2eError::Driver(format!("{} timed out after {:?}", op, self.request_timeout)))??;

        if response.ok {
            Ok(response.value)
        } else {
            Err(E2eError::Driver(format!(
                "{} failed: {}",
                op,
                response.error.unwrap_or_else(|| "unknown error".to_string())
            )))
        }
    }
}

/// Browser driven through Playwright
pub struct PlaywrightBrowser {
    bridge: Arc<Bridge>,
    config: PlaywrightConfig,
}

impl PlaywrightBrowser {
    /// Start the bridge and launch the browser
    pub async fn launch(config: PlaywrightConfig) -> E2eResult<Self> {
        check_playwright_installed(&config.project_dir)?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, BRIDGE_SCRIPT)?;

        info!(
            "Launching {} (headless: {}, viewport {}x{})",
            config.browser.as_str(),
            config.headless,
            config.viewport_width,
            config.viewport_height
        );

        let mut child = TokioCommand::new(&config.node_binary)
            .arg(&script_path)
            .current_dir(&config.project_dir)
            .env("TODOMVC_E2E_BROWSER", config.browser.as_str())
            .env("TODOMVC_E2E_HEADLESS", config.headless.to_string())
            .env("TODOMVC_E2E_VIEWPORT_WIDTH", config.viewport_width.to_string())
            .env("TODOMVC_E2E_VIEWPORT_HEIGHT", config.viewport_height.to_string())
            .env("TODOMVC_E2E_ACTION_TIMEOUT_MS", config.action_timeout_ms.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| E2eError::Driver(format!("Failed to start {}: {}", config.node_binary.display(), e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Driver("Failed to get bridge stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Driver("Failed to get bridge stdout".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("[bridge] {}", line);
                }
            });
        }

        let mut io = BridgeIo {
            writer: BufWriter::new(stdin),
            lines: BufReader::new(stdout).lines(),
        };

        let ready = tokio::time::timeout(config.launch_timeout, io.read_response())
            .await
            .map_err(|_| E2eError::Driver(format!("Browser did not start within {:?}", config.launch_timeout)))??;
        if !ready.ready {
            return Err(E2eError::Driver(format!("Unexpected bridge greeting: {:?}", ready)));
        }
        debug!("Playwright bridge ready");

        let bridge = Bridge {
            io: tokio::sync::Mutex::new(io),
            child: tokio::sync::Mutex::new(child),
            next_id: AtomicU64::new(1),
            request_timeout: Duration::from_millis(config.action_timeout_ms) + REQUEST_GRACE,
            _script_dir: script_dir,
        };

        Ok(Self {
            bridge: Arc::new(bridge),
            config,
        })
    }

    pub fn config(&self) -> &PlaywrightConfig {
        &self.config
    }

    /// Close the browser and wait for the bridge to exit
    pub async fn shutdown(&self) -> E2eResult<()> {
        if let Err(e) = self.bridge.call("shutdown", None, Value::Null).await {
            warn!("Bridge shutdown request failed: {}", e);
        }

        let mut child = self.bridge.child.lock().await;
        match tokio::time::timeout(Duration::from_secs(10), child.wait()).await {
            Ok(status) => {
                debug!("Playwright bridge exited: {}", status?);
            }
            Err(_) => {
                warn!("Playwright bridge did not exit, killing");
                child.kill().await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Browser for PlaywrightBrowser {
    type Page = PlaywrightPage;

    async fn new_page(&self) -> E2eResult<PlaywrightPage> {
        let value = self.bridge.call("new_page", None, Value::Null).await?;
        let id = value
            .as_u64()
            .ok_or_else(|| E2eError::Driver(format!("Invalid page id: {}", value)))?;
        Ok(PlaywrightPage {
            bridge: Arc::clone(&self.bridge),
            id,
        })
    }
}

/// One page in its own browser context
pub struct PlaywrightPage {
    bridge: Arc<Bridge>,
    id: u64,
}

impl PlaywrightPage {
    async fn call(&self, op: &str, args: Value) -> E2eResult<Value> {
        self.bridge.call(op, Some(self.id), args).await
    }

    async fn act(&self, op: &str, locator: &Locator) -> E2eResult<()> {
        self.call(op, json!({ "locator": locator })).await?;
        Ok(())
    }
}

#[async_trait]
impl Page for PlaywrightPage {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        self.call("goto", json!({ "url": url })).await?;
        Ok(())
    }

    async fn reload(&self) -> E2eResult<()> {
        self.call("reload", Value::Null).await?;
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        self.call("fill", json!({ "locator": locator, "value": value })).await?;
        Ok(())
    }

    async fn press(&self, locator: &Locator, key: Key) -> E2eResult<()> {
        self.call("press", json!({ "locator": locator, "key": key.as_str() })).await?;
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> E2eResult<()> {
        self.act("click", locator).await
    }

    async fn dblclick(&self, locator: &Locator) -> E2eResult<()> {
        self.act("dblclick", locator).await
    }

    async fn hover(&self, locator: &Locator) -> E2eResult<()> {
        self.act("hover", locator).await
    }

    async fn blur(&self, locator: &Locator) -> E2eResult<()> {
        self.act("blur", locator).await
    }

    async fn set_checked(&self, locator: &Locator, checked: bool) -> E2eResult<()> {
        self.call("set_checked", json!({ "locator": locator, "checked": checked })).await?;
        Ok(())
    }

    async fn texts(&self, locator: &Locator) -> E2eResult<Vec<String>> {
        let value = self.call("texts", json!({ "locator": locator })).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        let value = self.call("count", json!({ "locator": locator })).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn class_names(&self, locator: &Locator) -> E2eResult<Vec<String>> {
        let value = self.call("class_names", json!({ "locator": locator })).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn input_value(&self, locator: &Locator) -> E2eResult<String> {
        let value = self.call("input_value", json!({ "locator": locator })).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn is_visible(&self, locator: &Locator) -> E2eResult<bool> {
        let value = self.call("is_visible", json!({ "locator": locator })).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> E2eResult<()> {
        // The bridge runs in another directory
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.call(
            "screenshot",
            json!({ "path": path.to_string_lossy(), "full_page": full_page }),
        )
        .await?;
        Ok(())
    }

    async fn close(&self) -> E2eResult<()> {
        self.call("close", Value::Null).await?;
        Ok(())
    }
}

/// Check if Playwright is installed
pub fn check_playwright_installed(project_dir: &Path) -> E2eResult<()> {
    let output = Command::new("npx")
        .args(["playwright", "--version"])
        .current_dir(project_dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match output {
        Ok(status) if status.success() => Ok(()),
        _ => Err(E2eError::PlaywrightNotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_merges_args() {
        let locator = Locator::test_id("todo-item").nth(1);
        let request = Bridge::build_request(3, "fill", Some(2), json!({ "locator": locator, "value": "x" }));

        assert_eq!(request["id"], 3);
        assert_eq!(request["op"], "fill");
        assert_eq!(request["page"], 2);
        assert_eq!(request["value"], "x");
        assert_eq!(request["locator"]["segments"][0]["by"], "test_id");
        assert_eq!(request["locator"]["segments"][0]["nth"], 1);
    }

    #[test]
    fn test_build_request_without_page() {
        let request = Bridge::build_request(1, "new_page", None, Value::Null);
        assert_eq!(request, json!({ "id": 1, "op": "new_page" }));
    }

    #[test]
    fn test_parse_responses() {
        let ready: Response = serde_json::from_str(r#"{"ready":true}"#).unwrap();
        assert!(ready.ready);
        assert_eq!(ready.id, None);

        let failed: Response =
            serde_json::from_str(r#"{"id":4,"ok":false,"error":"strict mode violation"}"#).unwrap();
        assert_eq!(failed.id, Some(4));
        assert!(!failed.ok);
        assert_eq!(failed.error.as_deref(), Some("strict mode violation"));
    }

    #[test]
    fn test_browser_kind_names() {
        assert_eq!(BrowserKind::default().as_str(), "chromium");
        let kind: BrowserKind = serde_json::from_str("\"webkit\"").unwrap();
        assert_eq!(kind, BrowserKind::Webkit);
    }

    #[test]
    fn test_bridge_script_handles_every_op() {
        for op in [
            "new_page", "close", "goto", "reload", "fill", "press", "click", "dblclick", "hover",
            "blur", "set_checked", "texts", "count", "class_names", "input_value", "is_visible",
            "screenshot", "shutdown",
        ] {
            assert!(BRIDGE_SCRIPT.contains(&format!("'{}'", op)), "missing op {}", op);
        }
    }

    #[test]
    fn test_bridge_reads_resolve_strictly() {
        assert!(BRIDGE_SCRIPT.contains("case 'input_value': return await target().inputValue();"));
        assert!(BRIDGE_SCRIPT.contains("case 'is_visible': return await target().isVisible();"));
        assert!(!BRIDGE_SCRIPT.contains("first()"));
    }
}
