//! TodoMVC E2E runner
//!
//! Runs the built-in scenario suite (plus any YAML scenarios) against a
//! TodoMVC app. Exits 0 when every scenario passed, 1 when any failed and 2
//! when the run itself could not be carried out.

use std::path::PathBuf;
use std::time::Duration;
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use todomvc_e2e::playwright::{BrowserKind, PlaywrightBrowser, PlaywrightConfig};
use todomvc_e2e::runner::{RunnerConfig, TestSuiteResult};
use todomvc_e2e::server::{ServerConfig, ServerHandle};
use todomvc_e2e::simulated::SimulatedBrowser;
use todomvc_e2e::{suite, Browser, E2eError, E2eResult, Scenario, TestRunner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DriverKind {
    /// Real browser through Playwright
    Playwright,
    /// In-memory TodoMVC model
    Simulated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BrowserArg {
    Chromium,
    Firefox,
    Webkit,
}

impl From<BrowserArg> for BrowserKind {
    fn from(arg: BrowserArg) -> Self {
        match arg {
            BrowserArg::Chromium => BrowserKind::Chromium,
            BrowserArg::Firefox => BrowserKind::Firefox,
            BrowserArg::Webkit => BrowserKind::Webkit,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "todomvc-e2e")]
#[command(about = "E2E scenario runner for TodoMVC")]
struct Args {
    /// URL of the app under test
    #[arg(long, env = "TODOMVC_BASE_URL", default_value = "http://127.0.0.1:5173")]
    base_url: String,

    /// Automation driver
    #[arg(long, env = "TODOMVC_DRIVER", value_enum, default_value_t = DriverKind::Playwright)]
    driver: DriverKind,

    /// Browser to use
    #[arg(long, value_enum, default_value_t = BrowserArg::Chromium)]
    browser: BrowserArg,

    /// Run in headless mode
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    headless: bool,

    /// Viewport width
    #[arg(long, default_value = "1280")]
    viewport_width: u32,

    /// Viewport height
    #[arg(long, default_value = "720")]
    viewport_height: u32,

    /// Default wait window for expectations, in milliseconds
    #[arg(long, env = "TODOMVC_EXPECT_TIMEOUT_MS", default_value = "5000")]
    timeout_ms: u64,

    /// Run only the scenario with this exact name
    #[arg(short, long)]
    name: Option<String>,

    /// Run only scenarios in this group
    #[arg(short, long)]
    group: Option<String>,

    /// Directory of additional YAML scenarios
    #[arg(short, long)]
    scenarios: Option<PathBuf>,

    /// Output directory for the report and failure screenshots
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,

    /// Directory for checkpoint screenshots
    #[arg(long, default_value = "test-results/screenshots")]
    screenshots: PathBuf,

    /// Command that serves the app; `{port}` is replaced with a free port
    #[arg(long, env = "TODOMVC_SERVER_CMD")]
    server_cmd: Option<String>,

    /// Directory providing the `playwright` node package
    #[arg(long, default_value = ".")]
    node_project: PathBuf,

    /// List the selected scenarios and exit
    #[arg(long)]
    list: bool,
}

fn main() {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

/// Built-in suite plus extra files, narrowed by group and name
fn select_scenarios(args: &Args) -> E2eResult<Vec<Scenario>> {
    let mut scenarios = suite::builtin();
    if let Some(dir) = &args.scenarios {
        let extra = Scenario::load_all(dir)?;
        info!("Loaded {} scenario(s) from {}", extra.len(), dir.display());
        scenarios.extend(extra);
    }

    if let Some(group) = &args.group {
        scenarios.retain(|s| &s.group == group);
    }
    if let Some(name) = &args.name {
        scenarios.retain(|s| &s.name == name);
        if scenarios.is_empty() {
            return Err(E2eError::ScenarioNotFound(name.clone()));
        }
    }

    Ok(scenarios)
}

async fn run<B: Browser>(
    runner: &TestRunner<B>,
    scenarios: &[Scenario],
) -> E2eResult<TestSuiteResult> {
    let results = runner.run_all(scenarios).await?;
    runner.write_results(&results)?;

    for failure in results.failures() {
        error!(
            "{} > {} failed after {}/{} steps (last checkpoint: {}, screenshot: {})",
            failure.group,
            failure.name,
            failure.steps_run,
            failure.steps_total,
            failure.last_checkpoint.as_deref().unwrap_or("none"),
            failure
                .failure_screenshot
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "none".to_string()),
        );
    }
    Ok(results)
}

async fn async_main(args: Args) -> E2eResult<bool> {
    let scenarios = select_scenarios(&args)?;

    if args.list {
        for scenario in &scenarios {
            println!("{} ({} checkpoints)", scenario.full_name(), scenario.checkpoints().len());
        }
        return Ok(true);
    }

    // Keep the server alive until the run is over
    let server = match &args.server_cmd {
        Some(cmd) => Some(ServerHandle::spawn(ServerConfig::from_command_line(cmd)).await?),
        None => None,
    };
    let base_url = server
        .as_ref()
        .map(|s| s.base_url().to_string())
        .unwrap_or_else(|| args.base_url.clone());

    let config = RunnerConfig {
        base_url,
        screenshot_dir: args.screenshots.clone(),
        output_dir: args.output.clone(),
        expect_timeout: Duration::from_millis(args.timeout_ms),
        ..Default::default()
    };

    let results = match args.driver {
        DriverKind::Simulated => {
            let runner = TestRunner::new(SimulatedBrowser::new(), config)?;
            run(&runner, &scenarios).await?
        }
        DriverKind::Playwright => {
            let browser = PlaywrightBrowser::launch(PlaywrightConfig {
                browser: args.browser.into(),
                headless: args.headless,
                viewport_width: args.viewport_width,
                viewport_height: args.viewport_height,
                project_dir: args.node_project.clone(),
                ..Default::default()
            })
            .await?;
            let runner = TestRunner::new(browser, config)?;
            let results = run(&runner, &scenarios).await;
            runner.browser().shutdown().await?;
            results?
        }
    };

    drop(server);
    Ok(results.failed == 0)
}
