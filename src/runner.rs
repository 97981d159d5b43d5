//! Linear scenario execution.
//!
//! setup → navigate → steps → screenshot, with the browser torn down on every
//! path. The first failing step aborts the run.

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotParams;
use chromiumoxide::page::Page;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::bridge::expect_called;
use crate::browser::BrowserSession;
use crate::compose::Composer;
use crate::config::{RunnerConfig, NAVIGATION_TIMEOUT_MS};
use crate::error::VerifyError;
use crate::expect::expect;
use crate::interaction::{
    click, dispatch_event, fill, press, select_option, wait_for, ClickCount,
};
use crate::scenario::{Scenario, Step, Target};

/// Outcome of one scenario run.
#[derive(Debug)]
pub struct RunReport {
    pub scenario: String,
    pub steps_executed: usize,
    pub total_steps: usize,
    pub elapsed_ms: u128,
    /// Written only when every step passed.
    pub screenshot: Option<PathBuf>,
    pub error: Option<anyhow::Error>,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    pub fn format_output(&self) -> String {
        let mut out = String::new();
        if self.success() {
            out.push_str(&format!(
                "PASS {} ({} steps in {}ms)\n",
                self.scenario, self.total_steps, self.elapsed_ms
            ));
        } else {
            out.push_str(&format!(
                "FAIL {} ({}/{} steps passed in {}ms)\n",
                self.scenario, self.steps_executed, self.total_steps, self.elapsed_ms
            ));
        }
        if let Some(ref err) = self.error {
            out.push_str(&format!("Error: {:#}\n", err));
        }
        if let Some(ref path) = self.screenshot {
            out.push_str(&format!("Screenshot: {}", path.display()));
        }
        out.trim_end().to_string()
    }
}

pub struct ScenarioRunner {
    config: RunnerConfig,
}

impl ScenarioRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Run `scenario` start to finish in its own browser session.
    pub async fn run(&self, scenario: &Scenario) -> RunReport {
        let start = Instant::now();
        tracing::info!("Running scenario '{}' ({})", scenario.name, scenario.target);

        let mut executed = 0;
        let result = self.execute(scenario, &mut executed).await;
        let elapsed_ms = start.elapsed().as_millis();

        let (screenshot, error) = match result {
            Ok(path) => {
                tracing::info!("Scenario '{}' passed in {}ms", scenario.name, elapsed_ms);
                (Some(path), None)
            }
            Err(e) => {
                tracing::error!("Scenario '{}' failed: {:#}", scenario.name, e);
                (None, Some(e))
            }
        };

        RunReport {
            scenario: scenario.name.clone(),
            steps_executed: executed,
            total_steps: scenario.steps.len(),
            elapsed_ms,
            screenshot,
            error,
        }
    }

    async fn execute(&self, scenario: &Scenario, executed: &mut usize) -> Result<PathBuf> {
        let session = BrowserSession::launch(&self.config).await?;
        let outcome = self.drive(session.page(), scenario, executed).await;
        session.close().await;
        outcome
    }

    async fn drive(&self, page: &Page, scenario: &Scenario, executed: &mut usize) -> Result<PathBuf> {
        scenario.bridge.install(page).await?;

        // Holds the assembled document on disk until the run is over.
        let _assembled = self.navigate(page, &scenario.target).await?;

        let timeout_ms = scenario.timeout_ms.unwrap_or(self.config.timeout_ms);
        let total = scenario.steps.len();
        for (i, step) in scenario.steps.iter().enumerate() {
            let index = i + 1;
            tracing::info!("[{}/{}] {}", index, total, step);
            run_step(page, step, timeout_ms)
                .await
                .map_err(|source| VerifyError::StepFailed {
                    index,
                    step: step.to_string(),
                    source,
                })?;
            *executed += 1;
        }

        let path = self.screenshot_path(scenario);
        capture(page, &path).await?;
        Ok(path)
    }

    /// Load the target document. Composite targets are assembled into a
    /// temporary file first so the page still gets a real document load
    /// (and with it the bridge init script).
    async fn navigate(&self, page: &Page, target: &Target) -> Result<Option<tempfile::TempDir>> {
        let (path, assembled) = match target {
            Target::File { path } => (self.config.resolve(path), None),
            Target::Composite { host, fragments } => {
                let html = Composer::new(self.config.base_dir.clone())?
                    .with_fragments(fragments.iter().cloned())
                    .assemble(host)?;
                let dir = tempfile::tempdir().context("Failed to create directory for assembled page")?;
                let file_name = host
                    .file_name()
                    .map(|n| n.to_os_string())
                    .unwrap_or_else(|| "index.html".into());
                let path = dir.path().join(file_name);
                tokio::fs::write(&path, html)
                    .await
                    .with_context(|| format!("Failed to write assembled page {}", path.display()))?;
                (path, Some(dir))
            }
        };

        let url = file_url(&path)?;
        tracing::info!("Navigating to: {}", url);
        tokio::time::timeout(Duration::from_millis(NAVIGATION_TIMEOUT_MS), page.goto(&url))
            .await
            .map_err(|_| VerifyError::Timeout {
                what: format!("{} to load", url),
                timeout_ms: NAVIGATION_TIMEOUT_MS,
            })?
            .with_context(|| format!("Failed to navigate to {}", url))?;

        // goto() returns on the load event; give post-load handlers a beat.
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(assembled)
    }

    fn screenshot_path(&self, scenario: &Scenario) -> PathBuf {
        match &self.config.screenshot_override {
            Some(path) => path.clone(),
            None => self.config.resolve(&scenario.screenshot),
        }
    }
}

fn file_url(path: &Path) -> Result<String> {
    let absolute = std::fs::canonicalize(path)
        .with_context(|| format!("Target document {} not found", path.display()))?;
    Ok(format!("file://{}", absolute.display()))
}

async fn run_step(page: &Page, step: &Step, timeout_ms: u64) -> Result<()> {
    match step {
        Step::Fill { target, value } => fill(page, target, value, timeout_ms).await,
        Step::Click { target } => {
            let result = click(page, target, ClickCount::Single, timeout_ms).await?;
            tracing::debug!("Clicked {} via {}", target, result.method_used);
            Ok(())
        }
        Step::DblClick { target } => {
            let result = click(page, target, ClickCount::Double, timeout_ms).await?;
            tracing::debug!("Double-clicked {} via {}", target, result.method_used);
            Ok(())
        }
        Step::Select { target, option } => select_option(page, target, option, timeout_ms).await,
        Step::Press { target, key } => press(page, target.as_ref(), key, timeout_ms).await,
        Step::Dispatch { event, on } => dispatch_event(page, on, event, timeout_ms).await,
        Step::WaitFor {
            target,
            state,
            timeout_ms: own,
        } => wait_for(page, target, *state, own.unwrap_or(timeout_ms)).await,
        Step::Sleep { ms } => {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
            Ok(())
        }
        Step::Expect {
            target,
            to,
            timeout_ms: own,
        } => expect(page, target, to, own.unwrap_or(timeout_ms)).await,
        Step::ExpectCalled {
            method,
            times,
            timeout_ms: own,
        } => expect_called(page, method, *times, own.unwrap_or(timeout_ms)).await,
    }
}

/// Full-page PNG written to `path`, creating parent directories and
/// replacing any previous file.
pub async fn capture(page: &Page, path: &Path) -> Result<()> {
    let bytes = page
        .screenshot(
            CaptureScreenshotParams::builder()
                .capture_beyond_viewport(true)
                .build(),
        )
        .await
        .context("Failed to take full page screenshot")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, &bytes)
        .await
        .with_context(|| format!("Failed to write screenshot {}", path.display()))?;
    tracing::info!("Screenshot saved to {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(error: Option<anyhow::Error>) -> RunReport {
        RunReport {
            scenario: "duplicate-house".into(),
            steps_executed: 3,
            total_steps: 10,
            elapsed_ms: 1234,
            screenshot: None,
            error,
        }
    }

    #[test]
    fn test_format_failed_report() {
        let err = anyhow::Error::new(VerifyError::StepFailed {
            index: 4,
            step: "click css=#addHouseBtn".into(),
            source: anyhow::anyhow!("boom"),
        });
        let out = report(Some(err)).format_output();
        assert!(out.starts_with("FAIL duplicate-house (3/10 steps passed in 1234ms)"));
        assert!(out.contains("Step 4 (click css=#addHouseBtn) failed"));
    }

    #[test]
    fn test_format_passed_report() {
        let mut r = report(None);
        r.screenshot = Some(PathBuf::from("verification/duplicate-house.png"));
        assert_eq!(
            r.format_output(),
            "PASS duplicate-house (10 steps in 1234ms)\nScreenshot: verification/duplicate-house.png"
        );
    }

    #[test]
    fn test_screenshot_override_wins() {
        let runner = ScenarioRunner::new(RunnerConfig {
            base_dir: PathBuf::from("/srv/app"),
            screenshot_override: Some(PathBuf::from("/tmp/shot.png")),
            ..Default::default()
        });
        let scenario = crate::scenario::builtin::duplicate_house();
        assert_eq!(runner.screenshot_path(&scenario), PathBuf::from("/tmp/shot.png"));

        let runner = ScenarioRunner::new(RunnerConfig {
            base_dir: PathBuf::from("/srv/app"),
            ..Default::default()
        });
        assert_eq!(
            runner.screenshot_path(&scenario),
            PathBuf::from("/srv/app/verification/duplicate-house.png")
        );
    }

    #[test]
    fn test_file_url_requires_existing_file() {
        assert!(file_url(Path::new("/definitely/not/here.html")).is_err());
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("index.html");
        std::fs::write(&page, "<html></html>").unwrap();
        assert!(file_url(&page).unwrap().starts_with("file:///"));
    }
}
