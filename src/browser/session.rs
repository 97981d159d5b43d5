use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;

use super::launcher;
use crate::config::RunnerConfig;
use crate::error::VerifyError;

/// One browser process with exactly one page, owned for the length of a
/// scenario run.
pub struct BrowserSession {
    browser: Browser,
    handler_task: tokio::task::JoinHandle<()>,
    page: Page,
    // Dropped after the browser, which removes the throwaway profile.
    _profile_dir: tempfile::TempDir,
}

impl BrowserSession {
    /// Launch a new browser and open a blank page.
    pub async fn launch(config: &RunnerConfig) -> Result<Self> {
        let chrome = launcher::resolve_chrome(config.chrome_path.as_deref())?;
        let profile_dir = tempfile::tempdir().context("Failed to create profile directory")?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome)
            .user_data_dir(profile_dir.path())
            .args(launcher::default_chrome_args())
            .window_size(config.window_width, config.window_height);

        builder = if config.headless {
            builder.new_headless_mode()
        } else {
            builder.with_head()
        };

        let browser_config = builder.build().map_err(VerifyError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| VerifyError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to create initial page")?;

        tracing::info!("Browser session started (headless: {})", config.headless);

        Ok(Self {
            browser,
            handler_task,
            page,
            _profile_dir: profile_dir,
        })
    }

    /// The session's only page.
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Close the browser and reap the process. Problems are logged, never
    /// raised, so teardown cannot mask the scenario outcome.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("Browser close failed: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            tracing::warn!("Waiting for browser exit failed: {}", e);
        }
        self.handler_task.abort();
        tracing::info!("Browser session closed");
    }
}
