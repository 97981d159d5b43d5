use std::path::PathBuf;

/// Default bound for every wait and assertion, matching the page's own
/// expectation that mocked calls settle well within five seconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Interval between polls of a pending wait or assertion.
pub const POLL_INTERVAL_MS: u64 = 100;

/// Upper bound for loading the scenario's document.
pub const NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// Settings shared by every scenario in one invocation.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Run Chrome without a window.
    pub headless: bool,
    /// Explicit Chrome binary; discovered automatically when `None`.
    pub chrome_path: Option<PathBuf>,
    /// Default timeout for waits and assertions, in milliseconds.
    pub timeout_ms: u64,
    pub window_width: u32,
    pub window_height: u32,
    /// Directory that relative target and fragment paths resolve against.
    pub base_dir: PathBuf,
    /// Overrides the scenario's own screenshot path.
    pub screenshot_override: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            window_width: 1280,
            window_height: 720,
            base_dir: PathBuf::from("."),
            screenshot_override: None,
        }
    }
}

impl RunnerConfig {
    /// Resolve a scenario-relative path against `base_dir`.
    pub fn resolve(&self, path: &std::path::Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_against_base_dir() {
        let config = RunnerConfig {
            base_dir: PathBuf::from("/srv/app"),
            ..Default::default()
        };
        assert_eq!(
            config.resolve(std::path::Path::new("index.html")),
            PathBuf::from("/srv/app/index.html")
        );
    }

    #[test]
    fn test_resolve_keeps_absolute_paths() {
        let config = RunnerConfig::default();
        assert_eq!(
            config.resolve(std::path::Path::new("/tmp/page.html")),
            PathBuf::from("/tmp/page.html")
        );
    }
}
