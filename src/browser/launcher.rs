use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::error::VerifyError;

/// Environment variable naming the browser binary to use.
pub const CHROME_ENV: &str = "CHROME_PATH";

const PATH_NAMES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

/// Decide which browser binary to launch: an explicit path, then
/// `$CHROME_PATH`, then the well-known install locations, then `PATH`.
pub fn resolve_chrome(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(VerifyError::ChromeNotFound(format!("{} (given explicitly)", path.display())).into());
    }

    let from_env = std::env::var_os(CHROME_ENV).map(PathBuf::from);
    let mut searched = Vec::new();
    for path in from_env.into_iter().chain(install_locations()) {
        if path.is_file() {
            tracing::info!("Using browser at {}", path.display());
            return Ok(path);
        }
        searched.push(path.display().to_string());
    }

    for name in PATH_NAMES {
        if let Ok(path) = which::which(name) {
            tracing::info!("Using browser from PATH: {}", path.display());
            return Ok(path);
        }
        searched.push(format!("{} (PATH)", name));
    }

    Err(VerifyError::ChromeNotFound(searched.join("\n")).into())
}

fn install_locations() -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = Vec::new();

    if cfg!(target_os = "linux") {
        found.extend(
            [
                "/usr/bin/google-chrome",
                "/usr/bin/google-chrome-stable",
                "/usr/bin/chromium",
                "/usr/bin/chromium-browser",
                "/snap/bin/chromium",
            ]
            .map(PathBuf::from),
        );
    } else if cfg!(target_os = "macos") {
        let app = "Google Chrome.app/Contents/MacOS/Google Chrome";
        found.push(Path::new("/Applications").join(app));
        found.push(PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"));
        if let Some(home) = std::env::var_os("HOME") {
            found.push(Path::new(&home).join("Applications").join(app));
        }
    } else if cfg!(target_os = "windows") {
        for var in ["PROGRAMFILES", "LOCALAPPDATA"] {
            if let Some(root) = std::env::var_os(var) {
                found.push(Path::new(&root).join(r"Google\Chrome\Application\chrome.exe"));
            }
        }
    }

    found
}

/// Launch flags for a verification run. Profile directory, debugging port
/// and headless mode go through `BrowserConfig` instead.
pub fn default_chrome_args() -> Vec<String> {
    [
        "--no-sandbox",
        "--no-first-run",
        "--no-default-browser-check",
        "--disable-background-networking",
        "--disable-default-apps",
        "--disable-extensions",
        "--disable-popup-blocking",
        "--disable-sync",
        "--disable-translate",
        "--allow-file-access-from-files",
        "--force-device-scale-factor=1",
        "--hide-scrollbars",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args_leave_headless_and_port_to_config() {
        let args = default_chrome_args();
        assert!(!args.iter().any(|a| a.starts_with("--headless")));
        assert!(!args.iter().any(|a| a.starts_with("--remote-debugging-port")));
        assert!(!args.iter().any(|a| a.starts_with("--user-data-dir")));
        assert!(args.contains(&"--allow-file-access-from-files".to_string()));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let err = resolve_chrome(Some(Path::new("/no/such/chrome"))).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VerifyError>(),
            Some(VerifyError::ChromeNotFound(msg)) if msg.contains("/no/such/chrome")
        ));
    }

    #[test]
    fn test_explicit_path_is_used_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("chrome");
        std::fs::write(&fake, "").unwrap();
        assert_eq!(resolve_chrome(Some(&fake)).unwrap(), fake);
    }
}
