//! Composite document assembly.
//!
//! Host templates pull in partials with `<?!= include('name'); ?>`. Before a
//! page can be loaded from disk every directive is replaced with the
//! literal content of the named fragment, recursively.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::VerifyError;

const INCLUDE_PATTERN: &str = r#"<\?!=\s*include\(\s*['"]([^'"]+)['"]\s*\)\s*;?\s*\?>"#;

/// How fragment content is inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Wrap {
    #[default]
    None,
    Style,
    Script,
}

/// An explicitly registered fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// Name used inside `include('...')`.
    pub name: String,
    /// File holding the content, relative to the base directory.
    pub path: PathBuf,
    #[serde(default)]
    pub wrap: Wrap,
}

pub struct Composer {
    base_dir: PathBuf,
    fragments: HashMap<String, Fragment>,
    pattern: Regex,
}

impl Composer {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            base_dir: base_dir.into(),
            fragments: HashMap::new(),
            pattern: Regex::new(INCLUDE_PATTERN).context("Invalid include pattern")?,
        })
    }

    pub fn with_fragments(mut self, fragments: impl IntoIterator<Item = Fragment>) -> Self {
        for fragment in fragments {
            self.fragments.insert(fragment.name.clone(), fragment);
        }
        self
    }

    /// Read `host` (relative to the base directory) and expand its includes.
    pub fn assemble(&self, host: &Path) -> Result<String> {
        let host_path = self.base_dir.join(host);
        let content = std::fs::read_to_string(&host_path)
            .with_context(|| format!("Failed to read host document {}", host_path.display()))?;
        let mut stack = vec![host.display().to_string()];
        let html = self.expand(&content, &mut stack)?;
        tracing::debug!("Assembled {} ({} bytes)", host.display(), html.len());
        Ok(html)
    }

    /// Expand include directives in `content`.
    pub fn expand(&self, content: &str, stack: &mut Vec<String>) -> Result<String> {
        let mut out = String::with_capacity(content.len());
        let mut last = 0;

        for caps in self.pattern.captures_iter(content) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = name.as_str();
            if stack.iter().any(|entry| entry == name) {
                stack.push(name.to_string());
                return Err(VerifyError::IncludeCycle(stack.join(" -> ")).into());
            }

            let (path, wrap) = self.resolve(name)?;
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read fragment {}", path.display()))?;

            stack.push(name.to_string());
            let inner = self.expand(&raw, stack)?;
            stack.pop();

            out.push_str(&content[last..whole.start()]);
            match wrap {
                Wrap::None => out.push_str(&inner),
                Wrap::Style => {
                    out.push_str("<style>");
                    out.push_str(&inner);
                    out.push_str("</style>");
                }
                Wrap::Script => {
                    out.push_str("<script>");
                    out.push_str(&inner);
                    out.push_str("</script>");
                }
            }
            last = whole.end();
        }

        out.push_str(&content[last..]);
        Ok(out)
    }

    /// Registered fragments win; otherwise `name`, then `name.html`, in the
    /// base directory. Unregistered `*.css` fragments are wrapped in `<style>`.
    fn resolve(&self, name: &str) -> Result<(PathBuf, Wrap)> {
        if let Some(fragment) = self.fragments.get(name) {
            return Ok((self.base_dir.join(&fragment.path), fragment.wrap));
        }

        let wrap = if name.ends_with(".css") {
            Wrap::Style
        } else {
            Wrap::None
        };
        for candidate in [name.to_string(), format!("{}.html", name)] {
            let path = self.base_dir.join(&candidate);
            if path.is_file() {
                return Ok((path, wrap));
            }
        }

        Err(VerifyError::MissingFragment {
            name: name.to_string(),
            dir: self.base_dir.clone(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_replaces_directives_with_fragment_content() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "host.html", "<head><?!= include('style.css'); ?></head><body><?!= include('editor-modal.html'); ?></body>");
        write(dir.path(), "style.css.html", "body { color: red; }");
        write(dir.path(), "editor-modal.html", "<div id=\"editor-modal\"></div>");

        let html = Composer::new(dir.path())
            .unwrap()
            .assemble(Path::new("host.html"))
            .unwrap();
        assert_eq!(
            html,
            "<head><style>body { color: red; }</style></head><body><div id=\"editor-modal\"></div></body>"
        );
    }

    #[test]
    fn test_directive_spacing_and_quotes_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "main.js.html", "<script>init()</script>");
        let composer = Composer::new(dir.path()).unwrap();

        let html = composer
            .expand(r#"a<?!=include("main.js")?>b<?!=  include( 'main.js' ) ;  ?>c"#, &mut vec![])
            .unwrap();
        assert_eq!(html, "a<script>init()</script>b<script>init()</script>c");
    }

    #[test]
    fn test_registered_fragment_overrides_lookup() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "app.js", "run();");
        let composer = Composer::new(dir.path()).unwrap().with_fragments([Fragment {
            name: "main.js".into(),
            path: "app.js".into(),
            wrap: Wrap::Script,
        }]);

        let html = composer.expand("<?!= include('main.js'); ?>", &mut vec![]).unwrap();
        assert_eq!(html, "<script>run();</script>");
    }

    #[test]
    fn test_nested_includes_expand() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "outer.html", "[<?!= include('inner'); ?>]");
        write(dir.path(), "inner.html", "x");
        let composer = Composer::new(dir.path()).unwrap();

        let html = composer.expand("<?!= include('outer'); ?>", &mut vec![]).unwrap();
        assert_eq!(html, "[x]");
    }

    #[test]
    fn test_missing_fragment_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let composer = Composer::new(dir.path()).unwrap();

        let err = composer
            .expand("<?!= include('servicos-modal.html'); ?>", &mut vec![])
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VerifyError>(),
            Some(VerifyError::MissingFragment { name, .. }) if name == "servicos-modal.html"
        ));
    }

    #[test]
    fn test_include_cycle_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.html", "<?!= include('b'); ?>");
        write(dir.path(), "b.html", "<?!= include('a'); ?>");
        let composer = Composer::new(dir.path()).unwrap();

        let err = composer.expand("<?!= include('a'); ?>", &mut vec![]).unwrap_err();
        match err.downcast_ref::<VerifyError>() {
            Some(VerifyError::IncludeCycle(chain)) => assert_eq!(chain, "a -> b -> a"),
            other => panic!("expected include cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_text_without_directives_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let composer = Composer::new(dir.path()).unwrap();
        let html = "<p>include('x') is not a directive</p>";
        assert_eq!(composer.expand(html, &mut vec![]).unwrap(), html);
    }
}
