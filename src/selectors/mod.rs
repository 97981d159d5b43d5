pub mod css;
pub mod role;
pub mod text;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How to find an element on the page.
///
/// Every variant compiles to a JS resolver `(root) => Element[]`; the
/// combinators (`Within`, `Filter`, `Nth`) compose resolvers, so a locator is
/// always evaluated fresh against the live DOM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Locator {
    /// CSS selector. A trailing `:has-text("...")` becomes a text filter.
    Css { selector: String },
    /// Element whose own text matches (substring, case-insensitive, unless `exact`).
    Text {
        text: String,
        #[serde(default)]
        exact: bool,
    },
    /// Form control associated with a `<label>` (or `aria-label`) containing the text.
    Label { text: String },
    /// Input or textarea whose placeholder contains the text.
    Placeholder { text: String },
    /// Element with an explicit or implicit ARIA role and optional accessible name.
    Role {
        role: String,
        #[serde(default)]
        name: Option<String>,
    },
    /// `child` resolved inside each match of `parent`.
    Within {
        parent: Box<Locator>,
        child: Box<Locator>,
    },
    /// Matches of `base` whose text content contains `has_text`.
    Filter {
        base: Box<Locator>,
        has_text: String,
    },
    /// The `index`-th match of `base`.
    Nth { base: Box<Locator>, index: usize },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css {
            selector: selector.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            exact: false,
        }
    }

    pub fn exact_text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            exact: true,
        }
    }

    pub fn label(text: impl Into<String>) -> Self {
        Self::Label { text: text.into() }
    }

    pub fn placeholder(text: impl Into<String>) -> Self {
        Self::Placeholder { text: text.into() }
    }

    pub fn role(role: impl Into<String>, name: Option<&str>) -> Self {
        Self::Role {
            role: role.into(),
            name: name.map(str::to_string),
        }
    }

    /// Resolve `child` inside this locator's matches.
    pub fn locate(self, child: Locator) -> Self {
        Self::Within {
            parent: Box::new(self),
            child: Box::new(child),
        }
    }

    pub fn filter_text(self, has_text: impl Into<String>) -> Self {
        Self::Filter {
            base: Box::new(self),
            has_text: has_text.into(),
        }
    }

    pub fn nth(self, index: usize) -> Self {
        Self::Nth {
            base: Box::new(self),
            index,
        }
    }

    pub fn first(self) -> Self {
        self.nth(0)
    }

    /// Compile to a JS function expression `(root) => Element[]`.
    ///
    /// The expression refers to the `__norm`/`__matches`/`__rendered` helpers,
    /// so it must be embedded through [`selector_to_js`] or [`selector_all_js`].
    pub fn resolver_js(&self) -> Result<String> {
        Ok(match self {
            Self::Css { selector } => css::resolver(selector)?,
            Self::Text { text, exact } => text::text_resolver(text, *exact)?,
            Self::Label { text } => text::label_resolver(text)?,
            Self::Placeholder { text } => text::placeholder_resolver(text)?,
            Self::Role { role, name } => role::resolver(role, name.as_deref())?,
            Self::Within { parent, child } => format!(
                r#"((root) => {{
                    const out = [];
                    for (const scope of ({parent})(root)) {{
                        for (const el of ({child})(scope)) {{
                            if (!out.includes(el)) out.push(el);
                        }}
                    }}
                    return out;
                }})"#,
                parent = parent.resolver_js()?,
                child = child.resolver_js()?
            ),
            Self::Filter { base, has_text } => format!(
                r#"((root) => ({base})(root).filter(el => __matches(el.textContent, {text}, false)))"#,
                base = base.resolver_js()?,
                text = serde_json::to_string(has_text)?
            ),
            Self::Nth { base, index } => format!(
                r#"((root) => {{ const els = ({base})(root); return els.length > {index} ? [els[{index}]] : []; }})"#,
                base = base.resolver_js()?,
                index = index
            ),
        })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css { selector } => write!(f, "css={}", selector),
            Self::Text { text, exact: true } => write!(f, "text=\"{}\"", text),
            Self::Text { text, exact: false } => write!(f, "text={}", text),
            Self::Label { text } => write!(f, "label={}", text),
            Self::Placeholder { text } => write!(f, "placeholder={}", text),
            Self::Role { role, name: Some(name) } => write!(f, "role={}[name=\"{}\"]", role, name),
            Self::Role { role, name: None } => write!(f, "role={}", role),
            Self::Within { parent, child } => write!(f, "{} >> {}", parent, child),
            Self::Filter { base, has_text } => write!(f, "{} >> has-text=\"{}\"", base, has_text),
            Self::Nth { base, index } => write!(f, "{} >> nth={}", base, index),
        }
    }
}

/// Helpers shared by every resolver: whitespace normalization, text matching
/// and a rendered check (non-empty client rects, not `visibility: hidden`).
const HELPERS_JS: &str = r#"
    const __norm = (s) => (s || '').replace(/\s+/g, ' ').trim();
    const __matches = (hay, needle, exact) => exact
        ? __norm(hay) === __norm(needle)
        : __norm(hay).toLowerCase().includes(__norm(needle).toLowerCase());
    const __rendered = (el) => el.getClientRects().length > 0
        && getComputedStyle(el).visibility !== 'hidden';
"#;

/// Convert a locator to a JS expression that resolves to its first element, or `null`.
pub fn selector_to_js(locator: &Locator) -> Result<String> {
    Ok(format!(
        r#"(() => {{
            {helpers}
            const els = ({resolver})(document);
            return els.length > 0 ? els[0] : null;
        }})()"#,
        helpers = HELPERS_JS,
        resolver = locator.resolver_js()?
    ))
}

/// Convert a locator to a JS expression that resolves to all matching elements.
pub fn selector_all_js(locator: &Locator) -> Result<String> {
    Ok(format!(
        r#"(() => {{
            {helpers}
            return ({resolver})(document);
        }})()"#,
        helpers = HELPERS_JS,
        resolver = locator.resolver_js()?
    ))
}
