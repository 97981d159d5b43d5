use anyhow::Result;

/// Split a Playwright-style `base:has-text("...")` selector into the CSS part
/// and the text filter. A bare `:has-text(...)` matches any element.
pub fn split_has_text(selector: &str) -> (String, Option<String>) {
    if let Some(start) = selector.find(":has-text(") {
        let after = &selector[start + ":has-text(".len()..];
        let (quote, rest) = if let Some(stripped) = after.strip_prefix('"') {
            ('"', stripped)
        } else if let Some(stripped) = after.strip_prefix('\'') {
            ('\'', stripped)
        } else {
            return (selector.to_string(), None);
        };
        if let Some(end) = rest.find(quote) {
            let text = &rest[..end];
            let tail = rest[end + 1..].trim_start_matches(')');
            let mut base = selector[..start].to_string();
            base.push_str(tail);
            let base = base.trim();
            let base = if base.is_empty() { "*" } else { base };
            return (base.to_string(), Some(text.to_string()));
        }
    }
    (selector.to_string(), None)
}

/// Resolver for a CSS selector, honouring `:has-text(...)`.
pub fn resolver(selector: &str) -> Result<String> {
    let (base, has_text) = split_has_text(selector);
    let base_js = serde_json::to_string(&base)?;
    Ok(match has_text {
        Some(text) => format!(
            r#"((root) => Array.from(root.querySelectorAll({base})).filter(el => __matches(el.textContent, {text}, false)))"#,
            base = base_js,
            text = serde_json::to_string(&text)?
        ),
        None => format!(
            r#"((root) => Array.from(root.querySelectorAll({base})))"#,
            base = base_js
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_text_double_quotes() {
        let (base, text) = split_has_text(r#"div.toggle-container:has-text("Carga de Geladeira")"#);
        assert_eq!(base, "div.toggle-container");
        assert_eq!(text.as_deref(), Some("Carga de Geladeira"));
    }

    #[test]
    fn test_has_text_single_quotes() {
        let (base, text) = split_has_text("button:has-text('Salvar Dados')");
        assert_eq!(base, "button");
        assert_eq!(text.as_deref(), Some("Salvar Dados"));
    }

    #[test]
    fn test_bare_has_text_matches_any_element() {
        let (base, text) = split_has_text(r#":has-text("Observações")"#);
        assert_eq!(base, "*");
        assert_eq!(text.as_deref(), Some("Observações"));
    }

    #[test]
    fn test_plain_css_unchanged() {
        let (base, text) = split_has_text("#fridgeToggle_HOUSE2");
        assert_eq!(base, "#fridgeToggle_HOUSE2");
        assert!(text.is_none());
    }

    #[test]
    fn test_unquoted_has_text_left_alone() {
        let (base, text) = split_has_text("li:has-text(HOUSE1)");
        assert_eq!(base, "li:has-text(HOUSE1)");
        assert!(text.is_none());
    }

    #[test]
    fn test_resolver_filters_on_text() {
        let js = resolver(r#"li:has-text("HOUSE1")"#).unwrap();
        assert!(js.contains(r#"querySelectorAll("li")"#));
        assert!(js.contains(r#"__matches(el.textContent, "HOUSE1", false)"#));
    }
}
