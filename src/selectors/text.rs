use anyhow::Result;

/// Resolver for elements whose own text nodes match `text`.
///
/// Text inside `<script>`, `<style>` and `<template>` is ignored. The match is
/// a case-insensitive substring unless `exact`, both after whitespace
/// normalization.
pub fn text_resolver(text: &str, exact: bool) -> Result<String> {
    Ok(format!(
        r#"((root) => {{
            const target = {text};
            const out = [];
            const walker = document.createTreeWalker(root, NodeFilter.SHOW_TEXT, null);
            while (walker.nextNode()) {{
                const node = walker.currentNode;
                const el = node.parentElement;
                if (!el || ['SCRIPT', 'STYLE', 'TEMPLATE'].includes(el.tagName)) continue;
                if (__matches(node.textContent, target, {exact}) && !out.includes(el)) {{
                    out.push(el);
                }}
            }}
            return out;
        }})"#,
        text = serde_json::to_string(text)?,
        exact = exact
    ))
}

/// Resolver for form controls labelled by `text`, through `<label>`
/// association (`for`, nesting) or `aria-label`.
pub fn label_resolver(text: &str) -> Result<String> {
    Ok(format!(
        r#"((root) => {{
            const target = {text};
            const out = [];
            for (const label of root.querySelectorAll('label')) {{
                if (!__matches(label.textContent, target, false)) continue;
                const control = label.control
                    || (label.htmlFor ? document.getElementById(label.htmlFor) : null)
                    || label.querySelector('input, textarea, select');
                if (control && !out.includes(control)) out.push(control);
            }}
            for (const el of root.querySelectorAll('[aria-label]')) {{
                if (__matches(el.getAttribute('aria-label'), target, false) && !out.includes(el)) {{
                    out.push(el);
                }}
            }}
            return out;
        }})"#,
        text = serde_json::to_string(text)?
    ))
}

/// Resolver for elements whose `placeholder` contains `text`.
pub fn placeholder_resolver(text: &str) -> Result<String> {
    Ok(format!(
        r#"((root) => Array.from(root.querySelectorAll('[placeholder]'))
            .filter(el => __matches(el.getAttribute('placeholder'), {text}, false)))"#,
        text = serde_json::to_string(text)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_resolver_exact_flag() {
        assert!(text_resolver("HOUSE1", true).unwrap().contains("target, true)"));
        assert!(text_resolver("HOUSE1", false).unwrap().contains("target, false)"));
    }

    #[test]
    fn test_placeholder_keeps_accents() {
        let js = placeholder_resolver("Digite um responsável").unwrap();
        assert!(js.contains("Digite um responsável"));
    }
}
