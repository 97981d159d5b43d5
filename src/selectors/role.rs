use anyhow::Result;

/// CSS that selects elements carrying `role` implicitly or explicitly.
pub fn role_selector(role: &str) -> String {
    let implicit = match role {
        "button" => "button, input[type=button], input[type=submit], input[type=reset]",
        "link" => "a[href]",
        "list" => "ul, ol, menu",
        "listitem" => "li",
        "checkbox" => "input[type=checkbox]",
        "radio" => "input[type=radio]",
        "textbox" => "input:not([type]), input[type=text], input[type=email], input[type=search], input[type=tel], input[type=url], textarea",
        "combobox" => "select",
        "option" => "option",
        "heading" => "h1, h2, h3, h4, h5, h6",
        "dialog" => "dialog",
        "table" => "table",
        _ => "",
    };
    if implicit.is_empty() {
        format!("[role=\"{}\"]", role)
    } else {
        format!("{}, [role=\"{}\"]", implicit, role)
    }
}

/// Resolver for rendered elements with `role`, optionally filtered by
/// accessible name (`aria-label`, then value for input buttons, then text,
/// then `title`).
pub fn resolver(role: &str, name: Option<&str>) -> Result<String> {
    let name_filter = match name {
        Some(name) => format!(
            r#".filter(el => {{
                const accessible = el.getAttribute('aria-label')
                    || (el.tagName === 'INPUT' ? el.value : '')
                    || __norm(el.textContent)
                    || el.getAttribute('title')
                    || '';
                return __matches(accessible, {name}, false);
            }})"#,
            name = serde_json::to_string(name)?
        ),
        None => String::new(),
    };
    Ok(format!(
        r#"((root) => Array.from(root.querySelectorAll({sel}))
            .filter(el => !el.closest('[aria-hidden="true"]') && __rendered(el)){name_filter})"#,
        sel = serde_json::to_string(&role_selector(role))?,
        name_filter = name_filter
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implicit_roles() {
        assert!(role_selector("button").starts_with("button, input[type=button]"));
        assert!(role_selector("list").contains("ul, ol"));
    }

    #[test]
    fn test_unknown_role_falls_back_to_attribute() {
        assert_eq!(role_selector("switch"), r#"[role="switch"]"#);
    }

    #[test]
    fn test_resolver_without_name_has_no_name_filter() {
        let js = resolver("list", None).unwrap();
        assert!(!js.contains("accessible"));
        let js = resolver("button", Some("Adicionar")).unwrap();
        assert!(js.contains(r#"__matches(accessible, "Adicionar", false)"#));
    }
}
