//! Strict placeholder substitution for instruction templates.
//!
//! Templates use `${name}` placeholders. Rendering is a pure function of
//! (template, values): every placeholder the template references must have
//! a bound value, and templates used in a given role must contain that
//! role's required placeholder. Unknown placeholders fail at render time
//! instead of silently passing through, so malformed custom templates are
//! caught at construction rather than mid-run.

use crate::core::ConfigError;
use std::collections::BTreeMap;

/// Named values available to a template.
#[derive(Debug, Clone, Default)]
pub struct TemplateValues {
    values: BTreeMap<String, String>,
}

impl TemplateValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Substitute every `${name}` placeholder in `template` with its bound value.
///
/// Returns [`ConfigError::UnboundPlaceholder`] if the template references a
/// name absent from `values`. A value ending in `.` absorbs a period that
/// immediately follows its placeholder, so templates like `Complete ${task}.`
/// do not produce double periods when the task itself ends with one.
pub fn render(template: &str, values: &TemplateValues) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated "${" is treated as literal text
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let name = &after[..end];
        let value = values
            .get(name)
            .ok_or_else(|| ConfigError::UnboundPlaceholder(name.to_string()))?;
        out.push_str(value);
        rest = &after[end + 1..];
        if value.ends_with('.') && rest.starts_with('.') {
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    Ok(out)
}

/// List the placeholder names a template references, in order of appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else { break };
        found.push(after[..end].to_string());
        rest = &after[end + 1..];
    }
    found
}

/// Check that a template contains a placeholder its role requires.
pub fn ensure_placeholder(
    template: &str,
    placeholder: &'static str,
    role: &'static str,
) -> Result<(), ConfigError> {
    if placeholders(template).iter().any(|p| p == placeholder) {
        Ok(())
    } else {
        Err(ConfigError::MissingPlaceholder { role, placeholder })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_placeholder() {
        let values = TemplateValues::new().set("persona", "a skeptical economist");
        let out = render("Adopt this persona: ${persona}", &values).unwrap();
        assert_eq!(out, "Adopt this persona: a skeptical economist");
    }

    #[test]
    fn test_render_multiple_occurrences() {
        let values = TemplateValues::new().set("task", "draft a memo");
        let out = render("Task: ${task}. Repeat: ${task}", &values).unwrap();
        assert!(out.contains("Task: draft a memo"));
        assert!(out.contains("Repeat: draft a memo"));
    }

    #[test]
    fn test_render_unbound_placeholder_fails() {
        let values = TemplateValues::new().set("persona", "x");
        let err = render("${persona} ${missing}", &values).unwrap_err();
        assert_eq!(err, ConfigError::UnboundPlaceholder("missing".to_string()));
    }

    #[test]
    fn test_render_no_placeholders_is_identity() {
        let out = render("plain text { not a placeholder }", &TemplateValues::new()).unwrap();
        assert_eq!(out, "plain text { not a placeholder }");
    }

    #[test]
    fn test_render_json_braces_untouched() {
        // Task strings often carry JSON; bare braces must survive
        let values = TemplateValues::new().set("task", r#"{"a": 1}"#);
        let out = render("Do: ${task}", &values).unwrap();
        assert_eq!(out, r#"Do: {"a": 1}"#);
    }

    #[test]
    fn test_render_avoids_double_period() {
        let values = TemplateValues::new().set("task", "Summarize the findings.");
        let out = render("Complete the following: ${task}.", &values).unwrap();
        assert_eq!(out, "Complete the following: Summarize the findings.");
    }

    #[test]
    fn test_render_keeps_single_period() {
        let values = TemplateValues::new().set("task", "Summarize the findings");
        let out = render("Complete the following: ${task}.", &values).unwrap();
        assert_eq!(out, "Complete the following: Summarize the findings.");
    }

    #[test]
    fn test_unterminated_placeholder_is_literal() {
        let out = render("cost is ${price", &TemplateValues::new()).unwrap();
        assert_eq!(out, "cost is ${price");
    }

    #[test]
    fn test_placeholders_lists_in_order() {
        let names = placeholders("${a} then ${b} then ${a}");
        assert_eq!(names, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_ensure_placeholder() {
        assert!(ensure_placeholder("uses ${persona}", "persona", "persona template").is_ok());
        let err =
            ensure_placeholder("no placeholder", "persona", "persona template").unwrap_err();
        assert!(matches!(err, ConfigError::MissingPlaceholder { .. }));
    }
}
