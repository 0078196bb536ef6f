//! Environment templates for build-argument values.
//!
//! A value such as `v{{.VERSION}}-{{ .GIT_SHA }}` renders each `{{.NAME}}`
//! action with the environment variable `NAME` (empty when unset). Text
//! outside actions is copied verbatim.

/// Render `template`, resolving variables through `lookup`.
pub fn render(
    template: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let close = after.find("}}").ok_or_else(|| TemplateError::Unterminated {
            offset: template.len() - rest.len() + open,
        })?;

        let action = after[..close].trim();
        let name = action
            .strip_prefix('.')
            .filter(|name| !name.is_empty() && name.chars().all(is_name_char))
            .ok_or_else(|| TemplateError::UnsupportedAction {
                action: action.to_owned(),
            })?;
        out.push_str(&lookup(name).unwrap_or_default());

        rest = &after[close + 2..];
    }
    out.push_str(rest);

    Ok(out)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("unterminated action starting at byte {offset}")]
    Unterminated { offset: usize },
    #[error("unsupported template action {{{{{action}}}}}")]
    UnsupportedAction { action: String },
}
