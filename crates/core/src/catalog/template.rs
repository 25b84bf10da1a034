//! `${placeholder}` interpolation for catalog command templates.
//!
//! Command templates are rendered once, centrally, when a pipeline run is
//! requested; a placeholder with no binding is an error at render time
//! rather than a literal smuggled into an external tool's argv.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;

/// Regex pattern for ${variable_name}
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*)\}").expect("constant regex pattern is valid")
});

/// A `${name}` placeholder with no binding in the parameter map.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("no value for placeholder '${{{name}}}'")]
pub struct UnboundPlaceholder {
    pub name: String,
}

/// Interpolate every `${name}` placeholder with values from `vars`.
///
/// # Errors
///
/// Returns [`UnboundPlaceholder`] naming the first placeholder with no
/// binding. Text outside placeholders passes through untouched.
pub fn render(template: &str, vars: &HashMap<String, String>) -> Result<String, UnboundPlaceholder> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for captures in VAR_PATTERN.captures_iter(template) {
        let Some(full) = captures.get(0) else { continue };
        let name = &captures[1];
        let value = vars.get(name).ok_or_else(|| UnboundPlaceholder {
            name: name.to_string(),
        })?;
        out.push_str(&template[last..full.start()]);
        out.push_str(value);
        last = full.end();
    }

    out.push_str(&template[last..]);
    Ok(out)
}

/// The placeholder names a template references, in order of appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    VAR_PATTERN
        .captures_iter(template)
        .map(|captures| captures[1].to_string())
        .collect()
}
