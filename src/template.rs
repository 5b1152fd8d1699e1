//! Path template interpolation
//!
//! Resource paths contain `{name}` placeholders (`/repositories/{workspace_id}`)
//! that are filled from the active partition context.

use crate::error::{Error, Result};
use crate::partition::PartitionContext;
use regex::Regex;
use std::sync::LazyLock;

/// Regex for matching placeholders: {name}
static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-zA-Z_][a-zA-Z0-9_]*)\}").expect("valid regex"));

/// Render a path template with values from the partition context
///
/// Values are substituted verbatim, so a repository full name such as
/// `acme/widgets` expands into two path segments.
pub fn render(template: &str, context: &PartitionContext) -> Result<String> {
    let mut result = String::with_capacity(template.len());
    let mut last_end = 0;

    for cap in PLACEHOLDER_REGEX.captures_iter(template) {
        let full_match = cap.get(0).expect("capture group 0 always exists");
        let name = &cap[1];

        let value = context.get(name).ok_or_else(|| Error::undefined_var(name))?;

        result.push_str(&template[last_end..full_match.start()]);
        result.push_str(value);
        last_end = full_match.end();
    }

    result.push_str(&template[last_end..]);
    Ok(result)
}
