//! Pre-parse repair of alarm payloads whose nested objects were sent as
//! escaped JSON strings, e.g. `{"a":"{\"b\":1}"}` instead of `{"a":{"b":1}}`.
//!
//! The pass is a fixed sequence of literal substitutions. It undoes exactly one
//! level of string wrapping; payloads nested deeper, or string values that
//! legitimately contain `"{`, `}"` or `\"`, are not repaired correctly.

use serde_json::Value;

use crate::error::PayloadError;

/// One global literal substitution applied to the fragment.
#[derive(Clone, Copy, Debug)]
pub struct RepairRule {
    pub name: &'static str,
    pub pattern: &'static str,
    pub replacement: &'static str,
}

/// Rules in application order.
pub const RULES: [RepairRule; 3] = [
    RepairRule {
        name: "quote-before-open-brace",
        pattern: "\"{",
        replacement: "{",
    },
    RepairRule {
        name: "quote-after-close-brace",
        pattern: "}\"",
        replacement: "}",
    },
    RepairRule {
        name: "escaped-quote",
        pattern: "\\\"",
        replacement: "\"",
    },
];

impl RepairRule {
    #[must_use]
    pub fn apply(&self, input: &str) -> String {
        input.replace(self.pattern, self.replacement)
    }
}

/// Run every rule over `fragment`, in order.
#[must_use]
pub fn repair(fragment: &str) -> String {
    RULES
        .iter()
        .fold(fragment.to_string(), |text, rule| rule.apply(&text))
}

/// Repair `fragment` and parse the result as JSON.
///
/// # Errors
///
/// Returns [`PayloadError::Syntax`] when the repaired text is still not valid JSON.
pub fn repair_and_parse(fragment: &str) -> Result<Value, PayloadError> {
    let repaired = repair(fragment);
    serde_json::from_str(&repaired).map_err(|err| PayloadError::Syntax {
        message: err.to_string(),
    })
}
