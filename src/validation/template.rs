//! Validation message templating.
//!
//! Two token styles:
//! - `{name}` is resolved now, against the rule's own attributes. A message
//!   that is exactly `{key}` is first replaced by the catalog text for `key`.
//! - `${name}` is left untouched for the client to fill in at runtime.

use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::label::LabelResolver;

#[derive(Debug, Clone)]
pub struct MessageFormatter {
    indirection: Regex,
    token: Regex,
}

impl MessageFormatter {
    pub fn new() -> Self {
        Self {
            indirection: Regex::new(r"^\s*\{([\w.\-]+)\}\s*$").expect("valid indirection pattern"),
            token: Regex::new(r"\$?\{([\w.\-]+)\}").expect("valid token pattern"),
        }
    }

    pub fn format(
        &self,
        raw: &str,
        attributes: &IndexMap<String, Value>,
        labels: &LabelResolver,
        locale: Option<&str>,
    ) -> String {
        let text = match self.indirection.captures(raw) {
            Some(caps) => match labels.message(&caps[1], locale) {
                Some(message) => message,
                None => {
                    tracing::debug!("No catalog message for '{}', using raw text", &caps[1]);
                    raw.to_string()
                }
            },
            None => raw.to_string(),
        };

        self.substitute(&text, attributes)
    }

    /// Replace `{attr}` tokens with attribute values; keep `${...}` and unknown tokens.
    pub fn substitute(&self, text: &str, attributes: &IndexMap<String, Value>) -> String {
        self.token
            .replace_all(text, |caps: &Captures<'_>| {
                let whole = &caps[0];
                if whole.starts_with('$') {
                    return whole.to_string();
                }

                match attributes.get(&caps[1]) {
                    Some(value) => value_text(value),
                    None => whole.to_string(),
                }
            })
            .into_owned()
    }
}

impl Default for MessageFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}
