//! Label and description resolution.
//!
//! Lookup order for labels, first match wins:
//! 1. catalog key `<qualified name>.label`
//! 2. catalog key `<simple name>.label`
//! 3. inline label on the declaration
//! 4. humanized simple name (`fromAddressPattern` -> `From Address Pattern`)
//!
//! Descriptions follow the same order with `.description` keys and no
//! humanized fallback.

use convert_case::{Case, Casing};
use std::sync::Arc;

use crate::catalog::MessageSource;

/// Names and inline texts of one declared element (model, field, enum constant).
#[derive(Debug, Clone, Copy)]
pub struct ElementNames<'a> {
    pub simple_name: &'a str,
    pub qualified_name: &'a str,
    pub inline_label: Option<&'a str>,
    pub inline_description: Option<&'a str>,
}

impl<'a> ElementNames<'a> {
    pub fn new(simple_name: &'a str, qualified_name: &'a str) -> Self {
        Self {
            simple_name,
            qualified_name,
            inline_label: None,
            inline_description: None,
        }
    }

    pub fn with_inline(mut self, label: Option<&'a str>, description: Option<&'a str>) -> Self {
        self.inline_label = label;
        self.inline_description = description;
        self
    }
}

#[derive(Clone)]
pub struct LabelResolver {
    messages: Arc<dyn MessageSource>,
}

impl LabelResolver {
    pub fn new(messages: Arc<dyn MessageSource>) -> Self {
        Self { messages }
    }

    pub fn label(&self, element: &ElementNames<'_>, locale: Option<&str>) -> String {
        self.resolve(element, "label", locale)
            .or_else(|| element.inline_label.map(str::to_string))
            .unwrap_or_else(|| humanize(element.simple_name))
    }

    pub fn description(&self, element: &ElementNames<'_>, locale: Option<&str>) -> Option<String> {
        self.resolve(element, "description", locale)
            .or_else(|| element.inline_description.map(str::to_string))
    }

    /// Catalog text for a key; lookup failures count as "not found".
    pub fn message(&self, key: &str, locale: Option<&str>) -> Option<String> {
        match self.messages.message(key, locale) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!("Ignoring message lookup failure for '{}': {}", key, e);
                None
            }
        }
    }

    fn resolve(&self, element: &ElementNames<'_>, suffix: &str, locale: Option<&str>) -> Option<String> {
        self.message(&format!("{}.{}", element.qualified_name, suffix), locale)
            .or_else(|| self.message(&format!("{}.{}", element.simple_name, suffix), locale))
    }
}

/// Camel-case identifier to a display label.
///
/// Uppercases the first character and inserts a space before every later
/// uppercase letter.
pub fn humanize(name: &str) -> String {
    let mut label = String::with_capacity(name.len() + 8);

    for (index, ch) in name.trim().chars().enumerate() {
        if index == 0 {
            label.extend(ch.to_uppercase());
            continue;
        }

        if ch.is_uppercase() {
            label.push(' ');
        }
        label.push(ch);
    }

    label.trim().to_string()
}

/// Symbolic constant name (`IN_PROGRESS`) to a display label (`In Progress`).
pub fn humanize_constant(name: &str) -> String {
    name.to_case(Case::Title)
}
