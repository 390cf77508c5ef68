//! Compiled label patterns for query-backed LOVs.
//!
//! A label pattern such as `"{name} ({code})"` renders one row into an option
//! label. Compiled patterns are cached by raw text and shared across requests.

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::LovError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Column(String),
}

/// Parsed label pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    raw: String,
    segments: Vec<Segment>,
    group_names: Vec<String>,
}

impl CompiledPattern {
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Columns referenced by the pattern, in order of first use.
    pub fn group_names(&self) -> &[String] {
        &self.group_names
    }

    /// Render a row; missing or null columns render as empty text.
    pub fn render(&self, row: &IndexMap<String, Value>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Column(name) => match row.get(name) {
                    Some(Value::String(s)) => out.push_str(s),
                    Some(Value::Null) | None => {}
                    Some(other) => out.push_str(&other.to_string()),
                },
            }
        }
        out.trim().to_string()
    }
}

pub struct PatternCache {
    tokenizer: Regex,
    entries: Mutex<HashMap<String, Arc<CompiledPattern>>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self {
            tokenizer: Regex::new(r"\{(\w+)\}").expect("valid tokenizer pattern"),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cached compiled pattern, compiling and inserting it on first use.
    pub fn get_or_compile(&self, raw: &str) -> Result<Arc<CompiledPattern>, LovError> {
        let mut entries = self.entries.lock().map_err(|_| LovError::Pattern {
            pattern: raw.to_string(),
            reason: "pattern cache lock poisoned".to_string(),
        })?;

        if let Some(compiled) = entries.get(raw) {
            return Ok(Arc::clone(compiled));
        }

        let compiled = Arc::new(self.compile(raw)?);
        entries.insert(raw.to_string(), Arc::clone(&compiled));
        tracing::debug!("Compiled label pattern '{}'", raw);

        Ok(compiled)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn compile(&self, raw: &str) -> Result<CompiledPattern, LovError> {
        let mut segments = Vec::new();
        let mut group_names: Vec<String> = Vec::new();
        let mut last = 0;

        for caps in self.tokenizer.captures_iter(raw) {
            let whole = caps.get(0).expect("capture 0 always present");
            self.push_literal(raw, &raw[last..whole.start()], &mut segments)?;

            let name = caps[1].to_string();
            if !group_names.contains(&name) {
                group_names.push(name.clone());
            }
            segments.push(Segment::Column(name));
            last = whole.end();
        }
        self.push_literal(raw, &raw[last..], &mut segments)?;

        if group_names.is_empty() {
            return Err(LovError::Pattern {
                pattern: raw.to_string(),
                reason: "pattern references no columns".to_string(),
            });
        }

        Ok(CompiledPattern {
            raw: raw.to_string(),
            segments,
            group_names,
        })
    }

    fn push_literal(&self, raw: &str, text: &str, segments: &mut Vec<Segment>) -> Result<(), LovError> {
        if text.contains('{') || text.contains('}') {
            return Err(LovError::Pattern {
                pattern: raw.to_string(),
                reason: format!("malformed placeholder near '{}'", text),
            });
        }
        if !text.is_empty() {
            segments.push(Segment::Literal(text.to_string()));
        }
        Ok(())
    }
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> IndexMap<String, Value> {
        let mut row = IndexMap::new();
        row.insert("name".to_string(), json!("Hyderabad"));
        row.insert("code".to_string(), json!(500));
        row
    }

    #[test]
    fn test_render_row() {
        let cache = PatternCache::new();
        let pattern = cache.get_or_compile("{name} ({code})").unwrap();

        assert_eq!(pattern.group_names(), &["name".to_string(), "code".to_string()]);
        assert_eq!(pattern.render(&row()), "Hyderabad (500)");
    }

    #[test]
    fn test_compiled_once_and_shared() {
        let cache = PatternCache::new();
        let first = cache.get_or_compile("{name}").unwrap();
        let second = cache.get_or_compile("{name}").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_malformed_patterns_rejected() {
        let cache = PatternCache::new();
        assert!(cache.get_or_compile("{name").is_err());
        assert!(cache.get_or_compile("plain text").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_missing_columns_render_empty() {
        let cache = PatternCache::new();
        let pattern = cache.get_or_compile("{name} {missing}").unwrap();
        assert_eq!(pattern.render(&row()), "Hyderabad");
    }
}
