//! Typed access to the host-supplied configuration map.

use serde_json::{Map, Value};
use std::env;

/// Reads typed values out of a raw `key -> JSON value` configuration
/// map, with optional environment-variable fallback for values the
/// host leaves unset.
pub struct ConfigParser<'a> {
    raw: &'a Map<String, Value>,
}

impl<'a> ConfigParser<'a> {
    #[must_use]
    pub fn new(raw: &'a Map<String, Value>) -> Self {
        Self { raw }
    }

    /// String value for `key`.
    ///
    /// Resolution order: non-empty config value, then `env_var` (when
    /// non-empty and set), then `default`.
    #[must_use]
    pub fn get_str(&self, key: &str, env_var: &str, default: &str) -> String {
        if let Some(Value::String(s)) = self.raw.get(key) {
            if !s.is_empty() {
                return s.clone();
            }
        }
        if !env_var.is_empty() {
            if let Ok(value) = env::var(env_var) {
                if !value.is_empty() {
                    return value;
                }
            }
        }
        default.to_string()
    }

    /// Boolean value for `key`. String values `"true"` and `"1"`
    /// count as true.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.raw.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "true" || s == "1",
            _ => default,
        }
    }

    /// Integer value for `key`.
    #[must_use]
    pub fn get_i64(&self, key: &str, default: i64) -> i64 {
        match self.raw.get(key) {
            Some(Value::Number(n)) => n.as_i64().unwrap_or(default),
            Some(Value::String(s)) => s.parse().unwrap_or(default),
            _ => default,
        }
    }

    /// String list for `key`; non-string entries are skipped.
    #[must_use]
    pub fn get_str_list(&self, key: &str) -> Vec<String> {
        match self.raw.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_owned))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Nested object for `key`, if present.
    #[must_use]
    pub fn get_object(&self, key: &str) -> Option<&'a Map<String, Value>> {
        self.raw.get(key).and_then(Value::as_object)
    }
}
