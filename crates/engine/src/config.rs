use serde::{Deserialize, Serialize};
use std::env;

/// How `>`, `>=`, `<` and `<=` order two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderingPolicy {
    /// Compare as numbers when both sides parse as `f64`, as strings
    /// otherwise.
    #[default]
    #[serde(rename = "numeric")]
    NumericThenString,
    /// Always compare the string renderings, so `'9' > '10'`.
    Lexicographic,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub ordering: OrderingPolicy,
}

impl FilterConfig {
    /// Reads `SIFT_ORDERING` (`numeric` or `lexicographic`). Unset or
    /// unrecognised values keep the default.
    pub fn from_env() -> Self {
        let ordering = match env::var("SIFT_ORDERING")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str()
        {
            "lexicographic" => OrderingPolicy::Lexicographic,
            _ => OrderingPolicy::NumericThenString,
        };

        Self { ordering }
    }

    pub fn with_ordering(mut self, ordering: OrderingPolicy) -> Self {
        self.ordering = ordering;
        self
    }
}
