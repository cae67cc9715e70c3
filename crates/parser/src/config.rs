use serde::{Deserialize, Serialize};
use std::env;

/// Which characters the tokenizer skips between tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhitespacePolicy {
    /// Only the plain space character separates tokens. Tabs and newlines
    /// inside a statement are not skipped.
    #[default]
    Space,
    /// Any Unicode whitespace separates tokens.
    Any,
}

impl WhitespacePolicy {
    pub fn is_insignificant(self, ch: char) -> bool {
        match self {
            WhitespacePolicy::Space => ch == ' ',
            WhitespacePolicy::Any => ch.is_whitespace(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    pub whitespace: WhitespacePolicy,
}

impl ParseConfig {
    /// Reads `SIFT_WHITESPACE` (`space` or `any`). Unset or unrecognised
    /// values keep the default.
    pub fn from_env() -> Self {
        let whitespace = match env::var("SIFT_WHITESPACE")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str()
        {
            "any" => WhitespacePolicy::Any,
            _ => WhitespacePolicy::Space,
        };

        Self { whitespace }
    }

    pub fn with_whitespace(mut self, whitespace: WhitespacePolicy) -> Self {
        self.whitespace = whitespace;
        self
    }
}
