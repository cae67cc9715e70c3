//! Applies the WHERE clause of a sift SELECT statement to in-memory records.
//!
//! Records are JSON objects; dotted field names such as `address.zip` walk
//! into nested objects. A field that cannot be resolved makes its condition
//! false rather than failing the whole filter.
//!
//! ```
//! use serde_json::json;
//! use sift_engine::{filter, Dataset};
//!
//! let mut data = Dataset::new();
//! if let serde_json::Value::Object(record) = json!({"name": "John Doe", "age": 30}) {
//!     data.insert("1".to_string(), record);
//! }
//!
//! let matched = filter("SELECT * FROM users WHERE age >= '21'", &data).unwrap();
//! assert!(matched.contains_key("1"));
//! ```

mod config;
mod engine;
mod executor;

pub use config::{FilterConfig, OrderingPolicy};
pub use engine::{Dataset, Engine, EngineError};
pub use executor::{like_to_regex, render, resolve, Executor, ExecutorError, Record};

use std::collections::HashMap;

/// Filters `dataset` with a default [`Engine`].
pub fn filter<'d>(
    text: &str,
    dataset: &'d Dataset,
) -> Result<HashMap<&'d str, &'d Record>, EngineError> {
    Engine::new().filter(text, dataset)
}
