//! Parser for a small SQL-like dialect.
//!
//! Statements (`SELECT`, `INSERT INTO`, `UPDATE`, `DELETE FROM`,
//! `CREATE TABLE`) are tokenized on demand and driven through an explicit
//! state machine, then validated into a flat [`Query`]. WHERE clauses are a
//! conjunction of simple comparisons; there is no `OR` and no grouping.
//!
//! ```
//! use sift_parser::{parse, CompareOp, QueryKind};
//!
//! let query = parse("SELECT * FROM users WHERE id IN ('1','2','3')").unwrap();
//! assert_eq!(query.kind, QueryKind::Select);
//! assert_eq!(query.conditions[0].operator, CompareOp::In);
//! assert_eq!(query.conditions[0].in_values, vec!["1", "2", "3"]);
//! ```

mod ast;
mod config;
mod diagnostics;
mod error;
mod lexer;
mod parser;
mod render;
mod validate;

pub use ast::{Assignment, Column, CompareOp, Condition, Query, QueryKind};
pub use config::{ParseConfig, WhitespacePolicy};
pub use diagnostics::{Diagnostic, Diagnostics, Silent, TracingDiagnostics, WriterDiagnostics};
pub use error::{Clause, ParseError, PartialParse, ValidationError};
pub use lexer::{Keyword, Lexer, Token};
pub use parser::Parser;

/// Parses one statement with the default configuration.
pub fn parse(input: &str) -> Result<Query, ParseError> {
    Parser::new().parse(input)
}

/// Parses statements in order, stopping at the first failure.
pub fn parse_many<I, S>(inputs: I) -> Result<Vec<Query>, PartialParse>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Parser::new().parse_many(inputs)
}
