use crate::ast::Query;
use std::fmt;
use thiserror::Error;

/// Grammar position named in syntax error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    Statement,
    Select,
    InsertInto,
    Update,
    DeleteFrom,
    Where,
    WhereIn,
    CreateTable,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Clause::Statement => "start of statement",
            Clause::Select => "SELECT",
            Clause::InsertInto => "INSERT INTO",
            Clause::Update => "UPDATE",
            Clause::DeleteFrom => "DELETE FROM",
            Clause::Where => "WHERE",
            Clause::WhereIn => "WHERE IN",
            Clause::CreateTable => "CREATE TABLE",
        };
        f.write_str(label)
    }
}

/// A statement that tokenized and followed the grammar but breaks an
/// invariant of the query model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("at WHERE: empty WHERE clause")]
    EmptyWhere,
    #[error("query type cannot be empty")]
    MissingKind,
    #[error("table name cannot be empty")]
    MissingTable,
    #[error("at CREATE TABLE: need at least one field")]
    MissingColumns,
    #[error("at WHERE: WHERE clause is mandatory for UPDATE & DELETE")]
    MissingWhere,
    #[error("at WHERE: condition without operator")]
    MissingOperator,
    #[error("at WHERE: condition with empty left side operand")]
    EmptyLeftOperand,
    #[error("at WHERE: IN/NOT IN condition without values")]
    EmptyInValues,
    #[error("at WHERE: condition with empty right side operand")]
    EmptyRightOperand,
    #[error("at INSERT INTO: need at least one row to insert")]
    MissingRows,
    #[error("at INSERT INTO: value count doesn't match field count")]
    ArityMismatch { row: usize, expected: usize, found: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("at {clause}: expected {expected}")]
    Syntax {
        clause: Clause,
        /// State of the parser that rejected the token.
        state: &'static str,
        expected: &'static str,
        /// Byte offset of the rejected token in the trimmed input.
        position: usize,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ParseError {
    pub fn is_syntax(&self) -> bool {
        matches!(self, ParseError::Syntax { .. })
    }
}

/// Returned by `parse_many` when one of the statements fails.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("statement {index}: {source}")]
pub struct PartialParse {
    /// Statements before the failing one, all valid.
    pub parsed: Vec<Query>,
    pub index: usize,
    pub source: ParseError,
}
