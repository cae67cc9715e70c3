use crate::lexer::Keyword;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QueryKind {
    #[default]
    Unknown,
    Select,
    Update,
    Insert,
    Delete,
    Create,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryKind::Unknown => "UNKNOWN",
            QueryKind::Select => "SELECT",
            QueryKind::Update => "UPDATE",
            QueryKind::Insert => "INSERT",
            QueryKind::Delete => "DELETE",
            QueryKind::Create => "CREATE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompareOp {
    #[default]
    Unknown,
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Like,
    NotLike,
    In,
    NotIn,
}

impl CompareOp {
    pub fn from_keyword(keyword: Keyword) -> Option<Self> {
        let op = match keyword {
            Keyword::Equal => CompareOp::Equal,
            Keyword::NotEqual => CompareOp::NotEqual,
            Keyword::GreaterThan => CompareOp::GreaterThan,
            Keyword::LessThan => CompareOp::LessThan,
            Keyword::GreaterThanOrEqual => CompareOp::GreaterThanOrEqual,
            Keyword::LessThanOrEqual => CompareOp::LessThanOrEqual,
            Keyword::Like => CompareOp::Like,
            Keyword::NotLike => CompareOp::NotLike,
            Keyword::In => CompareOp::In,
            Keyword::NotIn => CompareOp::NotIn,
            _ => return None,
        };
        Some(op)
    }

    /// IN and NOT IN take a value list instead of a single operand.
    pub fn takes_list(self) -> bool {
        matches!(self, CompareOp::In | CompareOp::NotIn)
    }

    pub fn is_pattern(self) -> bool {
        matches!(self, CompareOp::Like | CompareOp::NotLike)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CompareOp::Unknown => "UNKNOWN",
            CompareOp::Equal => "=",
            CompareOp::NotEqual => "!=",
            CompareOp::GreaterThan => ">",
            CompareOp::LessThan => "<",
            CompareOp::GreaterThanOrEqual => ">=",
            CompareOp::LessThanOrEqual => "<=",
            CompareOp::Like => "LIKE",
            CompareOp::NotLike => "NOT LIKE",
            CompareOp::In => "IN",
            CompareOp::NotIn => "NOT IN",
        };
        f.write_str(text)
    }
}

/// One AND-conjunct of a WHERE clause. The left side is always a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub operand1: String,
    pub operator: CompareOp,
    pub operand2: String,
    pub operand2_is_field: bool,
    pub in_values: Vec<String>,
}

impl Condition {
    pub fn on_field(field: impl Into<String>) -> Self {
        Self {
            operand1: field.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub kind: QueryKind,
    pub table_name: String,
    /// Selected or inserted field names in source order. `SELECT *` keeps
    /// the literal `*`.
    pub fields: Vec<String>,
    /// Keyed by the original field name.
    pub aliases: BTreeMap<String, String>,
    pub conditions: Vec<Condition>,
    pub updates: Vec<Assignment>,
    pub inserts: Vec<Vec<String>>,
    pub create_fields: Vec<Column>,
}

impl Query {
    /// Sets `field` to `value`, keeping the position of an earlier
    /// assignment to the same field.
    pub fn set_update(&mut self, field: &str, value: &str) {
        match self.updates.iter_mut().find(|a| a.field == field) {
            Some(existing) => existing.value = value.to_string(),
            None => self.updates.push(Assignment {
                field: field.to_string(),
                value: value.to_string(),
            }),
        }
    }

    pub fn set_column(&mut self, name: &str, column_type: &str) {
        match self.create_fields.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.column_type = column_type.to_string(),
            None => self.create_fields.push(Column {
                name: name.to_string(),
                column_type: column_type.to_string(),
            }),
        }
    }

    pub fn update(&self, field: &str) -> Option<&str> {
        self.updates
            .iter()
            .find(|a| a.field == field)
            .map(|a| a.value.as_str())
    }

    pub fn column_type(&self, name: &str) -> Option<&str> {
        self.create_fields
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.column_type.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_assignment_keeps_first_position() {
        let mut query = Query::default();
        query.set_update("b", "1");
        query.set_update("c", "2");
        query.set_update("b", "3");

        assert_eq!(
            query.updates,
            vec![
                Assignment {
                    field: "b".into(),
                    value: "3".into()
                },
                Assignment {
                    field: "c".into(),
                    value: "2".into()
                },
            ]
        );
        assert_eq!(query.update("b"), Some("3"));
        assert_eq!(query.update("z"), None);
    }

    #[test]
    fn test_repeated_column_keeps_first_position() {
        let mut query = Query::default();
        query.set_column("id", "int");
        query.set_column("name", "string");
        query.set_column("id", "text");

        let names: Vec<&str> = query.create_fields.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
        assert_eq!(query.column_type("id"), Some("text"));
        assert_eq!(query.column_type("missing"), None);
    }

    #[test]
    fn test_operator_keywords() {
        assert_eq!(CompareOp::from_keyword(Keyword::NotIn), Some(CompareOp::NotIn));
        assert_eq!(CompareOp::from_keyword(Keyword::Where), None);
        assert_eq!(CompareOp::NotLike.to_string(), "NOT LIKE");
        assert!(CompareOp::In.takes_list());
        assert!(!CompareOp::Like.takes_list());
    }
}
