//! Renders a [`Query`] back into dialect text.
//!
//! Keywords come out uppercase, table names and every literal single
//! quoted, field references bare. Casing and spacing of the original input
//! are not preserved, but parsing the rendered text yields an equal query.

use crate::ast::{Condition, Query, QueryKind};
use std::fmt::{self, Display, Formatter, Write};

struct Quoted<'a>(&'a str);

impl Display for Quoted<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.0)
    }
}

fn write_separated<T, F>(
    f: &mut Formatter<'_>,
    items: &[T],
    separator: &str,
    mut write_item: F,
) -> fmt::Result
where
    F: FnMut(&mut Formatter<'_>, &T) -> fmt::Result,
{
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write_item(f, item)?;
    }
    Ok(())
}

fn write_value_list(f: &mut Formatter<'_>, values: &[String]) -> fmt::Result {
    f.write_char('(')?;
    write_separated(f, values, ", ", |f, value| write!(f, "{}", Quoted(value)))?;
    f.write_char(')')
}

impl Display for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.operand1, self.operator)?;
        if self.operator.takes_list() {
            write_value_list(f, &self.in_values)
        } else if self.operand2_is_field {
            f.write_str(&self.operand2)
        } else {
            write!(f, "{}", Quoted(&self.operand2))
        }
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.kind {
            QueryKind::Unknown => return Ok(()),
            QueryKind::Select => {
                f.write_str("SELECT ")?;
                if self.fields.is_empty() {
                    f.write_char('*')?;
                }
                write_separated(f, &self.fields, ", ", |f, field| {
                    f.write_str(field)?;
                    match self.aliases.get(field) {
                        Some(alias) => write!(f, " AS {}", alias),
                        None => Ok(()),
                    }
                })?;
                write!(f, " FROM {}", Quoted(&self.table_name))?;
            }
            QueryKind::Insert => {
                write!(f, "INSERT INTO {} (", Quoted(&self.table_name))?;
                write_separated(f, &self.fields, ", ", |f, field| f.write_str(field))?;
                f.write_str(") VALUES ")?;
                write_separated(f, &self.inserts, ", ", |f, row| write_value_list(f, row))?;
            }
            QueryKind::Update => {
                write!(f, "UPDATE {} SET ", Quoted(&self.table_name))?;
                write_separated(f, &self.updates, ", ", |f, assignment| {
                    write!(f, "{} = {}", assignment.field, Quoted(&assignment.value))
                })?;
            }
            QueryKind::Delete => {
                write!(f, "DELETE FROM {}", Quoted(&self.table_name))?;
            }
            QueryKind::Create => {
                write!(f, "CREATE TABLE {} (", Quoted(&self.table_name))?;
                write_separated(f, &self.create_fields, ", ", |f, column| {
                    write!(f, "{} {}", column.name, column.column_type)
                })?;
                f.write_char(')')?;
            }
        }

        if !self.conditions.is_empty() {
            f.write_str(" WHERE ")?;
            write_separated(f, &self.conditions, " AND ", |f, condition| {
                write!(f, "{}", condition)
            })?;
        }
        Ok(())
    }
}
