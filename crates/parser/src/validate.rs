use crate::ast::{CompareOp, Query, QueryKind};
use crate::error::ValidationError;
use crate::parser::State;

/// Checks that need the state the machine halted in, followed by the
/// checks on the query alone.
pub(crate) fn validate_halted(query: &Query, halted_in: &State) -> Result<(), ValidationError> {
    if *halted_in == State::WhereField && query.conditions.is_empty() {
        return Err(ValidationError::EmptyWhere);
    }
    query.validate()
}

impl Query {
    /// Checks the invariants every successfully parsed query satisfies.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.kind == QueryKind::Unknown {
            return Err(ValidationError::MissingKind);
        }
        if self.table_name.is_empty() {
            return Err(ValidationError::MissingTable);
        }
        if self.kind == QueryKind::Create {
            if self.create_fields.is_empty() {
                return Err(ValidationError::MissingColumns);
            }
            return Ok(());
        }
        if self.conditions.is_empty() && matches!(self.kind, QueryKind::Update | QueryKind::Delete)
        {
            return Err(ValidationError::MissingWhere);
        }

        for condition in &self.conditions {
            if condition.operator == CompareOp::Unknown {
                return Err(ValidationError::MissingOperator);
            }
            if condition.operand1.is_empty() {
                return Err(ValidationError::EmptyLeftOperand);
            }
            if condition.operator.takes_list() {
                if condition.in_values.is_empty() {
                    return Err(ValidationError::EmptyInValues);
                }
            } else if condition.operand2_is_field && condition.operand2.is_empty() {
                return Err(ValidationError::EmptyRightOperand);
            }
        }

        if self.kind == QueryKind::Insert {
            if self.inserts.is_empty() {
                return Err(ValidationError::MissingRows);
            }
            let expected = self.fields.len();
            if let Some((row, values)) = self
                .inserts
                .iter()
                .enumerate()
                .find(|(_, values)| values.len() != expected)
            {
                return Err(ValidationError::ArityMismatch {
                    row,
                    expected,
                    found: values.len(),
                });
            }
        }

        Ok(())
    }
}
