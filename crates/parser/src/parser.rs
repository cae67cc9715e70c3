use crate::ast::{CompareOp, Condition, Query, QueryKind};
use crate::config::ParseConfig;
use crate::diagnostics::{Diagnostic, Diagnostics, Silent};
use crate::error::{Clause, ParseError, PartialParse, ValidationError};
use crate::lexer::{Keyword, Lexer, Token};
use crate::validate::validate_halted;
use std::sync::Arc;

/// One state per grammar position. Data collected half way through a
/// construct travels inside the state until the construct is complete.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum State {
    Type,
    SelectField,
    SelectCommaOrFrom,
    SelectFromTable,
    InsertTable,
    InsertFieldsOpeningParens,
    InsertFields,
    InsertFieldsCommaOrClosingParens,
    InsertValuesKeyword,
    InsertValuesOpeningParens,
    InsertValues,
    InsertValuesCommaOrClosingParens,
    InsertValuesCommaBeforeOpeningParens,
    UpdateTable,
    UpdateSet,
    UpdateField,
    UpdateEquals { field: String },
    UpdateValue { field: String },
    UpdateComma,
    DeleteFromTable,
    CreateTable,
    CreateOpeningParens,
    CreateFieldName,
    CreateFieldType { name: String },
    CreateCommaOrClosingParens,
    CreateDone,
    Where,
    WhereField,
    WhereOperator(Condition),
    WhereValue(Condition),
    WhereInOpeningParens(Condition),
    WhereInValue(Condition),
    WhereInCommaOrClosingParens(Condition),
    WhereAnd,
}

impl State {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            State::Type => "Type",
            State::SelectField => "SelectField",
            State::SelectCommaOrFrom => "SelectCommaOrFrom",
            State::SelectFromTable => "SelectFromTable",
            State::InsertTable => "InsertTable",
            State::InsertFieldsOpeningParens => "InsertFieldsOpeningParens",
            State::InsertFields => "InsertFields",
            State::InsertFieldsCommaOrClosingParens => "InsertFieldsCommaOrClosingParens",
            State::InsertValuesKeyword => "InsertValuesKeyword",
            State::InsertValuesOpeningParens => "InsertValuesOpeningParens",
            State::InsertValues => "InsertValues",
            State::InsertValuesCommaOrClosingParens => "InsertValuesCommaOrClosingParens",
            State::InsertValuesCommaBeforeOpeningParens => "InsertValuesCommaBeforeOpeningParens",
            State::UpdateTable => "UpdateTable",
            State::UpdateSet => "UpdateSet",
            State::UpdateField => "UpdateField",
            State::UpdateEquals { .. } => "UpdateEquals",
            State::UpdateValue { .. } => "UpdateValue",
            State::UpdateComma => "UpdateComma",
            State::DeleteFromTable => "DeleteFromTable",
            State::CreateTable => "CreateTable",
            State::CreateOpeningParens => "CreateOpeningParens",
            State::CreateFieldName => "CreateFieldName",
            State::CreateFieldType { .. } => "CreateFieldType",
            State::CreateCommaOrClosingParens => "CreateCommaOrClosingParens",
            State::CreateDone => "CreateDone",
            State::Where => "Where",
            State::WhereField => "WhereField",
            State::WhereOperator(_) => "WhereOperator",
            State::WhereValue(_) => "WhereValue",
            State::WhereInOpeningParens(_) => "WhereInOpeningParens",
            State::WhereInValue(_) => "WhereInValue",
            State::WhereInCommaOrClosingParens(_) => "WhereInCommaOrClosingParens",
            State::WhereAnd => "WhereAnd",
        }
    }

    /// What this state accepts, used for the error when it gets anything else.
    fn expectation(&self) -> (Clause, &'static str) {
        match self {
            State::Type => (
                Clause::Statement,
                "SELECT, INSERT INTO, UPDATE, DELETE FROM or CREATE TABLE",
            ),
            State::SelectField => (Clause::Select, "field to SELECT"),
            State::SelectCommaOrFrom => (Clause::Select, "comma or FROM"),
            State::SelectFromTable => (Clause::Select, "quoted table name"),
            State::InsertTable => (Clause::InsertInto, "quoted table name"),
            State::InsertFieldsOpeningParens | State::InsertValuesOpeningParens => {
                (Clause::InsertInto, "opening parens")
            }
            State::InsertFields => (Clause::InsertInto, "at least one field to insert"),
            State::InsertFieldsCommaOrClosingParens | State::InsertValuesCommaOrClosingParens => {
                (Clause::InsertInto, "comma or closing parens")
            }
            State::InsertValuesKeyword => (Clause::InsertInto, "'VALUES'"),
            State::InsertValues => (Clause::InsertInto, "quoted value"),
            State::InsertValuesCommaBeforeOpeningParens => (Clause::InsertInto, "comma"),
            State::UpdateTable => (Clause::Update, "quoted table name"),
            State::UpdateSet => (Clause::Update, "'SET'"),
            State::UpdateField => (Clause::Update, "at least one field to update"),
            State::UpdateEquals { .. } => (Clause::Update, "'='"),
            State::UpdateValue { .. } => (Clause::Update, "quoted value"),
            State::UpdateComma => (Clause::Update, "','"),
            State::DeleteFromTable => (Clause::DeleteFrom, "quoted table name"),
            State::CreateTable => (Clause::CreateTable, "table name"),
            State::CreateOpeningParens => (Clause::CreateTable, "'('"),
            State::CreateFieldName => (Clause::CreateTable, "field name"),
            State::CreateFieldType { .. } => (Clause::CreateTable, "field type"),
            State::CreateCommaOrClosingParens => (Clause::CreateTable, "comma or ')'"),
            State::CreateDone => (Clause::CreateTable, "end of statement"),
            State::Where => (Clause::Where, "WHERE"),
            State::WhereField => (Clause::Where, "field"),
            State::WhereOperator(_) => (Clause::Where, "comparison operator"),
            State::WhereValue(condition) if condition.operator.is_pattern() => {
                (Clause::Where, "quoted value for LIKE/NOT LIKE")
            }
            State::WhereValue(_) => (Clause::Where, "quoted value"),
            State::WhereInOpeningParens(_) => (Clause::WhereIn, "opening parenthesis"),
            State::WhereInValue(_) => (Clause::WhereIn, "quoted value"),
            State::WhereInCommaOrClosingParens(_) => {
                (Clause::WhereIn, "comma or closing parenthesis")
            }
            State::WhereAnd => (Clause::Where, "AND"),
        }
    }

    /// States in which the statement may end. Ending anywhere else is only
    /// accepted by validation when it already reports a clearer error.
    fn is_accepting(&self) -> bool {
        matches!(
            self,
            State::Type
                | State::Where
                | State::WhereAnd
                | State::UpdateComma
                | State::InsertValuesCommaBeforeOpeningParens
                | State::CreateDone
        )
    }

    fn pending_condition(&self) -> Option<&Condition> {
        match self {
            State::WhereOperator(condition)
            | State::WhereValue(condition)
            | State::WhereInOpeningParens(condition)
            | State::WhereInValue(condition)
            | State::WhereInCommaOrClosingParens(condition) => Some(condition),
            _ => None,
        }
    }

    fn syntax_error(&self, lexer: &Lexer<'_>) -> ParseError {
        let (clause, expected) = self.expectation();
        ParseError::Syntax {
            clause,
            state: self.name(),
            expected,
            position: lexer.position(),
        }
    }
}

/// Consumes the token(s) of one grammar position and returns the next state
/// together with the advanced lexer.
pub(crate) fn step<'a>(
    state: State,
    mut lexer: Lexer<'a>,
    query: &mut Query,
) -> Result<(State, Lexer<'a>), ParseError> {
    let error = state.syntax_error(&lexer);
    let token = lexer.peek();

    let next = match state {
        State::Type => {
            let (kind, next) = match token {
                Token::Keyword(Keyword::Select) => (QueryKind::Select, State::SelectField),
                Token::Keyword(Keyword::InsertInto) => (QueryKind::Insert, State::InsertTable),
                Token::Keyword(Keyword::Update) => (QueryKind::Update, State::UpdateTable),
                Token::Keyword(Keyword::DeleteFrom) => {
                    (QueryKind::Delete, State::DeleteFromTable)
                }
                Token::Keyword(Keyword::CreateTable) => (QueryKind::Create, State::CreateTable),
                _ => return Err(error),
            };
            query.kind = kind;
            lexer.pop();
            next
        }

        State::SelectField => {
            let field = match token {
                Token::Ident("*") => "*",
                token => token.identifier().ok_or(error)?,
            };
            query.fields.push(field.to_string());
            lexer.pop();

            if lexer.peek().is_keyword(Keyword::As) {
                lexer.pop();
                let alias = lexer.peek().identifier().ok_or(ParseError::Syntax {
                    clause: Clause::Select,
                    state: "SelectField",
                    expected: "field alias after AS",
                    position: lexer.position(),
                })?;
                query.aliases.insert(field.to_string(), alias.to_string());
                lexer.pop();
            }
            State::SelectCommaOrFrom
        }
        State::SelectCommaOrFrom => {
            let next = match token {
                Token::Keyword(Keyword::Comma) => State::SelectField,
                Token::Keyword(Keyword::From) => State::SelectFromTable,
                _ => return Err(error),
            };
            lexer.pop();
            next
        }
        State::SelectFromTable => {
            query.table_name = token.name().ok_or(error)?.to_string();
            lexer.pop();
            State::Where
        }

        State::InsertTable => {
            query.table_name = token.name().ok_or(error)?.to_string();
            lexer.pop();
            State::InsertFieldsOpeningParens
        }
        State::InsertFieldsOpeningParens => {
            if !token.is_keyword(Keyword::LeftParen) {
                return Err(error);
            }
            lexer.pop();
            State::InsertFields
        }
        State::InsertFields => {
            query.fields.push(token.identifier().ok_or(error)?.to_string());
            lexer.pop();
            State::InsertFieldsCommaOrClosingParens
        }
        State::InsertFieldsCommaOrClosingParens => {
            let next = match token {
                Token::Keyword(Keyword::Comma) => State::InsertFields,
                Token::Keyword(Keyword::RightParen) => State::InsertValuesKeyword,
                _ => return Err(error),
            };
            lexer.pop();
            next
        }
        State::InsertValuesKeyword => {
            if !token.is_keyword(Keyword::Values) {
                return Err(error);
            }
            lexer.pop();
            State::InsertValuesOpeningParens
        }
        State::InsertValuesOpeningParens => {
            if !token.is_keyword(Keyword::LeftParen) {
                return Err(error);
            }
            query.inserts.push(Vec::new());
            lexer.pop();
            State::InsertValues
        }
        State::InsertValues => {
            let value = token.quoted().ok_or(error)?;
            if let Some(row) = query.inserts.last_mut() {
                row.push(value.to_string());
            }
            lexer.pop();
            State::InsertValuesCommaOrClosingParens
        }
        State::InsertValuesCommaOrClosingParens => match token {
            Token::Keyword(Keyword::Comma) => {
                lexer.pop();
                State::InsertValues
            }
            Token::Keyword(Keyword::RightParen) => {
                let found = query.inserts.last().map_or(0, Vec::len);
                if found != query.fields.len() {
                    return Err(ValidationError::ArityMismatch {
                        row: query.inserts.len().saturating_sub(1),
                        expected: query.fields.len(),
                        found,
                    }
                    .into());
                }
                lexer.pop();
                State::InsertValuesCommaBeforeOpeningParens
            }
            _ => return Err(error),
        },
        State::InsertValuesCommaBeforeOpeningParens => {
            if !token.is_keyword(Keyword::Comma) {
                return Err(error);
            }
            lexer.pop();
            State::InsertValuesOpeningParens
        }

        State::UpdateTable => {
            query.table_name = token.name().ok_or(error)?.to_string();
            lexer.pop();
            State::UpdateSet
        }
        State::UpdateSet => {
            if !token.is_keyword(Keyword::Set) {
                return Err(error);
            }
            lexer.pop();
            State::UpdateField
        }
        State::UpdateField => {
            let field = token.identifier().ok_or(error)?.to_string();
            lexer.pop();
            State::UpdateEquals { field }
        }
        State::UpdateEquals { field } => {
            if !token.is_keyword(Keyword::Equal) {
                return Err(error);
            }
            lexer.pop();
            State::UpdateValue { field }
        }
        State::UpdateValue { field } => {
            let value = token.quoted().ok_or(error)?;
            query.set_update(&field, value);
            lexer.pop();
            if lexer.peek().is_keyword(Keyword::Where) {
                State::Where
            } else {
                State::UpdateComma
            }
        }
        State::UpdateComma => {
            if !token.is_keyword(Keyword::Comma) {
                return Err(error);
            }
            lexer.pop();
            State::UpdateField
        }

        State::DeleteFromTable => {
            query.table_name = token.name().ok_or(error)?.to_string();
            lexer.pop();
            State::Where
        }

        State::CreateTable => {
            query.table_name = token.name().ok_or(error)?.to_string();
            lexer.pop();
            State::CreateOpeningParens
        }
        State::CreateOpeningParens => {
            if !token.is_keyword(Keyword::LeftParen) {
                return Err(error);
            }
            lexer.pop();
            State::CreateFieldName
        }
        State::CreateFieldName => {
            let name = token.identifier().ok_or(error)?.to_string();
            lexer.pop();
            State::CreateFieldType { name }
        }
        State::CreateFieldType { name } => {
            let column_type = token.identifier().ok_or(error)?;
            query.set_column(&name, column_type);
            lexer.pop();
            State::CreateCommaOrClosingParens
        }
        State::CreateCommaOrClosingParens => {
            let next = match token {
                Token::Keyword(Keyword::Comma) => State::CreateFieldName,
                Token::Keyword(Keyword::RightParen) => State::CreateDone,
                _ => return Err(error),
            };
            lexer.pop();
            next
        }
        State::CreateDone => return Err(error),

        State::Where => {
            if !token.is_keyword(Keyword::Where) {
                return Err(error);
            }
            lexer.pop();
            State::WhereField
        }
        State::WhereField => {
            let field = token.identifier().ok_or(error)?;
            lexer.pop();
            State::WhereOperator(Condition::on_field(field))
        }
        State::WhereOperator(mut condition) => {
            let operator = match token {
                Token::Keyword(keyword) => CompareOp::from_keyword(keyword).ok_or(error)?,
                _ => return Err(error),
            };
            condition.operator = operator;
            lexer.pop();
            if operator.takes_list() {
                State::WhereInOpeningParens(condition)
            } else {
                State::WhereValue(condition)
            }
        }
        State::WhereValue(mut condition) => {
            if condition.operator.is_pattern() {
                condition.operand2 = token.quoted().ok_or(error)?.to_string();
                condition.operand2_is_field = false;
            } else if let Some(field) = token.identifier() {
                condition.operand2 = field.to_string();
                condition.operand2_is_field = true;
            } else {
                condition.operand2 = token.quoted().ok_or(error)?.to_string();
                condition.operand2_is_field = false;
            }
            query.conditions.push(condition);
            lexer.pop();
            State::WhereAnd
        }
        State::WhereInOpeningParens(condition) => {
            if !token.is_keyword(Keyword::LeftParen) {
                return Err(error);
            }
            lexer.pop();
            State::WhereInValue(condition)
        }
        State::WhereInValue(mut condition) => {
            condition
                .in_values
                .push(token.quoted().ok_or(error)?.to_string());
            lexer.pop();
            State::WhereInCommaOrClosingParens(condition)
        }
        State::WhereInCommaOrClosingParens(condition) => {
            let next = match token {
                Token::Keyword(Keyword::Comma) => State::WhereInValue(condition),
                Token::Keyword(Keyword::RightParen) => {
                    query.conditions.push(condition);
                    State::WhereAnd
                }
                _ => return Err(error),
            };
            lexer.pop();
            next
        }
        State::WhereAnd => {
            if !token.is_word("AND") {
                return Err(error);
            }
            lexer.pop();
            State::WhereField
        }
    };

    Ok((next, lexer))
}

/// Parses statements of the dialect into [`Query`] values.
///
/// A parser holds only configuration and the diagnostics sink, so one
/// instance can be shared by any number of threads.
#[derive(Clone)]
pub struct Parser {
    config: ParseConfig,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            config: ParseConfig::default(),
            diagnostics: Arc::new(Silent),
        }
    }

    pub fn with_config(mut self, config: ParseConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    pub fn parse(&self, input: &str) -> Result<Query, ParseError> {
        let input = input.trim();
        match self.run(input) {
            Ok(query) => {
                tracing::debug!(
                    kind = %query.kind,
                    table = %query.table_name,
                    conditions = query.conditions.len(),
                    "parsed statement"
                );
                Ok(query)
            }
            Err((error, position)) => {
                self.diagnostics.report(&Diagnostic {
                    input: input.to_string(),
                    position,
                    message: error.to_string(),
                });
                Err(error)
            }
        }
    }

    /// Parses statements in order and stops at the first failure.
    pub fn parse_many<I, S>(&self, inputs: I) -> Result<Vec<Query>, PartialParse>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = Vec::new();
        for (index, input) in inputs.into_iter().enumerate() {
            match self.parse(input.as_ref()) {
                Ok(query) => parsed.push(query),
                Err(source) => {
                    return Err(PartialParse {
                        parsed,
                        index,
                        source,
                    })
                }
            }
        }
        Ok(parsed)
    }

    /// Drives the state machine over `input`. Errors carry the position the
    /// machine stopped at.
    fn run(&self, input: &str) -> Result<Query, (ParseError, usize)> {
        let mut lexer = Lexer::new(input, self.config.whitespace);
        let mut state = State::Type;
        let mut query = Query::default();

        while !lexer.is_at_end() {
            tracing::trace!(state = state.name(), position = lexer.position(), "step");
            let (next, advanced) = step(state, lexer, &mut query).map_err(|error| {
                let position = match &error {
                    ParseError::Syntax { position, .. } => *position,
                    ParseError::Validation(_) => lexer.position(),
                };
                (error, position)
            })?;
            state = next;
            lexer = advanced;
        }

        if let Some(condition) = state.pending_condition() {
            query.conditions.push(condition.clone());
        }
        validate_halted(&query, &state).map_err(|error| (error.into(), lexer.position()))?;

        if !state.is_accepting() {
            return Err((state.syntax_error(&lexer), lexer.position()));
        }
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WhitespacePolicy;

    fn parse(input: &str) -> Result<Query, ParseError> {
        Parser::new().parse(input)
    }

    #[test]
    fn test_step_carries_update_field_in_state() {
        let lexer = Lexer::new("b = 'x'", WhitespacePolicy::Space);
        let mut query = Query::default();

        let (state, lexer) = step(State::UpdateField, lexer, &mut query).unwrap();
        assert_eq!(
            state,
            State::UpdateEquals {
                field: "b".to_string()
            }
        );
        let (state, lexer) = step(state, lexer, &mut query).unwrap();
        let (state, lexer) = step(state, lexer, &mut query).unwrap();

        assert_eq!(state, State::UpdateComma);
        assert!(lexer.is_at_end());
        assert_eq!(query.update("b"), Some("x"));
    }

    #[test]
    fn test_step_reports_state_and_position() {
        let lexer = Lexer::new("UPDATE 'a' SET b WHERE", WhitespacePolicy::Space);
        let mut query = Query::default();
        let mut state = State::Type;
        let mut lexer = lexer;
        let error = loop {
            match step(state, lexer, &mut query) {
                Ok((next, advanced)) => {
                    state = next;
                    lexer = advanced;
                }
                Err(error) => break error,
            }
        };

        assert_eq!(
            error,
            ParseError::Syntax {
                clause: Clause::Update,
                state: "UpdateEquals",
                expected: "'='",
                position: 17,
            }
        );
    }

    #[test]
    fn test_select_with_alias() {
        let query = parse("SELECT a as z, b AS y, c FROM 'b'").unwrap();
        assert_eq!(query.fields, vec!["a", "b", "c"]);
        assert_eq!(query.aliases.get("a").map(String::as_str), Some("z"));
        assert_eq!(query.aliases.get("b").map(String::as_str), Some("y"));
        assert!(!query.aliases.contains_key("c"));
    }

    #[test]
    fn test_alias_must_be_identifier() {
        let err = parse("SELECT a AS FROM 'b'").unwrap_err();
        assert_eq!(err.to_string(), "at SELECT: expected field alias after AS");
    }

    #[test]
    fn test_unknown_statement() {
        let err = parse("DROP TABLE x").unwrap_err();
        assert!(err.is_syntax());
        assert_eq!(
            err.to_string(),
            "at start of statement: expected SELECT, INSERT INTO, UPDATE, DELETE FROM or CREATE TABLE"
        );
    }

    #[test]
    fn test_incomplete_in_list() {
        let err = parse("SELECT * FROM users WHERE id IN ('1', '2'").unwrap_err();
        assert_eq!(
            err.to_string(),
            "at WHERE IN: expected comma or closing parenthesis"
        );
    }

    #[test]
    fn test_missing_operand_at_end() {
        let err = parse("SELECT * FROM users WHERE age = ").unwrap_err();
        assert_eq!(err.to_string(), "at WHERE: expected quoted value");
    }

    #[test]
    fn test_trailing_and() {
        let err = parse("SELECT * FROM users WHERE a = '1' AND").unwrap_err();
        assert_eq!(err.to_string(), "at WHERE: expected field");
    }

    #[test]
    fn test_create_rejects_trailing_tokens() {
        let err = parse("CREATE TABLE t (a int) WHERE").unwrap_err();
        assert_eq!(err.to_string(), "at CREATE TABLE: expected end of statement");
    }

    #[test]
    fn test_create_needs_closing_paren() {
        let err = parse("CREATE TABLE t (a int").unwrap_err();
        assert_eq!(err.to_string(), "at CREATE TABLE: expected comma or ')'");
    }

    #[test]
    fn test_insert_trailing_comma() {
        let err = parse("INSERT INTO 'a' (b) VALUES ('1'),").unwrap_err();
        assert_eq!(err.to_string(), "at INSERT INTO: expected opening parens");
    }

    #[test]
    fn test_insert_row_arity_checked_on_close() {
        let err = parse("INSERT INTO 'a' (b, c) VALUES ('1', '2'), ('3')").unwrap_err();
        assert_eq!(
            err,
            ParseError::Validation(ValidationError::ArityMismatch {
                row: 1,
                expected: 2,
                found: 1,
            })
        );
    }

    #[test]
    fn test_parser_exposes_its_config() {
        assert_eq!(Parser::new().config(), &ParseConfig::default());

        let config = ParseConfig::default().with_whitespace(WhitespacePolicy::Any);
        let parser = Parser::default().with_config(config.clone());
        assert_eq!(parser.config(), &config);
    }

    #[test]
    fn test_tab_is_not_whitespace_by_default() {
        assert!(parse("SELECT a\tFROM 'b'").is_err());

        let parser =
            Parser::new().with_config(ParseConfig::default().with_whitespace(WhitespacePolicy::Any));
        let query = parser.parse("SELECT a\tFROM\n'b'").unwrap();
        assert_eq!(query.table_name, "b");
    }
}
