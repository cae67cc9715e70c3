use crate::config::FilterConfig;
use crate::executor::{Executor, ExecutorError, Record};
use sift_parser::{ParseError, Parser, Query, QueryKind};
use std::collections::HashMap;
use thiserror::Error;

pub type Dataset = HashMap<String, Record>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to parse SQL: {0}")]
    Parse(#[from] ParseError),
    #[error("only SELECT queries can be filtered, got {0}")]
    NotSelect(QueryKind),
    #[error("execution error: {0}")]
    Execution(#[from] ExecutorError),
}

/// Parses SELECT statements and applies their WHERE clause to datasets of
/// JSON records.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    parser: Parser,
    config: FilterConfig,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine configured from `SIFT_WHITESPACE` and `SIFT_ORDERING`.
    pub fn from_env() -> Self {
        Self {
            parser: Parser::new().with_config(sift_parser::ParseConfig::from_env()),
            config: FilterConfig::from_env(),
        }
    }

    pub fn with_parser(mut self, parser: Parser) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_config(mut self, config: FilterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Parses `text` and checks that it is a SELECT.
    pub fn select(&self, text: &str) -> Result<Query, EngineError> {
        let query = self.parser.parse(text)?;
        if query.kind != QueryKind::Select {
            return Err(EngineError::NotSelect(query.kind));
        }
        Ok(query)
    }

    /// Records of `dataset` matching the WHERE clause of `text`, borrowed
    /// under their original ids.
    pub fn filter<'d>(
        &self,
        text: &str,
        dataset: &'d Dataset,
    ) -> Result<HashMap<&'d str, &'d Record>, EngineError> {
        let query = self.select(text)?;
        let executor = Executor::new(&query.conditions, self.config.ordering)?;

        let matched: HashMap<&'d str, &'d Record> = dataset
            .iter()
            .filter(|(_, record)| executor.matches(record))
            .map(|(id, record)| (id.as_str(), record))
            .collect();

        tracing::debug!(
            table = %query.table_name,
            matched = matched.len(),
            total = dataset.len(),
            "filtered dataset"
        );
        Ok(matched)
    }

    /// Like [`Engine::filter`], but takes the dataset by value and keeps
    /// only the matching records.
    pub fn filter_owned(&self, text: &str, mut dataset: Dataset) -> Result<Dataset, EngineError> {
        let query = self.select(text)?;
        let executor = Executor::new(&query.conditions, self.config.ordering)?;

        let total = dataset.len();
        dataset.retain(|_, record| executor.matches(record));

        tracing::debug!(
            table = %query.table_name,
            matched = dataset.len(),
            total,
            "filtered dataset"
        );
        Ok(dataset)
    }

    /// Evaluates the WHERE clause of an already parsed query against one
    /// record. Any query kind is accepted.
    pub fn matches(&self, query: &Query, record: &Record) -> Result<bool, EngineError> {
        let executor = Executor::new(&query.conditions, self.config.ordering)?;
        Ok(executor.matches(record))
    }
}
