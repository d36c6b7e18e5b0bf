//! Parse validation of generated row-source SQL.
//!
//! Uses sqlparser-rs with the MS SQL dialect so a malformed query is caught
//! at generation time instead of at refresh time in the consuming tool.

use sqlparser::dialect::MsSqlDialect;
use sqlparser::parser::Parser;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid SQL: {message}")]
pub struct SqlValidationError {
    pub message: String,
    pub sql: String,
}

/// Validates that a SQL string is syntactically valid T-SQL.
pub fn validate_sql(sql: &str) -> Result<(), SqlValidationError> {
    Parser::parse_sql(&MsSqlDialect {}, sql)
        .map(|_| ())
        .map_err(|e| SqlValidationError {
            message: e.to_string(),
            sql: sql.to_string(),
        })
}
