//! Row-source SQL helpers.
//!
//! The row source is always the catalog's T-SQL endpoint (or a lakehouse SQL
//! endpoint with the same surface), so this module carries just what the
//! generator and filter converter need:
//!
//! - [`ident`] - identifier and string-literal quoting
//! - [`select`] - the `SELECT … FROM <table> AS Base [WHERE …]` builder
//! - [`validate`] - parse validation via sqlparser

pub mod ident;
pub mod select;
pub mod validate;

pub use ident::{is_plain_identifier, quote_bracket, quote_identifier, quote_string_single};
pub use select::{SelectColumn, SelectQuery};
pub use validate::{validate_sql, SqlValidationError};
