//! Saved-view filter conversion.
//!
//! ```text
//! FetchXML ──[parse]──▶ FetchQuery ──[convert]──▶ WHERE clause + diagnostics
//! ```
//!
//! Conversion degrades instead of failing: an operator the converter cannot
//! express contributes no clause and is reported in
//! [`FilterConversion::unsupported_features`].
//!
//! # Example
//!
//! ```
//! use semforge::filter::FilterConverter;
//!
//! let xml = r#"<fetch><entity name="account"><filter type="and">
//!     <condition attribute="name" operator="begins-with" value="Contoso" />
//! </filter></entity></fetch>"#;
//! let out = FilterConverter::new(0.0).convert(xml, "Base");
//! assert_eq!(out.sql_where_clause, "Base.name LIKE 'Contoso%'");
//! ```

pub mod ast;
pub mod convert;
pub mod datetime;
pub mod parse;
pub mod value;

pub use ast::{
    Condition, ConditionOperator, DateUnit, FetchQuery, FilterGroup, FilterItem, LinkEntity,
    LinkType, LogicalOperator,
};
pub use convert::{FilterConversion, FilterConverter, FilterEnvironment};
pub use datetime::TimeShift;
pub use parse::{parse_fetch_xml, FilterParseError};
