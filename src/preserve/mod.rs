//! Preservation of identity and user edits across regeneration.
//!
//! ```text
//! prior files ──[parse_definitions]──▶ PreservedMetadata
//!                                            │
//! fresh files ───────────────────[merge]─────┴──▶ merged files
//! ```
//!
//! Columns are identified by their row-source column, never by their
//! display name, so renaming a column keeps its lineage tag. All text
//! surgery happens on the [`document::Document`] block tree; regexes only
//! ever see a single line.

pub mod document;
pub mod merge;
pub mod metadata;
pub mod parse;

pub use document::{Document, Node};
pub use merge::merge;
pub use metadata::{
    ParseWarning, PreservedAnnotation, PreservedColumn, PreservedMeasure, PreservedMetadata,
    PreservedPartition, PreservedRelationship, PreservedTable, RelationshipKey,
};
pub use parse::{is_generated_definition, parse_definitions, parse_file};
