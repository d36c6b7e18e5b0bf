//! TMDL emission.
//!
//! ```text
//! definition/
//!   database.tmdl
//!   model.tmdl
//!   expressions.tmdl        connector parameters
//!   relationships.tmdl
//!   tables/<Table>.tmdl     one per selected table, plus Date
//! ```
//!
//! Text is written through [`format::IndentWriter`] with one tab per level,
//! the indentation the consuming tool writes itself. Lineage tags and
//! relationship names are fresh UUIDs here; [`crate::preserve`] restores
//! prior ones afterwards.

pub mod column;
pub mod corrections;
pub mod date_table;
pub mod format;
pub mod generator;
pub mod model_file;
pub mod partition;
pub mod relationship;
pub mod table;

pub use column::{ColumnSpec, DataType};
pub use corrections::ColumnCorrections;
pub use date_table::{DATE_COLUMN, DATE_TABLE};
pub use generator::{
    table_path, DiagnosticKind, GenerateError, GenerateOptions, GenerateResult,
    GenerationDiagnostic, GenerationOutput, ModelDefinitionGenerator, DATABASE_PATH,
    EXPRESSIONS_PATH, MODEL_PATH, RELATIONSHIPS_PATH,
};
pub use relationship::{GENERATED_ANNOTATION, SNOWFLAKE_ANNOTATION};
pub use table::{auto_measure_name, BASE_ALIAS, LOGICAL_NAME_ANNOTATION};
