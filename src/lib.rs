//! # semforge
//!
//! Compiles entity-catalog table selections and saved-view filters into a
//! TMDL semantic-model definition, and keeps user edits alive across
//! regeneration.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │         Catalog input (tables, attributes, edges)        │
//! │           + FetchXML view filters per table              │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!          ┌───────────────┼────────────────┐
//!          ▼ [filter]      ▼ [lookup]       │
//! ┌────────────────┐ ┌──────────────────┐   │
//! │ WHERE clauses  │ │ sub-column plans │   │
//! └────────────────┘ └──────────────────┘   │
//!          └───────────────┼────────────────┘
//!                          ▼ [tmdl]
//! ┌─────────────────────────────────────────────────────────┐
//! │             GeneratedDefinitionSet (fresh)               │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [preserve] + [analyze]
//! ┌─────────────────────────────────────────────────────────┐
//! │     Merged definitions + change list for review          │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! [`regenerate::regenerate`] runs the whole pass.

pub mod analyze;
pub mod config;
pub mod filter;
pub mod lookup;
pub mod model;
pub mod preserve;
pub mod regenerate;
pub mod sql;
pub mod tmdl;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::analyze::{
        analyze, AnalysisConfig, ChangeType, ImpactLevel, ObjectType, SemanticModelChange,
    };
    pub use crate::filter::{FilterConversion, FilterConverter, FilterEnvironment};
    pub use crate::lookup::{resolve_lookup_columns, ResolvedLookupColumns};
    pub use crate::model::{
        AttributeDescriptor, AttributeType, ConnectionType, DateTableConfig,
        GeneratedDefinitionSet, LookupSubColumnConfig, RelationshipEdge, StorageMode, TableRole,
        TableSelection,
    };
    pub use crate::preserve::{merge, parse_definitions, PreservedMetadata};
    pub use crate::regenerate::{regenerate, ModelInput, RegenerateOutput};
    pub use crate::tmdl::{GenerateOptions, GenerationOutput, ModelDefinitionGenerator};
}
