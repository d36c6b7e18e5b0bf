//! Catalog-facing data model.
//!
//! These are the plain-data shapes the metadata collaborator hands to the
//! core (attributes, table selections, relationship edges, per-table lookup
//! configuration) and the one artifact the core hands back
//! ([`GeneratedDefinitionSet`]). Everything here is `serde`-serializable so
//! the collaborator can exchange it as JSON.

pub mod attribute;
pub mod date;
pub mod definition;
pub mod lookup;
pub mod relationship;
pub mod storage;
pub mod table;

pub use attribute::{AttributeDescriptor, AttributeType};
pub use date::{DateConfigError, DateTableConfig};
pub use definition::GeneratedDefinitionSet;
pub use lookup::{LookupSubColumnConfig, SubColumnSetting};
pub use relationship::RelationshipEdge;
pub use storage::{ConnectionType, StorageMode};
pub use table::{TableRole, TableSelection};
