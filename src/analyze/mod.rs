//! Change analysis ahead of an incremental rebuild.
//!
//! Compares what a prior definition set contained with a freshly generated
//! one and classifies every difference by [`ChangeType`] and
//! [`ImpactLevel`]. Nothing here writes; callers decide whether a list with
//! destructive entries may be applied.

pub mod change;
pub mod diff;
pub mod reach;

pub use change::{
    has_destructive, AnalysisConfig, ChangeType, ImpactLevel, ObjectType, SemanticModelChange,
};
pub use diff::{analyze, query_hash};
pub use reach::unreachable_tables;
