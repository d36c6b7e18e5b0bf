//! Change records.

use serde::Serialize;
use std::fmt;

use crate::model::StorageMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ObjectType {
    Table,
    Column,
    Relationship,
    Measure,
    Query,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ChangeType {
    New,
    Update,
    Preserve,
    Warning,
    Error,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ImpactLevel {
    Safe,
    Additive,
    Moderate,
    Destructive,
}

/// One entry of the review list shown before a rebuild is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SemanticModelChange {
    pub object_type: ObjectType,
    pub object_name: String,
    pub change_type: ChangeType,
    pub impact: ImpactLevel,
    pub description: String,
}

impl SemanticModelChange {
    pub fn new(
        object_type: ObjectType,
        object_name: impl Into<String>,
        change_type: ChangeType,
        impact: ImpactLevel,
        description: impl Into<String>,
    ) -> Self {
        Self {
            object_type,
            object_name: object_name.into(),
            change_type,
            impact,
            description: description.into(),
        }
    }

    pub fn is_destructive(&self) -> bool {
        self.impact == ImpactLevel::Destructive
    }
}

impl fmt::Display for SemanticModelChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?}/{:?}] {:?} {}: {}",
            self.change_type, self.impact, self.object_type, self.object_name, self.description
        )
    }
}

/// What the analysis compares the prior output against.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AnalysisConfig {
    pub storage_mode: StorageMode,
    /// Logical name of the fact table. When absent, the table carrying the
    /// generated row-count measure is used.
    pub fact_table: Option<String>,
    /// Also report unchanged columns and relationships.
    pub include_unchanged: bool,
}

/// True when any change would remove something from the live model.
pub fn has_destructive(changes: &[SemanticModelChange]) -> bool {
    changes.iter().any(SemanticModelChange::is_destructive)
}
