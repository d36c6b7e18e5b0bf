//! Relationship edges between selected tables.

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A directed reference from a source table's lookup to a target table's key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub source_table: String,
    pub source_attribute: String,
    pub target_table: String,

    #[serde(default = "default_true")]
    pub active: bool,

    #[serde(default)]
    pub snowflake: bool,

    #[serde(default)]
    pub assume_referential_integrity: bool,
}

impl RelationshipEdge {
    pub fn new(
        source_table: impl Into<String>,
        source_attribute: impl Into<String>,
        target_table: impl Into<String>,
    ) -> Self {
        Self {
            source_table: source_table.into(),
            source_attribute: source_attribute.into(),
            target_table: target_table.into(),
            active: true,
            snowflake: false,
            assume_referential_integrity: false,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn snowflake(mut self) -> Self {
        self.snowflake = true;
        self
    }

    pub fn assume_integrity(mut self) -> Self {
        self.assume_referential_integrity = true;
        self
    }

    /// True when this edge starts at `table`.`attribute`.
    pub fn starts_at(&self, table: &str, attribute: &str) -> bool {
        self.source_table.eq_ignore_ascii_case(table)
            && self.source_attribute.eq_ignore_ascii_case(attribute)
    }
}
