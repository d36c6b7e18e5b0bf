//! What survives from a prior definition set.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::tmdl::format::split_column_ref;
use crate::tmdl::DATE_TABLE;

use super::document::Node;

/// Ordered pair of `Table.Column` endpoints identifying a relationship.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RelationshipKey {
    pub from: String,
    pub to: String,
}

impl RelationshipKey {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Keys of calendar relationships, expected to vanish when the date
    /// configuration changes.
    pub fn targets_date_table(&self) -> bool {
        split_column_ref(&self.to).is_some_and(|(table, _)| table == DATE_TABLE)
    }

    pub fn from_table(&self) -> Option<String> {
        split_column_ref(&self.from).map(|(table, _)| table)
    }

    pub fn to_table(&self) -> Option<String> {
        split_column_ref(&self.to).map(|(table, _)| table)
    }
}

impl fmt::Display for RelationshipKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreservedAnnotation {
    pub name: String,
    pub value: String,
    #[serde(skip)]
    pub block: Node,
}

/// Formatting of one column, keyed by its row-source column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PreservedColumn {
    pub name: String,
    pub source_column: String,
    pub data_type: Option<String>,
    pub format_string: Option<String>,
    pub summarize_by: Option<String>,
    pub is_hidden: bool,
    pub is_key: bool,
    pub annotations: Vec<PreservedAnnotation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreservedMeasure {
    pub name: String,
    pub expression: String,
    /// Matches the generator's own measure naming.
    pub auto_generated: bool,
    #[serde(skip)]
    pub block: Node,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreservedPartition {
    pub name: String,
    /// Source kind after `=`: `m` or `calculated`.
    pub kind: String,
    pub mode: Option<String>,
    /// Rendered `source` expression.
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PreservedTable {
    /// Stable key: the logical-name annotation, else the table name.
    pub key: String,
    pub name: String,
    /// Carries the logical-name annotation, i.e. was written by the generator.
    pub generated: bool,
    /// `"table"`, `"col:<source>"`, `"measure:<name>"` → lineage tag.
    pub lineage_tags: BTreeMap<String, String>,
    pub columns: BTreeMap<String, PreservedColumn>,
    pub measures: Vec<PreservedMeasure>,
    pub partition: Option<PreservedPartition>,
}

impl PreservedTable {
    pub fn user_measures(&self) -> impl Iterator<Item = &PreservedMeasure> {
        self.measures.iter().filter(|m| !m.auto_generated)
    }

    pub fn key_column_count(&self) -> usize {
        self.columns.values().filter(|c| c.is_key).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreservedRelationship {
    pub name: String,
    pub key: RelationshipKey,
    pub is_active: bool,
    /// Carries the generator's marker annotation.
    pub generated: bool,
    /// Order of appearance in the prior file.
    pub position: usize,
    #[serde(skip)]
    pub block: Node,
}

/// Something in the prior text that could not be recovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub path: String,
    pub message: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Identity and user edits recovered from a prior definition set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PreservedMetadata {
    pub tables: BTreeMap<String, PreservedTable>,
    /// `"expr:<name>"` → lineage tag.
    pub expression_tags: BTreeMap<String, String>,
    pub relationships: BTreeMap<RelationshipKey, PreservedRelationship>,
    pub warnings: Vec<ParseWarning>,
}

impl PreservedMetadata {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.expression_tags.is_empty() && self.relationships.is_empty()
    }

    /// Table by its display name.
    pub fn table_named(&self, name: &str) -> Option<&PreservedTable> {
        self.tables.values().find(|t| t.name == name)
    }

    /// Relationships a person added: absent from `fresh`, not a stale
    /// calendar relationship, and never marked as generated. In file order.
    pub fn user_relationships(&self, fresh: &HashSet<RelationshipKey>) -> Vec<&PreservedRelationship> {
        let mut user: Vec<_> = self
            .relationships
            .values()
            .filter(|r| !fresh.contains(&r.key) && !r.key.targets_date_table() && !r.generated)
            .collect();
        user.sort_by_key(|r| r.position);
        user
    }
}
