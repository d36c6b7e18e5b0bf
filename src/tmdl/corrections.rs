//! Virtual column name corrections.
//!
//! The catalog advertises some virtual columns the SQL endpoint does not
//! expose. Each run carries its own table, seeded with the known defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_CORRECTIONS: [(&str, &str); 4] = [
    ("createdbyyominame", "createdbyname"),
    ("modifiedbyyominame", "modifiedbyname"),
    ("createdonbehalfbyyominame", "createdonbehalfbyname"),
    ("modifiedonbehalfbyyominame", "modifiedonbehalfbyname"),
];

/// Advertised column name → queryable column name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnCorrections(BTreeMap<String, String>);

impl Default for ColumnCorrections {
    fn default() -> Self {
        Self(
            DEFAULT_CORRECTIONS
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        )
    }
}

impl ColumnCorrections {
    /// A table with no corrections at all.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, advertised: impl Into<String>, actual: impl Into<String>) -> Self {
        self.insert(advertised, actual);
        self
    }

    pub fn insert(&mut self, advertised: impl Into<String>, actual: impl Into<String>) {
        self.0
            .insert(advertised.into().to_ascii_lowercase(), actual.into());
    }

    pub fn extend(&mut self, other: &ColumnCorrections) {
        for (from, to) in &other.0 {
            self.insert(from.clone(), to.clone());
        }
    }

    /// Queryable name for `column`, or `column` itself.
    pub fn apply<'a>(&'a self, column: &'a str) -> &'a str {
        self.0
            .get(&column.to_ascii_lowercase())
            .map(String::as_str)
            .unwrap_or(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
