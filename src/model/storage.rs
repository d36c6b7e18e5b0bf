//! Storage mode and connector selection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the consuming tool stores table data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    #[default]
    DirectQuery,
    Import,
    Dual,
}

impl StorageMode {
    /// Value of the partition `mode:` property.
    pub fn as_tmdl(&self) -> &'static str {
        match self {
            StorageMode::DirectQuery => "directQuery",
            StorageMode::Import => "import",
            StorageMode::Dual => "dual",
        }
    }

    pub fn from_tmdl(s: &str) -> Option<Self> {
        match s.trim() {
            "directQuery" => Some(StorageMode::DirectQuery),
            "import" => Some(StorageMode::Import),
            "dual" => Some(StorageMode::Dual),
            _ => None,
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tmdl())
    }
}

/// Connector used to reach the row source. Both run the same inner SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    /// Catalog TDS endpoint.
    #[default]
    Dataverse,
    /// Lakehouse SQL endpoint fed by a replica. No current-user context.
    FabricLink,
}

impl ConnectionType {
    pub fn has_user_context(&self) -> bool {
        matches!(self, ConnectionType::Dataverse)
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionType::Dataverse => f.write_str("dataverse"),
            ConnectionType::FabricLink => f.write_str("fabric_link"),
        }
    }
}
