//! Attribute descriptors as fetched from the entity catalog.

use serde::{Deserialize, Serialize};

/// Declared attribute type.
///
/// Names follow the catalog's own type names so descriptors deserialize
/// straight from the metadata collaborator's JSON. Anything the core does
/// not distinguish lands in [`AttributeType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeType {
    String,
    Memo,
    Integer,
    BigInt,
    Decimal,
    Double,
    Money,
    Boolean,
    DateTime,
    Picklist,
    State,
    Status,
    MultiSelectPicklist,
    Lookup,
    Owner,
    Customer,
    Uniqueidentifier,
    EntityName,
    Virtual,
    #[serde(other)]
    Other,
}

impl AttributeType {
    /// Reference-typed attributes (plain lookups and the polymorphic pair).
    pub fn is_lookup_family(&self) -> bool {
        matches!(
            self,
            AttributeType::Lookup | AttributeType::Owner | AttributeType::Customer
        )
    }

    /// Lookups whose target table varies per row.
    pub fn is_polymorphic(&self) -> bool {
        matches!(self, AttributeType::Owner | AttributeType::Customer)
    }

    /// Coded-value attributes that are projected through their label column.
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            AttributeType::Picklist
                | AttributeType::State
                | AttributeType::Status
                | AttributeType::Boolean
                | AttributeType::MultiSelectPicklist
        )
    }
}

/// Immutable snapshot of one catalog attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub logical_name: String,

    #[serde(default)]
    pub display_name: Option<String>,

    pub attribute_type: AttributeType,

    /// Target tables for reference types.
    #[serde(default)]
    pub targets: Vec<String>,

    #[serde(default)]
    pub schema_name: Option<String>,
}

impl AttributeDescriptor {
    pub fn new(logical_name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            logical_name: logical_name.into(),
            display_name: None,
            attribute_type,
            targets: Vec::new(),
            schema_name: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }

    /// Catalog display name, or the logical name when the catalog has none.
    pub fn catalog_display_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.logical_name)
    }
}
