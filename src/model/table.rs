//! Table selections.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::attribute::AttributeDescriptor;
use super::lookup::LookupSubColumnConfig;

/// Star-schema role of a selected table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TableRole {
    Fact,
    #[default]
    Dimension,
}

/// A table chosen for the model, with its selected attributes and view filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSelection {
    pub logical_name: String,

    #[serde(default)]
    pub display_name: Option<String>,

    /// Primary-key attribute (e.g. `accountid`).
    pub primary_key: String,

    /// Primary display attribute (e.g. `name`).
    #[serde(default)]
    pub primary_name_attribute: Option<String>,

    #[serde(default)]
    pub role: TableRole,

    #[serde(default)]
    pub attributes: Vec<AttributeDescriptor>,

    /// Saved-view filter as FetchXML.
    #[serde(default)]
    pub filter_xml: Option<String>,

    /// Lookup sub-column configuration keyed by lookup logical name.
    #[serde(default)]
    pub lookup_configs: BTreeMap<String, LookupSubColumnConfig>,

    /// Display-name overrides keyed by attribute logical name.
    #[serde(default)]
    pub display_name_overrides: BTreeMap<String, String>,
}

impl TableSelection {
    pub fn new(logical_name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            logical_name: logical_name.into(),
            display_name: None,
            primary_key: primary_key.into(),
            primary_name_attribute: None,
            role: TableRole::Dimension,
            attributes: Vec::new(),
            filter_xml: None,
            lookup_configs: BTreeMap::new(),
            display_name_overrides: BTreeMap::new(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_role(mut self, role: TableRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_primary_name(mut self, attribute: impl Into<String>) -> Self {
        self.primary_name_attribute = Some(attribute.into());
        self
    }

    pub fn with_attribute(mut self, attribute: AttributeDescriptor) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_filter(mut self, fetch_xml: impl Into<String>) -> Self {
        self.filter_xml = Some(fetch_xml.into());
        self
    }

    pub fn with_lookup_config(
        mut self,
        attribute: impl Into<String>,
        config: LookupSubColumnConfig,
    ) -> Self {
        self.lookup_configs.insert(attribute.into(), config);
        self
    }

    pub fn with_override(mut self, attribute: impl Into<String>, name: impl Into<String>) -> Self {
        self.display_name_overrides
            .insert(attribute.into(), name.into());
        self
    }

    /// Name the table carries in the emitted model.
    pub fn model_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.logical_name)
    }

    pub fn is_fact(&self) -> bool {
        self.role == TableRole::Fact
    }

    pub fn attribute(&self, logical_name: &str) -> Option<&AttributeDescriptor> {
        self.attributes
            .iter()
            .find(|a| a.logical_name.eq_ignore_ascii_case(logical_name))
    }

    /// Effective display name: explicit override, then catalog display
    /// name, then logical name.
    ///
    /// Lookup name sub-columns resolve through their parent's key, so
    /// callers pass the parent lookup here, never a synthesized
    /// `<parent>name` key.
    pub fn effective_display_name<'a>(&'a self, attribute: &'a AttributeDescriptor) -> &'a str {
        self.display_name_overrides
            .get(&attribute.logical_name)
            .map(String::as_str)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| attribute.catalog_display_name())
    }
}
