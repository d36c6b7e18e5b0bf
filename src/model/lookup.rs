//! Per-lookup sub-column configuration written by the configuration UI.

use serde::{Deserialize, Serialize};

/// One nullable (include, hidden) pair. `None` means "derive from defaults".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubColumnSetting {
    #[serde(default)]
    pub include: Option<bool>,
    #[serde(default)]
    pub hidden: Option<bool>,
}

impl SubColumnSetting {
    /// Set the include flag. Excluding a sub-column also clears a stored
    /// hidden flag so hidden never outlives include.
    pub fn set_include(&mut self, include: bool) {
        self.include = Some(include);
        if !include && self.hidden == Some(true) {
            self.hidden = Some(false);
        }
    }

    /// Set the hidden flag. Hiding forces include.
    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = Some(hidden);
        if hidden {
            self.include = Some(true);
        }
    }

    /// Drop both overrides so the field derives from defaults again.
    pub fn reset(&mut self) {
        self.include = None;
        self.hidden = None;
    }

    pub fn is_unset(&self) -> bool {
        self.include.is_none() && self.hidden.is_none()
    }
}

/// Stored overrides for the four lookup sub-columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LookupSubColumnConfig {
    #[serde(default)]
    pub id: SubColumnSetting,
    #[serde(default)]
    pub name: SubColumnSetting,
    #[serde(default, rename = "type")]
    pub type_: SubColumnSetting,
    #[serde(default)]
    pub yomi: SubColumnSetting,
}

impl LookupSubColumnConfig {
    pub fn is_unset(&self) -> bool {
        self.id.is_unset() && self.name.is_unset() && self.type_.is_unset() && self.yomi.is_unset()
    }
}
