//! Relationship blocks.
//!
//! Relationship output never carries a `description` property; the
//! consuming tool rejects it on relationships.

use super::format::IndentWriter;

/// Marker annotation on every relationship the generator emits.
pub const GENERATED_ANNOTATION: &str = "SemforgeGenerated";

/// Marker annotation on snowflake edges.
pub const SNOWFLAKE_ANNOTATION: &str = "SemforgeSnowflake";

/// One emitted relationship, endpoints already rendered as column refs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipSpec {
    pub from_column: String,
    pub to_column: String,
    pub is_active: bool,
    pub snowflake: bool,
    pub rely_on_referential_integrity: bool,
}

impl RelationshipSpec {
    pub fn new(from_column: impl Into<String>, to_column: impl Into<String>) -> Self {
        Self {
            from_column: from_column.into(),
            to_column: to_column.into(),
            is_active: true,
            snowflake: false,
            rely_on_referential_integrity: false,
        }
    }

    pub fn write(&self, w: &mut IndentWriter, name: &str) {
        w.write_line(&format!("relationship {}", name));
        w.indent();
        if !self.is_active {
            w.write_line("isActive: false");
        }
        if self.rely_on_referential_integrity {
            w.write_line("relyOnReferentialIntegrity");
        }
        w.write_line(&format!("fromColumn: {}", self.from_column));
        w.write_line(&format!("toColumn: {}", self.to_column));
        w.blank_line();
        if self.snowflake {
            w.write_line(&format!("annotation {} = true", SNOWFLAKE_ANNOTATION));
            w.blank_line();
        }
        w.write_line(&format!("annotation {} = true", GENERATED_ANNOTATION));
        w.blank_line();
        w.dedent();
    }
}
