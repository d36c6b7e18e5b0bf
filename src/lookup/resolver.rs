//! Default-and-override resolution for lookup sub-columns.

use serde::Serialize;

use crate::model::{AttributeDescriptor, LookupSubColumnConfig, RelationshipEdge, SubColumnSetting};

/// Owning lookups only ever expose an id column at the query layer.
const OWNING_ATTRIBUTES: [&str; 3] = ["owninguser", "owningteam", "owningbusinessunit"];

/// The four columns a lookup can expand into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SubColumnKind {
    Id,
    Name,
    Type,
    Yomi,
}

impl SubColumnKind {
    pub const ALL: [SubColumnKind; 4] = [Self::Id, Self::Name, Self::Type, Self::Yomi];

    /// Suffix appended to the parent's logical name in the row source.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Id => "",
            Self::Name => "name",
            Self::Type => "type",
            Self::Yomi => "yominame",
        }
    }

    /// Row-source column carrying this sub-column.
    pub fn source_column(&self, parent: &str) -> String {
        format!("{}{}", parent, self.suffix())
    }
}

/// Effective include/hidden flags for one lookup attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ResolvedLookupColumns {
    pub include_id: bool,
    pub id_hidden: bool,
    pub include_name: bool,
    pub name_hidden: bool,
    pub include_type: bool,
    pub type_hidden: bool,
    pub include_yomi: bool,
    pub yomi_hidden: bool,
}

impl ResolvedLookupColumns {
    pub fn includes(&self, kind: SubColumnKind) -> bool {
        match kind {
            SubColumnKind::Id => self.include_id,
            SubColumnKind::Name => self.include_name,
            SubColumnKind::Type => self.include_type,
            SubColumnKind::Yomi => self.include_yomi,
        }
    }

    pub fn is_hidden(&self, kind: SubColumnKind) -> bool {
        match kind {
            SubColumnKind::Id => self.id_hidden,
            SubColumnKind::Name => self.name_hidden,
            SubColumnKind::Type => self.type_hidden,
            SubColumnKind::Yomi => self.yomi_hidden,
        }
    }

    /// Included sub-columns in emission order.
    pub fn included(&self) -> impl Iterator<Item = SubColumnKind> + '_ {
        SubColumnKind::ALL.into_iter().filter(|k| self.includes(*k))
    }

    fn set(&mut self, kind: SubColumnKind, include: bool, hidden: bool) {
        let hidden = include && hidden;
        match kind {
            SubColumnKind::Id => (self.include_id, self.id_hidden) = (include, hidden),
            SubColumnKind::Name => (self.include_name, self.name_hidden) = (include, hidden),
            SubColumnKind::Type => (self.include_type, self.type_hidden) = (include, hidden),
            SubColumnKind::Yomi => (self.include_yomi, self.yomi_hidden) = (include, hidden),
        }
    }
}

/// True iff any edge, active or not, starts at `table.attribute`.
pub fn is_relationship_mode(table: &str, attribute: &str, edges: &[RelationshipEdge]) -> bool {
    edges.iter().any(|edge| edge.starts_at(table, attribute))
}

pub fn is_owning_attribute(logical_name: &str) -> bool {
    OWNING_ATTRIBUTES
        .iter()
        .any(|name| name.eq_ignore_ascii_case(logical_name))
}

/// Resolve which sub-columns of `attribute` are emitted and whether each is
/// hidden.
///
/// Stored settings override per field; unset fields follow the mode
/// defaults, so adding or removing a relationship changes every field the
/// user never touched.
pub fn resolve_lookup_columns(
    table: &str,
    attribute: &AttributeDescriptor,
    config: Option<&LookupSubColumnConfig>,
    edges: &[RelationshipEdge],
) -> ResolvedLookupColumns {
    let relationship_mode = is_relationship_mode(table, &attribute.logical_name, edges);
    let owning = is_owning_attribute(&attribute.logical_name);
    let stored = config.copied().unwrap_or_default();

    // (include, hidden)
    let defaults = if relationship_mode {
        [(true, true), (false, false), (false, false), (false, false)]
    } else if owning {
        // No name companion exists, so the id stands in for it.
        [(true, false), (false, false), (false, false), (false, false)]
    } else {
        [(false, false), (true, false), (false, false), (false, false)]
    };
    let settings: [SubColumnSetting; 4] = [stored.id, stored.name, stored.type_, stored.yomi];

    let mut resolved = ResolvedLookupColumns::default();
    for ((kind, (include, hidden)), setting) in SubColumnKind::ALL.into_iter().zip(defaults).zip(settings) {
        resolved.set(
            kind,
            setting.include.unwrap_or(include),
            setting.hidden.unwrap_or(hidden),
        );
    }

    if !attribute.attribute_type.is_polymorphic() {
        resolved.set(SubColumnKind::Type, false, false);
        resolved.set(SubColumnKind::Yomi, false, false);
    }
    if owning {
        resolved.set(SubColumnKind::Name, false, false);
        resolved.set(SubColumnKind::Type, false, false);
        resolved.set(SubColumnKind::Yomi, false, false);
    }

    tracing::trace!(
        table = %table,
        attribute = %attribute.logical_name,
        relationship_mode,
        ?resolved,
        "resolved lookup sub-columns"
    );
    resolved
}
