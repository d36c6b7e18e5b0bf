//! Upfront grouping of selected attributes into standalone columns and
//! lookup groups.
//!
//! Virtual sub-columns (`owneridname`, `owneridtype`, `owneridyominame`)
//! are bound to their parent before generation, so the position of a
//! virtual column in the selection never changes what gets emitted.

use std::collections::HashMap;

use crate::model::AttributeDescriptor;

use super::resolver::SubColumnKind;

/// One unit of column generation.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeGroup<'a> {
    Standalone(&'a AttributeDescriptor),
    Lookup {
        parent: &'a AttributeDescriptor,
        /// Selected attributes that are sub-columns of `parent`, by kind.
        virtual_columns: Vec<(SubColumnKind, &'a AttributeDescriptor)>,
    },
}

impl<'a> AttributeGroup<'a> {
    /// The attribute that owns this group.
    pub fn attribute(&self) -> &'a AttributeDescriptor {
        match self {
            AttributeGroup::Standalone(attr) => attr,
            AttributeGroup::Lookup { parent, .. } => parent,
        }
    }
}

// Longest suffix first: `yominame` also ends in `name`.
const SUFFIXES: [SubColumnKind; 3] = [SubColumnKind::Yomi, SubColumnKind::Name, SubColumnKind::Type];

fn can_parent(parent: &AttributeDescriptor, kind: SubColumnKind) -> bool {
    match kind {
        SubColumnKind::Name => parent.attribute_type.is_lookup_family(),
        SubColumnKind::Type | SubColumnKind::Yomi => parent.attribute_type.is_polymorphic(),
        SubColumnKind::Id => false,
    }
}

/// Classify `attributes` into generation groups ordered by the position of
/// each group's parent.
pub fn classify_attributes(attributes: &[AttributeDescriptor]) -> Vec<AttributeGroup<'_>> {
    let index: HashMap<String, usize> = attributes
        .iter()
        .enumerate()
        .map(|(i, attr)| (attr.logical_name.to_ascii_lowercase(), i))
        .collect();

    // Pass 1: bind every virtual column to its parent.
    let mut parent_of: Vec<Option<(usize, SubColumnKind)>> = vec![None; attributes.len()];
    for (i, attr) in attributes.iter().enumerate() {
        if attr.attribute_type.is_lookup_family() {
            continue;
        }
        let name = attr.logical_name.to_ascii_lowercase();
        for kind in SUFFIXES {
            let Some(stem) = name.strip_suffix(kind.suffix()) else {
                continue;
            };
            if stem.is_empty() {
                continue;
            }
            if let Some(&p) = index.get(stem) {
                if p != i && can_parent(&attributes[p], kind) {
                    parent_of[i] = Some((p, kind));
                    break;
                }
            }
        }
    }

    // Pass 2: emit groups in parent order.
    let mut groups = Vec::new();
    for (i, attr) in attributes.iter().enumerate() {
        if parent_of[i].is_some() {
            continue;
        }
        if attr.attribute_type.is_lookup_family() {
            let mut virtual_columns: Vec<(SubColumnKind, &AttributeDescriptor)> = parent_of
                .iter()
                .enumerate()
                .filter_map(|(j, binding)| match binding {
                    Some((p, kind)) if *p == i => Some((*kind, &attributes[j])),
                    _ => None,
                })
                .collect();
            virtual_columns.sort_by_key(|(kind, _)| *kind);
            groups.push(AttributeGroup::Lookup {
                parent: attr,
                virtual_columns,
            });
        } else {
            groups.push(AttributeGroup::Standalone(attr));
        }
    }
    groups
}
