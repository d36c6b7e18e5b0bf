//! Lookup sub-column resolution.
//!
//! A lookup attribute expands into up to four columns in the row source:
//! the raw id, a display name, and for polymorphic (Owner/Customer) lookups
//! a target-type discriminator and a phonetic name. This module decides
//! which of those are emitted ([`resolve_lookup_columns`]) and, before any
//! generation runs, groups the selected attributes so a virtual sub-column
//! is always emitted through its parent ([`classify_attributes`]).

pub mod classify;
pub mod resolver;

pub use classify::{classify_attributes, AttributeGroup};
pub use resolver::{
    is_owning_attribute, is_relationship_mode, resolve_lookup_columns, ResolvedLookupColumns,
    SubColumnKind,
};
