//! Reinstate preserved identity and user edits onto fresh output.
//!
//! Fresh structure wins for everything the generator controls. Merge only
//! writes back lineage tags, relationship names, column formatting, and
//! re-attaches user measures and user relationships.

use std::collections::HashSet;

use crate::model::GeneratedDefinitionSet;
use crate::tmdl::format::split_name;
use crate::tmdl::{EXPRESSIONS_PATH, RELATIONSHIPS_PATH};

use super::document::{Document, Node};
use super::metadata::{PreservedColumn, PreservedMetadata, PreservedTable, RelationshipKey};
use super::parse::{annotation, column_source, relationship_key, table_key, TABLES_DIR};

/// Merge `preserved` into a freshly generated set.
pub fn merge(generated: GeneratedDefinitionSet, preserved: &PreservedMetadata) -> GeneratedDefinitionSet {
    let mut merged = GeneratedDefinitionSet::new();
    let mut saw_relationships = false;

    for (path, text) in generated.iter() {
        let text = if path.starts_with(TABLES_DIR) {
            merge_tables(text, preserved)
        } else if path == RELATIONSHIPS_PATH {
            saw_relationships = true;
            merge_relationships(text, preserved)
        } else if path == EXPRESSIONS_PATH {
            merge_expressions(text, preserved)
        } else {
            text.to_string()
        };
        merged.insert(path, text);
    }

    if !saw_relationships {
        let text = merge_relationships("", preserved);
        if !text.is_empty() {
            merged.insert(RELATIONSHIPS_PATH, text);
        }
    }
    merged
}

fn merge_tables(text: &str, preserved: &PreservedMetadata) -> String {
    let mut doc = Document::parse(text);
    for node in doc.blocks_mut("table") {
        let Some(key) = table_key(node) else { continue };
        let Some(prior) = preserved.tables.get(&key) else {
            tracing::debug!(table = %key, "no prior table; keeping fresh identity");
            continue;
        };
        merge_table(node, prior);
    }
    doc.render()
}

fn merge_table(node: &mut Node, prior: &PreservedTable) {
    if let Some(tag) = prior.lineage_tags.get("table") {
        node.set_property("lineageTag", tag);
    }

    for column in node.blocks_mut("column") {
        let Some(source) = column_source(column) else { continue };
        if let Some(tag) = prior.lineage_tags.get(&format!("col:{}", source)) {
            column.set_property("lineageTag", tag);
        }
        if let Some(formatting) = prior.columns.get(&source) {
            restore_formatting(column, formatting);
        }
    }

    let mut fresh_measures = HashSet::new();
    for measure in node.blocks_mut("measure") {
        let (name, _) = split_name(measure.header("measure").unwrap_or_default());
        if let Some(tag) = prior.lineage_tags.get(&format!("measure:{}", name)) {
            measure.set_property("lineageTag", tag);
        }
        fresh_measures.insert(name);
    }

    let user: Vec<Node> = prior
        .user_measures()
        .filter(|m| !fresh_measures.contains(&m.name))
        .map(|m| m.block.clone())
        .collect();
    if user.is_empty() {
        return;
    }
    let at = node
        .children
        .iter()
        .position(|c| c.header("partition").is_some())
        .or_else(|| node.children.iter().position(|c| c.header("annotation").is_some()))
        .unwrap_or(node.children.len());
    tracing::debug!(table = %prior.key, measures = user.len(), "re-attaching user measures");
    for (offset, measure) in user.into_iter().enumerate() {
        node.children.insert(at + offset, measure);
    }
}

fn restore_formatting(column: &mut Node, prior: &PreservedColumn) {
    if let Some(format) = &prior.format_string {
        if !column.set_property("formatString", format) {
            column.insert_property_after("dataType", "formatString", format);
        }
    }
    if let Some(summarize_by) = &prior.summarize_by {
        column.set_property("summarizeBy", summarize_by);
    }
    for preserved in &prior.annotations {
        let existing = column.children.iter().position(|c| {
            c.header("annotation").is_some()
                && annotation(c).is_some_and(|(name, _)| name == preserved.name)
        });
        match existing {
            Some(i) => column.children[i] = preserved.block.clone(),
            None => column.children.push(preserved.block.clone()),
        }
    }
}

fn merge_relationships(text: &str, preserved: &PreservedMetadata) -> String {
    let mut doc = if text.is_empty() {
        Document::default()
    } else {
        Document::parse(text)
    };
    let mut fresh: HashSet<RelationshipKey> = HashSet::new();
    for node in doc.blocks_mut("relationship") {
        let Some(key) = relationship_key(node) else { continue };
        if let Some(prior) = preserved.relationships.get(&key) {
            node.line = format!("relationship {}", prior.name);
        }
        fresh.insert(key);
    }

    for relationship in preserved.user_relationships(&fresh) {
        tracing::debug!(relationship = %relationship.key, "keeping user relationship");
        let mut block = relationship.block.clone();
        strip_descriptions(&mut block);
        doc.nodes.push(block);
    }
    doc.render()
}

/// Drop `description` properties and `///` doc lines from a relationship.
fn strip_descriptions(node: &mut Node) {
    node.doc.clear();
    node.children.retain(|c| {
        !c.text()
            .strip_prefix("description")
            .is_some_and(|rest| rest.trim_start().starts_with(':'))
    });
    for child in &mut node.children {
        child.doc.clear();
    }
}

fn merge_expressions(text: &str, preserved: &PreservedMetadata) -> String {
    let mut doc = Document::parse(text);
    for node in doc.blocks_mut("expression") {
        let (name, _) = split_name(node.header("expression").unwrap_or_default());
        if let Some(tag) = preserved.expression_tags.get(&format!("expr:{}", name)) {
            node.set_property("lineageTag", tag);
        }
    }
    doc.render()
}
