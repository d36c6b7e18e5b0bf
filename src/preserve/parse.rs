//! Recover [`PreservedMetadata`] from a prior definition set.
//!
//! Parsing never fails. Anything unrecognisable is reported as a
//! [`ParseWarning`] and simply not preserved.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::model::GeneratedDefinitionSet;
use crate::tmdl::format::split_name;
use crate::tmdl::{
    auto_measure_name, DATABASE_PATH, EXPRESSIONS_PATH, GENERATED_ANNOTATION,
    LOGICAL_NAME_ANNOTATION, MODEL_PATH, RELATIONSHIPS_PATH,
};

use super::document::{Document, Node};
use super::metadata::{
    ParseWarning, PreservedAnnotation, PreservedColumn, PreservedMeasure, PreservedMetadata,
    PreservedPartition, PreservedRelationship, PreservedTable, RelationshipKey,
};

// The regex crate runs in linear time; the size limit bounds compiled
// program size.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

fn bounded(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .unwrap()
}

static ANNOTATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| bounded(r"^annotation\s+([^\s=]+)\s*=\s*(.*)$"));

static LINEAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| bounded(r"^lineageTag\s*:\s*(\S+)\s*$"));

pub(crate) const TABLES_DIR: &str = "definition/tables/";

/// Parse every recognised file of `existing`.
pub fn parse_definitions(existing: &GeneratedDefinitionSet) -> PreservedMetadata {
    let mut meta = PreservedMetadata::default();
    for (path, text) in existing.iter() {
        parse_file(path, text, &mut meta);
    }
    tracing::debug!(
        tables = meta.tables.len(),
        relationships = meta.relationships.len(),
        warnings = meta.warnings.len(),
        "parsed prior definitions"
    );
    meta
}

/// Parse one file into `meta`. Unknown paths are ignored.
pub fn parse_file(path: &str, text: &str, meta: &mut PreservedMetadata) {
    let doc = Document::parse(text);
    if path.starts_with(TABLES_DIR) {
        parse_tables(path, &doc, meta);
    } else if path == RELATIONSHIPS_PATH {
        parse_relationships(path, &doc, meta);
    } else if path == EXPRESSIONS_PATH {
        for node in doc.blocks("expression") {
            let (name, _) = split_name(node.header("expression").unwrap_or_default());
            if let Some(tag) = lineage_tag(node) {
                meta.expression_tags.insert(format!("expr:{}", name), tag);
            }
        }
    }
}

/// Whether `path` holds a definition the generator writes, and so may
/// overwrite or remove. Table files count only when they carry the
/// logical-name annotation; everything else on disk belongs to the user.
pub fn is_generated_definition(path: &str, text: &str) -> bool {
    match path {
        DATABASE_PATH | MODEL_PATH | EXPRESSIONS_PATH | RELATIONSHIPS_PATH => true,
        _ if path.starts_with(TABLES_DIR) => {
            Document::parse(text).blocks("table").any(has_logical_name)
        }
        _ => false,
    }
}

fn warn(meta: &mut PreservedMetadata, path: &str, message: String) {
    tracing::warn!(path = %path, "{}", message);
    meta.warnings.push(ParseWarning {
        path: path.to_string(),
        message,
    });
}

/// `(name, value)` of an `annotation name = value` node.
pub(crate) fn annotation(node: &Node) -> Option<(String, String)> {
    let caps = ANNOTATION_PATTERN.captures(node.text())?;
    Some((caps[1].to_string(), caps[2].trim().to_string()))
}

fn lineage_tag(node: &Node) -> Option<String> {
    node.children
        .iter()
        .find_map(|c| LINEAGE_PATTERN.captures(c.text()))
        .map(|caps| caps[1].to_string())
}

fn has_logical_name(node: &Node) -> bool {
    node.blocks("annotation")
        .filter_map(annotation)
        .any(|(n, _)| n == LOGICAL_NAME_ANNOTATION)
}

/// Stable key of a table block.
pub(crate) fn table_key(node: &Node) -> Option<String> {
    let (name, _) = split_name(node.header("table")?);
    let key = node
        .blocks("annotation")
        .filter_map(annotation)
        .find(|(n, _)| n == LOGICAL_NAME_ANNOTATION)
        .map(|(_, v)| v)
        .unwrap_or(name);
    Some(key)
}

/// Identity of a column block: its row-source column, else its name.
pub(crate) fn column_source(node: &Node) -> Option<String> {
    let (name, _) = split_name(node.header("column")?);
    Some(node.property("sourceColumn").map(str::to_string).unwrap_or(name))
}

pub(crate) fn relationship_key(node: &Node) -> Option<RelationshipKey> {
    Some(RelationshipKey::new(
        node.property("fromColumn")?,
        node.property("toColumn")?,
    ))
}

fn parse_tables(path: &str, doc: &Document, meta: &mut PreservedMetadata) {
    let mut found = false;
    for node in doc.blocks("table") {
        found = true;
        let Some(key) = table_key(node) else { continue };
        let table = parse_table(node, key.clone());
        if meta.tables.insert(key.clone(), table).is_some() {
            warn(meta, path, format!("table key '{}' appears more than once", key));
        }
    }
    if !found {
        warn(meta, path, "no table block found".to_string());
    }
}

fn parse_table(node: &Node, key: String) -> PreservedTable {
    let (name, _) = split_name(node.header("table").unwrap_or_default());
    let mut table = PreservedTable {
        key,
        name,
        generated: has_logical_name(node),
        ..PreservedTable::default()
    };
    if let Some(tag) = lineage_tag(node) {
        table.lineage_tags.insert("table".to_string(), tag);
    }

    for column in node.blocks("column") {
        let Some(source) = column_source(column) else { continue };
        let (name, _) = split_name(column.header("column").unwrap_or_default());
        if let Some(tag) = lineage_tag(column) {
            table.lineage_tags.insert(format!("col:{}", source), tag);
        }
        let annotations = column
            .blocks("annotation")
            .filter_map(|a| {
                annotation(a).map(|(name, value)| PreservedAnnotation {
                    name,
                    value,
                    block: a.clone(),
                })
            })
            .collect();
        table.columns.insert(
            source.clone(),
            PreservedColumn {
                name,
                source_column: source,
                data_type: column.property("dataType").map(str::to_string),
                format_string: column.property("formatString").map(str::to_string),
                summarize_by: column.property("summarizeBy").map(str::to_string),
                is_hidden: column.has_flag("isHidden"),
                is_key: column.has_flag("isKey"),
                annotations,
            },
        );
    }

    let auto_name = auto_measure_name(&table.name);
    for measure in node.blocks("measure") {
        let (name, rest) = split_name(measure.header("measure").unwrap_or_default());
        if let Some(tag) = lineage_tag(measure) {
            table.lineage_tags.insert(format!("measure:{}", name), tag);
        }
        let expression = rest.trim_start().strip_prefix('=').unwrap_or(rest).trim().to_string();
        table.measures.push(PreservedMeasure {
            auto_generated: name == auto_name,
            name,
            expression,
            block: measure.clone(),
        });
    }

    if let Some(partition) = node.blocks("partition").next() {
        let (name, rest) = split_name(partition.header("partition").unwrap_or_default());
        let kind = rest.trim_start().strip_prefix('=').unwrap_or(rest).trim().to_string();
        let source = partition
            .children
            .iter()
            .find(|c| c.text().starts_with("source"))
            .map(Node::render)
            .unwrap_or_default();
        table.partition = Some(PreservedPartition {
            name,
            kind,
            mode: partition.property("mode").map(str::to_string),
            source,
        });
    }
    table
}

fn parse_relationships(path: &str, doc: &Document, meta: &mut PreservedMetadata) {
    for (position, node) in doc.blocks("relationship").enumerate() {
        let name = node.header("relationship").unwrap_or_default().to_string();
        let Some(key) = relationship_key(node) else {
            warn(meta, path, format!("relationship '{}' has no fromColumn/toColumn", name));
            continue;
        };
        let generated = node
            .blocks("annotation")
            .filter_map(annotation)
            .any(|(n, v)| n == GENERATED_ANNOTATION && v == "true");
        let relationship = PreservedRelationship {
            name,
            key: key.clone(),
            is_active: node.property("isActive") != Some("false"),
            generated,
            position,
            block: node.clone(),
        };
        if meta.relationships.insert(key.clone(), relationship).is_some() {
            warn(meta, path, format!("relationship {} appears more than once", key));
        }
    }
}
