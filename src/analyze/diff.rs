//! Structural comparison of prior and fresh definitions.

use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashSet};

use crate::model::{GeneratedDefinitionSet, StorageMode};
use crate::preserve::{
    parse_definitions, PreservedColumn, PreservedMetadata, PreservedTable, RelationshipKey,
};
use crate::tmdl::DATE_TABLE;

use super::change::{AnalysisConfig, ChangeType, ImpactLevel, ObjectType, SemanticModelChange};
use super::reach::unreachable_tables;

/// Hex SHA-256 of a query text.
pub fn query_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

struct Changes<'c> {
    list: Vec<SemanticModelChange>,
    config: &'c AnalysisConfig,
}

impl Changes<'_> {
    fn push(
        &mut self,
        object_type: ObjectType,
        name: impl Into<String>,
        change_type: ChangeType,
        impact: ImpactLevel,
        description: impl Into<String>,
    ) {
        self.list.push(SemanticModelChange::new(
            object_type,
            name,
            change_type,
            impact,
            description,
        ));
    }

    fn unchanged(&mut self, object_type: ObjectType, name: impl Into<String>, description: impl Into<String>) {
        if self.config.include_unchanged {
            self.push(object_type, name, ChangeType::Preserve, ImpactLevel::Safe, description);
        }
    }
}

/// Compare prior metadata with a freshly generated (unmerged) set.
pub fn analyze(
    previous: &PreservedMetadata,
    fresh: &GeneratedDefinitionSet,
    config: &AnalysisConfig,
) -> Vec<SemanticModelChange> {
    let current = parse_definitions(fresh);
    let mut changes = Changes {
        list: Vec::new(),
        config,
    };

    for (key, table) in &current.tables {
        match previous.tables.get(key) {
            Some(prior) => compare_table(prior, table, &mut changes),
            None => {
                changes.push(ObjectType::Table, &table.name, ChangeType::New, ImpactLevel::Additive, "table added");
                for measure in table.measures.iter().filter(|m| m.auto_generated) {
                    changes.push(
                        ObjectType::Measure,
                        qualified(&table.name, &measure.name),
                        ChangeType::New,
                        ImpactLevel::Additive,
                        "generated measure added",
                    );
                }
            }
        }
        let keys = table.key_column_count();
        if keys != 1 {
            changes.push(
                ObjectType::Table,
                &table.name,
                ChangeType::Error,
                ImpactLevel::Moderate,
                format!("table has {} key columns; exactly one is required", keys),
            );
        }
    }
    for (key, prior) in &previous.tables {
        // Hand-authored tables are never regenerated, so never removed.
        if !prior.generated || current.tables.contains_key(key) {
            continue;
        }
        changes.push(ObjectType::Table, &prior.name, ChangeType::Warning, ImpactLevel::Destructive, "table removed");
        for measure in prior.user_measures() {
            changes.push(
                ObjectType::Measure,
                qualified(&prior.name, &measure.name),
                ChangeType::Warning,
                ImpactLevel::Destructive,
                "user measure is lost with its table",
            );
        }
    }

    check_storage_mode(previous, config.storage_mode, &mut changes);
    let kept = compare_relationships(previous, &current, &mut changes);
    check_reachability(&current, &kept, config, &mut changes);

    tracing::debug!(changes = changes.list.len(), "analysis complete");
    changes.list
}

fn qualified(table: &str, object: &str) -> String {
    format!("{}.{}", table, object)
}

fn compare_table(prior: &PreservedTable, table: &PreservedTable, changes: &mut Changes<'_>) {
    let mut removed: Vec<&PreservedColumn> = prior
        .columns
        .iter()
        .filter(|(source, _)| !table.columns.contains_key(*source))
        .map(|(_, c)| c)
        .collect();
    let mut added: Vec<&PreservedColumn> = table
        .columns
        .iter()
        .filter(|(source, _)| !prior.columns.contains_key(*source))
        .map(|(_, c)| c)
        .collect();

    // Same name, different row-source column.
    removed.retain(|old| {
        match added.iter().position(|new| new.name.eq_ignore_ascii_case(&old.name)) {
            Some(i) => {
                let new = added.remove(i);
                changes.push(
                    ObjectType::Column,
                    qualified(&table.name, &new.name),
                    ChangeType::Update,
                    ImpactLevel::Moderate,
                    format!(
                        "source column changed from '{}' to '{}'",
                        old.source_column, new.source_column
                    ),
                );
                false
            }
            None => true,
        }
    });

    for (source, column) in &table.columns {
        let Some(old) = prior.columns.get(source) else { continue };
        let name = qualified(&table.name, &column.name);
        if old.data_type != column.data_type {
            changes.push(
                ObjectType::Column,
                name,
                ChangeType::Update,
                ImpactLevel::Moderate,
                format!(
                    "data type changed from {} to {}",
                    old.data_type.as_deref().unwrap_or("unset"),
                    column.data_type.as_deref().unwrap_or("unset")
                ),
            );
        } else if old.name != column.name {
            changes.push(
                ObjectType::Column,
                name,
                ChangeType::Preserve,
                ImpactLevel::Safe,
                format!("renamed from '{}'; identity kept", old.name),
            );
        } else {
            changes.unchanged(ObjectType::Column, name, "unchanged");
        }
    }
    for column in added {
        changes.push(
            ObjectType::Column,
            qualified(&table.name, &column.name),
            ChangeType::New,
            ImpactLevel::Additive,
            format!("column added (source '{}')", column.source_column),
        );
    }
    for column in removed {
        changes.push(
            ObjectType::Column,
            qualified(&table.name, &column.name),
            ChangeType::Warning,
            ImpactLevel::Destructive,
            format!("column '{}' removed (source '{}')", column.name, column.source_column),
        );
    }

    let prior_auto: HashSet<&str> = prior
        .measures
        .iter()
        .filter(|m| m.auto_generated)
        .map(|m| m.name.as_str())
        .collect();
    let fresh_auto: HashSet<&str> = table
        .measures
        .iter()
        .filter(|m| m.auto_generated)
        .map(|m| m.name.as_str())
        .collect();
    for name in fresh_auto.difference(&prior_auto) {
        changes.push(ObjectType::Measure, qualified(&table.name, name), ChangeType::New, ImpactLevel::Additive, "generated measure added");
    }
    for name in prior_auto.difference(&fresh_auto) {
        changes.push(
            ObjectType::Measure,
            qualified(&prior.name, name),
            ChangeType::Warning,
            ImpactLevel::Destructive,
            "generated measure removed",
        );
    }
    for measure in prior.user_measures() {
        changes.push(
            ObjectType::Measure,
            qualified(&table.name, &measure.name),
            ChangeType::Preserve,
            ImpactLevel::Safe,
            "user measure kept",
        );
    }

    if let (Some(old), Some(new)) = (&prior.partition, &table.partition) {
        if query_hash(&old.source) != query_hash(&new.source) {
            changes.push(
                ObjectType::Query,
                &table.name,
                ChangeType::Update,
                ImpactLevel::Moderate,
                "row-source query changed",
            );
        }
    }
}

fn check_storage_mode(previous: &PreservedMetadata, mode: StorageMode, changes: &mut Changes<'_>) {
    for table in previous.tables.values().filter(|t| t.generated) {
        let Some(partition) = &table.partition else { continue };
        if partition.kind == "calculated" {
            continue;
        }
        let Some(prior_mode) = partition.mode.as_deref() else { continue };
        if StorageMode::from_tmdl(prior_mode) != Some(mode) {
            changes.push(
                ObjectType::Table,
                &table.name,
                ChangeType::Info,
                ImpactLevel::Safe,
                format!("storage mode changes from {} to {}", prior_mode, mode),
            );
        }
    }
}

/// Returns user relationships that survive the merge.
fn compare_relationships(
    previous: &PreservedMetadata,
    current: &PreservedMetadata,
    changes: &mut Changes<'_>,
) -> Vec<RelationshipKey> {
    let mut added: BTreeSet<&RelationshipKey> = BTreeSet::new();
    for (key, relationship) in &current.relationships {
        match previous.relationships.get(key) {
            Some(old) if old.is_active != relationship.is_active => changes.push(
                ObjectType::Relationship,
                key.to_string(),
                ChangeType::Update,
                ImpactLevel::Moderate,
                if relationship.is_active { "relationship activated" } else { "relationship deactivated" },
            ),
            Some(_) => changes.unchanged(ObjectType::Relationship, key.to_string(), "unchanged"),
            None => {
                added.insert(key);
            }
        }
    }

    let mut kept = Vec::new();
    for (key, old) in &previous.relationships {
        if current.relationships.contains_key(key) {
            continue;
        }
        if key.targets_date_table() {
            changes.push(
                ObjectType::Relationship,
                key.to_string(),
                ChangeType::Info,
                ImpactLevel::Safe,
                "calendar relationship replaced",
            );
            continue;
        }
        if !old.generated {
            changes.push(
                ObjectType::Relationship,
                key.to_string(),
                ChangeType::Preserve,
                ImpactLevel::Safe,
                "user relationship kept",
            );
            kept.push(key.clone());
            continue;
        }
        let moved = added.iter().find(|k| k.from == key.from).map(|k| (*k).clone());
        match moved {
            Some(new_key) => {
                added.remove(&new_key);
                changes.push(
                    ObjectType::Relationship,
                    new_key.to_string(),
                    ChangeType::Update,
                    ImpactLevel::Moderate,
                    format!("endpoint changed from {}", key.to),
                );
            }
            None => changes.push(
                ObjectType::Relationship,
                key.to_string(),
                ChangeType::Warning,
                ImpactLevel::Destructive,
                "relationship removed",
            ),
        }
    }
    for key in added {
        changes.push(
            ObjectType::Relationship,
            key.to_string(),
            ChangeType::New,
            ImpactLevel::Additive,
            "relationship added",
        );
    }
    kept
}

fn check_reachability(
    current: &PreservedMetadata,
    kept: &[RelationshipKey],
    config: &AnalysisConfig,
    changes: &mut Changes<'_>,
) {
    let fact = config
        .fact_table
        .as_deref()
        .and_then(|key| current.tables.get(key))
        .or_else(|| {
            current
                .tables
                .values()
                .find(|t| t.measures.iter().any(|m| m.auto_generated))
        });
    let Some(fact) = fact else {
        return;
    };

    let edges = current
        .relationships
        .keys()
        .chain(kept.iter())
        .filter_map(|key| Some((key.from_table()?, key.to_table()?)));
    let names = current.tables.values().map(|t| t.name.as_str());
    for table in unreachable_tables(names, edges, &fact.name) {
        if table == DATE_TABLE {
            continue;
        }
        changes.push(
            ObjectType::Table,
            &table,
            ChangeType::Warning,
            ImpactLevel::Safe,
            format!("no relationship path from fact table '{}'", fact.name),
        );
    }
}
