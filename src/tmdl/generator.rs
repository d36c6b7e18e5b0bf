//! Model definition generation.
//!
//! Turns table selections, relationship edges, and an optional calendar
//! configuration into a [`GeneratedDefinitionSet`]. Everything is computed
//! in memory; writing the files is the caller's concern.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::{FilterConversion, FilterConverter, FilterEnvironment};
use crate::model::{
    ConnectionType, DateConfigError, DateTableConfig, GeneratedDefinitionSet, RelationshipEdge,
    StorageMode, TableSelection,
};
use crate::sql::validate_sql;

use super::corrections::ColumnCorrections;
use super::date_table::{write_date_table, DATE_COLUMN, DATE_TABLE};
use super::format::{column_ref, file_safe_name, new_identifier, IndentWriter};
use super::model_file::{write_database, write_model};
use super::partition::ConnectorParameters;
use super::relationship::RelationshipSpec;
use super::table::{PlanContext, TablePlan};

pub const DATABASE_PATH: &str = "definition/database.tmdl";
pub const MODEL_PATH: &str = "definition/model.tmdl";
pub const EXPRESSIONS_PATH: &str = "definition/expressions.tmdl";
pub const RELATIONSHIPS_PATH: &str = "definition/relationships.tmdl";

/// Output path of a table's definition file.
pub fn table_path(table_name: &str) -> String {
    format!("definition/tables/{}.tmdl", file_safe_name(table_name))
}

/// Configuration mistakes that stop generation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerateError {
    #[error("duplicate table '{0}' in selection")]
    DuplicateTable(String),

    #[error("fact table '{0}' is not among the selected tables")]
    FactTableNotSelected(String),

    #[error("date table '{0}' is not among the selected tables")]
    DateTableNotSelected(String),

    #[error("date field '{field}' is not selected on table '{table}'")]
    DateFieldNotSelected { table: String, field: String },

    #[error("invalid date configuration: {0}")]
    DateConfig(#[from] DateConfigError),

    #[error("UTC offset {0} is outside -14..=14 hours")]
    UtcOffsetOutOfRange(f64),
}

pub type GenerateResult<T> = Result<T, GenerateError>;

/// Per-run generation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    pub connection_type: ConnectionType,
    pub storage_mode: StorageMode,
    pub dataverse_url: String,
    pub fabric_sql_endpoint: String,
    pub fabric_lakehouse: String,
    pub culture: String,
    pub corrections: ColumnCorrections,
    /// Parse every row-source query and report failures as diagnostics.
    pub validate_sql: bool,
    /// Local-calendar offset for view filters. Falls back to the date
    /// table's offset, then UTC.
    pub utc_offset_hours: Option<f64>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            connection_type: ConnectionType::default(),
            storage_mode: StorageMode::default(),
            dataverse_url: String::new(),
            fabric_sql_endpoint: String::new(),
            fabric_lakehouse: String::new(),
            culture: "en-US".to_string(),
            corrections: ColumnCorrections::default(),
            validate_sql: true,
            utc_offset_hours: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// The table's view filter was only partly converted.
    PartialFilter,
    SkippedRelationship,
    /// A column whose row-source column was already projected.
    SkippedColumn,
    InvalidQuery,
}

/// A non-fatal finding from one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationDiagnostic {
    pub kind: DiagnosticKind,
    pub table: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct GenerationOutput {
    pub definitions: GeneratedDefinitionSet,
    pub diagnostics: Vec<GenerationDiagnostic>,
    /// Filter conversion result per table name.
    pub filters: BTreeMap<String, FilterConversion>,
}

/// Generates TMDL definition sets.
#[derive(Debug, Clone, Default)]
pub struct ModelDefinitionGenerator {
    options: GenerateOptions,
}

impl ModelDefinitionGenerator {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    fn connector(&self) -> ConnectorParameters {
        ConnectorParameters {
            connection_type: self.options.connection_type,
            dataverse_url: self.options.dataverse_url.clone(),
            fabric_sql_endpoint: self.options.fabric_sql_endpoint.clone(),
            fabric_lakehouse: self.options.fabric_lakehouse.clone(),
        }
    }

    pub fn generate(
        &self,
        tables: &[TableSelection],
        relationships: &[RelationshipEdge],
        date: Option<&DateTableConfig>,
        model_name: &str,
    ) -> GenerateResult<GenerationOutput> {
        if let Some(date) = date {
            date.validate()?;
        }
        check_duplicates(tables, date.is_some())?;

        let utc_offset = self
            .options
            .utc_offset_hours
            .or(date.map(|d| d.utc_offset_hours))
            .unwrap_or(0.0);
        if !(-14.0..=14.0).contains(&utc_offset) {
            return Err(GenerateError::UtcOffsetOutOfRange(utc_offset));
        }
        let converter = FilterConverter::new(utc_offset)
            .with_environment(FilterEnvironment::for_target(
                self.options.connection_type,
                self.options.storage_mode,
            ));
        let ctx = PlanContext {
            corrections: &self.options.corrections,
            converter: &converter,
            date,
            edges: relationships,
        };
        let plans: Vec<TablePlan> = tables.iter().map(|t| TablePlan::build(t, &ctx)).collect();

        let date_from = match date {
            Some(date) => Some(date_endpoint(&plans, date)?),
            None => None,
        };

        let mut output = GenerationOutput::default();
        let connector = self.connector();
        let mut fresh_tag = |_: &str| new_identifier();

        for plan in &plans {
            self.collect_diagnostics(plan, &mut output);
            let text = plan.write(&connector, self.options.storage_mode, &mut fresh_tag);
            output.definitions.insert(table_path(&plan.name), text);
        }
        if let Some(date) = date {
            output
                .definitions
                .insert(table_path(DATE_TABLE), write_date_table(date, &mut fresh_tag));
        }

        let specs = relationship_specs(&plans, relationships, date_from, &mut output.diagnostics);
        if !specs.is_empty() {
            let mut w = IndentWriter::new();
            for spec in &specs {
                spec.write(&mut w, &new_identifier());
            }
            output.definitions.insert(RELATIONSHIPS_PATH, w.into_string());
        }

        let mut table_names: Vec<String> = plans.iter().map(|p| p.name.clone()).collect();
        if date.is_some() {
            table_names.push(DATE_TABLE.to_string());
        }
        let mut query_order: Vec<String> = connector
            .parameters()
            .iter()
            .map(|(name, _)| name.to_string())
            .collect();
        query_order.extend(plans.iter().map(|p| p.name.clone()));

        output.definitions.insert(
            EXPRESSIONS_PATH,
            connector.write_expressions(&mut fresh_tag),
        );
        output.definitions.insert(
            MODEL_PATH,
            write_model(&self.options.culture, &query_order, &table_names),
        );
        output
            .definitions
            .insert(DATABASE_PATH, write_database(model_name));

        tracing::info!(
            model = %model_name,
            tables = table_names.len(),
            relationships = specs.len(),
            diagnostics = output.diagnostics.len(),
            "generated model definition"
        );
        Ok(output)
    }

    fn collect_diagnostics(&self, plan: &TablePlan, output: &mut GenerationOutput) {
        if let Some(filter) = &plan.filter {
            if !filter.is_fully_supported {
                output.diagnostics.push(GenerationDiagnostic {
                    kind: DiagnosticKind::PartialFilter,
                    table: plan.name.clone(),
                    message: filter.unsupported_features.join("; "),
                });
            }
            output.filters.insert(plan.name.clone(), filter.clone());
        }
        for source in &plan.skipped {
            output.diagnostics.push(GenerationDiagnostic {
                kind: DiagnosticKind::SkippedColumn,
                table: plan.name.clone(),
                message: format!("row-source column '{}' is already projected", source),
            });
        }
        if self.options.validate_sql {
            if let Err(err) = validate_sql(&plan.query()) {
                tracing::warn!(table = %plan.name, error = %err, "row-source query failed to parse");
                output.diagnostics.push(GenerationDiagnostic {
                    kind: DiagnosticKind::InvalidQuery,
                    table: plan.name.clone(),
                    message: err.message,
                });
            }
        }
    }
}

fn check_duplicates(tables: &[TableSelection], with_date: bool) -> GenerateResult<()> {
    let mut logical = HashSet::new();
    let mut paths = HashSet::new();
    if with_date {
        paths.insert(table_path(DATE_TABLE).to_ascii_lowercase());
    }
    for table in tables {
        if !logical.insert(table.logical_name.to_ascii_lowercase())
            || !paths.insert(table_path(table.model_name()).to_ascii_lowercase())
        {
            return Err(GenerateError::DuplicateTable(table.model_name().to_string()));
        }
    }
    Ok(())
}

/// `fromColumn` of the calendar relationship.
fn date_endpoint(plans: &[TablePlan], date: &DateTableConfig) -> GenerateResult<String> {
    let plan = plans
        .iter()
        .find(|p| p.logical_name.eq_ignore_ascii_case(&date.table))
        .ok_or_else(|| GenerateError::DateTableNotSelected(date.table.clone()))?;
    let column = plan
        .column_for_source(&date.field)
        .ok_or_else(|| GenerateError::DateFieldNotSelected {
            table: date.table.clone(),
            field: date.field.clone(),
        })?;
    Ok(column_ref(&plan.name, column))
}

fn relationship_specs(
    plans: &[TablePlan],
    edges: &[RelationshipEdge],
    date_from: Option<String>,
    diagnostics: &mut Vec<GenerationDiagnostic>,
) -> Vec<RelationshipSpec> {
    let find = |logical: &str| plans.iter().find(|p| p.logical_name.eq_ignore_ascii_case(logical));
    let mut skip = |table: &str, message: String| {
        tracing::debug!(table = %table, "{}", message);
        diagnostics.push(GenerationDiagnostic {
            kind: DiagnosticKind::SkippedRelationship,
            table: table.to_string(),
            message,
        });
    };

    let mut specs = Vec::new();
    let mut seen = HashSet::new();
    for edge in edges {
        let label = format!(
            "{}.{} -> {}",
            edge.source_table, edge.source_attribute, edge.target_table
        );
        let Some(source) = find(&edge.source_table) else {
            skip(&edge.source_table, format!("{}: source table is not selected", label));
            continue;
        };
        let Some(target) = find(&edge.target_table) else {
            skip(&source.name, format!("{}: target table is not selected", label));
            continue;
        };
        let attribute = edge.source_attribute.to_ascii_lowercase();
        let Some(from) = source.id_columns.get(&attribute) else {
            let reason = if source.excluded_ids.contains(&attribute) {
                "id column is excluded"
            } else {
                "lookup attribute is not selected"
            };
            skip(&source.name, format!("{}: {}", label, reason));
            continue;
        };
        let Some(to) = target.key_column() else {
            skip(&source.name, format!("{}: target has no key column", label));
            continue;
        };

        let mut spec = RelationshipSpec::new(column_ref(&source.name, from), column_ref(&target.name, to));
        if !seen.insert((spec.from_column.clone(), spec.to_column.clone())) {
            skip(&source.name, format!("{}: duplicate edge", label));
            continue;
        }
        spec.is_active = edge.active;
        spec.snowflake = edge.snowflake;
        spec.rely_on_referential_integrity = edge.assume_referential_integrity;
        specs.push(spec);
    }

    if let Some(from) = date_from {
        specs.push(RelationshipSpec::new(from, column_ref(DATE_TABLE, DATE_COLUMN)));
    }
    specs
}
