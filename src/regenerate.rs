//! End-to-end regeneration pass.
//!
//! The prior definition set is parsed before anything new is produced, the
//! fresh set is analyzed against it, and only then are the preserved
//! identifiers and user edits merged back in.

use serde::{Deserialize, Serialize};

use crate::analyze::{analyze, AnalysisConfig, ChangeType, ImpactLevel, ObjectType, SemanticModelChange};
use crate::model::{DateTableConfig, GeneratedDefinitionSet, RelationshipEdge, TableSelection};
use crate::preserve::{merge, parse_definitions, PreservedMetadata};
use crate::tmdl::{GenerateError, GenerateOptions, GenerateResult, GenerationDiagnostic, ModelDefinitionGenerator};

/// Everything the catalog collaborator hands over for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInput {
    pub model_name: String,
    pub tables: Vec<TableSelection>,
    #[serde(default)]
    pub relationships: Vec<RelationshipEdge>,
    #[serde(default)]
    pub date: Option<DateTableConfig>,
}

#[derive(Debug, Clone, Default)]
pub struct RegenerateOutput {
    /// Merged definition set, ready to replace the prior one.
    pub definitions: GeneratedDefinitionSet,
    pub changes: Vec<SemanticModelChange>,
    pub diagnostics: Vec<GenerationDiagnostic>,
}

/// Run one regeneration pass against an optional prior definition set.
pub fn regenerate(
    input: &ModelInput,
    prior: Option<&GeneratedDefinitionSet>,
    options: &GenerateOptions,
    analysis: &AnalysisConfig,
) -> GenerateResult<RegenerateOutput> {
    if let Some(fact) = &analysis.fact_table {
        if !input
            .tables
            .iter()
            .any(|t| t.logical_name.eq_ignore_ascii_case(fact))
        {
            return Err(GenerateError::FactTableNotSelected(fact.clone()));
        }
    }

    let preserved = match prior {
        Some(set) => parse_definitions(set),
        None => PreservedMetadata::default(),
    };
    for warning in &preserved.warnings {
        tracing::warn!(path = %warning.path, "{}", warning.message);
    }

    let generated = ModelDefinitionGenerator::new(options.clone()).generate(
        &input.tables,
        &input.relationships,
        input.date.as_ref(),
        &input.model_name,
    )?;

    let mut changes = if prior.is_some() {
        analyze(&preserved, &generated.definitions, analysis)
    } else {
        Vec::new()
    };
    changes.extend(generated.diagnostics.iter().map(|d| {
        SemanticModelChange::new(
            ObjectType::Query,
            &d.table,
            ChangeType::Warning,
            ImpactLevel::Safe,
            &d.message,
        )
    }));

    let definitions = merge(generated.definitions, &preserved);
    tracing::info!(
        model = %input.model_name,
        files = definitions.len(),
        changes = changes.len(),
        "regeneration complete"
    );

    Ok(RegenerateOutput {
        definitions,
        changes,
        diagnostics: generated.diagnostics,
    })
}
