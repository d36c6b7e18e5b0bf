//! Column planning and table blocks.
//!
//! A [`TablePlan`] fixes everything about one table before any text is
//! written: the ordered columns with their row-source expressions, the
//! inner SQL, the filter conversion, and which lookup id columns exist for
//! relationships to join on.

use std::collections::{BTreeMap, HashSet};

use crate::filter::{FilterConversion, FilterConverter, TimeShift};
use crate::lookup::{classify_attributes, resolve_lookup_columns, AttributeGroup, SubColumnKind};
use crate::model::{AttributeDescriptor, DateTableConfig, RelationshipEdge, StorageMode, TableSelection};
use crate::sql::ident::qualified;
use crate::sql::SelectQuery;

use super::column::{ColumnSpec, DataType};
use super::corrections::ColumnCorrections;
use super::format::{dax_table, quote_name, IndentWriter};
use super::partition::{write_m_partition, ConnectorParameters};

/// Alias of the table in its row-source query.
pub const BASE_ALIAS: &str = "Base";

/// Annotation carrying the stable table key.
pub const LOGICAL_NAME_ANNOTATION: &str = "SemforgeLogicalName";

/// Name of the fact table's row-count measure.
pub fn auto_measure_name(table_name: &str) -> String {
    format!("{} Count", table_name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Projection {
    Column,
    /// Date-only, timezone-shifted primary date field.
    LocalDate(String),
}

#[derive(Debug, Clone)]
pub(crate) struct PlannedColumn {
    pub spec: ColumnSpec,
    projection: Projection,
}

/// Everything needed to render one table.
#[derive(Debug, Clone)]
pub(crate) struct TablePlan {
    pub name: String,
    pub logical_name: String,
    pub is_fact: bool,
    pub columns: Vec<PlannedColumn>,
    pub filter: Option<FilterConversion>,
    /// Lookup logical name (lowercase) → emitted id column name.
    pub id_columns: BTreeMap<String, String>,
    /// Column names whose lookup id was explicitly excluded.
    pub excluded_ids: HashSet<String>,
    pub skipped: Vec<String>,
}

pub(crate) struct PlanContext<'a> {
    pub corrections: &'a ColumnCorrections,
    pub converter: &'a FilterConverter,
    pub date: Option<&'a DateTableConfig>,
    pub edges: &'a [RelationshipEdge],
}

impl TablePlan {
    pub fn build(table: &TableSelection, ctx: &PlanContext<'_>) -> Self {
        let mut plan = TablePlan {
            name: table.model_name().to_string(),
            logical_name: table.logical_name.clone(),
            is_fact: table.is_fact(),
            columns: Vec::new(),
            filter: None,
            id_columns: BTreeMap::new(),
            excluded_ids: HashSet::new(),
            skipped: Vec::new(),
        };
        let mut names = HashSet::new();
        let mut sources = HashSet::new();

        let pk = ColumnSpec::new(&table.primary_key, &table.primary_key, DataType::String)
            .hidden(true)
            .key();
        plan.push(pk, Projection::Column, &mut names, &mut sources);

        let mut groups = classify_attributes(&table.attributes);
        if let Some(primary) = &table.primary_name_attribute {
            if let Some(pos) = groups
                .iter()
                .position(|g| g.attribute().logical_name.eq_ignore_ascii_case(primary))
            {
                let group = groups.remove(pos);
                groups.insert(0, group);
            }
        }

        for group in &groups {
            if group
                .attribute()
                .logical_name
                .eq_ignore_ascii_case(&table.primary_key)
            {
                continue;
            }
            match group {
                AttributeGroup::Standalone(attr) => {
                    let (spec, projection) = plan_attribute(table, attr, ctx);
                    plan.push(spec, projection, &mut names, &mut sources);
                }
                AttributeGroup::Lookup { parent, .. } => {
                    plan.plan_lookup(table, parent, ctx, &mut names, &mut sources);
                }
            }
        }

        if let Some(xml) = table.filter_xml.as_deref().filter(|x| !x.trim().is_empty()) {
            plan.filter = Some(ctx.converter.convert(xml, BASE_ALIAS));
        }

        tracing::debug!(
            table = %plan.name,
            columns = plan.columns.len(),
            "planned table"
        );
        plan
    }

    fn plan_lookup(
        &mut self,
        table: &TableSelection,
        parent: &AttributeDescriptor,
        ctx: &PlanContext<'_>,
        names: &mut HashSet<String>,
        sources: &mut HashSet<String>,
    ) {
        let config = table.lookup_configs.get(&parent.logical_name);
        let resolved = resolve_lookup_columns(&table.logical_name, parent, config, ctx.edges);
        if !resolved.include_id {
            self.excluded_ids.insert(parent.logical_name.to_ascii_lowercase());
        }
        let display = table.effective_display_name(parent);

        for kind in resolved.included() {
            let name = match kind {
                SubColumnKind::Id => parent.logical_name.clone(),
                SubColumnKind::Name => display.to_string(),
                SubColumnKind::Type => format!("{} Type", display),
                SubColumnKind::Yomi => format!("{} Yomi", display),
            };
            let source = kind.source_column(&parent.logical_name);
            let source = ctx.corrections.apply(&source).to_string();
            let spec = ColumnSpec::new(name, source, DataType::String)
                .hidden(resolved.is_hidden(kind));
            if let Some(emitted) = self.push(spec, Projection::Column, names, sources) {
                if kind == SubColumnKind::Id {
                    self.id_columns
                        .insert(parent.logical_name.to_ascii_lowercase(), emitted);
                }
            }
        }
    }

    /// Append a column, dropping repeated sources and disambiguating
    /// repeated names. Returns the emitted name.
    fn push(
        &mut self,
        mut spec: ColumnSpec,
        projection: Projection,
        names: &mut HashSet<String>,
        sources: &mut HashSet<String>,
    ) -> Option<String> {
        if !sources.insert(spec.source_column.to_ascii_lowercase()) {
            tracing::debug!(
                table = %self.name,
                source = %spec.source_column,
                "column source already projected; skipped"
            );
            self.skipped.push(spec.source_column);
            return None;
        }
        if !names.insert(spec.name.to_ascii_lowercase()) {
            spec.name = format!("{} ({})", spec.name, spec.source_column);
            names.insert(spec.name.to_ascii_lowercase());
        }
        let name = spec.name.clone();
        self.columns.push(PlannedColumn { spec, projection });
        Some(name)
    }

    /// Emitted name of the column sourced from `source`.
    pub fn column_for_source(&self, source: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.spec.source_column.eq_ignore_ascii_case(source))
            .map(|c| c.spec.name.as_str())
    }

    pub fn key_column(&self) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.spec.is_key)
            .map(|c| c.spec.name.as_str())
    }

    /// Inner row-source SQL.
    pub fn query(&self) -> String {
        let mut query = SelectQuery::new(&self.logical_name, BASE_ALIAS);
        for column in &self.columns {
            match &column.projection {
                Projection::Column => {
                    query.column(&column.spec.source_column);
                }
                Projection::LocalDate(expr) => {
                    query.expr_as(expr.clone(), column.spec.source_column.clone());
                }
            }
        }
        if let Some(filter) = &self.filter {
            query.filter(filter.sql_where_clause.clone());
        }
        query.to_sql()
    }

    /// Render `tables/<Table>.tmdl`.
    pub fn write(
        &self,
        connector: &ConnectorParameters,
        mode: StorageMode,
        tag: &mut impl FnMut(&str) -> String,
    ) -> String {
        let mut w = IndentWriter::new();
        w.write_line(&format!("table {}", quote_name(&self.name)));
        w.indent();
        w.write_line(&format!("lineageTag: {}", tag("table")));
        w.blank_line();

        if self.is_fact {
            let measure = auto_measure_name(&self.name);
            w.write_line(&format!(
                "measure {} = COUNTROWS({})",
                quote_name(&measure),
                dax_table(&self.name)
            ));
            w.indent();
            w.write_line("formatString: #,0");
            w.write_line(&format!("lineageTag: {}", tag(&format!("measure:{}", measure))));
            w.blank_line();
            w.dedent();
        }

        for column in &self.columns {
            let key = format!("col:{}", column.spec.source_column);
            column.spec.write(&mut w, &tag(&key));
        }

        write_m_partition(&mut w, &self.name, mode, &connector.envelope(&self.query()));

        w.write_line(&format!(
            "annotation {} = {}",
            LOGICAL_NAME_ANNOTATION, self.logical_name
        ));
        w.blank_line();
        w.write_line("annotation PBI_ResultType = Table");
        w.into_string()
    }
}

fn plan_attribute(
    table: &TableSelection,
    attr: &AttributeDescriptor,
    ctx: &PlanContext<'_>,
) -> (ColumnSpec, Projection) {
    let name = table.effective_display_name(attr).to_string();
    let data_type = DataType::for_attribute(attr.attribute_type);

    if attr.attribute_type.is_choice() {
        let source = format!("{}name", attr.logical_name);
        let source = ctx.corrections.apply(&source).to_string();
        return (ColumnSpec::new(name, source, data_type), Projection::Column);
    }

    if let Some(date) = ctx.date {
        if date.table.eq_ignore_ascii_case(&table.logical_name)
            && date.field.eq_ignore_ascii_case(&attr.logical_name)
        {
            let shift = TimeShift::from_hours(date.utc_offset_hours);
            let local = shift.apply(&qualified(BASE_ALIAS, &attr.logical_name));
            let spec = ColumnSpec::new(name, &attr.logical_name, DataType::DateTime).format("Short Date");
            return (spec, Projection::LocalDate(format!("CAST({} AS DATE)", local)));
        }
    }

    let source = ctx.corrections.apply(&attr.logical_name).to_string();
    (ColumnSpec::new(name, source, data_type), Projection::Column)
}
