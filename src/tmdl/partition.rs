//! Partition sources and the connector parameters they reference.
//!
//! Both connector variants run the same inner SQL through
//! `Value.NativeQuery`; only the `Source` step and the parameters declared
//! in `expressions.tmdl` differ.

use crate::model::{ConnectionType, StorageMode};

use super::format::{m_string, quote_name, IndentWriter};

/// Connection parameters declared as model expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorParameters {
    pub connection_type: ConnectionType,
    pub dataverse_url: String,
    pub fabric_sql_endpoint: String,
    pub fabric_lakehouse: String,
}

impl ConnectorParameters {
    /// `(name, value)` of each parameter the connector references.
    pub fn parameters(&self) -> Vec<(&'static str, &str)> {
        match self.connection_type {
            ConnectionType::Dataverse => vec![("DataverseURL", self.dataverse_url.as_str())],
            ConnectionType::FabricLink => vec![
                ("FabricSQLEndpoint", self.fabric_sql_endpoint.as_str()),
                ("FabricLakehouse", self.fabric_lakehouse.as_str()),
            ],
        }
    }

    fn source_step(&self) -> &'static str {
        match self.connection_type {
            ConnectionType::Dataverse => {
                "CommonDataService.Database(DataverseURL, [CreateNavigationProperties=false])"
            }
            ConnectionType::FabricLink => "Sql.Database(FabricSQLEndpoint, FabricLakehouse)",
        }
    }

    /// The M expression wrapping `sql`.
    pub fn envelope(&self, sql: &str) -> String {
        format!(
            "let\n    Source = {},\n    Query = Value.NativeQuery(Source, {}, null, [EnableFolding=true])\nin\n    Query",
            self.source_step(),
            m_string(sql)
        )
    }

    /// Render `expressions.tmdl`. `tag` supplies a lineage tag per
    /// parameter name.
    pub fn write_expressions(&self, tag: &mut impl FnMut(&str) -> String) -> String {
        let mut w = IndentWriter::new();
        for (name, value) in self.parameters() {
            w.write_line(&format!(
                "expression {} = {} meta [IsParameterQuery=true, Type=\"Text\", IsParameterQueryRequired=true]",
                name,
                m_string(value)
            ));
            w.indent();
            w.write_line(&format!("lineageTag: {}", tag(name)));
            w.blank_line();
            w.write_line("annotation PBI_ResultType = Text");
            w.blank_line();
            w.dedent();
        }
        w.into_string()
    }
}

/// An M partition in the given storage mode.
pub fn write_m_partition(
    w: &mut IndentWriter,
    table_name: &str,
    mode: StorageMode,
    expression: &str,
) {
    w.write_line(&format!("partition {} = m", quote_name(table_name)));
    w.indent();
    w.write_line(&format!("mode: {}", mode.as_tmdl()));
    write_source(w, expression);
    w.dedent();
}

/// A DAX-calculated partition.
pub fn write_calculated_partition(w: &mut IndentWriter, table_name: &str, expression: &str) {
    w.write_line(&format!("partition {} = calculated", quote_name(table_name)));
    w.indent();
    w.write_line(&format!("mode: {}", StorageMode::Import.as_tmdl()));
    write_source(w, expression);
    w.dedent();
}

fn write_source(w: &mut IndentWriter, expression: &str) {
    w.write_line("source =");
    w.indent();
    w.indent();
    w.write_lines(expression);
    w.dedent();
    w.dedent();
    w.blank_line();
}
