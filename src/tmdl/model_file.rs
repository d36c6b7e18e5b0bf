//! `database.tmdl` and `model.tmdl`.

use super::format::{quote_name, IndentWriter};

/// Compatibility level of the emitted database.
pub const COMPATIBILITY_LEVEL: u32 = 1567;

pub fn write_database(model_name: &str) -> String {
    let mut w = IndentWriter::new();
    w.write_line(&format!("database {}", quote_name(model_name)));
    w.indent();
    w.write_line(&format!("compatibilityLevel: {}", COMPATIBILITY_LEVEL));
    w.into_string()
}

/// `query_order` lists parameters then tables, the order the consuming
/// tool shows them in its query editor.
pub fn write_model(culture: &str, query_order: &[String], tables: &[String]) -> String {
    let mut w = IndentWriter::new();
    w.write_line("model Model");
    w.indent();
    w.write_line(&format!("culture: {}", culture));
    w.write_line("defaultPowerBIDataSourceVersion: powerBI_V3");
    w.write_line("discourageImplicitMeasures");
    w.write_line(&format!("sourceQueryCulture: {}", culture));
    w.blank_line();
    let order = serde_json::to_string(query_order).unwrap_or_else(|_| "[]".to_string());
    w.write_line(&format!("annotation PBI_QueryOrder = {}", order));
    w.blank_line();
    w.dedent();
    for table in tables {
        w.write_line(&format!("ref table {}", quote_name(table)));
    }
    w.into_string()
}
