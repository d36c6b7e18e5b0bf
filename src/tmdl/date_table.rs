//! Synthetic calendar dimension.

use crate::model::DateTableConfig;

use super::column::{ColumnSpec, DataType};
use super::format::{quote_name, IndentWriter};
use super::partition::write_calculated_partition;
use super::table::LOGICAL_NAME_ANNOTATION;

/// Name of the emitted calendar table.
pub const DATE_TABLE: &str = "Date";

/// Key column of the calendar table.
pub const DATE_COLUMN: &str = "Date";

/// (column name, DAX expression, type, format). The `Date` column comes
/// from `CALENDAR` itself.
const CALENDAR_COLUMNS: [(&str, &str, DataType, Option<&str>); 8] = [
    ("Year", "YEAR([Date])", DataType::Int64, Some("0")),
    ("Quarter", "\"Q\" & QUARTER([Date])", DataType::String, None),
    ("Month Number", "MONTH([Date])", DataType::Int64, Some("0")),
    ("Month", "FORMAT([Date], \"MMMM\")", DataType::String, None),
    ("Week of Year", "WEEKNUM([Date], 2)", DataType::Int64, Some("0")),
    ("Day of Week", "WEEKDAY([Date], 2)", DataType::Int64, Some("0")),
    ("Day Name", "FORMAT([Date], \"dddd\")", DataType::String, None),
    ("Day", "DAY([Date])", DataType::Int64, Some("0")),
];

/// Calendar spanning `[start_year, end_year]`, one row per day.
pub fn calendar_expression(config: &DateTableConfig) -> String {
    let mut lines = vec![
        "ADDCOLUMNS(".to_string(),
        format!(
            "\tCALENDAR(DATE({}, 1, 1), DATE({}, 12, 31)),",
            config.start_year, config.end_year
        ),
    ];
    for (i, (name, expr, _, _)) in CALENDAR_COLUMNS.iter().enumerate() {
        let sep = if i + 1 == CALENDAR_COLUMNS.len() { "" } else { "," };
        lines.push(format!("\t\"{}\", {}{}", name, expr, sep));
    }
    lines.push(")".to_string());
    lines.join("\n")
}

fn calendar_columns() -> Vec<ColumnSpec> {
    let mut columns = vec![ColumnSpec::new(DATE_COLUMN, format!("[{}]", DATE_COLUMN), DataType::DateTime)
        .format("Short Date")
        .key()];
    for (name, _, data_type, format) in CALENDAR_COLUMNS {
        let mut column = ColumnSpec::new(name, format!("[{}]", name), data_type);
        column.format_string = format.map(str::to_string);
        columns.push(column);
    }
    columns
}

/// Render `tables/Date.tmdl`.
pub fn write_date_table(config: &DateTableConfig, tag: &mut impl FnMut(&str) -> String) -> String {
    let mut w = IndentWriter::new();
    w.write_line(&format!("table {}", quote_name(DATE_TABLE)));
    w.indent();
    w.write_line(&format!("lineageTag: {}", tag("table")));
    w.write_line("dataCategory: Time");
    w.blank_line();

    for column in calendar_columns() {
        let key = format!("col:{}", column.source_column);
        column.write(&mut w, &tag(&key));
    }

    write_calculated_partition(&mut w, DATE_TABLE, &calendar_expression(config));
    w.write_line(&format!("annotation {} = {}", LOGICAL_NAME_ANNOTATION, DATE_TABLE));
    w.blank_line();
    w.write_line("annotation PBI_ResultType = Table");
    w.into_string()
}
