//! Column blocks.

use crate::model::AttributeType;

use super::format::{quote_name, IndentWriter};

/// TMDL `dataType` values the generator emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    String,
    Int64,
    Decimal,
    Double,
    DateTime,
}

impl DataType {
    /// Type of the column an attribute projects to. Choice attributes
    /// project through their label column, so they are strings.
    pub fn for_attribute(attribute_type: AttributeType) -> Self {
        match attribute_type {
            AttributeType::Integer | AttributeType::BigInt => DataType::Int64,
            AttributeType::Decimal | AttributeType::Money => DataType::Decimal,
            AttributeType::Double => DataType::Double,
            AttributeType::DateTime => DataType::DateTime,
            _ => DataType::String,
        }
    }

    pub fn as_tmdl(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Int64 => "int64",
            DataType::Decimal => "decimal",
            DataType::Double => "double",
            DataType::DateTime => "dateTime",
        }
    }

    pub fn default_format(&self) -> Option<&'static str> {
        match self {
            DataType::Int64 => Some("0"),
            DataType::Decimal | DataType::Double => Some("#,0.00"),
            DataType::DateTime => Some("General Date"),
            DataType::String => None,
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int64 | DataType::Decimal | DataType::Double)
    }
}

/// One emitted column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    /// Row-source column; the stable identity of the column.
    pub source_column: String,
    pub data_type: DataType,
    pub format_string: Option<String>,
    pub is_hidden: bool,
    pub is_key: bool,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, source_column: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            source_column: source_column.into(),
            format_string: data_type.default_format().map(str::to_string),
            data_type,
            is_hidden: false,
            is_key: false,
        }
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.is_hidden = hidden;
        self
    }

    pub fn key(mut self) -> Self {
        self.is_key = true;
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format_string = Some(format.into());
        self
    }

    fn summarize_by(&self) -> &'static str {
        if self.data_type.is_numeric() && !self.is_key {
            "sum"
        } else {
            "none"
        }
    }

    pub fn write(&self, w: &mut IndentWriter, lineage_tag: &str) {
        w.write_line(&format!("column {}", quote_name(&self.name)));
        w.indent();
        w.write_line(&format!("dataType: {}", self.data_type.as_tmdl()));
        if let Some(format) = &self.format_string {
            w.write_line(&format!("formatString: {}", format));
        }
        if self.is_hidden {
            w.write_line("isHidden");
        }
        if self.is_key {
            w.write_line("isKey");
        }
        w.write_line(&format!("lineageTag: {}", lineage_tag));
        w.write_line(&format!("summarizeBy: {}", self.summarize_by()));
        w.write_line(&format!("sourceColumn: {}", self.source_column));
        w.blank_line();
        w.write_line("annotation SummarizationSetBy = Automatic");
        w.blank_line();
        w.dedent();
    }
}
