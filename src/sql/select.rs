//! Minimal SELECT builder for partition row-source queries.

use super::ident::{qualified, quote_identifier};

/// One entry of the select list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectColumn {
    /// Raw SQL expression.
    pub expr: String,
    pub alias: Option<String>,
}

impl SelectColumn {
    /// Name of the column in the result set.
    pub fn output_name(&self) -> Option<&str> {
        self.alias
            .as_deref()
            .or_else(|| self.expr.rsplit('.').next())
    }

    fn to_sql(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} AS {}", self.expr, quote_identifier(alias)),
            None => self.expr.clone(),
        }
    }
}

/// `SELECT <columns> FROM <table> AS <alias> [WHERE <filter>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    table: String,
    alias: String,
    columns: Vec<SelectColumn>,
    filter: Option<String>,
}

impl SelectQuery {
    pub fn new(table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: alias.into(),
            columns: Vec::new(),
            filter: None,
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Add `alias.column`. Duplicate columns are ignored.
    pub fn column(&mut self, column: &str) -> &mut Self {
        let expr = qualified(&self.alias, column);
        self.push(SelectColumn { expr, alias: None })
    }

    /// Add an arbitrary expression under an output alias.
    pub fn expr_as(&mut self, expr: impl Into<String>, alias: impl Into<String>) -> &mut Self {
        self.push(SelectColumn {
            expr: expr.into(),
            alias: Some(alias.into()),
        })
    }

    fn push(&mut self, column: SelectColumn) -> &mut Self {
        if !self.columns.contains(&column) {
            self.columns.push(column);
        }
        self
    }

    /// Set the WHERE clause. Empty clauses are dropped.
    pub fn filter(&mut self, clause: impl Into<String>) -> &mut Self {
        let clause = clause.into();
        self.filter = if clause.trim().is_empty() {
            None
        } else {
            Some(clause)
        };
        self
    }

    pub fn columns(&self) -> &[SelectColumn] {
        &self.columns
    }

    pub fn to_sql(&self) -> String {
        let select_list = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns
                .iter()
                .map(SelectColumn::to_sql)
                .collect::<Vec<_>>()
                .join(", ")
        };
        let mut sql = format!(
            "SELECT {} FROM {} AS {}",
            select_list,
            quote_identifier(&self.table),
            quote_identifier(&self.alias)
        );
        if let Some(filter) = &self.filter {
            sql.push_str(" WHERE ");
            sql.push_str(filter);
        }
        sql
    }
}
