//! TMDL formatting utilities.
//!
//! Name quoting, M/DAX literal escaping, output-path sanitising, and the
//! tab-indented writer every emitter renders through.

use uuid::Uuid;

/// True when a TMDL object name can be written without quotes.
#[must_use]
pub fn is_plain_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Quote an object name if needed.
///
/// Returns the name as-is if it's plain, otherwise wraps it in single
/// quotes with embedded quotes doubled: `'Account Name'`.
#[must_use]
pub fn quote_name(name: &str) -> String {
    if is_plain_name(name) {
        name.to_string()
    } else {
        quote_always(name)
    }
}

/// Always-quoted table reference for DAX expressions.
#[must_use]
pub fn dax_table(name: &str) -> String {
    quote_always(name)
}

fn quote_always(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// `Table.Column` reference as used by `fromColumn`/`toColumn`.
#[must_use]
pub fn column_ref(table: &str, column: &str) -> String {
    format!("{}.{}", quote_name(table), quote_name(column))
}

/// Undo [`quote_name`]. Unquoted input is returned trimmed.
#[must_use]
pub fn unquote_name(name: &str) -> String {
    let name = name.trim();
    match name.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        Some(inner) => inner.replace("''", "'"),
        None => name.to_string(),
    }
}

/// Split a leading (possibly quoted) object name off `s`, returning the
/// unquoted name and the unparsed remainder.
#[must_use]
pub fn split_name(s: &str) -> (String, &str) {
    let s = s.trim_start();
    if let Some(rest) = s.strip_prefix('\'') {
        let bytes = rest.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                return (rest[..i].replace("''", "'"), &rest[i + 1..]);
            }
            i += 1;
        }
        return (rest.replace("''", "'"), "");
    }
    let end = s
        .find(|c: char| c.is_whitespace() || c == '=' || c == '.')
        .unwrap_or(s.len());
    (s[..end].to_string(), &s[end..])
}

/// Split a `Table.Column` reference into unquoted parts.
#[must_use]
pub fn split_column_ref(reference: &str) -> Option<(String, String)> {
    let (table, rest) = split_name(reference);
    let rest = rest.trim_start().strip_prefix('.')?;
    let (column, _) = split_name(rest);
    Some((table, column))
}

/// Quote a string for a Power Query (M) literal: `"` doubled.
#[must_use]
pub fn m_string(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Replace characters that are unsafe in a file name with `_`.
#[must_use]
pub fn file_safe_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim_end_matches(&['.', ' '][..]);
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Fresh identifier for a lineage tag or relationship name.
#[must_use]
pub fn new_identifier() -> String {
    Uuid::new_v4().to_string()
}

/// A writer that manages tab indentation for TMDL output.
#[derive(Debug, Default)]
pub struct IndentWriter {
    buffer: String,
    depth: usize,
}

impl IndentWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Write a complete line at the current depth.
    pub fn write_line(&mut self, s: &str) {
        for _ in 0..self.depth {
            self.buffer.push('\t');
        }
        self.buffer.push_str(s);
        self.buffer.push('\n');
    }

    /// Write each line of a multi-line expression at the current depth.
    pub fn write_lines(&mut self, text: &str) {
        for line in text.lines() {
            self.write_line(line);
        }
    }

    pub fn blank_line(&mut self) {
        self.buffer.push('\n');
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.buffer
    }
}
