//! Identifier and literal quoting for the T-SQL row source.
//!
//! Names come from catalog metadata and are treated as untrusted: anything
//! that is not a plain identifier is bracket-quoted with `]` doubled, and
//! string literals always double embedded single quotes.

/// True for `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Quote identifier with square brackets.
pub fn quote_bracket(ident: &str) -> String {
    format!("[{}]", ident.replace(']', "]]"))
}

/// Emit plain identifiers bare, everything else bracket-quoted.
pub fn quote_identifier(ident: &str) -> String {
    if is_plain_identifier(ident) {
        ident.to_string()
    } else {
        quote_bracket(ident)
    }
}

/// Quote string with single quotes.
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// `alias.column` with both parts quoted as needed.
pub fn qualified(alias: &str, column: &str) -> String {
    format!("{}.{}", quote_identifier(alias), quote_identifier(column))
}
