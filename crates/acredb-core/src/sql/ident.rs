/// Maximum identifier length accepted, matching the Postgres NAMEDATALEN
/// limit of 63 bytes.
pub const MAX_IDENT_LEN: usize = 63;

/// True when `name` is a bare lowercase identifier: `[a-z_][a-z0-9_]*`,
/// at most [`MAX_IDENT_LEN`] bytes.
#[must_use]
pub fn is_safe_ident(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_IDENT_LEN {
        return false;
    }

    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_lowercase() || first == '_') {
        return false;
    }

    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// True for a bare identifier or a single-qualified `alias.column` pair.
#[must_use]
pub fn is_safe_qualified(name: &str) -> bool {
    match name.split_once('.') {
        Some((alias, column)) => is_safe_ident(alias) && is_safe_ident(column),
        None => is_safe_ident(name),
    }
}

#[cfg(test)]
mod tests {
    use super::{MAX_IDENT_LEN, is_safe_ident, is_safe_qualified};

    #[test]
    fn accepts_plain_columns() {
        assert!(is_safe_ident("lead_status"));
        assert!(is_safe_ident("_private"));
        assert!(is_safe_ident("col9"));
    }

    #[test]
    fn rejects_sql_metacharacters() {
        assert!(!is_safe_ident("id; DROP TABLE leads"));
        assert!(!is_safe_ident("id--"));
        assert!(!is_safe_ident("id = 1 OR 1"));
        assert!(!is_safe_ident(""));
    }

    #[test]
    fn rejects_uppercase_and_unicode() {
        assert!(!is_safe_ident("LeadStatus"));
        assert!(!is_safe_ident("statüs"));
    }

    #[test]
    fn rejects_overlong_identifiers() {
        let long = "a".repeat(MAX_IDENT_LEN + 1);
        assert!(!is_safe_ident(&long));
    }

    #[test]
    fn qualified_allows_one_dot() {
        assert!(is_safe_qualified("l.created_at"));
        assert!(is_safe_qualified("created_at"));
        assert!(!is_safe_qualified("a.b.c"));
        assert!(!is_safe_qualified("l.created_at; --"));
    }
}
