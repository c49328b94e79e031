// ─────────────────────────────────────────────────────────────────────────────
// Default-expression translation
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of translating a MySQL column default into SQLite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultClause {
    /// No `DEFAULT` clause at all.
    Omit,
    /// `DEFAULT NULL` — the source set it explicitly and the column is nullable.
    Null,
    /// `DEFAULT <rendered>` — a literal or keyword SQLite accepts verbatim.
    Verbatim(String),
    /// A MySQL 8 expression default (`(UUID())`, generated column, …) that has
    /// no portable SQLite form. The caller logs a warning naming the column.
    Dropped { expression: String },
}

/// Translate a raw `information_schema.columns.COLUMN_DEFAULT` value.
///
/// The catalog form differs between servers: MySQL 8 reports string literals
/// bare (`foo`) and expression defaults parenthesised; MariaDB reports string
/// literals quoted (`'foo'`) and "no default" as the literal word `NULL`.
/// Both conventions are accepted here.
///
/// `generated` marks a `GENERATED ALWAYS AS (...)` column (`EXTRA` contains
/// `GENERATED`) — its catalog default is an expression regardless of shape.
pub fn translate_default(raw: Option<&str>, nullable: bool, generated: bool) -> DefaultClause {
    let Some(raw) = raw else {
        return DefaultClause::Omit;
    };
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        // An empty string default arrives quoted from MariaDB ('') and bare
        // from MySQL 8; the bare form lands here.
        return DefaultClause::Verbatim("''".to_string());
    }

    if trimmed.eq_ignore_ascii_case("null") {
        return if nullable {
            DefaultClause::Null
        } else {
            DefaultClause::Omit
        };
    }

    if generated {
        return DefaultClause::Dropped {
            expression: trimmed.to_string(),
        };
    }

    // Charset introducer: _utf8mb4'x', _latin1'y' — strip, keep the literal.
    if let Some(literal) = strip_charset_introducer(trimmed) {
        return DefaultClause::Verbatim(literal);
    }

    // Bit literal b'0101' — SQLite has no bit literals, emit the integer.
    if let Some(value) = parse_bit_literal(trimmed) {
        return DefaultClause::Verbatim(value.to_string());
    }

    // CURRENT_TIMESTAMP / NOW() / CURRENT_DATE / CURRENT_TIME, with or
    // without parentheses and fractional-seconds specifier.
    if let Some(keyword) = map_temporal_keyword(trimmed) {
        return DefaultClause::Verbatim(keyword.to_string());
    }

    // MySQL 8 expression default — always parenthesised in the catalog.
    if trimmed.starts_with('(') {
        return DefaultClause::Dropped {
            expression: trimmed.to_string(),
        };
    }

    // Numeric literal passes through verbatim.
    if trimmed.parse::<i128>().is_ok() || trimmed.parse::<f64>().is_ok() {
        return DefaultClause::Verbatim(trimmed.to_string());
    }

    // Already-quoted string literal (MariaDB convention).
    if trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'') {
        return DefaultClause::Verbatim(trimmed.to_string());
    }

    // Anything else is an opaque text literal (MySQL 8 reports them bare).
    DefaultClause::Verbatim(quote_text(trimmed))
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// `_utf8mb4'x'` → `'x'`. The introducer is `_` followed by a charset name,
/// immediately followed by a single-quoted literal (possibly `\'`-escaped in
/// older catalogs).
fn strip_charset_introducer(s: &str) -> Option<String> {
    let rest = s.strip_prefix('_')?;
    let quote = rest.find('\'')?;
    let charset = &rest[..quote];
    if charset.is_empty() || !charset.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let literal = rest[quote..].trim();
    // Older catalogs escape the quotes: _utf8mb4\'x\'.
    let literal = literal.replace("\\'", "'");
    if literal.starts_with('\'') && literal.ends_with('\'') && literal.len() >= 2 {
        Some(literal)
    } else {
        None
    }
}

/// `b'0101'` → 5. MySQL bit literals hold at most 64 bits.
fn parse_bit_literal(s: &str) -> Option<u64> {
    let rest = s
        .strip_prefix("b'")
        .or_else(|| s.strip_prefix("B'"))?
        .strip_suffix('\'')?;
    if rest.is_empty() || rest.len() > 64 {
        return None;
    }
    u64::from_str_radix(rest, 2).ok()
}

fn map_temporal_keyword(s: &str) -> Option<&'static str> {
    // Normalise "current_timestamp(6)" / "now()" → base keyword.
    let prefix = s.split('(').next().unwrap_or(s);
    let base = prefix.trim().to_lowercase();
    let tail = &s[prefix.len()..];
    // Reject things like "current_timestamp + interval 1 day".
    if !tail.trim().is_empty() && !is_call_parens(tail.trim()) {
        return None;
    }
    match base.as_str() {
        "current_timestamp" | "now" | "localtime" | "localtimestamp" => Some("CURRENT_TIMESTAMP"),
        "current_date" | "curdate" => Some("CURRENT_DATE"),
        "current_time" | "curtime" => Some("CURRENT_TIME"),
        _ => None,
    }
}

/// `()`, `(6)` — an optional fractional-seconds call suffix.
fn is_call_parens(tail: &str) -> bool {
    tail.starts_with('(')
        && tail.ends_with(')')
        && tail[1..tail.len() - 1].chars().all(|c| c.is_ascii_digit())
}

fn quote_text(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_default_is_omitted() {
        assert_eq!(translate_default(None, true, false), DefaultClause::Omit);
        assert_eq!(translate_default(None, false, false), DefaultClause::Omit);
    }

    #[test]
    fn test_explicit_null_only_for_nullable_columns() {
        assert_eq!(
            translate_default(Some("NULL"), true, false),
            DefaultClause::Null
        );
        assert_eq!(
            translate_default(Some("NULL"), false, false),
            DefaultClause::Omit
        );
    }

    #[test]
    fn test_numeric_literals_pass_through() {
        for lit in ["0", "1", "-7", "42", "3.5", "-0.25", "1e3"] {
            assert_eq!(
                translate_default(Some(lit), true, false),
                DefaultClause::Verbatim(lit.to_string()),
                "{lit}"
            );
        }
    }

    #[test]
    fn test_quoted_string_literal_kept() {
        assert_eq!(
            translate_default(Some("'pending'"), true, false),
            DefaultClause::Verbatim("'pending'".into())
        );
    }

    #[test]
    fn test_bare_string_literal_is_quoted() {
        // MySQL 8 reports string defaults without quotes.
        assert_eq!(
            translate_default(Some("pending"), true, false),
            DefaultClause::Verbatim("'pending'".into())
        );
        assert_eq!(
            translate_default(Some("it's"), true, false),
            DefaultClause::Verbatim("'it''s'".into())
        );
    }

    #[test]
    fn test_charset_introducer_stripped() {
        assert_eq!(
            translate_default(Some("_utf8mb4'x'"), true, false),
            DefaultClause::Verbatim("'x'".into())
        );
        assert_eq!(
            translate_default(Some("_latin1'héllo'"), true, false),
            DefaultClause::Verbatim("'héllo'".into())
        );
        assert_eq!(
            translate_default(Some(r#"_utf8mb4\'x\'"#), true, false),
            DefaultClause::Verbatim("'x'".into())
        );
    }

    #[test]
    fn test_bit_literal_becomes_integer() {
        assert_eq!(
            translate_default(Some("b'1010'"), true, false),
            DefaultClause::Verbatim("10".into())
        );
        assert_eq!(
            translate_default(Some("b'0'"), true, false),
            DefaultClause::Verbatim("0".into())
        );
        assert_eq!(
            translate_default(Some("B'11111111'"), true, false),
            DefaultClause::Verbatim("255".into())
        );
    }

    #[test]
    fn test_temporal_keywords_mapped() {
        for (raw, want) in [
            ("CURRENT_TIMESTAMP", "CURRENT_TIMESTAMP"),
            ("current_timestamp()", "CURRENT_TIMESTAMP"),
            ("CURRENT_TIMESTAMP(6)", "CURRENT_TIMESTAMP"),
            ("now()", "CURRENT_TIMESTAMP"),
            ("NOW", "CURRENT_TIMESTAMP"),
            ("CURRENT_DATE", "CURRENT_DATE"),
            ("curdate()", "CURRENT_DATE"),
            ("CURRENT_TIME(3)", "CURRENT_TIME"),
        ] {
            assert_eq!(
                translate_default(Some(raw), true, false),
                DefaultClause::Verbatim(want.into()),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_expression_default_dropped() {
        let result = translate_default(Some("(uuid())"), true, false);
        assert_eq!(
            result,
            DefaultClause::Dropped {
                expression: "(uuid())".into()
            }
        );
        assert!(matches!(
            translate_default(Some("(json_object())"), true, false),
            DefaultClause::Dropped { .. }
        ));
    }

    #[test]
    fn test_generated_column_default_dropped() {
        assert_eq!(
            translate_default(Some("concat(first,' ',last)"), true, true),
            DefaultClause::Dropped {
                expression: "concat(first,' ',last)".into()
            }
        );
    }

    #[test]
    fn test_temporal_with_trailing_expression_is_opaque() {
        // Not a bare keyword; survives as a quoted literal rather than a
        // keyword SQLite would evaluate differently.
        let result = translate_default(Some("current_timestamp + interval 1 day"), true, false);
        assert_eq!(
            result,
            DefaultClause::Verbatim("'current_timestamp + interval 1 day'".into())
        );
    }

    #[test]
    fn test_empty_string_default() {
        assert_eq!(
            translate_default(Some(""), true, false),
            DefaultClause::Verbatim("''".into())
        );
        assert_eq!(
            translate_default(Some("''"), true, false),
            DefaultClause::Verbatim("''".into())
        );
    }
}
