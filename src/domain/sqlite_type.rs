use crate::domain::source_type::SourceType;

// ─────────────────────────────────────────────────────────────────────────────
// Destination types
// ─────────────────────────────────────────────────────────────────────────────

/// Collation applied to TEXT-affine columns in the emitted DDL.
/// SQLite ships exactly these three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[cfg_attr(feature = "cli", value(rename_all = "UPPER"))]
pub enum Collation {
    #[default]
    Binary,
    Nocase,
    Rtrim,
}

impl Collation {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Collation::Binary => "BINARY",
            Collation::Nocase => "NOCASE",
            Collation::Rtrim => "RTRIM",
        }
    }
}

impl std::fmt::Display for Collation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// The SQLite-side column type a [`SourceType`] translates to.
///
/// `DECIMAL`, `DATE`, `DATETIME`, `TIME` and `JSON` are kept as declared
/// types for affinity and readability; under STRICT they all downgrade to
/// `TEXT` (the five strict storage classes are the only legal spellings).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqliteType {
    Integer,
    Real,
    Text,
    Blob,
    Decimal { precision: u32, scale: u32 },
    Date,
    DateTime,
    Time,
    Json,
}

impl SqliteType {
    /// Render the type as it appears in `CREATE TABLE`.
    pub fn render(&self, strict: bool) -> String {
        match self {
            SqliteType::Integer => "INTEGER".into(),
            SqliteType::Real => "REAL".into(),
            SqliteType::Text => "TEXT".into(),
            SqliteType::Blob => "BLOB".into(),
            SqliteType::Decimal { precision, scale } => {
                if strict {
                    "TEXT".into()
                } else {
                    format!("DECIMAL({precision},{scale})")
                }
            }
            SqliteType::Date => downgrade("DATE", strict),
            SqliteType::DateTime => downgrade("DATETIME", strict),
            SqliteType::Time => downgrade("TIME", strict),
            SqliteType::Json => downgrade("JSON", strict),
        }
    }

    /// True for the columns that take a `COLLATE` clause.
    pub fn is_text_affine(&self) -> bool {
        matches!(self, SqliteType::Text)
    }
}

fn downgrade(declared: &str, strict: bool) -> String {
    if strict { "TEXT".into() } else { declared.into() }
}

// ─────────────────────────────────────────────────────────────────────────────
// Translation
// ─────────────────────────────────────────────────────────────────────────────

/// Destination-side switches the translator honours.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeOptions {
    /// The destination SQLite build has JSON1.
    pub json1_available: bool,
    /// `--json-as-text`: store JSON columns as plain TEXT regardless.
    pub json_as_text: bool,
}

/// Map a parsed MySQL type to its SQLite column type. Total over every
/// [`SourceType`] variant — unknown families never reach this point, the
/// `COLUMN_TYPE` parser rejects them first.
pub fn translate_type(source: &SourceType, opts: &TypeOptions) -> SqliteType {
    match source {
        SourceType::TinyInt { .. }
        | SourceType::SmallInt { .. }
        | SourceType::MediumInt { .. }
        | SourceType::Int { .. }
        | SourceType::BigInt { .. }
        | SourceType::Year => SqliteType::Integer,

        // A bit string still fits the integer storage class up to 8 bits;
        // anything wider keeps its raw bytes.
        SourceType::Bit { bits } => {
            if *bits <= 8 {
                SqliteType::Integer
            } else {
                SqliteType::Blob
            }
        }

        SourceType::Float | SourceType::Double => SqliteType::Real,

        SourceType::Decimal { precision, scale } => SqliteType::Decimal {
            precision: *precision,
            scale: *scale,
        },

        SourceType::Char
        | SourceType::VarChar
        | SourceType::TinyText
        | SourceType::Text
        | SourceType::MediumText
        | SourceType::LongText
        | SourceType::Enum { .. }
        | SourceType::Set { .. } => SqliteType::Text,

        SourceType::Date => SqliteType::Date,
        SourceType::DateTime | SourceType::Timestamp => SqliteType::DateTime,
        SourceType::Time => SqliteType::Time,

        SourceType::Binary
        | SourceType::VarBinary
        | SourceType::TinyBlob
        | SourceType::Blob
        | SourceType::MediumBlob
        | SourceType::LongBlob => SqliteType::Blob,

        SourceType::Json => {
            if opts.json1_available && !opts.json_as_text {
                SqliteType::Json
            } else {
                SqliteType::Text
            }
        }

        SourceType::Spatial { .. } => SqliteType::Blob,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn translate(declared: &str) -> SqliteType {
        translate_type(
            &SourceType::parse(declared).unwrap(),
            &TypeOptions::default(),
        )
    }

    #[test]
    fn test_integer_family_maps_to_integer() {
        for declared in [
            "tinyint(1)",
            "smallint",
            "mediumint(8)",
            "int(11)",
            "int unsigned",
            "bigint(20)",
            "year",
        ] {
            assert_eq!(translate(declared), SqliteType::Integer, "{declared}");
        }
    }

    #[test]
    fn test_float_family_maps_to_real() {
        for declared in ["float", "double", "real", "double(8,2)"] {
            assert_eq!(translate(declared), SqliteType::Real, "{declared}");
        }
    }

    #[test]
    fn test_text_family_maps_to_text() {
        for declared in [
            "char(4)",
            "varchar(190)",
            "tinytext",
            "text",
            "mediumtext",
            "longtext",
            "enum('a','b')",
            "set('x')",
        ] {
            assert_eq!(translate(declared), SqliteType::Text, "{declared}");
        }
    }

    #[test]
    fn test_blob_family_maps_to_blob() {
        for declared in [
            "binary(16)",
            "varbinary(32)",
            "tinyblob",
            "blob",
            "mediumblob",
            "longblob",
            "geometry",
            "point",
        ] {
            assert_eq!(translate(declared), SqliteType::Blob, "{declared}");
        }
    }

    #[test]
    fn test_bit_size_threshold() {
        // Sweep the full range: 1..=8 integer, 9..=64 blob.
        for bits in 1..=64u32 {
            let ty = translate_type(&SourceType::Bit { bits }, &TypeOptions::default());
            if bits <= 8 {
                assert_eq!(ty, SqliteType::Integer, "bit({bits})");
            } else {
                assert_eq!(ty, SqliteType::Blob, "bit({bits})");
            }
        }
    }

    #[test]
    fn test_decimal_preserves_parameters() {
        // Sweep a grid of (p, s) pairs; the declared parameters must survive
        // into the rendered type.
        for p in [1u32, 5, 10, 38, 65] {
            for s in [0u32, 2, 10, 30] {
                if s > p {
                    continue;
                }
                let ty = translate_type(
                    &SourceType::Decimal {
                        precision: p,
                        scale: s,
                    },
                    &TypeOptions::default(),
                );
                assert_eq!(ty.render(false), format!("DECIMAL({p},{s})"));
                assert_eq!(ty.render(true), "TEXT");
            }
        }
    }

    #[test]
    fn test_temporal_rendering() {
        assert_eq!(translate("date").render(false), "DATE");
        assert_eq!(translate("datetime").render(false), "DATETIME");
        assert_eq!(translate("timestamp").render(false), "DATETIME");
        assert_eq!(translate("time").render(false), "TIME");
        // STRICT narrows all of them to TEXT.
        assert_eq!(translate("date").render(true), "TEXT");
        assert_eq!(translate("datetime").render(true), "TEXT");
        assert_eq!(translate("time").render(true), "TEXT");
    }

    #[test]
    fn test_json_follows_capability_and_flag() {
        let src = SourceType::Json;
        let json1 = TypeOptions {
            json1_available: true,
            json_as_text: false,
        };
        assert_eq!(translate_type(&src, &json1), SqliteType::Json);

        let no_json1 = TypeOptions {
            json1_available: false,
            json_as_text: false,
        };
        assert_eq!(translate_type(&src, &no_json1), SqliteType::Text);

        let forced_text = TypeOptions {
            json1_available: true,
            json_as_text: true,
        };
        assert_eq!(translate_type(&src, &forced_text), SqliteType::Text);
    }

    #[test]
    fn test_only_plain_text_is_text_affine() {
        assert!(SqliteType::Text.is_text_affine());
        assert!(!SqliteType::Integer.is_text_affine());
        assert!(!SqliteType::Json.is_text_affine());
        assert!(
            !SqliteType::Decimal {
                precision: 10,
                scale: 2
            }
            .is_text_affine()
        );
    }

    #[test]
    fn test_enum_member_lists_do_not_change_output() {
        for members in [vec![], vec!["a".to_string()], vec!["a".into(), "b".into(), "c".into()]] {
            let ty = translate_type(&SourceType::Enum { members }, &TypeOptions::default());
            assert_eq!(ty, SqliteType::Text);
        }
    }
}
