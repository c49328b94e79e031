// ─────────────────────────────────────────────────────────────────────────────
// MySQL declared types
// ─────────────────────────────────────────────────────────────────────────────

/// A MySQL column type as reported by `information_schema.columns.COLUMN_TYPE`,
/// parsed into one variant per type family with the parameters that matter for
/// translation and row decoding.
///
/// Display widths (`int(11)`) and `zerofill` are parsed and discarded — they
/// affect rendering on the MySQL side only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceType {
    TinyInt { unsigned: bool },
    SmallInt { unsigned: bool },
    MediumInt { unsigned: bool },
    Int { unsigned: bool },
    BigInt { unsigned: bool },
    Year,
    Bit { bits: u32 },
    Float,
    Double,
    Decimal { precision: u32, scale: u32 },
    Char,
    VarChar,
    TinyText,
    Text,
    MediumText,
    LongText,
    Enum { members: Vec<String> },
    Set { members: Vec<String> },
    Date,
    DateTime,
    Timestamp,
    Time,
    Binary,
    VarBinary,
    TinyBlob,
    Blob,
    MediumBlob,
    LongBlob,
    Json,
    /// GEOMETRY, POINT, LINESTRING, POLYGON, … — carried through as a blob.
    Spatial { family: String },
}

impl SourceType {
    /// Parse a raw `COLUMN_TYPE` string (`int(11) unsigned`, `decimal(10,2)`,
    /// `enum('a','b')`, …). Returns `None` for type families the engine does
    /// not know — the introspector turns that into a schema error naming the
    /// table and column.
    pub fn parse(declared: &str) -> Option<Self> {
        let lowered = declared.trim().to_lowercase();
        let (base, args) = split_base(&lowered);
        let unsigned = lowered.contains(" unsigned");

        let ty = match base {
            "tinyint" => Self::TinyInt { unsigned },
            "smallint" => Self::SmallInt { unsigned },
            "mediumint" => Self::MediumInt { unsigned },
            "int" | "integer" => Self::Int { unsigned },
            "bigint" => Self::BigInt { unsigned },
            "year" => Self::Year,
            "bit" => Self::Bit {
                bits: first_arg(args).unwrap_or(1),
            },
            "float" => Self::Float,
            "double" | "real" => Self::Double,
            "decimal" | "numeric" | "fixed" | "dec" => {
                let (precision, scale) = numeric_args(args);
                Self::Decimal { precision, scale }
            }
            "char" | "nchar" => Self::Char,
            "varchar" | "nvarchar" => Self::VarChar,
            "tinytext" => Self::TinyText,
            "text" => Self::Text,
            "mediumtext" => Self::MediumText,
            "longtext" => Self::LongText,
            "enum" => Self::Enum {
                members: member_list(args),
            },
            "set" => Self::Set {
                members: member_list(args),
            },
            "date" => Self::Date,
            "datetime" => Self::DateTime,
            "timestamp" => Self::Timestamp,
            "time" => Self::Time,
            "binary" => Self::Binary,
            "varbinary" => Self::VarBinary,
            "tinyblob" => Self::TinyBlob,
            "blob" => Self::Blob,
            "mediumblob" => Self::MediumBlob,
            "longblob" => Self::LongBlob,
            "json" => Self::Json,
            "geometry" | "point" | "linestring" | "polygon" | "multipoint"
            | "multilinestring" | "multipolygon" | "geometrycollection" | "geomcollection" => {
                Self::Spatial {
                    family: base.to_string(),
                }
            }
            _ => return None,
        };
        Some(ty)
    }

    /// Integer family (all widths plus YEAR) — candidates for the
    /// `INTEGER PRIMARY KEY AUTOINCREMENT` collapse.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::TinyInt { .. }
                | Self::SmallInt { .. }
                | Self::MediumInt { .. }
                | Self::Int { .. }
                | Self::BigInt { .. }
                | Self::Year
        )
    }

    pub fn is_spatial(&self) -> bool {
        matches!(self, Self::Spatial { .. })
    }
}

// ─── Parse helpers ────────────────────────────────────────────────────────────

/// Split `decimal(10,2) unsigned` into `("decimal", Some("10,2"))`.
fn split_base(lowered: &str) -> (&str, Option<&str>) {
    match lowered.find('(') {
        Some(open) => {
            let base = lowered[..open].trim();
            let close = lowered.rfind(')').unwrap_or(lowered.len());
            (base, Some(&lowered[open + 1..close]))
        }
        None => (
            lowered.split_whitespace().next().unwrap_or(lowered),
            None,
        ),
    }
}

fn first_arg(args: Option<&str>) -> Option<u32> {
    args?.split(',').next()?.trim().parse().ok()
}

/// `(p,s)` of a DECIMAL; MySQL defaults to `(10,0)` when unspecified.
fn numeric_args(args: Option<&str>) -> (u32, u32) {
    let Some(args) = args else { return (10, 0) };
    let mut parts = args.split(',');
    let precision = parts
        .next()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(10);
    let scale = parts.next().and_then(|s| s.trim().parse().ok()).unwrap_or(0);
    (precision, scale)
}

/// Members of `enum('a','b','it''s')` with the SQL quote doubling undone.
fn member_list(args: Option<&str>) -> Vec<String> {
    let Some(args) = args else { return Vec::new() };
    let mut members = Vec::new();
    let mut current = String::new();
    let mut chars = args.chars().peekable();
    let mut in_quotes = false;
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    current.push('\'');
                } else {
                    in_quotes = false;
                    members.push(std::mem::take(&mut current));
                }
            } else {
                current.push(c);
            }
        } else if c == '\'' {
            in_quotes = true;
        }
    }
    members
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_families() {
        assert_eq!(
            SourceType::parse("int(11)"),
            Some(SourceType::Int { unsigned: false })
        );
        assert_eq!(
            SourceType::parse("int(10) unsigned"),
            Some(SourceType::Int { unsigned: true })
        );
        assert_eq!(
            SourceType::parse("INT UNSIGNED"),
            Some(SourceType::Int { unsigned: true })
        );
        assert_eq!(
            SourceType::parse("bigint(20) unsigned zerofill"),
            Some(SourceType::BigInt { unsigned: true })
        );
        assert_eq!(
            SourceType::parse("tinyint(1)"),
            Some(SourceType::TinyInt { unsigned: false })
        );
        assert_eq!(SourceType::parse("year(4)"), Some(SourceType::Year));
    }

    #[test]
    fn test_parse_decimal_and_aliases() {
        assert_eq!(
            SourceType::parse("decimal(10,2)"),
            Some(SourceType::Decimal {
                precision: 10,
                scale: 2
            })
        );
        assert_eq!(
            SourceType::parse("numeric(5,0)"),
            Some(SourceType::Decimal {
                precision: 5,
                scale: 0
            })
        );
        assert_eq!(
            SourceType::parse("fixed"),
            Some(SourceType::Decimal {
                precision: 10,
                scale: 0
            })
        );
    }

    #[test]
    fn test_parse_bit_sizes() {
        assert_eq!(SourceType::parse("bit(4)"), Some(SourceType::Bit { bits: 4 }));
        assert_eq!(SourceType::parse("bit(64)"), Some(SourceType::Bit { bits: 64 }));
        assert_eq!(SourceType::parse("bit"), Some(SourceType::Bit { bits: 1 }));
    }

    #[test]
    fn test_parse_enum_members() {
        assert_eq!(
            SourceType::parse("enum('a','b')"),
            Some(SourceType::Enum {
                members: vec!["a".into(), "b".into()]
            })
        );
        // SQL quote doubling inside a member
        assert_eq!(
            SourceType::parse("enum('it''s','plain')"),
            Some(SourceType::Enum {
                members: vec!["it's".into(), "plain".into()]
            })
        );
        assert_eq!(
            SourceType::parse("set('x','y','z')"),
            Some(SourceType::Set {
                members: vec!["x".into(), "y".into(), "z".into()]
            })
        );
    }

    #[test]
    fn test_parse_text_and_blob_families() {
        assert_eq!(SourceType::parse("varchar(32)"), Some(SourceType::VarChar));
        assert_eq!(SourceType::parse("char(5)"), Some(SourceType::Char));
        assert_eq!(SourceType::parse("longtext"), Some(SourceType::LongText));
        assert_eq!(SourceType::parse("varbinary(16)"), Some(SourceType::VarBinary));
        assert_eq!(SourceType::parse("mediumblob"), Some(SourceType::MediumBlob));
    }

    #[test]
    fn test_parse_temporal() {
        assert_eq!(SourceType::parse("datetime(6)"), Some(SourceType::DateTime));
        assert_eq!(SourceType::parse("timestamp"), Some(SourceType::Timestamp));
        assert_eq!(SourceType::parse("time(3)"), Some(SourceType::Time));
        assert_eq!(SourceType::parse("date"), Some(SourceType::Date));
    }

    #[test]
    fn test_parse_spatial() {
        assert_eq!(
            SourceType::parse("point"),
            Some(SourceType::Spatial {
                family: "point".into()
            })
        );
        assert!(SourceType::parse("multipolygon").unwrap().is_spatial());
    }

    #[test]
    fn test_parse_unknown_is_none() {
        assert_eq!(SourceType::parse("frobnicator(3)"), None);
        assert_eq!(SourceType::parse(""), None);
    }

    #[test]
    fn test_is_integer() {
        assert!(SourceType::parse("int").unwrap().is_integer());
        assert!(SourceType::parse("year").unwrap().is_integer());
        assert!(!SourceType::parse("decimal(4,2)").unwrap().is_integer());
        assert!(!SourceType::parse("varchar(4)").unwrap().is_integer());
    }
}
