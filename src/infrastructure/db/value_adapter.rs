use sqlx::mysql::MySqlRow;
use sqlx::types::chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::types::BigDecimal;
use sqlx::Row;

use crate::domain::descriptors::{ColumnDescriptor, TableDescriptor};
use crate::domain::error::TransferError;
use crate::domain::source_type::SourceType;
use crate::domain::value::{format_date, format_datetime, format_time, SqliteValue};

// ─────────────────────────────────────────────────────────────────────────────
// MySQL row → SQLite bind values
// ─────────────────────────────────────────────────────────────────────────────
//
// Decoding is driven by the introspected SourceType, never by guessing from
// the wire type — the SELECT lists columns in descriptor order, so position i
// always carries column i. The adapter never rejects on content; it only
// fails when a value cannot exist in any SQLite storage class (an unsigned
// BIGINT past i64::MAX is the one real case).

pub fn decode_row(
    row: &MySqlRow,
    table: &TableDescriptor,
    ordinal: u64,
) -> Result<Vec<SqliteValue>, TransferError> {
    let mut values = Vec::with_capacity(table.columns.len());
    for (idx, col) in table.columns.iter().enumerate() {
        values.push(decode_column(row, idx, table, col, ordinal)?);
    }
    Ok(values)
}

fn decode_column(
    row: &MySqlRow,
    idx: usize,
    table: &TableDescriptor,
    col: &ColumnDescriptor,
    ordinal: u64,
) -> Result<SqliteValue, TransferError> {
    let fail = |message: String| {
        TransferError::data_conversion(&table.name, &col.name, ordinal, message)
    };

    let value = match &col.source_type {
        SourceType::TinyInt { unsigned }
        | SourceType::SmallInt { unsigned }
        | SourceType::MediumInt { unsigned }
        | SourceType::Int { unsigned }
        | SourceType::BigInt { unsigned } => {
            if *unsigned {
                match row.try_get::<Option<u64>, _>(idx).map_err(|e| fail(e.to_string()))? {
                    None => SqliteValue::Null,
                    Some(v) => SqliteValue::Integer(i64::try_from(v).map_err(|_| {
                        fail(format!("unsigned value {v} exceeds the SQLite INTEGER range"))
                    })?),
                }
            } else {
                opt(row.try_get::<Option<i64>, _>(idx), fail)?
                    .map_or(SqliteValue::Null, SqliteValue::Integer)
            }
        }

        SourceType::Year => opt(row.try_get::<Option<u16>, _>(idx), fail)?
            .map_or(SqliteValue::Null, |v| SqliteValue::Integer(v as i64)),

        SourceType::Bit { bits } => opt(row.try_get::<Option<u64>, _>(idx), fail)?
            .map_or(SqliteValue::Null, |v| bit_to_value(v, *bits)),

        SourceType::Float => opt(row.try_get::<Option<f32>, _>(idx), fail)?
            .map_or(SqliteValue::Null, |v| SqliteValue::Real(v as f64)),

        SourceType::Double => opt(row.try_get::<Option<f64>, _>(idx), fail)?
            .map_or(SqliteValue::Null, SqliteValue::Real),

        // Exact digits, not a float — DECIMAL goes to TEXT affinity.
        SourceType::Decimal { .. } => opt(row.try_get::<Option<BigDecimal>, _>(idx), fail)?
            .map_or(SqliteValue::Null, |d| SqliteValue::Text(d.to_string())),

        SourceType::Char
        | SourceType::VarChar
        | SourceType::TinyText
        | SourceType::Text
        | SourceType::MediumText
        | SourceType::LongText
        | SourceType::Enum { .. }
        | SourceType::Set { .. } => opt(row.try_get::<Option<String>, _>(idx), fail)?
            .map_or(SqliteValue::Null, SqliteValue::Text),

        SourceType::Date => opt(row.try_get::<Option<NaiveDate>, _>(idx), fail)?
            .map_or(SqliteValue::Null, |d| SqliteValue::Text(format_date(&d))),

        SourceType::DateTime | SourceType::Timestamp => {
            opt(row.try_get::<Option<NaiveDateTime>, _>(idx), fail)?
                .map_or(SqliteValue::Null, |dt| {
                    SqliteValue::Text(format_datetime(&dt))
                })
        }

        SourceType::Time => opt(row.try_get::<Option<NaiveTime>, _>(idx), fail)?
            .map_or(SqliteValue::Null, |t| SqliteValue::Text(format_time(&t))),

        SourceType::Binary
        | SourceType::VarBinary
        | SourceType::TinyBlob
        | SourceType::Blob
        | SourceType::MediumBlob
        | SourceType::LongBlob
        | SourceType::Spatial { .. } => opt(row.try_get::<Option<Vec<u8>>, _>(idx), fail)?
            .map_or(SqliteValue::Null, SqliteValue::Blob),

        // Re-serialised compactly; SQLite's JSON functions want minified text.
        SourceType::Json => opt(row.try_get::<Option<serde_json::Value>, _>(idx), fail)?
            .map_or(SqliteValue::Null, |v| SqliteValue::Text(v.to_string())),
    };
    Ok(value)
}

fn opt<T>(
    result: Result<Option<T>, sqlx::Error>,
    fail: impl Fn(String) -> TransferError,
) -> Result<Option<T>, TransferError> {
    result.map_err(|e| fail(e.to_string()))
}

/// A bit string of up to 8 bits fits the integer storage class; anything
/// wider keeps its raw bytes, big-endian, at the declared width.
fn bit_to_value(value: u64, bits: u32) -> SqliteValue {
    if bits <= 8 {
        SqliteValue::Integer(value as i64)
    } else {
        let width = bits.div_ceil(8) as usize;
        let bytes = value.to_be_bytes();
        SqliteValue::Blob(bytes[8 - width..].to_vec())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
