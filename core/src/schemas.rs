//! Arrow schemas of catalog result sets and conversion of fetched rows to record batches.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BinaryBuilder, BooleanBuilder, Date32Builder, Float64Builder, Int64Builder,
    StringBuilder, Time64NanosecondBuilder, TimestampNanosecondBuilder,
};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{NaiveDate, Timelike};
use once_cell::sync::Lazy;

use crate::columns::{ColumnInfo, FetchType};
use crate::error::{Error, Result};
use crate::value::Value;

/// Columns of the result set of a [crate::catalog::CatalogKind::Tables] request.
pub static TABLES_SCHEMA: Lazy<SchemaRef> = Lazy::new(|| {
    Arc::new(Schema::new(vec![
        Field::new("TABLE_CAT", DataType::Utf8, true),
        Field::new("TABLE_SCHEM", DataType::Utf8, true),
        Field::new("TABLE_NAME", DataType::Utf8, true),
        Field::new("TABLE_TYPE", DataType::Utf8, true),
        Field::new("REMARKS", DataType::Utf8, true),
    ]))
});

/// Columns of the result set of a [crate::catalog::CatalogKind::Columns] request.
pub static COLUMNS_SCHEMA: Lazy<SchemaRef> = Lazy::new(|| {
    Arc::new(Schema::new(vec![
        Field::new("TABLE_CAT", DataType::Utf8, true),
        Field::new("TABLE_SCHEM", DataType::Utf8, true),
        Field::new("TABLE_NAME", DataType::Utf8, false),
        Field::new("COLUMN_NAME", DataType::Utf8, false),
        Field::new("DATA_TYPE", DataType::Int16, false),
        Field::new("TYPE_NAME", DataType::Utf8, false),
        Field::new("COLUMN_SIZE", DataType::Int32, true),
        Field::new("BUFFER_LENGTH", DataType::Int32, true),
        Field::new("DECIMAL_DIGITS", DataType::Int16, true),
        Field::new("NUM_PREC_RADIX", DataType::Int16, true),
        Field::new("NULLABLE", DataType::Int16, false),
        Field::new("REMARKS", DataType::Utf8, true),
        Field::new("COLUMN_DEF", DataType::Utf8, true),
        Field::new("SQL_DATA_TYPE", DataType::Int16, false),
        Field::new("SQL_DATETIME_SUB", DataType::Int16, true),
        Field::new("CHAR_OCTET_LENGTH", DataType::Int32, true),
        Field::new("ORDINAL_POSITION", DataType::Int32, false),
        Field::new("IS_NULLABLE", DataType::Utf8, true),
    ]))
});

/// Columns of the result set of a [crate::catalog::CatalogKind::Types] request.
pub static TYPE_INFO_SCHEMA: Lazy<SchemaRef> = Lazy::new(|| {
    Arc::new(Schema::new(vec![
        Field::new("TYPE_NAME", DataType::Utf8, false),
        Field::new("DATA_TYPE", DataType::Int16, false),
        Field::new("COLUMN_SIZE", DataType::Int32, true),
        Field::new("LITERAL_PREFIX", DataType::Utf8, true),
        Field::new("LITERAL_SUFFIX", DataType::Utf8, true),
        Field::new("CREATE_PARAMS", DataType::Utf8, true),
        Field::new("NULLABLE", DataType::Int16, false),
        Field::new("CASE_SENSITIVE", DataType::Int16, false),
        Field::new("SEARCHABLE", DataType::Int16, false),
        Field::new("UNSIGNED_ATTRIBUTE", DataType::Int16, true),
        Field::new("FIXED_PREC_SCALE", DataType::Int16, false),
        Field::new("AUTO_UNIQUE_VALUE", DataType::Int16, true),
        Field::new("LOCAL_TYPE_NAME", DataType::Utf8, true),
        Field::new("MINIMUM_SCALE", DataType::Int16, true),
        Field::new("MAXIMUM_SCALE", DataType::Int16, true),
        Field::new("SQL_DATA_TYPE", DataType::Int16, false),
        Field::new("SQL_DATETIME_SUB", DataType::Int16, true),
        Field::new("NUM_PREC_RADIX", DataType::Int32, true),
        Field::new("INTERVAL_PRECISION", DataType::Int16, true),
    ]))
});

/// Arrow type holding values materialized with `fetch_type`.
pub fn data_type(fetch_type: FetchType) -> DataType {
    match fetch_type {
        FetchType::Bit => DataType::Boolean,
        FetchType::UTinyInt
        | FetchType::SLong
        | FetchType::ULong
        | FetchType::SBigInt
        | FetchType::UBigInt => DataType::Int64,
        FetchType::Double => DataType::Float64,
        FetchType::Date => DataType::Date32,
        FetchType::Time => DataType::Time64(TimeUnit::Nanosecond),
        FetchType::Timestamp => DataType::Timestamp(TimeUnit::Nanosecond, None),
        FetchType::Binary => DataType::Binary,
        FetchType::Narrow(_) | FetchType::Wide => DataType::Utf8,
    }
}

/// Schema of a described result set. Every field is nullable since drivers may report
/// nullability as unknown.
pub fn result_schema(columns: &[ColumnInfo]) -> SchemaRef {
    let fields: Vec<Field> = columns
        .iter()
        .map(|c| Field::new(&c.description.title, data_type(c.plan.fetch_type), true))
        .collect();
    Arc::new(Schema::new(fields))
}

/// Builds a record batch from fetched rows, one value per field in each row.
pub fn rows_to_batch(schema: SchemaRef, rows: &[Vec<Value>]) -> Result<RecordBatch> {
    let columns = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(index, field)| column_array(field, index, rows))
        .collect::<Result<Vec<_>>>()?;
    Ok(RecordBatch::try_new(schema, columns)?)
}

fn mismatch(field: &Field, value: &Value) -> Error {
    Error::internal(format!(
        "Cannot store {} value in {} column {:?}",
        value.kind(),
        field.data_type(),
        field.name()
    ))
}

macro_rules! build_array {
    ($builder:expr, $field:expr, $index:expr, $rows:expr, $pattern:pat => $append:expr) => {{
        let mut builder = $builder;
        for row in $rows {
            let value = row
                .get($index)
                .ok_or_else(|| Error::internal("Row is shorter than the schema"))?;
            match value {
                Value::Null => builder.append_null(),
                $pattern => builder.append_value($append),
                other => return Err(mismatch($field, other)),
            }
        }
        Arc::new(builder.finish()) as ArrayRef
    }};
}

fn column_array(field: &Field, index: usize, rows: &[Vec<Value>]) -> Result<ArrayRef> {
    let array = match field.data_type() {
        DataType::Boolean => {
            build_array!(BooleanBuilder::new(), field, index, rows, Value::Bool(b) => *b)
        }
        DataType::Int64 => {
            build_array!(Int64Builder::new(), field, index, rows, Value::Integer(i) => *i)
        }
        DataType::Float64 => {
            build_array!(Float64Builder::new(), field, index, rows, Value::Float(f) => *f)
        }
        DataType::Date32 => build_array!(
            Date32Builder::new(), field, index, rows, Value::Date(d) => days_since_epoch(d)
        ),
        DataType::Time64(TimeUnit::Nanosecond) => build_array!(
            Time64NanosecondBuilder::new(), field, index, rows,
            Value::Time(t) => t.num_seconds_from_midnight() as i64 * 1_000_000_000
                + t.nanosecond() as i64
        ),
        DataType::Timestamp(TimeUnit::Nanosecond, None) => build_array!(
            TimestampNanosecondBuilder::new(), field, index, rows,
            Value::DateTime(dt) => dt.and_utc().timestamp_nanos_opt().ok_or_else(|| {
                Error::with_message_and_status(
                    format!("Timestamp {} is out of range", dt),
                    crate::error::Status::Overflow,
                )
            })?
        ),
        DataType::Binary => build_array!(
            BinaryBuilder::new(), field, index, rows, Value::Binary(b) => b.as_slice()
        ),
        DataType::Utf8 => build_array!(
            StringBuilder::new(), field, index, rows, Value::Text(s) => s.as_str()
        ),
        other => {
            return Err(Error::unsupported(format!(
                "No conversion to Arrow {} for column {:?}",
                other,
                field.name()
            )))
        }
    };
    Ok(array)
}

fn days_since_epoch(date: &NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    (*date - epoch).num_days() as i32
}
