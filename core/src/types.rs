//! Choice of native storage for outgoing values.

use crate::ffi::constants::*;
use crate::ffi::SQLSMALLINT;
use crate::options::CharEncoding;
use crate::value::Value;

/// Native C storage a parameter value is marshaled into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageType {
    Null,
    Bit,
    /// Signed 32-bit.
    Long,
    /// Unsigned 32-bit, for values in `(i32::MAX, u32::MAX]`.
    ULong,
    /// Signed 64-bit, for values below `i32::MIN`.
    SBigInt,
    /// Unsigned 64-bit, for values above `u32::MAX`.
    UBigInt,
    Double,
    Time,
    Date,
    Timestamp,
    /// Single-byte text, UTF-8 or Latin-1 per the encoding policy.
    Char,
    /// UTF-16 text.
    WChar,
    Binary,
}

impl StorageType {
    /// Picks the storage for `value`. Text follows `encoding`; everything else depends on
    /// the value alone.
    pub fn of(value: &Value, encoding: CharEncoding) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bit,
            Value::Integer(i) => match *i {
                i if i > u32::MAX as i64 => Self::UBigInt,
                i if i > i32::MAX as i64 => Self::ULong,
                i if i < i32::MIN as i64 => Self::SBigInt,
                _ => Self::Long,
            },
            Value::Float(_) => Self::Double,
            Value::Time(_) => Self::Time,
            Value::Date(_) => Self::Date,
            Value::DateTime(_) => Self::Timestamp,
            Value::Text(_) => match encoding {
                CharEncoding::Utf16 => Self::WChar,
                CharEncoding::Utf8 | CharEncoding::Latin1 => Self::Char,
            },
            Value::Binary(_) => Self::Binary,
        }
    }

    /// The `SQL_C_*` value type passed to `SQLBindParameter`.
    pub fn c_type(self) -> SQLSMALLINT {
        match self {
            Self::Null => SQL_C_DEFAULT,
            Self::Bit => SQL_C_BIT,
            Self::Long => SQL_C_LONG,
            Self::ULong => SQL_C_ULONG,
            Self::SBigInt => SQL_C_SBIGINT,
            Self::UBigInt => SQL_C_UBIGINT,
            Self::Double => SQL_C_DOUBLE,
            Self::Time => SQL_C_TYPE_TIME,
            Self::Date => SQL_C_TYPE_DATE,
            Self::Timestamp => SQL_C_TYPE_TIMESTAMP,
            Self::Char => SQL_C_CHAR,
            Self::WChar => SQL_C_WCHAR,
            Self::Binary => SQL_C_BINARY,
        }
    }

    /// The target `SQL_*` parameter type implied by the storage.
    pub fn sql_type(self) -> SQLSMALLINT {
        match self {
            // Any type works for a null indicator; VARCHAR is accepted by every driver.
            Self::Null => SQL_VARCHAR,
            Self::Bit => SQL_BIT,
            Self::Long | Self::ULong => SQL_INTEGER,
            Self::SBigInt | Self::UBigInt => SQL_BIGINT,
            Self::Double => SQL_DOUBLE,
            Self::Time => SQL_TYPE_TIME,
            Self::Date => SQL_TYPE_DATE,
            Self::Timestamp => SQL_TYPE_TIMESTAMP,
            Self::Char => SQL_VARCHAR,
            Self::WChar => SQL_WVARCHAR,
            Self::Binary => SQL_VARBINARY,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;

    fn storage(value: impl Into<Value>) -> StorageType {
        StorageType::of(&value.into(), CharEncoding::Utf16)
    }

    #[test]
    fn test_integer_boundaries() {
        assert_eq!(storage(0), StorageType::Long);
        assert_eq!(storage(2147483647i64), StorageType::Long);
        assert_eq!(storage(-2147483648i64), StorageType::Long);
        assert_eq!(storage(2147483648i64), StorageType::ULong);
        assert_eq!(storage(4294967295i64), StorageType::ULong);
        assert_eq!(storage(4294967296i64), StorageType::UBigInt);
        assert_eq!(storage(i64::MAX), StorageType::UBigInt);
        assert_eq!(storage(-2147483649i64), StorageType::SBigInt);
        assert_eq!(storage(i64::MIN), StorageType::SBigInt);
    }

    #[test]
    fn test_sql_types() {
        assert_eq!(StorageType::Long.sql_type(), SQL_INTEGER);
        assert_eq!(StorageType::ULong.sql_type(), SQL_INTEGER);
        assert_eq!(StorageType::UBigInt.sql_type(), SQL_BIGINT);
        assert_eq!(StorageType::WChar.sql_type(), SQL_WVARCHAR);
        assert_eq!(StorageType::Char.sql_type(), SQL_VARCHAR);
        assert_eq!(StorageType::Binary.sql_type(), SQL_VARBINARY);
        assert_eq!(StorageType::Null.c_type(), SQL_C_DEFAULT);
    }

    #[test]
    fn test_temporal_and_text() {
        let date = NaiveDate::from_ymd_opt(2017, 10, 1).unwrap();
        let time = NaiveTime::from_hms_opt(17, 32, 19).unwrap();
        assert_eq!(storage(date), StorageType::Date);
        assert_eq!(storage(time), StorageType::Time);
        assert_eq!(storage(date.and_time(time)), StorageType::Timestamp);

        let text = Value::from("Brian");
        assert_eq!(StorageType::of(&text, CharEncoding::Utf16), StorageType::WChar);
        assert_eq!(StorageType::of(&text, CharEncoding::Utf8), StorageType::Char);
        assert_eq!(StorageType::of(&text, CharEncoding::Latin1), StorageType::Char);
    }

    #[test]
    fn test_other_shapes() {
        assert_eq!(storage(Value::Null), StorageType::Null);
        assert_eq!(storage(true), StorageType::Bit);
        assert_eq!(storage(1.5), StorageType::Double);
        assert_eq!(storage(vec![0u8, 1]), StorageType::Binary);
    }
}
