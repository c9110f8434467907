use std::mem::size_of;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use odbc_core::ffi::constants::*;
use odbc_core::ffi::{SQLSMALLINT, SQLULEN, DATE_STRUCT, TIMESTAMP_STRUCT, TIME_STRUCT};
use odbc_core::Value;

/// A value as the driver stores it.
///
/// Text keeps the representation it arrived in, so that narrow bytes are handed back
/// exactly as they were bound.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Null,
    Bit(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Narrow(Vec<u8>),
    Wide(Vec<u16>),
    Bytes(Vec<u8>),
}

impl Datum {
    pub fn text(text: &str) -> Self {
        Self::Wide(text.encode_utf16().collect())
    }

    /// Text this datum holds, decoding narrow bytes as UTF-8.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Narrow(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            Self::Wide(units) => Some(String::from_utf16_lossy(units)),
            _ => None,
        }
    }

    /// Column type a value of this kind is naturally reported as: SQL type, column size
    /// and whether it is unsigned.
    pub fn natural_type(&self) -> (SQLSMALLINT, SQLULEN, bool) {
        match self {
            Self::Null => (SQL_WVARCHAR, 1, false),
            Self::Bit(_) => (SQL_BIT, 1, false),
            Self::Int(_) => (SQL_BIGINT, 19, false),
            Self::UInt(_) => (SQL_BIGINT, 20, true),
            Self::Double(_) => (SQL_DOUBLE, 15, false),
            Self::Date(_) => (SQL_TYPE_DATE, 10, false),
            Self::Time(_) => (SQL_TYPE_TIME, 8, false),
            Self::Timestamp(_) => (SQL_TYPE_TIMESTAMP, 29, false),
            Self::Narrow(bytes) => (SQL_VARCHAR, bytes.len().max(1), false),
            Self::Wide(units) => (SQL_WVARCHAR, units.len().max(1), false),
            Self::Bytes(bytes) => (SQL_VARBINARY, bytes.len().max(1), false),
        }
    }
}

impl From<Value> for Datum {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bit(b),
            Value::Integer(i) => Self::Int(i),
            Value::Float(f) => Self::Double(f),
            Value::Time(t) => Self::Time(t),
            Value::Date(d) => Self::Date(d),
            Value::DateTime(dt) => Self::Timestamp(dt),
            Value::Text(s) => Self::text(&s),
            Value::Binary(b) => Self::Bytes(b),
        }
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<i64> for Datum {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// Data produced for a get-data request.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Payload {
    /// Fixed-size data, all of which is written. `reported` is the length announced to the
    /// caller, which only differs for multi-bit `BIT` values.
    Fixed { bytes: Vec<u8>, reported: usize },
    /// Variable-length data read in pieces, followed by a terminator of `terminator` bytes.
    Variable { bytes: Vec<u8>, terminator: usize },
}

fn fixed<T: Copy>(value: T) -> Payload {
    let bytes = unsafe {
        std::slice::from_raw_parts(&value as *const T as *const u8, size_of::<T>()).to_vec()
    };
    Payload::Fixed {
        reported: bytes.len(),
        bytes,
    }
}

fn to_string(datum: &Datum) -> Option<String> {
    match datum {
        Datum::Bit(b) => Some(u8::from(*b).to_string()),
        Datum::Int(i) => Some(i.to_string()),
        Datum::UInt(u) => Some(u.to_string()),
        Datum::Double(f) => Some(f.to_string()),
        Datum::Date(d) => Some(d.to_string()),
        Datum::Time(t) => Some(t.to_string()),
        Datum::Timestamp(ts) => Some(ts.to_string()),
        Datum::Narrow(_) | Datum::Wide(_) => datum.as_text(),
        Datum::Null | Datum::Bytes(_) => None,
    }
}

fn integer(datum: &Datum) -> Option<i128> {
    match datum {
        Datum::Bit(b) => Some((*b).into()),
        Datum::Int(i) => Some((*i).into()),
        Datum::UInt(u) => Some((*u).into()),
        _ => None,
    }
}

/// Converts `datum` to C type `c_type`, or `None` when the conversion is not supported.
pub(crate) fn payload(datum: &Datum, c_type: SQLSMALLINT) -> Option<Payload> {
    let payload = match c_type {
        SQL_C_BIT => match datum {
            // Multi-bit values announce their width but only the first byte is written.
            Datum::Bytes(bytes) if !bytes.is_empty() => Payload::Fixed {
                bytes: bytes[..1].to_vec(),
                reported: bytes.len(),
            },
            other => fixed(u8::from(integer(other)? != 0)),
        },
        SQL_C_UTINYINT => fixed(integer(datum)? as u8),
        SQL_C_LONG | SQL_C_SLONG => fixed(integer(datum)? as i32),
        SQL_C_ULONG => fixed(integer(datum)? as u32),
        SQL_C_SBIGINT => fixed(integer(datum)? as i64),
        SQL_C_UBIGINT => fixed(integer(datum)? as u64),
        SQL_C_DOUBLE => match datum {
            Datum::Double(f) => fixed(*f),
            other => fixed(integer(other)? as f64),
        },
        SQL_C_TYPE_DATE => match datum {
            Datum::Date(d) => fixed(DATE_STRUCT {
                year: d.year() as i16,
                month: d.month() as u16,
                day: d.day() as u16,
            }),
            _ => return None,
        },
        SQL_C_TYPE_TIME => match datum {
            Datum::Time(t) => fixed(TIME_STRUCT {
                hour: t.hour() as u16,
                minute: t.minute() as u16,
                second: t.second() as u16,
            }),
            _ => return None,
        },
        SQL_C_TYPE_TIMESTAMP => match datum {
            Datum::Timestamp(ts) => fixed(TIMESTAMP_STRUCT {
                year: ts.year() as i16,
                month: ts.month() as u16,
                day: ts.day() as u16,
                hour: ts.hour() as u16,
                minute: ts.minute() as u16,
                second: ts.second() as u16,
                fraction: ts.nanosecond(),
            }),
            _ => return None,
        },
        SQL_C_BINARY => match datum {
            Datum::Bytes(bytes) | Datum::Narrow(bytes) => Payload::Variable {
                bytes: bytes.clone(),
                terminator: 0,
            },
            Datum::Wide(units) => Payload::Variable {
                bytes: units.iter().flat_map(|u| u.to_ne_bytes()).collect(),
                terminator: 0,
            },
            _ => return None,
        },
        SQL_C_CHAR => match datum {
            Datum::Narrow(bytes) => Payload::Variable {
                bytes: bytes.clone(),
                terminator: 1,
            },
            other => Payload::Variable {
                bytes: to_string(other)?.into_bytes(),
                terminator: 1,
            },
        },
        SQL_C_WCHAR => {
            let units: Vec<u16> = match datum {
                Datum::Wide(units) => units.clone(),
                other => to_string(other)?.encode_utf16().collect(),
            };
            Payload::Variable {
                bytes: units.iter().flat_map(|u| u.to_ne_bytes()).collect(),
                terminator: 2,
            }
        }
        _ => return None,
    };
    Some(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_payload() {
        let payload = payload(&Datum::text("ab"), SQL_C_WCHAR).unwrap();
        let expected: Vec<u8> = [97u16, 98].iter().flat_map(|u| u.to_ne_bytes()).collect();
        assert_eq!(
            payload,
            Payload::Variable {
                bytes: expected,
                terminator: 2
            }
        );
    }

    #[test]
    fn test_multi_bit_payload() {
        let payload = payload(&Datum::Bytes(vec![1, 0, 1]), SQL_C_BIT).unwrap();
        assert_eq!(
            payload,
            Payload::Fixed {
                bytes: vec![1],
                reported: 3
            }
        );
    }

    #[test]
    fn test_unsupported_conversion() {
        assert!(payload(&Datum::text("x"), SQL_C_TYPE_DATE).is_none());
    }
}
