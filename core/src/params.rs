//! Parameter buffers bound for a single execution.

use std::mem::size_of;
use std::os::raw::c_void;
use std::ptr::null_mut;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::diagnostics::{self, HandleKind};
use crate::error::{Error, Result, Status};
use crate::ffi::constants::{SQL_NULL_DATA, SQL_PARAM_INPUT, SQL_RESET_PARAMS, SQLWCHAR_SIZE};
use crate::ffi::{
    FunctionTable, Handle, DATE_STRUCT, SQLLEN, SQLPOINTER, SQLULEN, SQLUSMALLINT, SQLWCHAR,
    TIMESTAMP_STRUCT, TIME_STRUCT,
};
use crate::odbc_method;
use crate::options::CharEncoding;
use crate::types::StorageType;
use crate::value::Value;

/// Encoded content of a parameter, one variant per [StorageType].
#[derive(Debug, Clone, PartialEq)]
enum ParameterData {
    Null,
    Bit(u8),
    Long(i32),
    ULong(u32),
    SBigInt(i64),
    UBigInt(u64),
    Double(f64),
    Time(TIME_STRUCT),
    Date(DATE_STRUCT),
    Timestamp(TIMESTAMP_STRUCT),
    Char(Vec<u8>),
    WChar(Vec<SQLWCHAR>),
    Binary(Vec<u8>),
}

/// One placeholder's buffer and length/indicator.
///
/// The native statement keeps pointers into this struct between binding and execution,
/// so it is always boxed and never moved while bound.
#[derive(Debug)]
pub struct Parameter {
    storage: StorageType,
    column_size: SQLULEN,
    data: ParameterData,
    length: SQLLEN,
}

impl Parameter {
    /// Encodes `value` into a freshly allocated buffer.
    pub fn new(value: &Value, encoding: CharEncoding) -> Result<Self> {
        let storage = StorageType::of(value, encoding);
        let data = match (storage, value) {
            (StorageType::Null, _) => ParameterData::Null,
            (StorageType::Bit, Value::Bool(b)) => ParameterData::Bit(u8::from(*b)),
            (StorageType::Long, Value::Integer(i)) => ParameterData::Long(narrow(*i)?),
            (StorageType::ULong, Value::Integer(i)) => ParameterData::ULong(narrow(*i)?),
            (StorageType::SBigInt, Value::Integer(i)) => ParameterData::SBigInt(*i),
            (StorageType::UBigInt, Value::Integer(i)) => ParameterData::UBigInt(narrow(*i)?),
            (StorageType::Double, Value::Float(f)) => ParameterData::Double(*f),
            (StorageType::Time, Value::Time(t)) => ParameterData::Time(time_struct(t)),
            (StorageType::Date, Value::Date(d)) => ParameterData::Date(date_struct(d)?),
            (StorageType::Timestamp, Value::DateTime(dt)) => {
                ParameterData::Timestamp(timestamp_struct(dt)?)
            }
            (StorageType::Char, Value::Text(s)) => ParameterData::Char(encode_narrow(s, encoding)?),
            (StorageType::WChar, Value::Text(s)) => ParameterData::WChar(s.encode_utf16().collect()),
            (StorageType::Binary, Value::Binary(b)) => ParameterData::Binary(b.clone()),
            (storage, value) => {
                return Err(Error::invalid_argument(format!(
                    "Non-SQL-mappable {} value for {:?} storage",
                    value.kind(),
                    storage
                )))
            }
        };

        let (length, column_size) = match &data {
            ParameterData::Null => (SQL_NULL_DATA, 0),
            ParameterData::Char(bytes) | ParameterData::Binary(bytes) => {
                (bytes.len() as SQLLEN, bytes.len().max(1))
            }
            ParameterData::WChar(units) => {
                ((units.len() * SQLWCHAR_SIZE) as SQLLEN, units.len().max(1))
            }
            _ => (0, 0),
        };

        Ok(Self {
            storage,
            column_size,
            data,
            length,
        })
    }

    pub fn storage(&self) -> StorageType {
        self.storage
    }

    pub fn column_size(&self) -> SQLULEN {
        self.column_size
    }

    /// Length/indicator handed to the driver: byte length, or `SQL_NULL_DATA`.
    pub fn length(&self) -> SQLLEN {
        self.length
    }

    /// Size in bytes of the encoded value.
    pub fn buffer_size(&self) -> usize {
        match &self.data {
            ParameterData::Null => 0,
            ParameterData::Bit(_) => size_of::<u8>(),
            ParameterData::Long(_) => size_of::<i32>(),
            ParameterData::ULong(_) => size_of::<u32>(),
            ParameterData::SBigInt(_) => size_of::<i64>(),
            ParameterData::UBigInt(_) => size_of::<u64>(),
            ParameterData::Double(_) => size_of::<f64>(),
            ParameterData::Time(_) => size_of::<TIME_STRUCT>(),
            ParameterData::Date(_) => size_of::<DATE_STRUCT>(),
            ParameterData::Timestamp(_) => size_of::<TIMESTAMP_STRUCT>(),
            ParameterData::Char(bytes) | ParameterData::Binary(bytes) => bytes.len(),
            ParameterData::WChar(units) => units.len() * SQLWCHAR_SIZE,
        }
    }

    fn buffer_ptr(&mut self) -> SQLPOINTER {
        fn ptr<T>(value: &mut T) -> SQLPOINTER {
            value as *mut T as *mut c_void
        }
        match &mut self.data {
            ParameterData::Null => null_mut(),
            ParameterData::Bit(v) => ptr(v),
            ParameterData::Long(v) => ptr(v),
            ParameterData::ULong(v) => ptr(v),
            ParameterData::SBigInt(v) => ptr(v),
            ParameterData::UBigInt(v) => ptr(v),
            ParameterData::Double(v) => ptr(v),
            ParameterData::Time(v) => ptr(v),
            ParameterData::Date(v) => ptr(v),
            ParameterData::Timestamp(v) => ptr(v),
            ParameterData::Char(v) | ParameterData::Binary(v) => v.as_mut_ptr() as SQLPOINTER,
            ParameterData::WChar(v) => v.as_mut_ptr() as SQLPOINTER,
        }
    }
}

fn narrow<T: TryFrom<i64>>(value: i64) -> Result<T> {
    T::try_from(value).map_err(|_| {
        Error::internal(format!("Integer {} does not fit its chosen storage", value))
    })
}

fn date_struct(date: &NaiveDate) -> Result<DATE_STRUCT> {
    Ok(DATE_STRUCT {
        year: year(date)?,
        month: date.month() as u16,
        day: date.day() as u16,
    })
}

fn time_struct(time: &NaiveTime) -> TIME_STRUCT {
    // TIME_STRUCT has no fraction, sub-second precision is not transmitted.
    TIME_STRUCT {
        hour: time.hour() as u16,
        minute: time.minute() as u16,
        second: time.second() as u16,
    }
}

fn timestamp_struct(stamp: &NaiveDateTime) -> Result<TIMESTAMP_STRUCT> {
    Ok(TIMESTAMP_STRUCT {
        year: year(&stamp.date())?,
        month: stamp.month() as u16,
        day: stamp.day() as u16,
        hour: stamp.hour() as u16,
        minute: stamp.minute() as u16,
        second: stamp.second() as u16,
        // Leap seconds are folded into the last nanosecond of the second.
        fraction: stamp.nanosecond().min(999_999_999),
    })
}

fn year(date: &NaiveDate) -> Result<i16> {
    i16::try_from(date.year()).map_err(|_| {
        Error::invalid_argument(format!("Year {} cannot be represented by ODBC", date.year()))
    })
}

/// Encodes text for `SQL_C_CHAR` storage under a single-byte policy.
pub fn encode_narrow(text: &str, encoding: CharEncoding) -> Result<Vec<u8>> {
    match encoding {
        CharEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
        CharEncoding::Latin1 => text
            .chars()
            .map(|c| {
                u8::try_from(u32::from(c)).map_err(|_| {
                    Error::with_message_and_status(
                        format!("Codepoint U+{:04X} too high for Latin1", u32::from(c)),
                        Status::Overflow,
                    )
                })
            })
            .collect(),
        CharEncoding::Utf16 => Err(Error::internal(
            "UTF-16 text must be bound as wide characters",
        )),
    }
}

/// Parameters bound to a statement for one execution.
///
/// Dropping the set frees every buffer; it must outlive the execute call.
#[derive(Debug, Default)]
pub struct BoundParameters {
    params: Vec<Box<Parameter>>,
}

impl BoundParameters {
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter().map(|p| p.as_ref())
    }
}

/// Encodes `values` and binds them to positions `1..=values.len()` of `hstmt`.
///
/// On failure the bindings made so far are reset before the buffers are released.
pub fn bind_parameters(
    functions: &FunctionTable,
    hstmt: Handle,
    values: &[Value],
    encoding: CharEncoding,
) -> Result<BoundParameters> {
    let mut bound = BoundParameters {
        params: values
            .iter()
            .map(|v| Parameter::new(v, encoding).map(Box::new))
            .collect::<Result<_>>()?,
    };

    let method = odbc_method!(functions, SQLBindParameter);
    for (index, param) in bound.params.iter_mut().enumerate() {
        let number = SQLUSMALLINT::try_from(index + 1)
            .map_err(|_| Error::invalid_argument("Too many parameters"))?;
        let buffer_size = param.buffer_size() as SQLLEN;
        let buffer = param.buffer_ptr();

        tracing::trace!(
            number,
            storage = ?param.storage,
            column_size = param.column_size,
            buffer_size,
            "binding parameter"
        );

        let rc = unsafe {
            method(
                hstmt.as_raw(),
                number,
                SQL_PARAM_INPUT,
                param.storage.c_type(),
                param.storage.sql_type(),
                param.column_size,
                0,
                buffer,
                buffer_size,
                &mut param.length,
            )
        };
        if !crate::ffi::succeeded(rc) {
            let error = diagnostics::error_for(functions, HandleKind::Statement, Some(hstmt));
            reset_parameters(functions, hstmt);
            return Err(error);
        }
    }

    Ok(bound)
}

/// Unbinds every parameter of `hstmt`. Failures are ignored.
pub(crate) fn reset_parameters(functions: &FunctionTable, hstmt: Handle) {
    let method = odbc_method!(functions, SQLFreeStmt);
    unsafe { method(hstmt.as_raw(), SQL_RESET_PARAMS) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_parameter() {
        let param = Parameter::new(&Value::Null, CharEncoding::Utf16).unwrap();
        assert_eq!(param.storage(), StorageType::Null);
        assert_eq!(param.length(), SQL_NULL_DATA);
        assert_eq!(param.buffer_size(), 0);
        assert_eq!(param.column_size(), 0);
    }

    #[test]
    fn test_text_sizes() {
        let text = Value::from("Grüße");

        let param = Parameter::new(&text, CharEncoding::Utf8).unwrap();
        assert_eq!(param.storage(), StorageType::Char);
        assert_eq!(param.buffer_size(), 7);
        assert_eq!(param.length(), 7);

        let param = Parameter::new(&text, CharEncoding::Latin1).unwrap();
        assert_eq!(param.buffer_size(), 5);

        let param = Parameter::new(&text, CharEncoding::Utf16).unwrap();
        assert_eq!(param.storage(), StorageType::WChar);
        assert_eq!(param.buffer_size(), 10);
        assert_eq!(param.column_size(), 5);
    }

    #[test]
    fn test_latin1_rejects_high_codepoints() {
        let error = Parameter::new(&Value::from("snow ☃"), CharEncoding::Latin1).unwrap_err();
        assert_eq!(error.status, Status::Overflow);

        // Beyond the BMP is fine as UTF-16 (surrogate pair) and UTF-8.
        let text = Value::from("🎉");
        let param = Parameter::new(&text, CharEncoding::Utf16).unwrap();
        assert_eq!(param.buffer_size(), 4);
        let param = Parameter::new(&text, CharEncoding::Utf8).unwrap();
        assert_eq!(param.buffer_size(), 4);
    }

    #[test]
    fn test_timestamp_fraction() {
        let stamp = NaiveDate::from_ymd_opt(2020, 2, 29)
            .unwrap()
            .and_hms_nano_opt(23, 59, 58, 250_000_000)
            .unwrap();
        let param = Parameter::new(&Value::DateTime(stamp), CharEncoding::Utf16).unwrap();
        assert_eq!(
            param.data,
            ParameterData::Timestamp(TIMESTAMP_STRUCT {
                year: 2020,
                month: 2,
                day: 29,
                hour: 23,
                minute: 59,
                second: 58,
                fraction: 250_000_000,
            })
        );
        assert_eq!(param.buffer_size(), size_of::<TIMESTAMP_STRUCT>());
    }

    #[test]
    fn test_year_out_of_range() {
        let date = NaiveDate::from_ymd_opt(40000, 1, 1).unwrap();
        let error = Parameter::new(&Value::Date(date), CharEncoding::Utf16).unwrap_err();
        assert_eq!(error.status, Status::InvalidArguments);
    }

    #[test]
    fn test_unsigned_storage() {
        let param = Parameter::new(&Value::Integer(4294967295), CharEncoding::Utf16).unwrap();
        assert_eq!(param.data, ParameterData::ULong(u32::MAX));
        let param = Parameter::new(&Value::Integer(i64::MAX), CharEncoding::Utf16).unwrap();
        assert_eq!(param.data, ParameterData::UBigInt(i64::MAX as u64));
    }
}
