//! Row retrieval and conversion of native column data into [Value]s.

use std::mem::size_of;
use std::ptr::read_unaligned;

use chrono::{NaiveDate, NaiveTime};

use crate::columns::{Column, FetchType, NarrowEncoding};
use crate::diagnostics::{self, HandleKind};
use crate::error::{Error, Result, Status};
use crate::ffi::constants::*;
use crate::ffi::{
    FunctionTable, Handle, DATE_STRUCT, SQLLEN, SQLPOINTER, SQLRETURN, SQLSMALLINT,
    SQLUSMALLINT, TIMESTAMP_STRUCT, TIME_STRUCT,
};
use crate::odbc_method;
use crate::value::Value;

/// Fetches up to `part` rows (all remaining rows if `None`) and converts every column.
///
/// `ceiling` sizes the chunks used to read long text whose total length is unknown.
pub fn fetch_rows(
    functions: &FunctionTable,
    hstmt: Handle,
    columns: &mut [Column],
    part: Option<usize>,
    ceiling: usize,
) -> Result<Vec<Vec<Value>>> {
    let mut rows = Vec::new();
    let fetch = odbc_method!(functions, SQLFetch);

    while part.map_or(true, |limit| rows.len() < limit) {
        let rc = unsafe { fetch(hstmt.as_raw()) };
        match rc {
            SQL_SUCCESS => {}
            SQL_SUCCESS_WITH_INFO => {
                match diagnostics::first_record(functions, HandleKind::Statement, Some(hstmt)) {
                    Ok(record) => tracing::warn!(state = %record.state, "row fetched with info"),
                    Err(error) => tracing::warn!("row fetched with info: {}", error.message),
                }
            }
            SQL_NO_DATA => break,
            _ => {
                return Err(diagnostics::error_for(
                    functions,
                    HandleKind::Statement,
                    Some(hstmt),
                ))
            }
        }

        let row = columns
            .iter_mut()
            .enumerate()
            .map(|(index, column)| {
                let number = SQLUSMALLINT::try_from(index + 1)
                    .map_err(|_| Error::internal("Too many result columns"))?;
                read_column(functions, hstmt, number, column, ceiling)
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push(row);
    }

    Ok(rows)
}

fn get_data(
    functions: &FunctionTable,
    hstmt: Handle,
    number: SQLUSMALLINT,
    c_type: SQLSMALLINT,
    buffer: SQLPOINTER,
    buffer_len: usize,
    len: &mut SQLLEN,
) -> SQLRETURN {
    let method = odbc_method!(functions, SQLGetData);
    unsafe {
        method(
            hstmt.as_raw(),
            number,
            c_type,
            buffer,
            buffer_len as SQLLEN,
            len,
        )
    }
}

/// Reads the current row's value of column `number`.
fn read_column(
    functions: &FunctionTable,
    hstmt: Handle,
    number: SQLUSMALLINT,
    column: &mut Column,
    ceiling: usize,
) -> Result<Value> {
    let plan = column.plan();
    let c_type = plan.fetch_type.c_type();
    // The pointer must not be null even when no data is wanted yet.
    let mut scratch = [0u8; 1];
    let (buffer, buffer_len) = match column.buffer_mut() {
        Some(buffer) => (buffer.as_mut_ptr(), buffer.len()),
        None => (scratch.as_mut_ptr() as SQLPOINTER, 0),
    };
    let deferred = buffer_len == 0;

    let mut len: SQLLEN = 0;
    let rc = get_data(functions, hstmt, number, c_type, buffer, buffer_len, &mut len);

    if deferred && len == SQL_NO_TOTAL {
        return Err(Error::internal(
            "ODBC gave SQL_NO_TOTAL for var-size field",
        ));
    }

    match rc {
        SQL_SUCCESS | SQL_SUCCESS_WITH_INFO if len == SQL_NULL_DATA => Ok(Value::Null),
        // Some drivers report the full length with SQL_SUCCESS when given no room.
        SQL_SUCCESS if deferred && len > 0 => {
            refetch(functions, hstmt, number, plan.fetch_type, len)
        }
        SQL_SUCCESS => {
            let bytes = column
                .buffer()
                .map(|b| &b.bytes()[..stored_len(len, b.len(), plan.fetch_type)])
                .unwrap_or(&[]);
            convert(plan.fetch_type, bytes, len)
        }
        SQL_SUCCESS_WITH_INFO if deferred => {
            refetch(functions, hstmt, number, plan.fetch_type, len)
        }
        SQL_SUCCESS_WITH_INFO if plan.extendable => {
            let mut data = column
                .buffer()
                .map(|b| b.bytes()[..b.len() - plan.fetch_type.terminator_size()].to_vec())
                .unwrap_or_default();
            read_continuation(functions, hstmt, number, plan.fetch_type, len, ceiling, &mut data)?;
            convert(plan.fetch_type, &data, data.len() as SQLLEN)
        }
        SQL_SUCCESS_WITH_INFO => Err(Error::internal(format!(
            "SQLGetData() reported truncation of fixed-size column {:?}",
            column.title()
        ))),
        SQL_NO_DATA => Err(Error::internal(format!(
            "SQLGetData() reported no data for unread column {:?}",
            column.title()
        ))),
        _ => Err(diagnostics::error_for(
            functions,
            HandleKind::Statement,
            Some(hstmt),
        )),
    }
}

/// Bytes of valid data in a buffer of `capacity` after a successful get-data.
fn stored_len(len: SQLLEN, capacity: usize, fetch_type: FetchType) -> usize {
    match fetch_type.is_text() {
        true => (len.max(0) as usize).min(capacity - fetch_type.terminator_size()),
        false => capacity,
    }
}

/// Second phase for a column fetched with no buffer: reads exactly `len` bytes.
fn refetch(
    functions: &FunctionTable,
    hstmt: Handle,
    number: SQLUSMALLINT,
    fetch_type: FetchType,
    len: SQLLEN,
) -> Result<Value> {
    if len == 0 {
        // Some drivers refuse a get-data call with a zero length buffer.
        return convert(fetch_type, &[], 0);
    }

    let mut data = vec![0u8; len as usize];
    let mut len_check: SQLLEN = 0;
    tracing::trace!(number, len, "re-fetching variable length column");
    let rc = get_data(
        functions,
        hstmt,
        number,
        fetch_type.c_type(),
        data.as_mut_ptr() as SQLPOINTER,
        data.len(),
        &mut len_check,
    );
    if rc != SQL_SUCCESS {
        return Err(diagnostics::error_for(
            functions,
            HandleKind::Statement,
            Some(hstmt),
        ));
    }
    if len_check != len {
        return Err(Error::internal(format!(
            "SQLGetData() reported {} bytes after announcing {}",
            len_check, len
        )));
    }

    match fetch_type {
        FetchType::Binary => Ok(Value::Binary(data)),
        _ => convert(fetch_type, &data, len),
    }
}

/// Reads the rest of a long text value after the first buffer-full, appending to `data`.
///
/// `announced` is the length reported with that buffer-full: the bytes that were
/// outstanding before it was copied, or `SQL_NO_TOTAL`.
fn read_continuation(
    functions: &FunctionTable,
    hstmt: Handle,
    number: SQLUSMALLINT,
    fetch_type: FetchType,
    announced: SQLLEN,
    ceiling: usize,
    data: &mut Vec<u8>,
) -> Result<()> {
    let terminator = fetch_type.terminator_size();
    let mut outstanding = outstanding_after(announced, data.len())?;

    loop {
        if outstanding == Some(0) {
            return Ok(());
        }
        let chunk = outstanding.unwrap_or(ceiling * terminator);
        let mut buffer = vec![0u8; chunk + terminator];
        let mut len: SQLLEN = 0;
        tracing::trace!(number, ?outstanding, "continuing long text column");
        let rc = get_data(
            functions,
            hstmt,
            number,
            fetch_type.c_type(),
            buffer.as_mut_ptr() as SQLPOINTER,
            buffer.len(),
            &mut len,
        );

        match (rc, outstanding) {
            (SQL_SUCCESS, Some(expected)) => {
                if len != expected as SQLLEN {
                    return Err(Error::internal(format!(
                        "SQLGetData() continuation reported {} bytes, {} were outstanding",
                        len, expected
                    )));
                }
                data.extend_from_slice(&buffer[..expected]);
                return Ok(());
            }
            (SQL_SUCCESS, None) => {
                data.extend_from_slice(&buffer[..(len.max(0) as usize).min(chunk)]);
                return Ok(());
            }
            (SQL_SUCCESS_WITH_INFO, None) => {
                data.extend_from_slice(&buffer[..chunk]);
                outstanding = outstanding_after(len, chunk)?;
            }
            (SQL_SUCCESS_WITH_INFO, Some(expected)) => {
                return Err(Error::internal(format!(
                    "SQLGetData() truncated a continuation sized for {} bytes",
                    expected
                )));
            }
            _ => {
                return Err(diagnostics::error_for(
                    functions,
                    HandleKind::Statement,
                    Some(hstmt),
                ))
            }
        }
    }
}

fn outstanding_after(announced: SQLLEN, copied: usize) -> Result<Option<usize>> {
    if announced == SQL_NO_TOTAL {
        return Ok(None);
    }
    usize::try_from(announced)
        .ok()
        .and_then(|total| total.checked_sub(copied))
        .map(Some)
        .ok_or_else(|| {
            Error::internal(format!(
                "SQLGetData() announced {} bytes but returned {}",
                announced, copied
            ))
        })
}

/// Converts `len` bytes of native data of `fetch_type` into a value.
pub fn convert(fetch_type: FetchType, bytes: &[u8], len: SQLLEN) -> Result<Value> {
    if len == SQL_NULL_DATA {
        return Ok(Value::Null);
    }

    let value = match fetch_type {
        FetchType::Bit => {
            // MySQL reports BIT(n) this way with n > 1.
            if len != 1 {
                return Err(Error::unsupported(
                    "BIT(n) fields are only supported for n = 1",
                ));
            }
            Value::Bool(read::<u8>(bytes)? != 0)
        }
        FetchType::UTinyInt => Value::Integer(read::<u8>(bytes)?.into()),
        FetchType::SLong => Value::Integer(read::<i32>(bytes)?.into()),
        FetchType::ULong => Value::Integer(read::<u32>(bytes)?.into()),
        FetchType::SBigInt => Value::Integer(read::<i64>(bytes)?),
        FetchType::UBigInt => {
            let value = read::<u64>(bytes)?;
            Value::Integer(i64::try_from(value).map_err(|_| {
                Error::with_message_and_status(
                    format!("Unsigned 64-bit value {} does not fit a signed integer", value),
                    Status::Overflow,
                )
            })?)
        }
        FetchType::Double => Value::Float(read::<f64>(bytes)?),
        FetchType::Date => Value::Date(date(&read::<DATE_STRUCT>(bytes)?)?),
        FetchType::Time => {
            // TIME_STRUCT has no fraction, sub-second precision is lost.
            let time = read::<TIME_STRUCT>(bytes)?;
            Value::Time(
                NaiveTime::from_hms_opt(time.hour.into(), time.minute.into(), time.second.into())
                    .ok_or_else(|| invalid_data(format!("Invalid time {:?}", time)))?,
            )
        }
        FetchType::Timestamp => {
            let stamp = read::<TIMESTAMP_STRUCT>(bytes)?;
            let date = date(&DATE_STRUCT {
                year: stamp.year,
                month: stamp.month,
                day: stamp.day,
            })?;
            let time = NaiveTime::from_hms_nano_opt(
                stamp.hour.into(),
                stamp.minute.into(),
                stamp.second.into(),
                stamp.fraction,
            )
            .ok_or_else(|| invalid_data(format!("Invalid timestamp {:?}", stamp)))?;
            Value::DateTime(date.and_time(time))
        }
        FetchType::Binary => Value::Binary(bytes.to_vec()),
        FetchType::Narrow(NarrowEncoding::Utf8) => Value::Text(
            String::from_utf8(bytes.to_vec())
                .map_err(|e| invalid_data(format!("Column data is not UTF-8: {}", e)))?,
        ),
        FetchType::Narrow(NarrowEncoding::Latin1) => {
            Value::Text(bytes.iter().map(|b| char::from(*b)).collect())
        }
        FetchType::Wide => Value::Text(decode_wide(bytes)?),
    };
    Ok(value)
}

fn read<T: Copy>(bytes: &[u8]) -> Result<T> {
    if bytes.len() < size_of::<T>() {
        return Err(Error::internal(format!(
            "Buffer of {} bytes is too small for a {} byte value",
            bytes.len(),
            size_of::<T>()
        )));
    }
    // SAFETY: length checked above; T is a plain repr(C) or primitive type.
    Ok(unsafe { read_unaligned(bytes.as_ptr() as *const T) })
}

fn date(date: &DATE_STRUCT) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year.into(), date.month.into(), date.day.into())
        .ok_or_else(|| invalid_data(format!("Invalid date {:?}", date)))
}

fn decode_wide(bytes: &[u8]) -> Result<String> {
    if bytes.len() % SQLWCHAR_SIZE != 0 {
        return Err(invalid_data(format!(
            "Wide character data has odd length {}",
            bytes.len()
        )));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(SQLWCHAR_SIZE)
        .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|e| invalid_data(format!("Invalid UTF-16: {}", e)))
}

fn invalid_data(message: String) -> Error {
    Error::with_message_and_status(message, Status::InvalidData)
}
