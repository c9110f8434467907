//! Translation of native failures into [Error]s through diagnostic records.

use std::ptr::null_mut;

use crate::error::{Error, Status};
use crate::ffi::constants::{
    SQL_ERROR, SQL_HANDLE_DBC, SQL_HANDLE_ENV, SQL_HANDLE_STMT, SQL_INVALID_HANDLE, SQL_NO_DATA,
    SQL_SUCCESS, SQL_SUCCESS_WITH_INFO,
};
use crate::ffi::{FunctionTable, Handle, SQLINTEGER, SQLSMALLINT, SQLWCHAR};
use crate::odbc_method;

const MESSAGE_BUFFER_SIZE: usize = 4086;

/// Kind of handle a diagnostic is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Environment,
    Connection,
    Statement,
}

impl From<HandleKind> for SQLSMALLINT {
    fn from(value: HandleKind) -> Self {
        match value {
            HandleKind::Environment => SQL_HANDLE_ENV,
            HandleKind::Connection => SQL_HANDLE_DBC,
            HandleKind::Statement => SQL_HANDLE_STMT,
        }
    }
}

/// First diagnostic record of a handle: SQLSTATE, native code and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub state: String,
    pub native_code: i32,
    pub message: String,
}

/// Reads diagnostic record 1 of `handle`.
///
/// `handle` may be `None` for failures of the environment allocation itself.
pub fn first_record(
    functions: &FunctionTable,
    kind: HandleKind,
    handle: Option<Handle>,
) -> std::result::Result<Record, Error> {
    let mut state: [SQLWCHAR; 6] = [0; 6];
    let mut native: SQLINTEGER = 0;
    let mut message: Vec<SQLWCHAR> = vec![0; MESSAGE_BUFFER_SIZE];
    let mut message_len: SQLSMALLINT = 0;

    let method = odbc_method!(functions, SQLGetDiagRecW);
    let rc = unsafe {
        method(
            kind.into(),
            handle.map(Handle::as_raw).unwrap_or(null_mut()),
            1,
            state.as_mut_ptr(),
            &mut native,
            message.as_mut_ptr(),
            MESSAGE_BUFFER_SIZE as SQLSMALLINT,
            &mut message_len,
        )
    };

    match rc {
        SQL_SUCCESS | SQL_SUCCESS_WITH_INFO => {
            // With info means the message did not fit and was truncated.
            let len = (message_len.max(0) as usize).min(MESSAGE_BUFFER_SIZE - 1);
            let state_len = state.iter().position(|c| *c == 0).unwrap_or(5);
            Ok(Record {
                state: String::from_utf16_lossy(&state[..state_len]),
                native_code: native,
                message: String::from_utf16_lossy(&message[..len]),
            })
        }
        SQL_INVALID_HANDLE => Err(Error::with_message_and_status(
            "Internal ODBC extension error (invalid handle)",
            Status::BadDiagnostic,
        )),
        SQL_ERROR => Err(Error::with_message_and_status(
            "Internal ODBC extension error (bad diag record #)",
            Status::BadDiagnostic,
        )),
        SQL_NO_DATA => Err(Error::with_message_and_status(
            "No ODBC diagnostic information available",
            Status::NoDiagnostic,
        )),
        _ => Err(Error::with_message_and_status(
            format!("Undocumented SQLRETURN {} from SQLGetDiagRecW()", rc),
            Status::UnexpectedReturn,
        )),
    }
}

/// Builds the error surfaced for a failed native call on `handle`.
pub fn error_for(functions: &FunctionTable, kind: HandleKind, handle: Option<Handle>) -> Error {
    match first_record(functions, kind, handle) {
        Ok(record) => Error {
            message: record.message,
            status: Status::Native,
            native_code: record.native_code,
            sqlstate: record.state,
        },
        Err(error) => {
            tracing::warn!(?kind, "could not get ODBC error message: {}", error.message);
            error
        }
    }
}

/// Maps the return code of a native call to `Ok` when it succeeded.
pub(crate) fn check(
    functions: &FunctionTable,
    rc: crate::ffi::SQLRETURN,
    kind: HandleKind,
    handle: Option<Handle>,
) -> crate::error::Result<()> {
    match crate::ffi::succeeded(rc) {
        true => Ok(()),
        false => Err(error_for(functions, kind, handle)),
    }
}
