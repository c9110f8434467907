//! Entry points of the driver. Handles are boxed state structs, one type per handle kind.
#![allow(non_snake_case)]

use std::collections::BTreeMap;
use std::ptr::{copy_nonoverlapping, null_mut, read_unaligned, write_bytes};
use std::slice;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use odbc_core::ffi::constants::*;
use odbc_core::ffi::types::{SQLHDBC, SQLHENV, SQLHSTMT, SQLHWND};
use odbc_core::ffi::{
    FunctionTable, DATE_STRUCT, SQLHANDLE, SQLINTEGER, SQLLEN, SQLPOINTER, SQLRETURN,
    SQLSMALLINT, SQLULEN, SQLUSMALLINT, SQLWCHAR, TIMESTAMP_STRUCT, TIME_STRUCT,
};

use crate::catalog;
use crate::datum::{payload, Datum, Payload};
use crate::{connection_attribute, lookup, BindRecord, CatalogCall, Database, Outcome, ResultSet};

#[derive(Debug)]
struct Diag {
    state: String,
    message: String,
}

#[derive(Debug, Default)]
struct EnvState {
    version: Option<usize>,
    diag: Option<Diag>,
}

#[derive(Debug, Default)]
struct DbcState {
    database: Option<Arc<Database>>,
    connected: bool,
    login_timeout: Option<usize>,
    statements: Vec<*mut StmtState>,
    diag: Option<Diag>,
}

#[derive(Debug)]
struct Binding {
    record: BindRecord,
    buffer: SQLPOINTER,
    indicator: *mut SQLLEN,
}

#[derive(Debug)]
struct Cursor {
    result: ResultSet,
    /// Current row, `None` before the first fetch.
    row: Option<usize>,
    /// Bytes of each column of the current row already returned, `None` if unread.
    offsets: Vec<Option<usize>>,
}

#[derive(Debug)]
struct StmtState {
    database: Arc<Database>,
    dbc: *mut DbcState,
    sql: Option<String>,
    bindings: BTreeMap<SQLUSMALLINT, Binding>,
    cursor: Option<Cursor>,
    row_count: SQLLEN,
    diag: Option<Diag>,
}

/// Dereferences a handle of state type `$ty`, clearing its diagnostics.
macro_rules! state {
    ($handle:expr, $ty:ty) => {
        match ($handle as *mut $ty).as_mut() {
            Some(state) => {
                state.diag = None;
                state
            }
            None => return SQL_INVALID_HANDLE,
        }
    };
}

fn fail(diag: &mut Option<Diag>, state: &str, message: impl Into<String>) -> SQLRETURN {
    *diag = Some(Diag {
        state: state.into(),
        message: message.into(),
    });
    SQL_ERROR
}

unsafe fn set<T>(target: *mut T, value: T) {
    if let Some(target) = target.as_mut() {
        *target = value;
    }
}

/// Reads a wide string argument of `len` characters, or up to its terminator for
/// `SQL_NTS`.
unsafe fn wide_arg(text: *const SQLWCHAR, len: SQLINTEGER) -> Option<String> {
    if text.is_null() {
        return None;
    }
    let len = match len {
        SQL_NTS => (0..).take_while(|i| *text.add(*i) != 0).count(),
        len => len.max(0) as usize,
    };
    Some(String::from_utf16_lossy(slice::from_raw_parts(text, len)))
}

/// Writes `text` and a terminator into `capacity` characters at `buffer`. Returns the
/// full length of `text` in characters and whether it had to be truncated.
unsafe fn write_wide(text: &str, buffer: *mut SQLWCHAR, capacity: usize) -> (usize, bool) {
    let units: Vec<u16> = text.encode_utf16().collect();
    if buffer.is_null() || capacity == 0 {
        return (units.len(), !units.is_empty());
    }
    let copied = units.len().min(capacity - 1);
    copy_nonoverlapping(units.as_ptr(), buffer, copied);
    *buffer.add(copied) = 0;
    (units.len(), copied < units.len())
}

fn truncated(diag: &mut Option<Diag>) -> SQLRETURN {
    *diag = Some(Diag {
        state: "01004".into(),
        message: "String data, right truncated".into(),
    });
    SQL_SUCCESS_WITH_INFO
}

pub(crate) fn fill(functions: &mut FunctionTable) {
    functions.SQLAllocHandle = Some(SQLAllocHandle);
    functions.SQLFreeHandle = Some(SQLFreeHandle);
    functions.SQLSetEnvAttr = Some(SQLSetEnvAttr);
    functions.SQLSetConnectAttrW = Some(SQLSetConnectAttrW);
    functions.SQLDriverConnectW = Some(SQLDriverConnectW);
    functions.SQLDisconnect = Some(SQLDisconnect);
    functions.SQLPrepareW = Some(SQLPrepareW);
    functions.SQLExecute = Some(SQLExecute);
    functions.SQLFreeStmt = Some(SQLFreeStmt);
    functions.SQLCloseCursor = Some(SQLCloseCursor);
    functions.SQLBindParameter = Some(SQLBindParameter);
    functions.SQLNumResultCols = Some(SQLNumResultCols);
    functions.SQLRowCount = Some(SQLRowCount);
    functions.SQLDescribeColW = Some(SQLDescribeColW);
    functions.SQLColAttributeW = Some(SQLColAttributeW);
    functions.SQLFetch = Some(SQLFetch);
    functions.SQLGetData = Some(SQLGetData);
    functions.SQLTablesW = Some(SQLTablesW);
    functions.SQLColumnsW = Some(SQLColumnsW);
    functions.SQLGetTypeInfoW = Some(SQLGetTypeInfoW);
    functions.SQLGetDiagRecW = Some(SQLGetDiagRecW);
}

unsafe extern "system" fn SQLAllocHandle(
    handle_type: SQLSMALLINT,
    input: SQLHANDLE,
    output: *mut SQLHANDLE,
) -> SQLRETURN {
    if output.is_null() {
        return SQL_ERROR;
    }
    *output = null_mut();

    match handle_type {
        SQL_HANDLE_ENV => {
            *output = Box::into_raw(Box::<EnvState>::default()) as SQLHANDLE;
            SQL_SUCCESS
        }
        SQL_HANDLE_DBC => {
            let env = state!(input, EnvState);
            if env.version.is_none() {
                return fail(&mut env.diag, "HY010", "Function sequence error");
            }
            *output = Box::into_raw(Box::<DbcState>::default()) as SQLHANDLE;
            SQL_SUCCESS
        }
        SQL_HANDLE_STMT => {
            let dbc = state!(input, DbcState);
            let database = match (&dbc.database, dbc.connected) {
                (Some(database), true) => database.clone(),
                _ => return fail(&mut dbc.diag, "08003", "Connection does not exist"),
            };
            let stmt = Box::into_raw(Box::new(StmtState {
                database,
                dbc: input as *mut DbcState,
                sql: None,
                bindings: BTreeMap::new(),
                cursor: None,
                row_count: -1,
                diag: None,
            }));
            dbc.statements.push(stmt);
            *output = stmt as SQLHANDLE;
            SQL_SUCCESS
        }
        _ => SQL_ERROR,
    }
}

unsafe extern "system" fn SQLFreeHandle(handle_type: SQLSMALLINT, handle: SQLHANDLE) -> SQLRETURN {
    match handle_type {
        SQL_HANDLE_ENV => {
            let env = state!(handle, EnvState);
            drop(Box::from_raw(env as *mut EnvState));
            SQL_SUCCESS
        }
        SQL_HANDLE_DBC => {
            let dbc = state!(handle, DbcState);
            if dbc.connected {
                return fail(&mut dbc.diag, "HY010", "Function sequence error");
            }
            if let Some(database) = &dbc.database {
                database.record(|stats| stats.connection_frees += 1);
            }
            drop(Box::from_raw(dbc as *mut DbcState));
            SQL_SUCCESS
        }
        SQL_HANDLE_STMT => {
            let stmt = state!(handle, StmtState);
            let stmt = stmt as *mut StmtState;
            if let Some(dbc) = (*stmt).dbc.as_mut() {
                dbc.statements.retain(|s| *s != stmt);
            }
            (*stmt).database.record(|stats| stats.statement_frees += 1);
            drop(Box::from_raw(stmt));
            SQL_SUCCESS
        }
        _ => SQL_INVALID_HANDLE,
    }
}

unsafe extern "system" fn SQLSetEnvAttr(
    henv: SQLHENV,
    attribute: SQLINTEGER,
    value: SQLPOINTER,
    _: SQLINTEGER,
) -> SQLRETURN {
    let env = state!(henv, EnvState);
    match attribute {
        SQL_ATTR_ODBC_VERSION => {
            env.version = Some(value as usize);
            SQL_SUCCESS
        }
        _ => fail(&mut env.diag, "HY092", "Invalid attribute/option identifier"),
    }
}

unsafe extern "system" fn SQLSetConnectAttrW(
    hdbc: SQLHDBC,
    attribute: SQLINTEGER,
    value: SQLPOINTER,
    _: SQLINTEGER,
) -> SQLRETURN {
    let dbc = state!(hdbc, DbcState);
    let value = value as usize;
    if attribute == SQL_ATTR_LOGIN_TIMEOUT {
        dbc.login_timeout = Some(value);
        return SQL_SUCCESS;
    }

    let database = match (&dbc.database, dbc.connected) {
        (Some(database), true) => database.clone(),
        _ => return fail(&mut dbc.diag, "08003", "Connection does not exist"),
    };
    match attribute {
        SQL_ATTR_ACCESS_MODE => database.record(|stats| stats.access_mode = Some(value)),
        SQL_ATTR_AUTOCOMMIT => database.record(|stats| stats.autocommit = Some(value)),
        _ => return fail(&mut dbc.diag, "HY092", "Invalid attribute/option identifier"),
    }
    SQL_SUCCESS
}

unsafe extern "system" fn SQLDriverConnectW(
    hdbc: SQLHDBC,
    _: SQLHWND,
    connection_string: *const SQLWCHAR,
    connection_len: SQLSMALLINT,
    _: *mut SQLWCHAR,
    _: SQLSMALLINT,
    _: *mut SQLSMALLINT,
    _: SQLUSMALLINT,
) -> SQLRETURN {
    let dbc = state!(hdbc, DbcState);
    if dbc.connected {
        return fail(&mut dbc.diag, "08002", "Connection name in use");
    }
    let Some(connection_string) = wide_arg(connection_string, connection_len.into()) else {
        return fail(&mut dbc.diag, "HY009", "Invalid use of null pointer");
    };
    let database = connection_attribute(&connection_string, "DSN").and_then(|dsn| lookup(&dsn));
    let Some(database) = database else {
        return fail(
            &mut dbc.diag,
            "IM002",
            "Data source name not found and no default driver specified",
        );
    };

    std::thread::sleep(database.connect_delay());
    let login_timeout = dbc.login_timeout;
    database.record(|stats| {
        stats.connects += 1;
        stats.login_timeout = login_timeout;
    });
    dbc.database = Some(database);
    dbc.connected = true;
    SQL_SUCCESS
}

unsafe extern "system" fn SQLDisconnect(hdbc: SQLHDBC) -> SQLRETURN {
    let dbc = state!(hdbc, DbcState);
    if !dbc.connected {
        return fail(&mut dbc.diag, "08003", "Connection does not exist");
    }
    // Statements die with their connection.
    for stmt in dbc.statements.drain(..) {
        drop(Box::from_raw(stmt));
    }
    dbc.connected = false;
    if let Some(database) = &dbc.database {
        database.record(|stats| stats.disconnects += 1);
    }
    SQL_SUCCESS
}

unsafe extern "system" fn SQLPrepareW(
    hstmt: SQLHSTMT,
    text: *const SQLWCHAR,
    len: SQLINTEGER,
) -> SQLRETURN {
    let stmt = state!(hstmt, StmtState);
    let Some(sql) = wide_arg(text, len) else {
        return fail(&mut stmt.diag, "HY009", "Invalid use of null pointer");
    };
    stmt.database.record(|stats| stats.prepares += 1);
    stmt.sql = None;
    if stmt.database.script(&sql).is_none() {
        return fail(
            &mut stmt.diag,
            "42000",
            format!("Syntax error or access violation: {}", sql),
        );
    }
    stmt.sql = Some(sql);
    SQL_SUCCESS
}

unsafe fn read<T>(buffer: SQLPOINTER) -> T {
    read_unaligned(buffer as *const T)
}

/// Reads the value currently in a bound parameter's buffer.
unsafe fn decode(binding: &Binding) -> Result<Datum, Diag> {
    let diag = |state: &str, message: &str| Diag {
        state: state.into(),
        message: message.into(),
    };
    let indicator = binding.indicator.as_ref().copied();
    if indicator == Some(SQL_NULL_DATA) {
        return Ok(Datum::Null);
    }
    let buffer = binding.buffer;
    if buffer.is_null() {
        return Err(diag("HY009", "Invalid use of null pointer"));
    }

    let bytes = || match indicator {
        Some(len) if len >= 0 && len <= binding.record.buffer_len => {
            Ok(slice::from_raw_parts(buffer as *const u8, len as usize).to_vec())
        }
        _ => Err(diag("HY090", "Invalid string or buffer length")),
    };

    let datum = match binding.record.c_type {
        SQL_C_BIT => Datum::Bit(read::<u8>(buffer) != 0),
        SQL_C_UTINYINT => Datum::UInt(read::<u8>(buffer).into()),
        SQL_C_LONG | SQL_C_SLONG => Datum::Int(read::<i32>(buffer).into()),
        SQL_C_ULONG => Datum::UInt(read::<u32>(buffer).into()),
        SQL_C_SBIGINT => Datum::Int(read::<i64>(buffer)),
        SQL_C_UBIGINT => Datum::UInt(read::<u64>(buffer)),
        SQL_C_DOUBLE => Datum::Double(read::<f64>(buffer)),
        SQL_C_TYPE_DATE => {
            let date = read::<DATE_STRUCT>(buffer);
            NaiveDate::from_ymd_opt(date.year.into(), date.month.into(), date.day.into())
                .map(Datum::Date)
                .ok_or_else(|| diag("22007", "Invalid datetime format"))?
        }
        SQL_C_TYPE_TIME => {
            let time = read::<TIME_STRUCT>(buffer);
            NaiveTime::from_hms_opt(time.hour.into(), time.minute.into(), time.second.into())
                .map(Datum::Time)
                .ok_or_else(|| diag("22007", "Invalid datetime format"))?
        }
        SQL_C_TYPE_TIMESTAMP => {
            let stamp = read::<TIMESTAMP_STRUCT>(buffer);
            NaiveDate::from_ymd_opt(stamp.year.into(), stamp.month.into(), stamp.day.into())
                .and_then(|date| {
                    date.and_hms_nano_opt(
                        stamp.hour.into(),
                        stamp.minute.into(),
                        stamp.second.into(),
                        stamp.fraction,
                    )
                })
                .map(Datum::Timestamp)
                .ok_or_else(|| diag("22007", "Invalid datetime format"))?
        }
        SQL_C_CHAR => Datum::Narrow(bytes()?),
        SQL_C_BINARY => Datum::Bytes(bytes()?),
        SQL_C_WCHAR => Datum::Wide(
            bytes()?
                .chunks_exact(2)
                .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
                .collect(),
        ),
        _ => return Err(diag("HY003", "Invalid application buffer type")),
    };
    Ok(datum)
}

unsafe extern "system" fn SQLExecute(hstmt: SQLHSTMT) -> SQLRETURN {
    let stmt = state!(hstmt, StmtState);
    let Some(sql) = stmt.sql.clone() else {
        return fail(&mut stmt.diag, "HY010", "Function sequence error");
    };
    if stmt.cursor.is_some() {
        return fail(&mut stmt.diag, "24000", "Invalid cursor state");
    }
    let Some(handler) = stmt.database.script(&sql) else {
        return fail(&mut stmt.diag, "42000", "Statement is no longer scripted");
    };

    let expected = stmt.bindings.keys().next_back().copied().unwrap_or(0);
    if usize::from(expected) != stmt.bindings.len() {
        return fail(&mut stmt.diag, "07002", "COUNT field incorrect");
    }
    let mut params = Vec::with_capacity(stmt.bindings.len());
    for binding in stmt.bindings.values() {
        match decode(binding) {
            Ok(datum) => params.push(datum),
            Err(diag) => {
                stmt.diag = Some(diag);
                return SQL_ERROR;
            }
        }
    }

    let bindings: Vec<BindRecord> = stmt.bindings.values().map(|b| b.record.clone()).collect();
    stmt.database.record(|stats| {
        stats.executes += 1;
        stats.bindings = bindings;
        stats.params = params.clone();
    });

    match (*handler)(&params) {
        Outcome::RowCount(rows) => {
            stmt.row_count = rows as SQLLEN;
            SQL_SUCCESS
        }
        Outcome::NoData => {
            stmt.row_count = 0;
            SQL_NO_DATA
        }
        Outcome::Rows(result) => {
            stmt.row_count = -1;
            open_cursor(stmt, result);
            SQL_SUCCESS
        }
        Outcome::Error { state, message } => fail(&mut stmt.diag, &state, message),
        Outcome::Return(rc) => rc,
    }
}

fn open_cursor(stmt: &mut StmtState, result: ResultSet) {
    stmt.cursor = Some(Cursor {
        offsets: vec![None; result.columns.len()],
        result,
        row: None,
    });
}

unsafe extern "system" fn SQLFreeStmt(hstmt: SQLHSTMT, option: SQLUSMALLINT) -> SQLRETURN {
    let stmt = state!(hstmt, StmtState);
    match option {
        SQL_CLOSE => stmt.cursor = None,
        SQL_RESET_PARAMS => stmt.bindings.clear(),
        _ => return fail(&mut stmt.diag, "HY092", "Invalid attribute/option identifier"),
    }
    SQL_SUCCESS
}

unsafe extern "system" fn SQLCloseCursor(hstmt: SQLHSTMT) -> SQLRETURN {
    let stmt = state!(hstmt, StmtState);
    match stmt.cursor.take() {
        Some(_) => SQL_SUCCESS,
        None => fail(&mut stmt.diag, "24000", "Invalid cursor state"),
    }
}

unsafe extern "system" fn SQLBindParameter(
    hstmt: SQLHSTMT,
    number: SQLUSMALLINT,
    _: SQLSMALLINT,
    c_type: SQLSMALLINT,
    sql_type: SQLSMALLINT,
    column_size: SQLULEN,
    _: SQLSMALLINT,
    buffer: SQLPOINTER,
    buffer_len: SQLLEN,
    indicator: *mut SQLLEN,
) -> SQLRETURN {
    let stmt = state!(hstmt, StmtState);
    if number == 0 {
        return fail(&mut stmt.diag, "07009", "Invalid descriptor index");
    }
    let record = BindRecord {
        number,
        c_type,
        sql_type,
        column_size,
        buffer_len,
        indicator: indicator.as_ref().copied().unwrap_or(0),
    };
    stmt.bindings.insert(
        number,
        Binding {
            record,
            buffer,
            indicator,
        },
    );
    SQL_SUCCESS
}

unsafe extern "system" fn SQLNumResultCols(hstmt: SQLHSTMT, count: *mut SQLSMALLINT) -> SQLRETURN {
    let stmt = state!(hstmt, StmtState);
    let columns = stmt.cursor.as_ref().map_or(0, |c| c.result.columns.len());
    set(count, columns as SQLSMALLINT);
    SQL_SUCCESS
}

unsafe extern "system" fn SQLRowCount(hstmt: SQLHSTMT, rows: *mut SQLLEN) -> SQLRETURN {
    let stmt = state!(hstmt, StmtState);
    set(rows, stmt.row_count);
    SQL_SUCCESS
}

unsafe extern "system" fn SQLDescribeColW(
    hstmt: SQLHSTMT,
    number: SQLUSMALLINT,
    name: *mut SQLWCHAR,
    name_capacity: SQLSMALLINT,
    name_len: *mut SQLSMALLINT,
    sql_type: *mut SQLSMALLINT,
    column_size: *mut SQLULEN,
    digits: *mut SQLSMALLINT,
    nullable: *mut SQLSMALLINT,
) -> SQLRETURN {
    let stmt = state!(hstmt, StmtState);
    let Some(cursor) = &stmt.cursor else {
        return fail(
            &mut stmt.diag,
            "07005",
            "Prepared statement not a cursor-specification",
        );
    };
    let Some(column) = cursor.result.columns.get(usize::from(number).wrapping_sub(1)) else {
        return fail(&mut stmt.diag, "07009", "Invalid descriptor index");
    };

    let (len, cut) = write_wide(&column.name, name, name_capacity.max(0) as usize);
    set(name_len, len as SQLSMALLINT);
    set(sql_type, column.reported_type.unwrap_or(column.sql_type));
    set(column_size, column.column_size);
    set(digits, 0);
    set(nullable, column.nullable);
    match cut {
        true => truncated(&mut stmt.diag),
        false => SQL_SUCCESS,
    }
}

unsafe extern "system" fn SQLColAttributeW(
    hstmt: SQLHSTMT,
    number: SQLUSMALLINT,
    field: SQLUSMALLINT,
    text: SQLPOINTER,
    text_capacity: SQLSMALLINT,
    text_len: *mut SQLSMALLINT,
    numeric: *mut SQLLEN,
) -> SQLRETURN {
    let stmt = state!(hstmt, StmtState);
    let Some(cursor) = &stmt.cursor else {
        return fail(
            &mut stmt.diag,
            "07005",
            "Prepared statement not a cursor-specification",
        );
    };
    let Some(column) = cursor.result.columns.get(usize::from(number).wrapping_sub(1)) else {
        return fail(&mut stmt.diag, "07009", "Invalid descriptor index");
    };

    match field {
        SQL_DESC_UNSIGNED => {
            set(numeric, if column.unsigned { SQL_TRUE } else { SQL_FALSE });
            SQL_SUCCESS
        }
        SQL_DESC_TYPE_NAME => {
            let capacity = text_capacity.max(0) as usize / SQLWCHAR_SIZE;
            let (len, cut) = write_wide(&column.type_name, text as *mut SQLWCHAR, capacity);
            set(text_len, (len * SQLWCHAR_SIZE) as SQLSMALLINT);
            match cut {
                true => truncated(&mut stmt.diag),
                false => SQL_SUCCESS,
            }
        }
        _ => fail(&mut stmt.diag, "HY091", "Invalid descriptor field identifier"),
    }
}

unsafe extern "system" fn SQLFetch(hstmt: SQLHSTMT) -> SQLRETURN {
    let stmt = state!(hstmt, StmtState);
    let with_info = stmt.database.fetches_with_info();
    let Some(cursor) = &mut stmt.cursor else {
        return fail(&mut stmt.diag, "24000", "Invalid cursor state");
    };

    let row = cursor.row.map_or(0, |row| row + 1).min(cursor.result.rows.len());
    cursor.row = Some(row);
    cursor.offsets.iter_mut().for_each(|offset| *offset = None);
    if row == cursor.result.rows.len() {
        return SQL_NO_DATA;
    }
    match with_info {
        true => {
            stmt.diag = Some(Diag {
                state: "01S01".into(),
                message: "Error in row".into(),
            });
            SQL_SUCCESS_WITH_INFO
        }
        false => SQL_SUCCESS,
    }
}

unsafe extern "system" fn SQLGetData(
    hstmt: SQLHSTMT,
    number: SQLUSMALLINT,
    c_type: SQLSMALLINT,
    buffer: SQLPOINTER,
    buffer_len: SQLLEN,
    indicator: *mut SQLLEN,
) -> SQLRETURN {
    let stmt = state!(hstmt, StmtState);
    let Some(cursor) = &mut stmt.cursor else {
        return fail(&mut stmt.diag, "24000", "Invalid cursor state");
    };
    let Some(row) = cursor.row.and_then(|row| cursor.result.rows.get(row)) else {
        return fail(&mut stmt.diag, "24000", "Invalid cursor state");
    };
    let index = usize::from(number).wrapping_sub(1);
    let (Some(datum), Some(column)) = (row.get(index), cursor.result.columns.get(index)) else {
        return fail(&mut stmt.diag, "07009", "Invalid descriptor index");
    };
    let offset = cursor.offsets[index];

    if *datum == Datum::Null {
        if offset.is_some() {
            return SQL_NO_DATA;
        }
        cursor.offsets[index] = Some(0);
        set(indicator, SQL_NULL_DATA);
        return SQL_SUCCESS;
    }

    let Some(payload) = payload(datum, c_type) else {
        return fail(
            &mut stmt.diag,
            "07006",
            "Restricted data type attribute violation",
        );
    };
    if buffer.is_null() {
        return fail(&mut stmt.diag, "HY009", "Invalid use of null pointer");
    }

    match payload {
        Payload::Fixed { bytes, reported } => {
            if offset.is_some() {
                return SQL_NO_DATA;
            }
            copy_nonoverlapping(bytes.as_ptr(), buffer as *mut u8, bytes.len());
            cursor.offsets[index] = Some(bytes.len());
            set(indicator, reported as SQLLEN);
            SQL_SUCCESS
        }
        Payload::Variable { bytes, terminator } => {
            let start = offset.unwrap_or(0);
            if offset.is_some() && start >= bytes.len() {
                return SQL_NO_DATA;
            }
            let remaining = bytes.len() - start;
            let capacity = buffer_len.max(0) as usize;
            let target = buffer as *mut u8;

            if capacity >= remaining + terminator {
                copy_nonoverlapping(bytes[start..].as_ptr(), target, remaining);
                write_bytes(target.add(remaining), 0, terminator);
                cursor.offsets[index] = Some(bytes.len());
                set(indicator, remaining as SQLLEN);
                return SQL_SUCCESS;
            }

            let mut room = capacity.saturating_sub(terminator);
            if terminator == SQLWCHAR_SIZE {
                room -= room % SQLWCHAR_SIZE;
            }
            copy_nonoverlapping(bytes[start..].as_ptr(), target, room);
            if capacity >= room + terminator {
                write_bytes(target.add(room), 0, terminator);
            }
            cursor.offsets[index] = Some(start + room);
            set(
                indicator,
                match column.no_total {
                    true => SQL_NO_TOTAL,
                    false => remaining as SQLLEN,
                },
            );
            match capacity == 0 && column.quiet_truncation {
                true => SQL_SUCCESS,
                false => truncated(&mut stmt.diag),
            }
        }
    }
}

unsafe fn catalog_arguments(arguments: [(*const SQLWCHAR, SQLSMALLINT); 4]) -> [Option<String>; 4] {
    arguments.map(|(text, len)| wide_arg(text, len.into()))
}

unsafe extern "system" fn SQLTablesW(
    hstmt: SQLHSTMT,
    catalog_name: *const SQLWCHAR,
    catalog_len: SQLSMALLINT,
    schema_name: *const SQLWCHAR,
    schema_len: SQLSMALLINT,
    table_name: *const SQLWCHAR,
    table_len: SQLSMALLINT,
    table_type: *const SQLWCHAR,
    table_type_len: SQLSMALLINT,
) -> SQLRETURN {
    let stmt = state!(hstmt, StmtState);
    if stmt.cursor.is_some() {
        return fail(&mut stmt.diag, "24000", "Invalid cursor state");
    }
    let arguments = catalog_arguments([
        (catalog_name, catalog_len),
        (schema_name, schema_len),
        (table_name, table_len),
        (table_type, table_type_len),
    ]);
    let result = catalog::tables(&stmt.database.tables(), &arguments);
    stmt.database.record(|stats| {
        stats.catalog_calls.push(CatalogCall {
            function: "SQLTablesW",
            arguments: arguments.to_vec(),
        })
    });
    stmt.row_count = -1;
    open_cursor(stmt, result);
    SQL_SUCCESS
}

unsafe extern "system" fn SQLColumnsW(
    hstmt: SQLHSTMT,
    catalog_name: *const SQLWCHAR,
    catalog_len: SQLSMALLINT,
    schema_name: *const SQLWCHAR,
    schema_len: SQLSMALLINT,
    table_name: *const SQLWCHAR,
    table_len: SQLSMALLINT,
    column_name: *const SQLWCHAR,
    column_len: SQLSMALLINT,
) -> SQLRETURN {
    let stmt = state!(hstmt, StmtState);
    if stmt.cursor.is_some() {
        return fail(&mut stmt.diag, "24000", "Invalid cursor state");
    }
    let arguments = catalog_arguments([
        (catalog_name, catalog_len),
        (schema_name, schema_len),
        (table_name, table_len),
        (column_name, column_len),
    ]);
    let result = catalog::columns(&stmt.database.tables(), &arguments);
    stmt.database.record(|stats| {
        stats.catalog_calls.push(CatalogCall {
            function: "SQLColumnsW",
            arguments: arguments.to_vec(),
        })
    });
    stmt.row_count = -1;
    open_cursor(stmt, result);
    SQL_SUCCESS
}

unsafe extern "system" fn SQLGetTypeInfoW(hstmt: SQLHSTMT, data_type: SQLSMALLINT) -> SQLRETURN {
    let stmt = state!(hstmt, StmtState);
    if stmt.cursor.is_some() {
        return fail(&mut stmt.diag, "24000", "Invalid cursor state");
    }
    stmt.database.record(|stats| {
        stats.catalog_calls.push(CatalogCall {
            function: "SQLGetTypeInfoW",
            arguments: vec![Some(data_type.to_string())],
        })
    });
    stmt.row_count = -1;
    open_cursor(stmt, catalog::type_info(data_type));
    SQL_SUCCESS
}

unsafe extern "system" fn SQLGetDiagRecW(
    handle_type: SQLSMALLINT,
    handle: SQLHANDLE,
    record: SQLSMALLINT,
    state: *mut SQLWCHAR,
    native: *mut SQLINTEGER,
    message: *mut SQLWCHAR,
    message_capacity: SQLSMALLINT,
    message_len: *mut SQLSMALLINT,
) -> SQLRETURN {
    if handle.is_null() {
        return SQL_INVALID_HANDLE;
    }
    let diag = match handle_type {
        SQL_HANDLE_ENV => &(*(handle as *mut EnvState)).diag,
        SQL_HANDLE_DBC => &(*(handle as *mut DbcState)).diag,
        SQL_HANDLE_STMT => &(*(handle as *mut StmtState)).diag,
        _ => return SQL_INVALID_HANDLE,
    };
    if record < 1 {
        return SQL_ERROR;
    }
    let Some(diag) = diag.as_ref().filter(|_| record == 1) else {
        return SQL_NO_DATA;
    };

    write_wide(&diag.state, state, 6);
    set(native, 0);
    let (len, cut) = write_wide(&diag.message, message, message_capacity.max(0) as usize);
    set(message_len, len as SQLSMALLINT);
    match cut {
        true => SQL_SUCCESS_WITH_INFO,
        false => SQL_SUCCESS,
    }
}
