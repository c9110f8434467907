#![allow(non_snake_case)]

use super::constants::SQL_ERROR;
use super::types::*;

// SQLAllocHandle
pub type FuncSQLAllocHandle = unsafe extern "system" fn(
    SQLSMALLINT,
    SQLHANDLE,
    *mut SQLHANDLE,
) -> SQLRETURN;
pub unsafe extern "system" fn SQLAllocHandle(
    _: SQLSMALLINT,
    _: SQLHANDLE,
    _: *mut SQLHANDLE,
) -> SQLRETURN {
    SQL_ERROR
}

// SQLFreeHandle
pub type FuncSQLFreeHandle = unsafe extern "system" fn(SQLSMALLINT, SQLHANDLE) -> SQLRETURN;
pub unsafe extern "system" fn SQLFreeHandle(_: SQLSMALLINT, _: SQLHANDLE) -> SQLRETURN {
    SQL_ERROR
}

// SQLSetEnvAttr
pub type FuncSQLSetEnvAttr = unsafe extern "system" fn(
    SQLHENV,
    SQLINTEGER,
    SQLPOINTER,
    SQLINTEGER,
) -> SQLRETURN;
pub unsafe extern "system" fn SQLSetEnvAttr(
    _: SQLHENV,
    _: SQLINTEGER,
    _: SQLPOINTER,
    _: SQLINTEGER,
) -> SQLRETURN {
    SQL_ERROR
}

// SQLSetConnectAttrW
pub type FuncSQLSetConnectAttrW = unsafe extern "system" fn(
    SQLHDBC,
    SQLINTEGER,
    SQLPOINTER,
    SQLINTEGER,
) -> SQLRETURN;
pub unsafe extern "system" fn SQLSetConnectAttrW(
    _: SQLHDBC,
    _: SQLINTEGER,
    _: SQLPOINTER,
    _: SQLINTEGER,
) -> SQLRETURN {
    SQL_ERROR
}

// SQLDriverConnectW
pub type FuncSQLDriverConnectW = unsafe extern "system" fn(
    SQLHDBC,
    SQLHWND,
    *const SQLWCHAR,
    SQLSMALLINT,
    *mut SQLWCHAR,
    SQLSMALLINT,
    *mut SQLSMALLINT,
    SQLUSMALLINT,
) -> SQLRETURN;
pub unsafe extern "system" fn SQLDriverConnectW(
    _: SQLHDBC,
    _: SQLHWND,
    _: *const SQLWCHAR,
    _: SQLSMALLINT,
    _: *mut SQLWCHAR,
    _: SQLSMALLINT,
    _: *mut SQLSMALLINT,
    _: SQLUSMALLINT,
) -> SQLRETURN {
    SQL_ERROR
}

// SQLDisconnect
pub type FuncSQLDisconnect = unsafe extern "system" fn(SQLHDBC) -> SQLRETURN;
pub unsafe extern "system" fn SQLDisconnect(_: SQLHDBC) -> SQLRETURN {
    SQL_ERROR
}

// SQLPrepareW
pub type FuncSQLPrepareW = unsafe extern "system" fn(
    SQLHSTMT,
    *const SQLWCHAR,
    SQLINTEGER,
) -> SQLRETURN;
pub unsafe extern "system" fn SQLPrepareW(
    _: SQLHSTMT,
    _: *const SQLWCHAR,
    _: SQLINTEGER,
) -> SQLRETURN {
    SQL_ERROR
}

// SQLExecute
pub type FuncSQLExecute = unsafe extern "system" fn(SQLHSTMT) -> SQLRETURN;
pub unsafe extern "system" fn SQLExecute(_: SQLHSTMT) -> SQLRETURN {
    SQL_ERROR
}

// SQLFreeStmt
pub type FuncSQLFreeStmt = unsafe extern "system" fn(SQLHSTMT, SQLUSMALLINT) -> SQLRETURN;
pub unsafe extern "system" fn SQLFreeStmt(_: SQLHSTMT, _: SQLUSMALLINT) -> SQLRETURN {
    SQL_ERROR
}

// SQLCloseCursor
pub type FuncSQLCloseCursor = unsafe extern "system" fn(SQLHSTMT) -> SQLRETURN;
pub unsafe extern "system" fn SQLCloseCursor(_: SQLHSTMT) -> SQLRETURN {
    SQL_ERROR
}

// SQLBindParameter
pub type FuncSQLBindParameter = unsafe extern "system" fn(
    SQLHSTMT,
    SQLUSMALLINT,
    SQLSMALLINT,
    SQLSMALLINT,
    SQLSMALLINT,
    SQLULEN,
    SQLSMALLINT,
    SQLPOINTER,
    SQLLEN,
    *mut SQLLEN,
) -> SQLRETURN;
pub unsafe extern "system" fn SQLBindParameter(
    _: SQLHSTMT,
    _: SQLUSMALLINT,
    _: SQLSMALLINT,
    _: SQLSMALLINT,
    _: SQLSMALLINT,
    _: SQLULEN,
    _: SQLSMALLINT,
    _: SQLPOINTER,
    _: SQLLEN,
    _: *mut SQLLEN,
) -> SQLRETURN {
    SQL_ERROR
}

// SQLNumResultCols
pub type FuncSQLNumResultCols = unsafe extern "system" fn(SQLHSTMT, *mut SQLSMALLINT) -> SQLRETURN;
pub unsafe extern "system" fn SQLNumResultCols(
    _: SQLHSTMT,
    _: *mut SQLSMALLINT,
) -> SQLRETURN {
    SQL_ERROR
}

// SQLRowCount
pub type FuncSQLRowCount = unsafe extern "system" fn(SQLHSTMT, *mut SQLLEN) -> SQLRETURN;
pub unsafe extern "system" fn SQLRowCount(_: SQLHSTMT, _: *mut SQLLEN) -> SQLRETURN {
    SQL_ERROR
}

// SQLDescribeColW
pub type FuncSQLDescribeColW = unsafe extern "system" fn(
    SQLHSTMT,
    SQLUSMALLINT,
    *mut SQLWCHAR,
    SQLSMALLINT,
    *mut SQLSMALLINT,
    *mut SQLSMALLINT,
    *mut SQLULEN,
    *mut SQLSMALLINT,
    *mut SQLSMALLINT,
) -> SQLRETURN;
pub unsafe extern "system" fn SQLDescribeColW(
    _: SQLHSTMT,
    _: SQLUSMALLINT,
    _: *mut SQLWCHAR,
    _: SQLSMALLINT,
    _: *mut SQLSMALLINT,
    _: *mut SQLSMALLINT,
    _: *mut SQLULEN,
    _: *mut SQLSMALLINT,
    _: *mut SQLSMALLINT,
) -> SQLRETURN {
    SQL_ERROR
}

// SQLColAttributeW
pub type FuncSQLColAttributeW = unsafe extern "system" fn(
    SQLHSTMT,
    SQLUSMALLINT,
    SQLUSMALLINT,
    SQLPOINTER,
    SQLSMALLINT,
    *mut SQLSMALLINT,
    *mut SQLLEN,
) -> SQLRETURN;
pub unsafe extern "system" fn SQLColAttributeW(
    _: SQLHSTMT,
    _: SQLUSMALLINT,
    _: SQLUSMALLINT,
    _: SQLPOINTER,
    _: SQLSMALLINT,
    _: *mut SQLSMALLINT,
    _: *mut SQLLEN,
) -> SQLRETURN {
    SQL_ERROR
}

// SQLFetch
pub type FuncSQLFetch = unsafe extern "system" fn(SQLHSTMT) -> SQLRETURN;
pub unsafe extern "system" fn SQLFetch(_: SQLHSTMT) -> SQLRETURN {
    SQL_ERROR
}

// SQLGetData
pub type FuncSQLGetData = unsafe extern "system" fn(
    SQLHSTMT,
    SQLUSMALLINT,
    SQLSMALLINT,
    SQLPOINTER,
    SQLLEN,
    *mut SQLLEN,
) -> SQLRETURN;
pub unsafe extern "system" fn SQLGetData(
    _: SQLHSTMT,
    _: SQLUSMALLINT,
    _: SQLSMALLINT,
    _: SQLPOINTER,
    _: SQLLEN,
    _: *mut SQLLEN,
) -> SQLRETURN {
    SQL_ERROR
}

// SQLTablesW
pub type FuncSQLTablesW = unsafe extern "system" fn(
    SQLHSTMT,
    *const SQLWCHAR,
    SQLSMALLINT,
    *const SQLWCHAR,
    SQLSMALLINT,
    *const SQLWCHAR,
    SQLSMALLINT,
    *const SQLWCHAR,
    SQLSMALLINT,
) -> SQLRETURN;
pub unsafe extern "system" fn SQLTablesW(
    _: SQLHSTMT,
    _: *const SQLWCHAR,
    _: SQLSMALLINT,
    _: *const SQLWCHAR,
    _: SQLSMALLINT,
    _: *const SQLWCHAR,
    _: SQLSMALLINT,
    _: *const SQLWCHAR,
    _: SQLSMALLINT,
) -> SQLRETURN {
    SQL_ERROR
}

// SQLColumnsW
pub type FuncSQLColumnsW = unsafe extern "system" fn(
    SQLHSTMT,
    *const SQLWCHAR,
    SQLSMALLINT,
    *const SQLWCHAR,
    SQLSMALLINT,
    *const SQLWCHAR,
    SQLSMALLINT,
    *const SQLWCHAR,
    SQLSMALLINT,
) -> SQLRETURN;
pub unsafe extern "system" fn SQLColumnsW(
    _: SQLHSTMT,
    _: *const SQLWCHAR,
    _: SQLSMALLINT,
    _: *const SQLWCHAR,
    _: SQLSMALLINT,
    _: *const SQLWCHAR,
    _: SQLSMALLINT,
    _: *const SQLWCHAR,
    _: SQLSMALLINT,
) -> SQLRETURN {
    SQL_ERROR
}

// SQLGetTypeInfoW
pub type FuncSQLGetTypeInfoW = unsafe extern "system" fn(SQLHSTMT, SQLSMALLINT) -> SQLRETURN;
pub unsafe extern "system" fn SQLGetTypeInfoW(_: SQLHSTMT, _: SQLSMALLINT) -> SQLRETURN {
    SQL_ERROR
}

// SQLGetDiagRecW
pub type FuncSQLGetDiagRecW = unsafe extern "system" fn(
    SQLSMALLINT,
    SQLHANDLE,
    SQLSMALLINT,
    *mut SQLWCHAR,
    *mut SQLINTEGER,
    *mut SQLWCHAR,
    SQLSMALLINT,
    *mut SQLSMALLINT,
) -> SQLRETURN;
pub unsafe extern "system" fn SQLGetDiagRecW(
    _: SQLSMALLINT,
    _: SQLHANDLE,
    _: SQLSMALLINT,
    _: *mut SQLWCHAR,
    _: *mut SQLINTEGER,
    _: *mut SQLWCHAR,
    _: SQLSMALLINT,
    _: *mut SQLSMALLINT,
) -> SQLRETURN {
    SQL_ERROR
}
