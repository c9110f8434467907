#![allow(non_camel_case_types, non_snake_case)]

use std::fmt::Debug;
use std::os::raw::c_void;
use std::ptr::null_mut;

use super::methods;

pub type SQLHANDLE = *mut c_void;
pub type SQLHENV = SQLHANDLE;
pub type SQLHDBC = SQLHANDLE;
pub type SQLHSTMT = SQLHANDLE;
pub type SQLHWND = *mut c_void;
pub type SQLPOINTER = *mut c_void;
pub type SQLRETURN = i16;
pub type SQLSMALLINT = i16;
pub type SQLUSMALLINT = u16;
pub type SQLINTEGER = i32;
pub type SQLUINTEGER = u32;
pub type SQLLEN = isize;
pub type SQLULEN = usize;
pub type SQLWCHAR = u16;

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DATE_STRUCT {
    pub year: SQLSMALLINT,
    pub month: SQLUSMALLINT,
    pub day: SQLUSMALLINT,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TIME_STRUCT {
    pub hour: SQLUSMALLINT,
    pub minute: SQLUSMALLINT,
    pub second: SQLUSMALLINT,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TIMESTAMP_STRUCT {
    pub year: SQLSMALLINT,
    pub month: SQLUSMALLINT,
    pub day: SQLUSMALLINT,
    pub hour: SQLUSMALLINT,
    pub minute: SQLUSMALLINT,
    pub second: SQLUSMALLINT,
    /// Billionths of a second.
    pub fraction: SQLUINTEGER,
}

/// A non-null native handle of any kind.
///
/// The wrapper only carries the pointer; which kind it is, and whether it is still
/// allocated, is tracked by its owner.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(SQLHANDLE);

unsafe impl Send for Handle {}
unsafe impl Sync for Handle {}

impl Handle {
    pub fn from_raw(raw: SQLHANDLE) -> Option<Self> {
        (!raw.is_null()).then_some(Self(raw))
    }

    pub fn as_raw(self) -> SQLHANDLE {
        self.0
    }
}

/// Entry points of the call-level API.
///
/// A missing entry falls back to a stub reporting `SQL_ERROR`, see [odbc_method].
#[derive(Default, Clone)]
pub struct FunctionTable {
    pub SQLAllocHandle: Option<methods::FuncSQLAllocHandle>,
    pub SQLFreeHandle: Option<methods::FuncSQLFreeHandle>,
    pub SQLSetEnvAttr: Option<methods::FuncSQLSetEnvAttr>,
    pub SQLSetConnectAttrW: Option<methods::FuncSQLSetConnectAttrW>,
    pub SQLDriverConnectW: Option<methods::FuncSQLDriverConnectW>,
    pub SQLDisconnect: Option<methods::FuncSQLDisconnect>,
    pub SQLPrepareW: Option<methods::FuncSQLPrepareW>,
    pub SQLExecute: Option<methods::FuncSQLExecute>,
    pub SQLFreeStmt: Option<methods::FuncSQLFreeStmt>,
    pub SQLCloseCursor: Option<methods::FuncSQLCloseCursor>,
    pub SQLBindParameter: Option<methods::FuncSQLBindParameter>,
    pub SQLNumResultCols: Option<methods::FuncSQLNumResultCols>,
    pub SQLRowCount: Option<methods::FuncSQLRowCount>,
    pub SQLDescribeColW: Option<methods::FuncSQLDescribeColW>,
    pub SQLColAttributeW: Option<methods::FuncSQLColAttributeW>,
    pub SQLFetch: Option<methods::FuncSQLFetch>,
    pub SQLGetData: Option<methods::FuncSQLGetData>,
    pub SQLTablesW: Option<methods::FuncSQLTablesW>,
    pub SQLColumnsW: Option<methods::FuncSQLColumnsW>,
    pub SQLGetTypeInfoW: Option<methods::FuncSQLGetTypeInfoW>,
    pub SQLGetDiagRecW: Option<methods::FuncSQLGetDiagRecW>,
}

impl Debug for FunctionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let loaded = [
            self.SQLAllocHandle.is_some(),
            self.SQLFreeHandle.is_some(),
            self.SQLSetEnvAttr.is_some(),
            self.SQLSetConnectAttrW.is_some(),
            self.SQLDriverConnectW.is_some(),
            self.SQLDisconnect.is_some(),
            self.SQLPrepareW.is_some(),
            self.SQLExecute.is_some(),
            self.SQLFreeStmt.is_some(),
            self.SQLCloseCursor.is_some(),
            self.SQLBindParameter.is_some(),
            self.SQLNumResultCols.is_some(),
            self.SQLRowCount.is_some(),
            self.SQLDescribeColW.is_some(),
            self.SQLColAttributeW.is_some(),
            self.SQLFetch.is_some(),
            self.SQLGetData.is_some(),
            self.SQLTablesW.is_some(),
            self.SQLColumnsW.is_some(),
            self.SQLGetTypeInfoW.is_some(),
            self.SQLGetDiagRecW.is_some(),
        ];
        f.debug_struct("FunctionTable")
            .field("loaded", &loaded.iter().filter(|x| **x).count())
            .field("total", &loaded.len())
            .finish()
    }
}

#[macro_export]
macro_rules! odbc_method {
    ($functions:expr, $method:ident) => {
        $functions
            .$method
            .unwrap_or($crate::ffi::methods::$method)
    };
}

/// Allocates a handle of `handle_type` under `parent`, returning the raw status and the
/// handle if one was produced.
pub(crate) fn alloc_handle(
    functions: &FunctionTable,
    handle_type: SQLSMALLINT,
    parent: Option<Handle>,
) -> (SQLRETURN, Option<Handle>) {
    let mut output: SQLHANDLE = null_mut();
    let method = odbc_method!(functions, SQLAllocHandle);
    let parent = parent.map(Handle::as_raw).unwrap_or(null_mut());
    let rc = unsafe { method(handle_type, parent, &mut output) };
    (rc, Handle::from_raw(output))
}
