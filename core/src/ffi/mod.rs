pub mod constants;
pub mod methods;
pub mod types;

pub use types::{
    FunctionTable, Handle, DATE_STRUCT, SQLHANDLE, SQLINTEGER, SQLLEN, SQLPOINTER, SQLRETURN,
    SQLSMALLINT, SQLUINTEGER, SQLULEN, SQLUSMALLINT, SQLWCHAR, TIMESTAMP_STRUCT, TIME_STRUCT,
};

/// `SQL_SUCCEEDED` from `sql.h`.
pub fn succeeded(rc: SQLRETURN) -> bool {
    rc == constants::SQL_SUCCESS || rc == constants::SQL_SUCCESS_WITH_INFO
}
