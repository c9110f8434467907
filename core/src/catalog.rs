//! Catalog requests mapped onto the native enumeration calls.

use std::fmt::Display;
use std::ptr::null;
use std::str::FromStr;

use widestring::U16CString;

use crate::diagnostics::{self, HandleKind};
use crate::error::{Error, Result};
use crate::ffi::constants::{SQL_ALL_TYPES, SQL_NTS_SMALL};
use crate::ffi::{FunctionTable, Handle, SQLSMALLINT, SQLWCHAR};
use crate::odbc_method;

/// Most filter patterns any catalog request accepts.
pub const MAX_PATTERNS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    /// Patterns: table, schema, catalog, table type.
    Tables,
    /// Patterns: table, column, schema, catalog.
    Columns,
    /// Every data type of the data source. Takes no patterns.
    Types,
}

impl FromStr for CatalogKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tables" => Ok(Self::Tables),
            "columns" => Ok(Self::Columns),
            "types" => Ok(Self::Types),
            _ => Err(Error::invalid_argument(
                "Catalog must be TABLES, COLUMNS, or TYPES",
            )),
        }
    }
}

impl Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Tables => "tables",
            Self::Columns => "columns",
            Self::Types => "types",
        };
        f.write_str(name)
    }
}

/// Pattern arguments in the order the native call takes them.
type NativeArguments = [Option<U16CString>; MAX_PATTERNS];

fn native_arguments(kind: CatalogKind, patterns: &[Option<String>]) -> Result<NativeArguments> {
    if patterns.len() > MAX_PATTERNS {
        return Err(Error::invalid_argument(format!(
            "Catalog request should not have more than {} patterns, got {}",
            MAX_PATTERNS,
            patterns.len()
        )));
    }
    if kind == CatalogKind::Types && patterns.iter().any(Option::is_some) {
        return Err(Error::invalid_argument("Catalog TYPES takes no patterns"));
    }

    let mut given: NativeArguments = Default::default();
    for (slot, pattern) in given.iter_mut().zip(patterns) {
        *slot = pattern
            .as_deref()
            .map(U16CString::from_str)
            .transpose()?;
    }
    let [p0, p1, p2, p3] = given;

    Ok(match kind {
        // catalog, schema, table, table type
        CatalogKind::Tables => [p2, p1, p0, p3],
        // catalog, schema, table, column
        CatalogKind::Columns => [p3, p2, p0, p1],
        CatalogKind::Types => [None, None, None, None],
    })
}

/// Runs a catalog request on `hstmt`, leaving its result set open like an executed query.
pub fn query_catalog(
    functions: &FunctionTable,
    hstmt: Handle,
    kind: CatalogKind,
    patterns: &[Option<String>],
) -> Result<()> {
    let arguments = native_arguments(kind, patterns)?;
    tracing::debug!(%kind, ?patterns, "catalog request");

    let ptr = |index: usize| -> *const SQLWCHAR {
        arguments[index]
            .as_ref()
            .map(|s| s.as_ptr())
            .unwrap_or(null())
    };
    let len: SQLSMALLINT = SQL_NTS_SMALL;

    let rc = match kind {
        CatalogKind::Tables => {
            let method = odbc_method!(functions, SQLTablesW);
            unsafe { method(hstmt.as_raw(), ptr(0), len, ptr(1), len, ptr(2), len, ptr(3), len) }
        }
        CatalogKind::Columns => {
            let method = odbc_method!(functions, SQLColumnsW);
            unsafe { method(hstmt.as_raw(), ptr(0), len, ptr(1), len, ptr(2), len, ptr(3), len) }
        }
        CatalogKind::Types => {
            let method = odbc_method!(functions, SQLGetTypeInfoW);
            unsafe { method(hstmt.as_raw(), SQL_ALL_TYPES) }
        }
    };
    diagnostics::check(functions, rc, HandleKind::Statement, Some(hstmt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Status;

    fn decoded(arguments: NativeArguments) -> Vec<Option<String>> {
        arguments
            .into_iter()
            .map(|a| a.map(|s| s.to_string_lossy()))
            .collect()
    }

    fn patterns(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(String::from)).collect()
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("TABLES".parse::<CatalogKind>().unwrap(), CatalogKind::Tables);
        assert_eq!("columns".parse::<CatalogKind>().unwrap(), CatalogKind::Columns);
        assert_eq!("Types".parse::<CatalogKind>().unwrap(), CatalogKind::Types);
        let error = "views".parse::<CatalogKind>().unwrap_err();
        assert_eq!(error.status, Status::InvalidArguments);
    }

    #[test]
    fn test_tables_order() {
        let given = patterns(&[Some("t"), Some("s"), Some("c"), Some("TABLE")]);
        let arguments = native_arguments(CatalogKind::Tables, &given).unwrap();
        assert_eq!(
            decoded(arguments),
            patterns(&[Some("c"), Some("s"), Some("t"), Some("TABLE")])
        );
    }

    #[test]
    fn test_columns_order() {
        let given = patterns(&[Some("t"), Some("col"), None]);
        let arguments = native_arguments(CatalogKind::Columns, &given).unwrap();
        assert_eq!(
            decoded(arguments),
            patterns(&[None, None, Some("t"), Some("col")])
        );
    }

    #[test]
    fn test_pattern_limits() {
        let given = patterns(&[None, None, None, None, None]);
        let error = native_arguments(CatalogKind::Tables, &given).unwrap_err();
        assert_eq!(error.status, Status::InvalidArguments);

        let error = native_arguments(CatalogKind::Types, &patterns(&[Some("x")])).unwrap_err();
        assert_eq!(error.status, Status::InvalidArguments);
        assert!(native_arguments(CatalogKind::Types, &patterns(&[None])).is_ok());

        let error =
            native_arguments(CatalogKind::Tables, &patterns(&[Some("a\0b")])).unwrap_err();
        assert_eq!(error.status, Status::InvalidArguments);
    }
}
