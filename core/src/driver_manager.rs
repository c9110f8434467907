//! Resolution of the native entry points.

use std::sync::Arc;

use crate::error::{Error, Result, Status};
use crate::ffi::{self, FunctionTable, SQLRETURN};

/// Signature of a static driver init function: fills the entry points it implements.
pub type DriverInitFunc = fn(&mut FunctionTable) -> SQLRETURN;

/// Keeps a loaded library alive as long as the function pointers taken from it.
#[derive(Debug)]
struct DriverInner {
    functions: FunctionTable,
    #[cfg(feature = "driver_manager")]
    _library: Option<libloading::Library>,
}

/// A handle to a set of native entry points. Cheaply clonable.
#[derive(Debug, Clone)]
pub struct DriverManager {
    inner: Arc<DriverInner>,
}

impl DriverManager {
    /// Loads entry points from an init function linked into the process.
    pub fn load_static(init: &DriverInitFunc) -> Result<Self> {
        let mut functions = FunctionTable::default();
        let rc = init(&mut functions);
        if !ffi::succeeded(rc) {
            return Err(Error::with_message_and_status(
                format!("Driver init function returned {}", rc),
                Status::Load,
            ));
        }
        Ok(Self {
            inner: Arc::new(DriverInner {
                functions,
                #[cfg(feature = "driver_manager")]
                _library: None,
            }),
        })
    }

    /// Loads every entry point from the shared library `name`, typically the platform
    /// driver manager (unixODBC, iODBC or `odbc32.dll`).
    #[cfg(feature = "driver_manager")]
    pub fn load_dynamic(name: &str) -> Result<Self> {
        // Safety: the library stays loaded as long as the function table lives.
        let library = unsafe { libloading::Library::new(name)? };

        macro_rules! load_symbols {
            ($($method:ident),* $(,)?) => {
                FunctionTable {
                    $($method: Some(unsafe {
                        symbol(&library, concat!(stringify!($method), "\0"))?
                    }),)*
                }
            };
        }

        let functions = load_symbols!(
            SQLAllocHandle,
            SQLFreeHandle,
            SQLSetEnvAttr,
            SQLSetConnectAttrW,
            SQLDriverConnectW,
            SQLDisconnect,
            SQLPrepareW,
            SQLExecute,
            SQLFreeStmt,
            SQLCloseCursor,
            SQLBindParameter,
            SQLNumResultCols,
            SQLRowCount,
            SQLDescribeColW,
            SQLColAttributeW,
            SQLFetch,
            SQLGetData,
            SQLTablesW,
            SQLColumnsW,
            SQLGetTypeInfoW,
            SQLGetDiagRecW,
        );
        tracing::debug!(name, "driver manager loaded");

        Ok(Self {
            inner: Arc::new(DriverInner {
                functions,
                _library: Some(library),
            }),
        })
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.inner.functions
    }
}

#[cfg(feature = "driver_manager")]
unsafe fn symbol<T: Copy>(library: &libloading::Library, name: &str) -> Result<T> {
    let symbol: libloading::Symbol<T> = library.get(name.as_bytes())?;
    Ok(*symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::constants::{SQL_ERROR, SQL_SUCCESS};

    fn partial_init(functions: &mut FunctionTable) -> SQLRETURN {
        functions.SQLFetch = Some(crate::ffi::methods::SQLFetch);
        SQL_SUCCESS
    }

    fn failing_init(_: &mut FunctionTable) -> SQLRETURN {
        SQL_ERROR
    }

    #[test]
    fn test_load_static() {
        let driver = DriverManager::load_static(&(partial_init as DriverInitFunc)).unwrap();
        assert!(driver.functions().SQLFetch.is_some());
        assert!(driver.functions().SQLExecute.is_none());

        let error = DriverManager::load_static(&(failing_init as DriverInitFunc)).unwrap_err();
        assert_eq!(error.status, Status::Load);
    }

    #[cfg(feature = "driver_manager")]
    #[test]
    fn test_load_dynamic_missing_library() {
        let error = DriverManager::load_dynamic("libodbc_core_does_not_exist.so").unwrap_err();
        assert_eq!(error.status, Status::Load);
    }
}
