use std::ptr::null_mut;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use widestring::U16CString;

use crate::connection::Connection;
use crate::diagnostics::{self, HandleKind};
use crate::driver_manager::DriverManager;
use crate::error::{Error, Result};
use crate::ffi::constants::*;
use crate::ffi::types::alloc_handle;
use crate::ffi::{FunctionTable, Handle, SQLINTEGER, SQLPOINTER, SQLSMALLINT};
use crate::odbc_method;
use crate::options::{CharEncoding, EnvironmentOptions};
use crate::registry::{self, ConnectionEntry, Registry, RegistryStats, SweepReport};

/// State shared by an environment and every object opened from it.
#[derive(Debug)]
pub(crate) struct Shared {
    driver: DriverManager,
    pub(crate) registry: Mutex<Registry>,
    encoding: RwLock<CharEncoding>,
    options: EnvironmentOptions,
}

impl Shared {
    pub(crate) fn functions(&self) -> &FunctionTable {
        self.driver.functions()
    }

    pub(crate) fn char_encoding(&self) -> CharEncoding {
        *self.encoding.read()
    }

    pub(crate) fn long_text_ceiling(&self) -> usize {
        self.options.long_text_ceiling
    }
}

/// The native environment: one lazily allocated environment handle plus the registries
/// of everything opened under it.
#[derive(Debug, Clone)]
pub struct Environment {
    shared: Arc<Shared>,
}

#[cfg(feature = "driver_manager")]
static GLOBAL: once_cell::sync::OnceCell<Environment> = once_cell::sync::OnceCell::new();

impl Environment {
    pub fn new(driver: DriverManager, options: EnvironmentOptions) -> Self {
        Self {
            shared: Arc::new(Shared {
                driver,
                registry: Mutex::new(Registry::default()),
                encoding: RwLock::new(options.char_encoding),
                options,
            }),
        }
    }

    /// The process-wide environment over the platform driver manager, configured from
    /// [EnvironmentOptions::from_env].
    #[cfg(feature = "driver_manager")]
    pub fn global() -> Result<&'static Environment> {
        GLOBAL.get_or_try_init(|| {
            let options = EnvironmentOptions::from_env()?;
            let driver = DriverManager::load_dynamic(&options.driver_manager)?;
            Ok(Self::new(driver, options))
        })
    }

    pub fn options(&self) -> &EnvironmentOptions {
        &self.shared.options
    }

    pub fn char_encoding(&self) -> CharEncoding {
        self.shared.char_encoding()
    }

    /// Sets the encoding used for text parameters and narrow columns of result sets
    /// described from now on.
    pub fn set_char_encoding(&self, encoding: CharEncoding) {
        tracing::debug!(%encoding, "character encoding changed");
        *self.shared.encoding.write() = encoding;
    }

    /// Checks that nothing is left over from a previous session.
    pub fn startup(&self) -> Result<()> {
        let stats = self.stats();
        if stats.environment_allocated || stats.live_connections > 0 || stats.live_column_lists > 0
        {
            return Err(Error::invalid_state(format!(
                "Environment already started: {:?}",
                stats
            )));
        }
        Ok(())
    }

    /// Connects with a driver connection string, never prompting.
    pub fn open_connection(&self, connection_string: &str) -> Result<Connection> {
        let functions = self.shared.functions();
        let connection_string = U16CString::from_str(connection_string)?;
        let connection_len = SQLSMALLINT::try_from(connection_string.len())
            .map_err(|_| Error::invalid_argument("Connection string is too long"))?;

        // Connecting may block for the login timeout, so the registry is only locked to
        // find the environment handle and, later, to register the connection.
        let henv = environment_handle(functions, &mut self.shared.registry.lock())?;

        let (rc, hdbc) = alloc_handle(functions, SQL_HANDLE_DBC, Some(henv));
        let hdbc = match hdbc {
            Some(hdbc) if crate::ffi::succeeded(rc) => hdbc,
            _ => {
                return Err(diagnostics::error_for(
                    functions,
                    HandleKind::Environment,
                    Some(henv),
                ))
            }
        };

        let timeout = self.shared.options.login_timeout.as_secs() as usize;
        let set_attr = odbc_method!(functions, SQLSetConnectAttrW);
        let rc = unsafe {
            set_attr(
                hdbc.as_raw(),
                SQL_ATTR_LOGIN_TIMEOUT,
                timeout as SQLPOINTER,
                SQL_IS_UINTEGER,
            )
        };
        if let Err(error) = diagnostics::check(functions, rc, HandleKind::Connection, Some(hdbc)) {
            registry::free_handle(functions, SQL_HANDLE_DBC, hdbc);
            return Err(error);
        }

        let connect = odbc_method!(functions, SQLDriverConnectW);
        let rc = unsafe {
            connect(
                hdbc.as_raw(),
                null_mut(),
                connection_string.as_ptr(),
                connection_len,
                null_mut(),
                0,
                null_mut(),
                SQL_DRIVER_NOPROMPT,
            )
        };
        if let Err(error) = diagnostics::check(functions, rc, HandleKind::Connection, Some(hdbc)) {
            registry::free_handle(functions, SQL_HANDLE_DBC, hdbc);
            return Err(error);
        }

        let entry = Arc::new(ConnectionEntry::new(hdbc));
        self.shared.registry.lock().register_connection(entry.clone());
        tracing::debug!("connection opened");
        Ok(Connection::new(entry, self.shared.clone()))
    }

    /// Cleans up every outstanding connection and result set, then frees the environment
    /// handle. Objects still held stay usable only for closing.
    pub fn shutdown(&self) -> SweepReport {
        registry::sweep(&self.shared.registry, self.shared.functions())
    }

    pub fn stats(&self) -> RegistryStats {
        self.shared.registry.lock().stats()
    }
}

/// Returns the environment handle, allocating it and selecting ODBC 3 behavior first.
fn environment_handle(functions: &FunctionTable, registry: &mut Registry) -> Result<Handle> {
    if let Some(henv) = registry.henv() {
        return Ok(henv);
    }

    let (rc, henv) = alloc_handle(functions, SQL_HANDLE_ENV, None);
    let henv = match henv {
        Some(henv) if crate::ffi::succeeded(rc) => henv,
        henv => return Err(diagnostics::error_for(functions, HandleKind::Environment, henv)),
    };

    let set_attr = odbc_method!(functions, SQLSetEnvAttr);
    let rc = unsafe {
        set_attr(
            henv.as_raw(),
            SQL_ATTR_ODBC_VERSION,
            SQL_OV_ODBC3 as SQLPOINTER,
            0 as SQLINTEGER,
        )
    };
    if let Err(error) = diagnostics::check(functions, rc, HandleKind::Environment, Some(henv)) {
        registry::free_handle(functions, SQL_HANDLE_ENV, henv);
        return Err(error);
    }

    tracing::debug!("environment handle allocated");
    registry.set_henv(henv);
    Ok(henv)
}
