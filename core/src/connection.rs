use std::sync::Arc;

use crate::diagnostics::{self, HandleKind};
use crate::environment::Shared;
use crate::error::{Error, Result};
use crate::ffi::constants::{
    SQL_ATTR_ACCESS_MODE, SQL_ATTR_AUTOCOMMIT, SQL_HANDLE_STMT, SQL_IS_UINTEGER,
};
use crate::ffi::types::alloc_handle;
use crate::ffi::{Handle, SQLINTEGER, SQLPOINTER};
use crate::odbc_method;
use crate::options::{AccessMode, AutoCommit};
use crate::registry::ConnectionEntry;
use crate::statement::Statement;

/// Owner of a registered connection. Dropping it cleans the connection up and unlinks it
/// from the registry.
#[derive(Debug)]
struct ConnectionHandle {
    entry: Arc<ConnectionEntry>,
    shared: Arc<Shared>,
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.entry.cleanup(self.shared.functions());
        self.shared.registry.lock().unlink_connection(&self.entry);
    }
}

/// An open database connection.
///
/// Clones share the native connection, which is released when the last clone is dropped,
/// on [Connection::close], or by [crate::Environment::shutdown], whichever comes first.
#[derive(Debug, Clone)]
pub struct Connection {
    handle: Arc<ConnectionHandle>,
}

impl Connection {
    pub(crate) fn new(entry: Arc<ConnectionEntry>, shared: Arc<Shared>) -> Self {
        Self {
            handle: Arc::new(ConnectionHandle { entry, shared }),
        }
    }

    pub(crate) fn entry(&self) -> &ConnectionEntry {
        &self.handle.entry
    }

    pub fn is_open(&self) -> bool {
        self.handle.entry.is_live()
    }

    /// Disconnects. Returns `false` if the connection was already closed.
    pub fn close(&self) -> Result<bool> {
        Ok(self.handle.entry.cleanup(self.handle.shared.functions()))
    }

    /// Allocates a statement. The statement keeps the connection open until it is
    /// dropped, unless the connection is closed explicitly.
    pub fn open_statement(&self) -> Result<Statement> {
        let functions = self.handle.shared.functions();
        let hdbc = self.handle.entry.lock();
        let hdbc = live(*hdbc)?;

        let (rc, hstmt) = alloc_handle(functions, SQL_HANDLE_STMT, Some(hdbc));
        match hstmt {
            Some(hstmt) if crate::ffi::succeeded(rc) => Ok(Statement::new(
                hstmt,
                self.clone(),
                self.handle.shared.clone(),
            )),
            _ => Err(diagnostics::error_for(
                functions,
                HandleKind::Connection,
                Some(hdbc),
            )),
        }
    }

    /// Sets the access mode and autocommit behavior of the connection.
    pub fn set_modes(&self, access: AccessMode, autocommit: AutoCommit) -> Result<()> {
        let functions = self.handle.shared.functions();
        let hdbc = self.handle.entry.lock();
        let hdbc = live(*hdbc)?;

        let set_attr = odbc_method!(functions, SQLSetConnectAttrW);
        let attributes: [(SQLINTEGER, usize); 2] = [
            (SQL_ATTR_ACCESS_MODE, access.into()),
            (SQL_ATTR_AUTOCOMMIT, autocommit.into()),
        ];
        for (attribute, value) in attributes {
            let rc = unsafe {
                set_attr(
                    hdbc.as_raw(),
                    attribute,
                    value as SQLPOINTER,
                    SQL_IS_UINTEGER,
                )
            };
            diagnostics::check(functions, rc, HandleKind::Connection, Some(hdbc))?;
        }
        tracing::debug!(?access, ?autocommit, "connection modes set");
        Ok(())
    }
}

fn live(hdbc: Option<Handle>) -> Result<Handle> {
    hdbc.ok_or_else(|| Error::invalid_state("Connection is closed"))
}
