//! Side-lists of every connection and column list still holding native resources.
//!
//! Entries are linked at the head of their list when created and unlinked when their
//! owner is dropped. The lists exist so that [sweep] can release everything that is
//! still outstanding, whoever still holds the owners.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::columns::Column;
use crate::ffi::constants::{SQL_HANDLE_DBC, SQL_HANDLE_ENV};
use crate::ffi::{FunctionTable, Handle};
use crate::odbc_method;

/// A native connection, `None` once cleaned up.
///
/// `live` mirrors the handle so that the registry can count live entries without taking
/// their locks, which statements hold while calling into the driver.
#[derive(Debug)]
pub struct ConnectionEntry {
    hdbc: Mutex<Option<Handle>>,
    live: AtomicBool,
}

impl ConnectionEntry {
    pub(crate) fn new(hdbc: Handle) -> Self {
        Self {
            hdbc: Mutex::new(Some(hdbc)),
            live: AtomicBool::new(true),
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Holds off cleanup while statements of this connection call into the driver.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Option<Handle>> {
        self.hdbc.lock()
    }

    /// Disconnects and frees the handle. Returns whether there was anything to release.
    pub(crate) fn cleanup(&self, functions: &FunctionTable) -> bool {
        let mut hdbc = self.hdbc.lock();
        let Some(handle) = hdbc.take() else {
            return false;
        };
        self.live.store(false, Ordering::Release);

        let disconnect = odbc_method!(functions, SQLDisconnect);
        let rc = unsafe { disconnect(handle.as_raw()) };
        if !crate::ffi::succeeded(rc) {
            tracing::warn!(rc, "SQLDisconnect failed during cleanup");
        }
        free_handle(functions, SQL_HANDLE_DBC, handle);
        tracing::debug!("connection cleaned up");
        true
    }
}

/// Described columns of a statement's current result set, `None` once cleaned up.
#[derive(Debug)]
pub struct ColumnListEntry {
    columns: Mutex<Option<Vec<Column>>>,
    live: AtomicBool,
}

impl ColumnListEntry {
    pub(crate) fn new(columns: Vec<Column>) -> Self {
        Self {
            columns: Mutex::new(Some(columns)),
            live: AtomicBool::new(true),
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Option<Vec<Column>>> {
        self.columns.lock()
    }

    /// Releases every column buffer and title.
    pub(crate) fn cleanup(&self) -> bool {
        let mut columns = self.columns.lock();
        self.live.store(false, Ordering::Release);
        columns.take().is_some()
    }
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    henv: Option<Handle>,
    connections: VecDeque<Arc<ConnectionEntry>>,
    column_lists: VecDeque<Arc<ColumnListEntry>>,
}

/// Snapshot of the registry, see [crate::Environment::stats].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    pub connections: usize,
    pub live_connections: usize,
    pub column_lists: usize,
    pub live_column_lists: usize,
    pub environment_allocated: bool,
}

/// What a [sweep] released.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub connections: usize,
    pub column_lists: usize,
    pub environment_freed: bool,
}

impl Registry {
    pub(crate) fn henv(&self) -> Option<Handle> {
        self.henv
    }

    pub(crate) fn set_henv(&mut self, henv: Handle) {
        self.henv = Some(henv);
    }

    pub(crate) fn register_connection(&mut self, entry: Arc<ConnectionEntry>) {
        self.connections.push_front(entry);
    }

    pub(crate) fn register_column_list(&mut self, entry: Arc<ColumnListEntry>) {
        self.column_lists.push_front(entry);
    }

    pub(crate) fn unlink_connection(&mut self, entry: &Arc<ConnectionEntry>) -> bool {
        unlink(&mut self.connections, entry)
    }

    pub(crate) fn unlink_column_list(&mut self, entry: &Arc<ColumnListEntry>) -> bool {
        unlink(&mut self.column_lists, entry)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.henv.is_none() && self.connections.is_empty() && self.column_lists.is_empty()
    }

    pub(crate) fn stats(&self) -> RegistryStats {
        RegistryStats {
            connections: self.connections.len(),
            live_connections: self.connections.iter().filter(|e| e.is_live()).count(),
            column_lists: self.column_lists.len(),
            live_column_lists: self.column_lists.iter().filter(|e| e.is_live()).count(),
            environment_allocated: self.henv.is_some(),
        }
    }
}

fn unlink<T>(list: &mut VecDeque<Arc<T>>, entry: &Arc<T>) -> bool {
    match list.iter().position(|e| Arc::ptr_eq(e, entry)) {
        Some(index) => list.remove(index).is_some(),
        None => false,
    }
}

pub(crate) fn free_handle(functions: &FunctionTable, handle_type: i16, handle: Handle) {
    let method = odbc_method!(functions, SQLFreeHandle);
    let rc = unsafe { method(handle_type, handle.as_raw()) };
    if !crate::ffi::succeeded(rc) {
        tracing::warn!(rc, handle_type, "SQLFreeHandle failed during cleanup");
    }
}

/// Cleans up every registered column list and connection, then frees the environment
/// handle. Entries stay linked until their owners are dropped.
///
/// The lists are snapshotted first so that owners dropped during the sweep can unlink
/// themselves without waiting on it.
pub(crate) fn sweep(registry: &Mutex<Registry>, functions: &FunctionTable) -> SweepReport {
    let (connections, column_lists) = {
        let registry = registry.lock();
        (
            registry.connections.iter().cloned().collect::<Vec<_>>(),
            registry.column_lists.iter().cloned().collect::<Vec<_>>(),
        )
    };

    let column_lists = column_lists.iter().filter(|e| e.cleanup()).count();
    let connections = connections.iter().filter(|e| e.cleanup(functions)).count();

    let henv = registry.lock().henv.take();
    if let Some(henv) = henv {
        free_handle(functions, SQL_HANDLE_ENV, henv);
    }

    let report = SweepReport {
        connections,
        column_lists,
        environment_freed: henv.is_some(),
    };
    tracing::debug!(?report, "shutdown sweep");
    report
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::ptr::NonNull;

    use super::*;
    use crate::columns::{ColumnDescription, FetchPlan, FetchType};
    use crate::ffi::constants::SQL_SUCCESS;
    use crate::ffi::types::{SQLHANDLE, SQLHDBC, SQLRETURN, SQLSMALLINT};

    thread_local! {
        static DISCONNECTS: Cell<usize> = Cell::new(0);
        static FREES: Cell<usize> = Cell::new(0);
    }

    unsafe extern "system" fn disconnect(_: SQLHDBC) -> SQLRETURN {
        DISCONNECTS.with(|c| c.set(c.get() + 1));
        SQL_SUCCESS
    }

    unsafe extern "system" fn free(_: SQLSMALLINT, _: SQLHANDLE) -> SQLRETURN {
        FREES.with(|c| c.set(c.get() + 1));
        SQL_SUCCESS
    }

    fn functions() -> FunctionTable {
        DISCONNECTS.with(|c| c.set(0));
        FREES.with(|c| c.set(0));
        FunctionTable {
            SQLDisconnect: Some(disconnect),
            SQLFreeHandle: Some(free),
            ..Default::default()
        }
    }

    fn fake_handle() -> Handle {
        Handle::from_raw(NonNull::<u8>::dangling().as_ptr().cast()).unwrap()
    }

    fn column_list() -> ColumnListEntry {
        let description = ColumnDescription {
            title: "ID".into(),
            sql_type: crate::ffi::constants::SQL_INTEGER,
            column_size: 10,
            precision: 0,
            nullable: 0,
            unsigned: false,
        };
        let plan = FetchPlan {
            fetch_type: FetchType::SLong,
            buffer_size: 4,
            extendable: false,
        };
        ColumnListEntry::new(vec![Column::new(description, plan)])
    }

    #[test]
    fn test_connection_cleanup_is_idempotent() {
        let functions = functions();
        let entry = ConnectionEntry::new(fake_handle());
        assert!(entry.is_live());
        assert!(entry.cleanup(&functions));
        assert!(!entry.cleanup(&functions));
        assert!(!entry.is_live());
        assert_eq!(DISCONNECTS.with(Cell::get), 1);
        assert_eq!(FREES.with(Cell::get), 1);
    }

    #[test]
    fn test_column_list_cleanup_is_idempotent() {
        let entry = column_list();
        assert!(entry.cleanup());
        assert!(!entry.cleanup());
        assert!(entry.lock().is_none());
    }

    #[test]
    fn test_stats_while_entries_are_locked() {
        let functions = functions();
        let mut registry = Registry::default();
        let connection = Arc::new(ConnectionEntry::new(fake_handle()));
        let columns = Arc::new(column_list());
        registry.register_connection(connection.clone());
        registry.register_column_list(columns.clone());

        // A statement holds both while fetching.
        let hdbc = connection.lock();
        let list = columns.lock();
        let stats = registry.stats();
        assert_eq!(stats.live_connections, 1);
        assert_eq!(stats.live_column_lists, 1);
        drop(list);
        drop(hdbc);

        assert!(connection.cleanup(&functions));
        assert!(columns.cleanup());
        let stats = registry.stats();
        assert_eq!(stats.live_connections, 0);
        assert_eq!(stats.live_column_lists, 0);
    }

    #[test]
    fn test_register_at_head_and_unlink() {
        let mut registry = Registry::default();
        let first = Arc::new(column_list());
        let second = Arc::new(column_list());
        registry.register_column_list(first.clone());
        registry.register_column_list(second.clone());
        assert!(Arc::ptr_eq(&registry.column_lists[0], &second));

        assert!(registry.unlink_column_list(&first));
        assert!(!registry.unlink_column_list(&first));
        assert_eq!(registry.stats().column_lists, 1);
    }

    #[test]
    fn test_sweep() {
        let functions = functions();
        let registry = Mutex::new(Registry::default());
        let connections: Vec<_> = (0..2)
            .map(|_| Arc::new(ConnectionEntry::new(fake_handle())))
            .collect();
        let columns = Arc::new(column_list());
        {
            let mut registry = registry.lock();
            registry.set_henv(fake_handle());
            connections
                .iter()
                .for_each(|c| registry.register_connection(c.clone()));
            registry.register_column_list(columns.clone());
        }
        // Already cleaned entries are skipped.
        assert!(connections[1].cleanup(&functions));

        let report = sweep(&registry, &functions);
        assert_eq!(
            report,
            SweepReport {
                connections: 1,
                column_lists: 1,
                environment_freed: true,
            }
        );
        assert_eq!(DISCONNECTS.with(Cell::get), 2);
        // Two connections and the environment.
        assert_eq!(FREES.with(Cell::get), 3);

        let stats = registry.lock().stats();
        assert_eq!(stats.connections, 2);
        assert_eq!(stats.live_connections, 0);
        assert_eq!(stats.live_column_lists, 0);
        assert!(!stats.environment_allocated);

        assert_eq!(sweep(&registry, &functions), SweepReport::default());
    }
}
