//! An in-memory ODBC driver for testing purposes.
//!
//! Databases are registered by name with [Database::create] and reached with a connection
//! string of the form `DSN=<name>`. A database answers the SQL texts scripted with
//! [Database::on], serves catalog requests from the tables declared with
//! [Database::add_table], and records what the caller did in its [Stats].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use odbc_core::driver_manager::DriverInitFunc;
use odbc_core::ffi::constants::*;
use odbc_core::ffi::{FunctionTable, SQLLEN, SQLRETURN, SQLSMALLINT, SQLULEN};
use odbc_core::{DriverManager, Result};
use once_cell::sync::Lazy;
use parking_lot::Mutex;

mod catalog;
mod datum;
mod driver;

pub use datum::Datum;

/// A column of a scripted result set or of a declared table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: SQLSMALLINT,
    pub column_size: SQLULEN,
    pub unsigned: bool,
    pub nullable: SQLSMALLINT,
    pub type_name: String,
    /// Type reported by the description, when the driver misreports it.
    pub reported_type: Option<SQLSMALLINT>,
    /// Announce `SQL_NO_TOTAL` instead of the remaining length when data is truncated.
    pub no_total: bool,
    /// Report `SQL_SUCCESS` rather than truncation when given no room at all.
    pub quiet_truncation: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, sql_type: SQLSMALLINT, column_size: SQLULEN) -> Self {
        Self {
            name: name.into(),
            sql_type,
            column_size,
            unsigned: false,
            nullable: SQL_NULLABLE,
            type_name: type_name(sql_type).to_string(),
            reported_type: None,
            no_total: false,
            quiet_truncation: false,
        }
    }

    /// A column of the natural type of `datum`.
    pub fn for_datum(name: impl Into<String>, datum: &Datum) -> Self {
        let (sql_type, column_size, unsigned) = datum.natural_type();
        let column = Self::new(name, sql_type, column_size);
        match unsigned {
            true => column.unsigned(),
            false => column,
        }
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = SQL_NO_NULLS;
        self
    }

    /// Reports the column as `SQL_VARCHAR` with the given type name, the way some drivers
    /// describe types they have no code for.
    pub fn misreported(mut self, type_name: impl Into<String>) -> Self {
        self.reported_type = Some(SQL_VARCHAR);
        self.type_name = type_name.into();
        self
    }

    pub fn no_total(mut self) -> Self {
        self.no_total = true;
        self
    }

    pub fn quiet_truncation(mut self) -> Self {
        self.quiet_truncation = true;
        self
    }
}

/// Name a driver would report for `sql_type`.
pub fn type_name(sql_type: SQLSMALLINT) -> &'static str {
    match sql_type {
        SQL_CHAR => "CHAR",
        SQL_NUMERIC => "NUMERIC",
        SQL_DECIMAL => "DECIMAL",
        SQL_INTEGER => "INTEGER",
        SQL_SMALLINT => "SMALLINT",
        SQL_FLOAT => "FLOAT",
        SQL_REAL => "REAL",
        SQL_DOUBLE => "DOUBLE",
        SQL_VARCHAR => "VARCHAR",
        SQL_TYPE_DATE => "DATE",
        SQL_TYPE_TIME => "TIME",
        SQL_TYPE_TIMESTAMP => "TIMESTAMP",
        SQL_LONGVARCHAR => "LONG VARCHAR",
        SQL_BINARY => "BINARY",
        SQL_VARBINARY => "VARBINARY",
        SQL_LONGVARBINARY => "LONG VARBINARY",
        SQL_BIGINT => "BIGINT",
        SQL_TINYINT => "TINYINT",
        SQL_BIT => "BIT",
        SQL_WCHAR => "NCHAR",
        SQL_WVARCHAR => "NVARCHAR",
        SQL_WLONGVARCHAR => "LONG NVARCHAR",
        _ => "UNKNOWN",
    }
}

/// Rows produced by an execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Vec<Datum>>,
}

impl ResultSet {
    pub fn new(columns: Vec<ColumnDef>, rows: Vec<Vec<Datum>>) -> Self {
        Self { columns, rows }
    }

    /// One row holding `params`, in columns `C1`, `C2`... of their natural types.
    pub fn echo(params: &[Datum]) -> Self {
        let columns = params
            .iter()
            .enumerate()
            .map(|(index, datum)| ColumnDef::for_datum(format!("C{}", index + 1), datum))
            .collect();
        Self::new(columns, vec![params.to_vec()])
    }
}

/// What an execution does.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Affects this many rows and produces no result set.
    RowCount(i64),
    /// Reports `SQL_NO_DATA`, like a searched update that touched nothing.
    NoData,
    Rows(ResultSet),
    /// Fails with a diagnostic record.
    Error { state: String, message: String },
    /// Returns this code without a diagnostic record.
    Return(SQLRETURN),
}

pub type Handler = Arc<dyn Fn(&[Datum]) -> Outcome + Send + Sync>;

/// A table served by catalog requests.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub name: String,
    pub table_type: String,
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            catalog: None,
            schema: None,
            name: name.into(),
            table_type: "TABLE".into(),
            columns,
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

/// Arguments of one parameter binding, as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindRecord {
    pub number: u16,
    pub c_type: SQLSMALLINT,
    pub sql_type: SQLSMALLINT,
    pub column_size: SQLULEN,
    pub buffer_len: SQLLEN,
    pub indicator: SQLLEN,
}

/// One catalog call: function name and its four (or fewer) arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogCall {
    pub function: &'static str,
    pub arguments: Vec<Option<String>>,
}

/// What callers did to a database.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    pub connects: usize,
    pub disconnects: usize,
    pub connection_frees: usize,
    pub statement_frees: usize,
    pub prepares: usize,
    pub executes: usize,
    pub bindings: Vec<BindRecord>,
    pub params: Vec<Datum>,
    pub catalog_calls: Vec<CatalogCall>,
    pub login_timeout: Option<usize>,
    pub access_mode: Option<usize>,
    pub autocommit: Option<usize>,
}

pub struct Database {
    name: String,
    scripts: Mutex<HashMap<String, Handler>>,
    tables: Mutex<Vec<TableDef>>,
    stats: Mutex<Stats>,
    fetch_with_info: Mutex<bool>,
    connect_delay: Mutex<Duration>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("scripts", &self.scripts.lock().len())
            .field("tables", &self.tables.lock().len())
            .finish()
    }
}

static DATABASES: Lazy<Mutex<HashMap<String, Arc<Database>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

impl Database {
    /// Registers an empty database under `name`, replacing any previous one.
    pub fn create(name: impl Into<String>) -> Arc<Database> {
        let name = name.into();
        let database = Arc::new(Database {
            name: name.clone(),
            scripts: Mutex::new(HashMap::new()),
            tables: Mutex::new(Vec::new()),
            stats: Mutex::new(Stats::default()),
            fetch_with_info: Mutex::new(false),
            connect_delay: Mutex::new(Duration::ZERO),
        });
        DATABASES.lock().insert(name, database.clone());
        database
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection_string(&self) -> String {
        format!("DSN={}", self.name)
    }

    /// Answers executions of `sql` with `handler`, called with the bound parameters.
    pub fn on(
        &self,
        sql: impl Into<String>,
        handler: impl Fn(&[Datum]) -> Outcome + Send + Sync + 'static,
    ) {
        self.scripts.lock().insert(sql.into(), Arc::new(handler));
    }

    pub fn add_table(&self, table: TableDef) {
        self.tables.lock().push(table);
    }

    /// Makes every fetched row report `SQL_SUCCESS_WITH_INFO`.
    pub fn set_fetch_with_info(&self, enabled: bool) {
        *self.fetch_with_info.lock() = enabled;
    }

    /// Makes every connect take at least `delay`, like a slow network login.
    pub fn set_connect_delay(&self, delay: Duration) {
        *self.connect_delay.lock() = delay;
    }

    pub fn stats(&self) -> Stats {
        self.stats.lock().clone()
    }

    pub(crate) fn record(&self, f: impl FnOnce(&mut Stats)) {
        f(&mut self.stats.lock())
    }

    pub(crate) fn script(&self, sql: &str) -> Option<Handler> {
        self.scripts.lock().get(sql).cloned()
    }

    pub(crate) fn tables(&self) -> Vec<TableDef> {
        self.tables.lock().clone()
    }

    pub(crate) fn fetches_with_info(&self) -> bool {
        *self.fetch_with_info.lock()
    }

    pub(crate) fn connect_delay(&self) -> Duration {
        *self.connect_delay.lock()
    }
}

pub(crate) fn lookup(name: &str) -> Option<Arc<Database>> {
    DATABASES.lock().get(name).cloned()
}

/// Fills `functions` with the driver's entry points.
pub fn init(functions: &mut FunctionTable) -> SQLRETURN {
    driver::fill(functions);
    SQL_SUCCESS
}

/// A driver manager dispatching to this driver.
pub fn driver_manager() -> Result<DriverManager> {
    let init: DriverInitFunc = init;
    DriverManager::load_static(&init)
}

/// Value of `key` in a `KEY=value;...` connection string, keys compared without case.
pub(crate) fn connection_attribute(connection_string: &str, key: &str) -> Option<String> {
    connection_string.split(';').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        k.trim()
            .eq_ignore_ascii_case(key)
            .then(|| v.trim().to_string())
    })
}
