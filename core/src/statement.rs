use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use widestring::U16CString;

use crate::catalog::{self, CatalogKind};
use crate::columns::{self, ColumnInfo};
use crate::diagnostics::{self, HandleKind};
use crate::environment::Shared;
use crate::error::{Error, Result, Status};
use crate::ffi::constants::*;
use crate::ffi::{FunctionTable, Handle, SQLLEN, SQLSMALLINT, SQLUSMALLINT};
use crate::fetch;
use crate::odbc_method;
use crate::options::CharEncoding;
use crate::params;
use crate::connection::Connection;
use crate::registry::{self, ColumnListEntry};
use crate::schemas;
use crate::value::Value;

/// What to execute on a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// SQL text with one value per `?` placeholder.
    Sql { text: String, params: Vec<Value> },
    /// A catalog enumeration with up to four filter patterns.
    Catalog {
        kind: CatalogKind,
        patterns: Vec<Option<String>>,
    },
}

impl Request {
    pub fn sql(text: impl Into<String>, params: impl IntoIterator<Item = Value>) -> Self {
        Self::Sql {
            text: text.into(),
            params: params.into_iter().collect(),
        }
    }

    pub fn catalog<S: Into<String>>(
        kind: CatalogKind,
        patterns: impl IntoIterator<Item = Option<S>>,
    ) -> Self {
        Self::Catalog {
            kind,
            patterns: patterns.into_iter().map(|p| p.map(Into::into)).collect(),
        }
    }
}

/// Outcome of [Statement::execute].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Executed {
    /// Rows affected by a statement producing no result set.
    RowCount(i64),
    /// Column titles of the result set, whose rows are read with [Statement::fetch].
    Titles(Vec<String>),
}

/// Owner of a registered column list. Dropping it releases the columns and unlinks them
/// from the registry.
#[derive(Debug)]
struct ColumnListHandle {
    entry: Arc<ColumnListEntry>,
    shared: Arc<Shared>,
}

impl Drop for ColumnListHandle {
    fn drop(&mut self) {
        if self.entry.cleanup() {
            tracing::debug!("column list released");
        }
        self.shared.registry.lock().unlink_column_list(&self.entry);
    }
}

/// A statement of a [crate::Connection].
///
/// The statement remembers the last SQL text it prepared: executing the same text again
/// skips preparation and returns the titles of the result set described the first time.
#[derive(Debug)]
pub struct Statement {
    hstmt: Option<Handle>,
    connection: Connection,
    shared: Arc<Shared>,
    sql: Option<String>,
    titles: Option<Vec<String>>,
    columns: Option<ColumnListHandle>,
}

impl Statement {
    pub(crate) fn new(hstmt: Handle, connection: Connection, shared: Arc<Shared>) -> Self {
        Self {
            hstmt: Some(hstmt),
            connection,
            shared,
            sql: None,
            titles: None,
            columns: None,
        }
    }

    /// SQL text prepared by the last execution, if it was not a catalog request.
    pub fn sql(&self) -> Option<&str> {
        self.sql.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.hstmt.is_some() && self.connection.is_open()
    }

    pub fn execute(&mut self, request: Request) -> Result<Executed> {
        let shared = self.shared.clone();
        let functions = shared.functions();
        let connection = self.connection.clone();
        let hdbc = connection.entry().lock();
        let hstmt = live(self.hstmt, *hdbc)?;

        // Leftovers of a previous execution; failures only mean there were none.
        params::reset_parameters(functions, hstmt);
        let close_cursor = odbc_method!(functions, SQLCloseCursor);
        unsafe { close_cursor(hstmt.as_raw()) };

        let use_cache = match request {
            Request::Sql { text, params } => {
                let use_cache = self.sql.as_deref() == Some(text.as_str());
                if use_cache {
                    tracing::debug!(sql = %text, "re-executing prepared statement");
                } else {
                    self.sql = None;
                    self.forget_result_set();
                    prepare(functions, hstmt, &text)?;
                    self.sql = Some(text);
                }
                execute_with(functions, hstmt, &params, shared.char_encoding())?;
                use_cache
            }
            Request::Catalog { kind, patterns } => {
                self.sql = None;
                self.forget_result_set();
                catalog::query_catalog(functions, hstmt, kind, &patterns)?;
                false
            }
        };

        let mut count: SQLSMALLINT = 0;
        let num_result_cols = odbc_method!(functions, SQLNumResultCols);
        let rc = unsafe { num_result_cols(hstmt.as_raw(), &mut count) };
        diagnostics::check(functions, rc, HandleKind::Statement, Some(hstmt))?;

        if count <= 0 {
            self.forget_result_set();
            let mut rows: SQLLEN = 0;
            let row_count = odbc_method!(functions, SQLRowCount);
            let rc = unsafe { row_count(hstmt.as_raw(), &mut rows) };
            diagnostics::check(functions, rc, HandleKind::Statement, Some(hstmt))?;
            return Ok(Executed::RowCount(rows as i64));
        }

        if use_cache {
            if let Some(titles) = &self.titles {
                return Ok(Executed::Titles(titles.clone()));
            }
        }

        self.forget_result_set();
        let columns = columns::describe(
            functions,
            hstmt,
            count as SQLUSMALLINT,
            shared.char_encoding(),
            shared.long_text_ceiling(),
        )?;
        let titles: Vec<String> = columns.iter().map(|c| c.title().to_string()).collect();
        tracing::debug!(?titles, "result set described");

        let entry = Arc::new(ColumnListEntry::new(columns));
        shared.registry.lock().register_column_list(entry.clone());
        self.columns = Some(ColumnListHandle {
            entry,
            shared: shared.clone(),
        });
        self.titles = Some(titles.clone());
        Ok(Executed::Titles(titles))
    }

    /// Releases the column list of the previous result set.
    fn forget_result_set(&mut self) {
        self.titles = None;
        self.columns = None;
    }

    /// Reads up to `part` rows of the current result set, or all remaining rows.
    pub fn fetch(&mut self, part: Option<usize>) -> Result<Vec<Vec<Value>>> {
        let functions = self.shared.functions();
        let hdbc = self.connection.entry().lock();
        let hstmt = live(self.hstmt, *hdbc)?;

        let handle = self
            .columns
            .as_ref()
            .ok_or_else(|| Error::invalid_state("Statement has no result set"))?;
        let mut columns = handle.entry.lock();
        let columns = columns
            .as_mut()
            .ok_or_else(|| Error::invalid_state("Result set was already released"))?;

        fetch::fetch_rows(
            functions,
            hstmt,
            columns,
            part,
            self.shared.long_text_ceiling(),
        )
    }

    /// Reads rows like [Statement::fetch] into a record batch shaped by the column plans.
    pub fn fetch_batch(&mut self, part: Option<usize>) -> Result<RecordBatch> {
        let rows = self.fetch(part)?;
        let schema = schemas::result_schema(&self.columns()?);
        schemas::rows_to_batch(schema, &rows)
    }

    /// Descriptions and fetch plans of the current result set.
    pub fn columns(&self) -> Result<Vec<ColumnInfo>> {
        let handle = self
            .columns
            .as_ref()
            .ok_or_else(|| Error::invalid_state("Statement has no result set"))?;
        let columns = handle.entry.lock();
        let columns = columns
            .as_ref()
            .ok_or_else(|| Error::invalid_state("Result set was already released"))?;
        Ok(columns.iter().map(|c| c.info()).collect())
    }

    /// Releases the result set and the native statement. Returns `false` if the statement
    /// was already closed.
    pub fn close(&mut self) -> Result<bool> {
        let Some(hstmt) = self.hstmt.take() else {
            return Ok(false);
        };
        self.forget_result_set();
        self.sql = None;

        // A cleaned up connection took its statements with it.
        if self.connection.entry().lock().is_some() {
            registry::free_handle(self.shared.functions(), SQL_HANDLE_STMT, hstmt);
        }
        Ok(true)
    }
}

impl Drop for Statement {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn live(hstmt: Option<Handle>, hdbc: Option<Handle>) -> Result<Handle> {
    match (hstmt, hdbc) {
        (Some(hstmt), Some(_)) => Ok(hstmt),
        (None, _) => Err(Error::invalid_state("Statement is closed")),
        (_, None) => Err(Error::invalid_state("Connection is closed")),
    }
}

fn prepare(functions: &FunctionTable, hstmt: Handle, text: &str) -> Result<()> {
    tracing::debug!(sql = %text, "preparing statement");
    let text = U16CString::from_str(text)?;
    let prepare = odbc_method!(functions, SQLPrepareW);
    let rc = unsafe { prepare(hstmt.as_raw(), text.as_ptr(), SQL_NTS) };
    diagnostics::check(functions, rc, HandleKind::Statement, Some(hstmt))
}

/// Binds `values` and executes. The parameter buffers are released before the outcome is
/// examined.
fn execute_with(
    functions: &FunctionTable,
    hstmt: Handle,
    values: &[Value],
    encoding: CharEncoding,
) -> Result<()> {
    let bound = params::bind_parameters(functions, hstmt, values, encoding)?;
    let execute = odbc_method!(functions, SQLExecute);
    let rc = unsafe { execute(hstmt.as_raw()) };
    drop(bound);

    match rc {
        // SQL_NO_DATA: a searched UPDATE or DELETE that touched no rows.
        SQL_SUCCESS | SQL_SUCCESS_WITH_INFO | SQL_NO_DATA => Ok(()),
        SQL_NEED_DATA | SQL_STILL_EXECUTING | SQL_PARAM_DATA_AVAILABLE => {
            let mut error = diagnostics::error_for(functions, HandleKind::Statement, Some(hstmt));
            if error.sqlstate.is_empty() {
                error.status = Status::UnexpectedReturn;
                error.message = format!("Unexpected SQLRETURN {} from SQLExecute()", rc);
            }
            Err(error)
        }
        _ => Err(diagnostics::error_for(
            functions,
            HandleKind::Statement,
            Some(hstmt),
        )),
    }
}
