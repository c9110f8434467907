//! Marshaling of host values to and from the ODBC call-level API, and lifecycle tracking
//! of the native handles behind them.
//!
//! An [Environment] lazily allocates the native environment handle and registers every
//! [Connection] and result-set column list it hands out, so that
//! [Environment::shutdown] can release whatever is still outstanding. A [Statement]
//! executes either SQL text with bound parameters or a catalog request, and materializes
//! result rows as [Value]s.

pub mod catalog;
pub mod columns;
pub mod connection;
pub mod diagnostics;
pub mod driver_manager;
pub mod environment;
pub mod error;
pub mod fetch;
pub mod ffi;
pub mod options;
pub mod params;
pub mod registry;
pub mod schemas;
pub mod statement;
pub mod types;
pub mod value;

pub use catalog::CatalogKind;
pub use connection::Connection;
pub use driver_manager::DriverManager;
pub use environment::Environment;
pub use error::{Error, Result, Status};
pub use options::{AccessMode, AutoCommit, CharEncoding, EnvironmentOptions};
pub use statement::{Executed, Request, Statement};
pub use value::Value;
