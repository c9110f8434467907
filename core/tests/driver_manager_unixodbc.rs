//! Runs against a real data source through the platform driver manager. Set
//! `TEST_ODBC_CONNECTION_STRING` and run with `--ignored`.
#![cfg(feature = "driver_manager")]

use std::env;

use odbc_core::options::{EnvironmentOptions, DEFAULT_DRIVER_MANAGER};
use odbc_core::{CatalogKind, DriverManager, Environment, Executed, Request, Value};

mod common;

fn get_connection_string() -> String {
    env::var("TEST_ODBC_CONNECTION_STRING")
        .expect("environment variable TEST_ODBC_CONNECTION_STRING is not defined")
}

fn get_environment() -> Environment {
    common::init_tracing();
    let driver = DriverManager::load_dynamic(DEFAULT_DRIVER_MANAGER).unwrap();
    Environment::new(driver, EnvironmentOptions::default())
}

#[test]
#[ignore = "requires an ODBC data source"]
fn test_round_trips() {
    let environment = get_environment();
    let connection = environment
        .open_connection(&get_connection_string())
        .unwrap();
    common::test_round_trips(&connection);
}

#[test]
#[ignore = "requires an ODBC data source"]
fn test_catalog() {
    let environment = get_environment();
    let connection = environment
        .open_connection(&get_connection_string())
        .unwrap();
    let mut statement = connection.open_statement().unwrap();

    let executed = statement
        .execute(Request::catalog(CatalogKind::Types, Vec::<Option<String>>::new()))
        .unwrap();
    assert!(matches!(executed, Executed::Titles(titles) if titles[0] == "TYPE_NAME"));
    assert!(!statement.fetch(None).unwrap().is_empty());
}

#[test]
#[ignore = "requires an ODBC data source"]
fn test_shutdown() {
    let environment = get_environment();
    let connection = environment
        .open_connection(&get_connection_string())
        .unwrap();
    assert_eq!(common::round_trip(&connection, Value::Integer(1)), Value::Integer(1));

    let report = environment.shutdown();
    assert_eq!(report.connections, 1);
    assert!(report.environment_freed);
    assert!(!connection.is_open());
}
