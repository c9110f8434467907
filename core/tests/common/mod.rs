#![allow(dead_code)]

use std::sync::Arc;

use odbc_core::options::EnvironmentOptions;
use odbc_core::{Connection, Environment, Executed, Request, Statement, Value};
use odbc_dummy::{Database, Datum, Outcome, ResultSet};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn dummy_environment(options: EnvironmentOptions) -> Environment {
    init_tracing();
    Environment::new(odbc_dummy::driver_manager().unwrap(), options)
}

/// A database answering `SELECT ?, ?...` with its parameters.
pub fn echo_database(name: &str) -> Arc<Database> {
    let database = Database::create(name);
    for arity in 1..=4 {
        let sql = format!("SELECT {}", vec!["?"; arity].join(", "));
        database.on(sql, |params: &[Datum]| Outcome::Rows(ResultSet::echo(params)));
    }
    database
}

pub fn open(environment: &Environment, database: &Database) -> Connection {
    environment
        .open_connection(&database.connection_string())
        .unwrap()
}

pub fn select(statement: &mut Statement, sql: &str, params: Vec<Value>) -> Vec<Vec<Value>> {
    match statement.execute(Request::sql(sql, params)).unwrap() {
        Executed::Titles(_) => statement.fetch(None).unwrap(),
        other => panic!("expected a result set, got {:?}", other),
    }
}

/// Sends `value` as the parameter of `SELECT ?` on a fresh statement and reads it back.
pub fn round_trip(connection: &Connection, value: Value) -> Value {
    let mut statement = connection.open_statement().unwrap();
    let mut rows = select(&mut statement, "SELECT ?", vec![value]);
    assert_eq!(rows.len(), 1);
    rows.remove(0).remove(0)
}

/// Checks values any conforming driver reads back unchanged through `SELECT ?`.
pub fn test_round_trips(connection: &Connection) {
    for value in [
        Value::Integer(42),
        Value::Integer(-2147483648),
        Value::Float(2.5),
        Value::from("Grüße"),
        Value::Bool(true),
    ] {
        assert_eq!(round_trip(connection, value.clone()), value);
    }
    assert_eq!(round_trip(connection, Value::Null), Value::Null);
}
