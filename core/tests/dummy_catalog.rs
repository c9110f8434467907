use odbc_core::catalog::CatalogKind;
use odbc_core::error::Status;
use odbc_core::ffi::constants::*;
use odbc_core::options::EnvironmentOptions;
use odbc_core::schemas::{COLUMNS_SCHEMA, TABLES_SCHEMA, TYPE_INFO_SCHEMA};
use odbc_core::{Executed, Request, Value};
use odbc_dummy::{CatalogCall, ColumnDef, Database, TableDef};

mod common;

fn shop_database(name: &str) -> std::sync::Arc<Database> {
    let database = common::echo_database(name);
    database.add_table(
        TableDef::new(
            "customers",
            vec![
                ColumnDef::new("id", SQL_INTEGER, 10).not_null(),
                ColumnDef::new("name", SQL_WVARCHAR, 80),
            ],
        )
        .in_schema("sales"),
    );
    database.add_table(
        TableDef::new("orders", vec![ColumnDef::new("total", SQL_DOUBLE, 15)]).in_schema("sales"),
    );
    database.add_table(TableDef::new("audit", vec![]).in_schema("ops"));
    database
}

fn titles(schema: &arrow::datatypes::SchemaRef) -> Vec<String> {
    schema.fields().iter().map(|f| f.name().to_string()).collect()
}

#[test]
fn test_tables() {
    let database = shop_database("catalog_tables");
    let environment = common::dummy_environment(EnvironmentOptions::default());
    let connection = common::open(&environment, &database);
    let mut statement = connection.open_statement().unwrap();

    let executed = statement
        .execute(Request::catalog(CatalogKind::Tables, Vec::<Option<String>>::new()))
        .unwrap();
    assert_eq!(executed, Executed::Titles(titles(&TABLES_SCHEMA)));
    let rows = statement.fetch(None).unwrap();
    let names: Vec<&Value> = rows.iter().map(|row| &row[2]).collect();
    assert_eq!(
        names,
        vec![
            &Value::from("customers"),
            &Value::from("orders"),
            &Value::from("audit")
        ]
    );
    assert_eq!(rows[0][0], Value::Null);
    assert_eq!(rows[0][1], Value::from("sales"));

    // table, schema: the native call takes catalog, schema, table, table type.
    statement
        .execute(Request::catalog(CatalogKind::Tables, [Some("%s"), Some("sales")]))
        .unwrap();
    let rows = statement.fetch(None).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(
        database.stats().catalog_calls.last(),
        Some(&CatalogCall {
            function: "SQLTablesW",
            arguments: vec![None, Some("sales".into()), Some("%s".into()), None],
        })
    );
}

#[test]
fn test_columns() {
    let database = shop_database("catalog_columns");
    let environment = common::dummy_environment(EnvironmentOptions::default());
    let connection = common::open(&environment, &database);
    let mut statement = connection.open_statement().unwrap();

    let executed = statement
        .execute(Request::catalog(
            CatalogKind::Columns,
            [Some("customers"), None, Some("sales")],
        ))
        .unwrap();
    assert_eq!(executed, Executed::Titles(titles(&COLUMNS_SCHEMA)));
    assert_eq!(
        database.stats().catalog_calls.last(),
        Some(&CatalogCall {
            function: "SQLColumnsW",
            arguments: vec![None, Some("sales".into()), Some("customers".into()), None],
        })
    );

    let rows = statement.fetch(None).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][3], Value::from("id"));
    assert_eq!(rows[0][4], Value::Integer(SQL_INTEGER.into()));
    assert_eq!(rows[0][10], Value::Integer(SQL_NO_NULLS.into()));
    assert_eq!(rows[1][3], Value::from("name"));
    assert_eq!(rows[1][16], Value::Integer(2));
    assert_eq!(rows[1][17], Value::from("YES"));

    statement
        .execute(Request::catalog(
            CatalogKind::Columns,
            [Some("customers"), Some("na%")],
        ))
        .unwrap();
    let rows = statement.fetch(None).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][3], Value::from("name"));

    let batch = {
        statement
            .execute(Request::catalog(CatalogKind::Columns, [Some("orders")]))
            .unwrap();
        statement.fetch_batch(None).unwrap()
    };
    assert_eq!(batch.num_rows(), 1);
    assert_eq!(batch.num_columns(), COLUMNS_SCHEMA.fields().len());
}

#[test]
fn test_types() {
    let database = shop_database("catalog_types");
    let environment = common::dummy_environment(EnvironmentOptions::default());
    let connection = common::open(&environment, &database);
    let mut statement = connection.open_statement().unwrap();

    let executed = statement
        .execute(Request::catalog(CatalogKind::Types, Vec::<Option<String>>::new()))
        .unwrap();
    assert_eq!(executed, Executed::Titles(titles(&TYPE_INFO_SCHEMA)));
    let rows = statement.fetch(None).unwrap();
    assert_eq!(rows.len(), 10);
    assert!(rows.iter().any(|row| row[0] == Value::from("BIGINT")));
    assert_eq!(
        database.stats().catalog_calls.last().unwrap().arguments,
        vec![Some(SQL_ALL_TYPES.to_string())]
    );

    let calls = database.stats().catalog_calls.len();
    let error = statement
        .execute(Request::catalog(CatalogKind::Types, [Some("INTEGER")]))
        .unwrap_err();
    assert_eq!(error.status, Status::InvalidArguments);
    assert_eq!(database.stats().catalog_calls.len(), calls);
}

#[test]
fn test_invalid_requests() {
    let error = "VIEWS".parse::<CatalogKind>().unwrap_err();
    assert_eq!(error.status, Status::InvalidArguments);
    assert_eq!("Columns".parse::<CatalogKind>().unwrap(), CatalogKind::Columns);

    let database = shop_database("catalog_invalid");
    let environment = common::dummy_environment(EnvironmentOptions::default());
    let connection = common::open(&environment, &database);
    let mut statement = connection.open_statement().unwrap();

    let error = statement
        .execute(Request::catalog(
            CatalogKind::Tables,
            [Some("a"), Some("b"), Some("c"), Some("d"), Some("e")],
        ))
        .unwrap_err();
    assert_eq!(error.status, Status::InvalidArguments);
    assert!(database.stats().catalog_calls.is_empty());
}

#[test]
fn test_catalog_forgets_prepared_sql() {
    let database = shop_database("catalog_forgets_sql");
    let environment = common::dummy_environment(EnvironmentOptions::default());
    let connection = common::open(&environment, &database);
    let mut statement = connection.open_statement().unwrap();

    let rows = common::select(&mut statement, "SELECT ?", vec![Value::Integer(1)]);
    assert_eq!(rows, vec![vec![Value::Integer(1)]]);
    assert_eq!(statement.sql(), Some("SELECT ?"));
    let prepares = database.stats().prepares;

    statement
        .execute(Request::catalog(CatalogKind::Tables, Vec::<Option<String>>::new()))
        .unwrap();
    assert_eq!(statement.sql(), None);

    let rows = common::select(&mut statement, "SELECT ?", vec![Value::Integer(2)]);
    assert_eq!(rows, vec![vec![Value::Integer(2)]]);
    assert_eq!(database.stats().prepares, prepares + 1);
}
