use std::sync::Arc;

use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::DataType;

use odbc_core::columns::{FetchType, NarrowEncoding};
use odbc_core::error::Status;
use odbc_core::ffi::constants::*;
use odbc_core::options::{CharEncoding, EnvironmentOptions};
use odbc_core::{Environment, Executed, Request, Value};
use odbc_dummy::{ColumnDef, Database, Datum, Outcome, ResultSet};

mod common;

const PEOPLE: &str = "SELECT * FROM t WHERE id = ?";

fn people_database(name: &str) -> Arc<Database> {
    let database = Database::create(name);
    database.on(PEOPLE, |params: &[Datum]| {
        let people = [(42, "Brian"), (42, "Brianna"), (43, "Eve")];
        let rows = people
            .iter()
            .filter(|(id, _)| params.first() == Some(&Datum::Int(*id)))
            .map(|(id, name)| vec![Datum::Int(*id), Datum::Narrow(name.as_bytes().to_vec())])
            .collect();
        Outcome::Rows(ResultSet::new(
            vec![
                ColumnDef::new("ID", SQL_INTEGER, 10).not_null(),
                ColumnDef::new("NAME", SQL_VARCHAR, 50),
            ],
            rows,
        ))
    });
    database
}

/// A database answering `SELECT v` with one row holding `value` in column `column`.
fn single_value_database(name: &str, column: ColumnDef, value: Datum) -> Arc<Database> {
    let database = Database::create(name);
    database.on("SELECT v", move |_: &[Datum]| {
        Outcome::Rows(ResultSet::new(vec![column.clone()], vec![vec![value.clone()]]))
    });
    database
}

fn select_value(environment: &Environment, database: &Database) -> odbc_core::Result<Value> {
    let connection = common::open(environment, database);
    let mut statement = connection.open_statement()?;
    statement.execute(Request::sql("SELECT v", Vec::<Value>::new()))?;
    let mut rows = statement.fetch(None)?;
    assert_eq!(rows.len(), 1);
    Ok(rows.remove(0).remove(0))
}

#[test]
fn test_select_by_id() {
    let database = people_database("results_select_by_id");
    let environment = common::dummy_environment(EnvironmentOptions::default());
    let connection = common::open(&environment, &database);
    let mut statement = connection.open_statement().unwrap();

    let executed = statement
        .execute(Request::sql(PEOPLE, [Value::Integer(42)]))
        .unwrap();
    assert_eq!(
        executed,
        Executed::Titles(vec!["ID".to_string(), "NAME".to_string()])
    );

    let rows = statement.fetch(Some(1)).unwrap();
    assert_eq!(rows, vec![vec![Value::Integer(42), Value::from("Brian")]]);
    let rows = statement.fetch(Some(1)).unwrap();
    assert_eq!(rows, vec![vec![Value::Integer(42), Value::from("Brianna")]]);
    assert!(statement.fetch(None).unwrap().is_empty());

    let columns = statement.columns().unwrap();
    assert_eq!(columns[0].description.sql_type, SQL_INTEGER);
    assert_eq!(columns[0].description.nullable, SQL_NO_NULLS);
    assert_eq!(columns[0].plan.fetch_type, FetchType::SLong);
    assert_eq!(columns[1].plan.fetch_type, FetchType::Wide);
    assert_eq!(columns[1].plan.buffer_size, 51 * 2);
}

#[test]
fn test_fetch_batch() {
    let database = people_database("results_fetch_batch");
    let environment = common::dummy_environment(EnvironmentOptions::default());
    let connection = common::open(&environment, &database);
    let mut statement = connection.open_statement().unwrap();

    statement
        .execute(Request::sql(PEOPLE, [Value::Integer(42)]))
        .unwrap();
    let batch = statement.fetch_batch(None).unwrap();
    assert_eq!(batch.num_rows(), 2);
    assert_eq!(batch.schema().field(0).name(), "ID");
    assert_eq!(batch.schema().field(1).data_type(), &DataType::Utf8);

    let ids = batch.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
    assert_eq!((ids.value(0), ids.value(1)), (42, 42));
    let names = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
    assert_eq!(names.value(1), "Brianna");
}

#[test]
fn test_fetch_without_result_set() {
    let database = people_database("results_without_result_set");
    let environment = common::dummy_environment(EnvironmentOptions::default());
    let connection = common::open(&environment, &database);
    let mut statement = connection.open_statement().unwrap();

    let error = statement.fetch(None).unwrap_err();
    assert_eq!(error.status, Status::InvalidState);
    let error = statement.columns().unwrap_err();
    assert_eq!(error.status, Status::InvalidState);
}

#[test]
fn test_two_phase_binary() {
    let environment = common::dummy_environment(EnvironmentOptions::default());
    let payload: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();

    let column = ColumnDef::new("V", SQL_VARBINARY, 0);
    let database = single_value_database(
        "results_binary",
        column.clone(),
        Datum::Bytes(payload.clone()),
    );
    assert_eq!(
        select_value(&environment, &database).unwrap(),
        Value::Binary(payload.clone())
    );

    let database = single_value_database("results_binary_empty", column.clone(), Datum::Bytes(vec![]));
    assert_eq!(
        select_value(&environment, &database).unwrap(),
        Value::Binary(vec![])
    );

    // Drivers that report the full length without a truncation warning.
    let database = single_value_database(
        "results_binary_quiet",
        column.clone().quiet_truncation(),
        Datum::Bytes(payload.clone()),
    );
    assert_eq!(
        select_value(&environment, &database).unwrap(),
        Value::Binary(payload.clone())
    );

    let database = single_value_database(
        "results_binary_no_total",
        column.no_total(),
        Datum::Bytes(payload),
    );
    let error = select_value(&environment, &database).unwrap_err();
    assert_eq!(error.status, Status::Internal);
}

#[test]
fn test_long_text() {
    let environment = common::dummy_environment(EnvironmentOptions {
        long_text_ceiling: 8,
        ..Default::default()
    });
    let text = "The quick brown fox jumps over the lazy dog, twice: ünïcödé 🦊🦊";

    let database = single_value_database(
        "results_long_wide",
        ColumnDef::new("V", SQL_WLONGVARCHAR, 0),
        Datum::text(text),
    );
    assert_eq!(select_value(&environment, &database).unwrap(), Value::from(text));

    // Declared larger than the ceiling.
    let database = single_value_database(
        "results_long_declared",
        ColumnDef::new("V", SQL_WVARCHAR, 200),
        Datum::text(text),
    );
    assert_eq!(select_value(&environment, &database).unwrap(), Value::from(text));

    let database = single_value_database(
        "results_long_no_total",
        ColumnDef::new("V", SQL_WLONGVARCHAR, 0).no_total(),
        Datum::text(text),
    );
    assert_eq!(select_value(&environment, &database).unwrap(), Value::from(text));
}

#[test]
fn test_long_narrow_text() {
    let environment = common::dummy_environment(EnvironmentOptions {
        char_encoding: CharEncoding::Utf8,
        long_text_ceiling: 8,
        ..Default::default()
    });
    let text = "ça commence à être long, très long, vraiment très long";

    let database = single_value_database(
        "results_long_narrow",
        ColumnDef::new("V", SQL_LONGVARCHAR, 0).no_total(),
        Datum::Narrow(text.as_bytes().to_vec()),
    );
    assert_eq!(select_value(&environment, &database).unwrap(), Value::from(text));
}

#[test]
fn test_fixed_text_truncation() {
    let environment = common::dummy_environment(EnvironmentOptions::default());
    let database = single_value_database(
        "results_fixed_truncation",
        ColumnDef::new("V", SQL_WVARCHAR, 4),
        Datum::text("longer than declared"),
    );
    let error = select_value(&environment, &database).unwrap_err();
    assert_eq!(error.status, Status::Internal);
}

#[test]
fn test_nulls_and_bits() {
    let environment = common::dummy_environment(EnvironmentOptions::default());

    let database = single_value_database(
        "results_bit",
        ColumnDef::new("V", SQL_BIT, 1),
        Datum::Bit(true),
    );
    assert_eq!(select_value(&environment, &database).unwrap(), Value::Bool(true));

    for (name, column) in [
        ("results_null_bit", ColumnDef::new("V", SQL_BIT, 1)),
        ("results_null_text", ColumnDef::new("V", SQL_WVARCHAR, 10)),
        ("results_null_binary", ColumnDef::new("V", SQL_VARBINARY, 0)),
        ("results_null_date", ColumnDef::new("V", SQL_TYPE_DATE, 10)),
    ] {
        let database = single_value_database(name, column, Datum::Null);
        assert_eq!(select_value(&environment, &database).unwrap(), Value::Null);
    }

    let database = single_value_database(
        "results_multi_bit",
        ColumnDef::new("V", SQL_BIT, 3),
        Datum::Bytes(vec![1, 0, 1]),
    );
    let error = select_value(&environment, &database).unwrap_err();
    assert_eq!(error.status, Status::Unsupported);
}

#[test]
fn test_integer_columns() {
    let environment = common::dummy_environment(EnvironmentOptions::default());

    let database = single_value_database(
        "results_tinyint",
        ColumnDef::new("V", SQL_TINYINT, 3).unsigned(),
        Datum::UInt(200),
    );
    assert_eq!(select_value(&environment, &database).unwrap(), Value::Integer(200));

    let database = single_value_database(
        "results_uint",
        ColumnDef::new("V", SQL_INTEGER, 10).unsigned(),
        Datum::UInt(4294967295),
    );
    assert_eq!(
        select_value(&environment, &database).unwrap(),
        Value::Integer(4294967295)
    );

    let database = single_value_database(
        "results_ubigint_max",
        ColumnDef::new("V", SQL_BIGINT, 20).unsigned(),
        Datum::UInt(u64::MAX),
    );
    let error = select_value(&environment, &database).unwrap_err();
    assert_eq!(error.status, Status::Overflow);

    let database = single_value_database(
        "results_decimal",
        ColumnDef::new("V", SQL_DECIMAL, 10),
        Datum::Double(12.25),
    );
    assert_eq!(select_value(&environment, &database).unwrap(), Value::Float(12.25));
}

#[test]
fn test_narrow_encodings() {
    let latin1 = common::dummy_environment(EnvironmentOptions {
        char_encoding: CharEncoding::Latin1,
        ..Default::default()
    });
    let database = single_value_database(
        "results_latin1",
        ColumnDef::new("V", SQL_VARCHAR, 3),
        Datum::Narrow(vec![0xe9, b't', 0xe9]),
    );
    assert_eq!(select_value(&latin1, &database).unwrap(), Value::from("été"));

    let utf8 = common::dummy_environment(EnvironmentOptions {
        char_encoding: CharEncoding::Utf8,
        ..Default::default()
    });
    let error = select_value(&utf8, &database).unwrap_err();
    assert_eq!(error.status, Status::InvalidData);
}

#[test]
fn test_encoding_is_captured_by_the_plan() {
    let database = single_value_database(
        "results_captured_encoding",
        ColumnDef::new("V", SQL_VARCHAR, 10),
        Datum::Narrow("été".as_bytes().to_vec()),
    );
    let environment = common::dummy_environment(EnvironmentOptions {
        char_encoding: CharEncoding::Utf8,
        ..Default::default()
    });
    let connection = common::open(&environment, &database);
    let mut statement = connection.open_statement().unwrap();

    statement
        .execute(Request::sql("SELECT v", Vec::<Value>::new()))
        .unwrap();
    environment.set_char_encoding(CharEncoding::Latin1);
    assert_eq!(
        statement.fetch(None).unwrap(),
        vec![vec![Value::from("été")]]
    );
    assert_eq!(
        statement.columns().unwrap()[0].plan.fetch_type,
        FetchType::Narrow(NarrowEncoding::Utf8)
    );
}

#[test]
fn test_misreported_types() {
    let environment = common::dummy_environment(EnvironmentOptions::default());

    let database = single_value_database(
        "results_misreported_binary",
        ColumnDef::new("V", SQL_VARBINARY, 0).misreported("varbinary"),
        Datum::Bytes(vec![0xde, 0xad]),
    );
    assert_eq!(
        select_value(&environment, &database).unwrap(),
        Value::Binary(vec![0xde, 0xad])
    );

    let database = single_value_database(
        "results_misreported_text",
        ColumnDef::new("V", SQL_WVARCHAR, 10).misreported("NVARCHAR"),
        Datum::text("Brian"),
    );
    assert_eq!(select_value(&environment, &database).unwrap(), Value::from("Brian"));

    let database = single_value_database(
        "results_misreported_unknown",
        ColumnDef::new("V", SQL_VARBINARY, 0).misreported("GEOMETRY"),
        Datum::Bytes(vec![0]),
    );
    let error = select_value(&environment, &database).unwrap_err();
    assert_eq!(error.status, Status::Unsupported);
}

#[test]
fn test_fetch_with_info() {
    let database = people_database("results_fetch_with_info");
    database.set_fetch_with_info(true);
    let environment = common::dummy_environment(EnvironmentOptions::default());
    let connection = common::open(&environment, &database);
    let mut statement = connection.open_statement().unwrap();

    let rows = common::select(&mut statement, PEOPLE, vec![Value::Integer(43)]);
    assert_eq!(rows, vec![vec![Value::Integer(43), Value::from("Eve")]]);
}
