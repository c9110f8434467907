use arrow::datatypes::{DataType, SchemaRef};
use odbc_core::ffi::constants::*;
use odbc_core::schemas::{COLUMNS_SCHEMA, TABLES_SCHEMA, TYPE_INFO_SCHEMA};

use crate::{type_name, ColumnDef, Datum, ResultSet, TableDef};

/// Types listed by a type-info request: SQL type and column size.
const TYPES: [(i16, usize); 10] = [
    (SQL_BIT, 1),
    (SQL_INTEGER, 10),
    (SQL_BIGINT, 19),
    (SQL_DOUBLE, 15),
    (SQL_TYPE_DATE, 10),
    (SQL_TYPE_TIME, 8),
    (SQL_TYPE_TIMESTAMP, 29),
    (SQL_VARCHAR, 255),
    (SQL_WVARCHAR, 255),
    (SQL_VARBINARY, 255),
];

fn columns_of(schema: &SchemaRef) -> Vec<ColumnDef> {
    schema
        .fields()
        .iter()
        .map(|field| {
            let column = match field.data_type() {
                DataType::Int16 => ColumnDef::new(field.name(), SQL_SMALLINT, 5),
                DataType::Int32 => ColumnDef::new(field.name(), SQL_INTEGER, 10),
                _ => ColumnDef::new(field.name(), SQL_WVARCHAR, 128),
            };
            match field.is_nullable() {
                true => column,
                false => column.not_null(),
            }
        })
        .collect()
}

/// SQL `LIKE` matching with `%` and `_`. A missing pattern matches everything.
pub(crate) fn like(pattern: Option<&str>, value: &str) -> bool {
    fn matches(pattern: &[char], value: &[char]) -> bool {
        match pattern.split_first() {
            None => value.is_empty(),
            Some(('%', rest)) => (0..=value.len()).any(|skip| matches(rest, &value[skip..])),
            Some(('_', rest)) => !value.is_empty() && matches(rest, &value[1..]),
            Some((c, rest)) => value.first() == Some(c) && matches(rest, &value[1..]),
        }
    }
    let Some(pattern) = pattern else {
        return true;
    };
    let pattern: Vec<char> = pattern.chars().collect();
    let value: Vec<char> = value.chars().collect();
    matches(&pattern, &value)
}

fn optional(value: &Option<String>) -> Datum {
    value.as_deref().map(Datum::from).unwrap_or(Datum::Null)
}

fn selected<'a>(
    tables: &'a [TableDef],
    catalog: Option<&'a str>,
    schema: Option<&'a str>,
    table: Option<&'a str>,
) -> impl Iterator<Item = &'a TableDef> {
    tables.iter().filter(move |t| {
        like(catalog, t.catalog.as_deref().unwrap_or(""))
            && like(schema, t.schema.as_deref().unwrap_or(""))
            && like(table, &t.name)
    })
}

/// Result of a tables request. `types` is a comma separated list of table types, quoted
/// or not.
pub(crate) fn tables(tables: &[TableDef], arguments: &[Option<String>; 4]) -> ResultSet {
    let [catalog, schema, table, types] = arguments;
    let types: Option<Vec<String>> = types.as_ref().map(|list| {
        list.split(',')
            .map(|t| t.trim().trim_matches('\'').to_string())
            .collect()
    });

    let rows = selected(tables, catalog.as_deref(), schema.as_deref(), table.as_deref())
        .filter(|t| {
            types
                .as_ref()
                .map_or(true, |types| types.iter().any(|x| x == "%" || *x == t.table_type))
        })
        .map(|t| {
            vec![
                optional(&t.catalog),
                optional(&t.schema),
                Datum::from(t.name.as_str()),
                Datum::from(t.table_type.as_str()),
                Datum::Null,
            ]
        })
        .collect();
    ResultSet::new(columns_of(&TABLES_SCHEMA), rows)
}

/// Result of a columns request.
pub(crate) fn columns(tables: &[TableDef], arguments: &[Option<String>; 4]) -> ResultSet {
    let [catalog, schema, table, column] = arguments;
    let mut rows = Vec::new();
    for t in selected(tables, catalog.as_deref(), schema.as_deref(), table.as_deref()) {
        for (index, c) in t.columns.iter().enumerate() {
            if !like(column.as_deref(), &c.name) {
                continue;
            }
            let nullable = c.nullable != SQL_NO_NULLS;
            rows.push(vec![
                optional(&t.catalog),
                optional(&t.schema),
                Datum::from(t.name.as_str()),
                Datum::from(c.name.as_str()),
                Datum::Int(c.sql_type.into()),
                Datum::from(c.type_name.as_str()),
                Datum::Int(c.column_size as i64),
                Datum::Null,
                Datum::Null,
                Datum::Null,
                Datum::Int(c.nullable.into()),
                Datum::Null,
                Datum::Null,
                Datum::Int(c.sql_type.into()),
                Datum::Null,
                Datum::Null,
                Datum::Int(index as i64 + 1),
                Datum::from(if nullable { "YES" } else { "NO" }),
            ]);
        }
    }
    ResultSet::new(columns_of(&COLUMNS_SCHEMA), rows)
}

/// Result of a type-info request for `data_type`, or every type for `SQL_ALL_TYPES`.
pub(crate) fn type_info(data_type: i16) -> ResultSet {
    let rows = TYPES
        .iter()
        .filter(|(sql_type, _)| data_type == SQL_ALL_TYPES || data_type == *sql_type)
        .map(|(sql_type, size)| {
            let text = matches!(*sql_type, SQL_VARCHAR | SQL_WVARCHAR);
            vec![
                Datum::from(type_name(*sql_type)),
                Datum::Int((*sql_type).into()),
                Datum::Int(*size as i64),
                if text { Datum::from("'") } else { Datum::Null },
                if text { Datum::from("'") } else { Datum::Null },
                if text { Datum::from("length") } else { Datum::Null },
                Datum::Int(SQL_NULLABLE.into()),
                Datum::Int(text.into()),
                Datum::Int(3),
                Datum::Null,
                Datum::Int(0),
                Datum::Null,
                Datum::Null,
                Datum::Null,
                Datum::Null,
                Datum::Int((*sql_type).into()),
                Datum::Null,
                Datum::Null,
                Datum::Null,
            ]
        })
        .collect();
    ResultSet::new(columns_of(&TYPE_INFO_SCHEMA), rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like() {
        assert!(like(None, "anything"));
        assert!(like(Some("%"), ""));
        assert!(like(Some("cust%"), "customers"));
        assert!(like(Some("c_st"), "cast"));
        assert!(!like(Some("c_st"), "coast"));
        assert!(!like(Some("orders"), "customers"));
    }

    #[test]
    fn test_tables_filters() {
        let defs = vec![
            TableDef::new("customers", vec![]).in_schema("shop"),
            TableDef::new("orders", vec![]).in_schema("shop"),
        ];
        let arguments = [None, None, Some("cust%".to_string()), None];
        let result = tables(&defs, &arguments);
        assert_eq!(result.columns.len(), 5);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0][2], Datum::from("customers"));
    }

    #[test]
    fn test_type_info_shape() {
        let all = type_info(SQL_ALL_TYPES);
        assert_eq!(all.columns.len(), 19);
        assert_eq!(all.rows.len(), TYPES.len());
        assert!(all.rows.iter().all(|row| row.len() == 19));
        assert_eq!(type_info(SQL_BIT).rows.len(), 1);
    }
}
