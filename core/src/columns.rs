//! Result-set column descriptions and the fetch plan derived from them.

use std::mem::size_of;
use std::os::raw::c_void;
use std::ptr::null_mut;

use crate::diagnostics::{self, HandleKind};
use crate::error::{Error, Result};
use crate::ffi::constants::*;
use crate::ffi::{
    FunctionTable, Handle, DATE_STRUCT, SQLLEN, SQLPOINTER, SQLSMALLINT, SQLULEN, SQLUSMALLINT,
    SQLWCHAR, TIMESTAMP_STRUCT, TIME_STRUCT,
};
use crate::odbc_method;
use crate::options::CharEncoding;

const TITLE_BUFFER_SIZE: usize = 255;
const TYPE_NAME_BUFFER_SIZE: usize = 32;

/// Decoding applied to bytes of a narrow (`SQL_C_CHAR`) column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrowEncoding {
    Utf8,
    Latin1,
}

/// Native type a column is fetched as. Many declared SQL types share a fetch type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchType {
    Bit,
    UTinyInt,
    SLong,
    ULong,
    SBigInt,
    UBigInt,
    Double,
    Date,
    Time,
    Timestamp,
    Binary,
    Narrow(NarrowEncoding),
    Wide,
}

impl FetchType {
    pub fn c_type(self) -> SQLSMALLINT {
        match self {
            Self::Bit => SQL_C_BIT,
            Self::UTinyInt => SQL_C_UTINYINT,
            Self::SLong => SQL_C_SLONG,
            Self::ULong => SQL_C_ULONG,
            Self::SBigInt => SQL_C_SBIGINT,
            Self::UBigInt => SQL_C_UBIGINT,
            Self::Double => SQL_C_DOUBLE,
            Self::Date => SQL_C_TYPE_DATE,
            Self::Time => SQL_C_TYPE_TIME,
            Self::Timestamp => SQL_C_TYPE_TIMESTAMP,
            Self::Binary => SQL_C_BINARY,
            Self::Narrow(_) => SQL_C_CHAR,
            Self::Wide => SQL_C_WCHAR,
        }
    }

    /// Bytes the driver appends after character data.
    pub fn terminator_size(self) -> usize {
        match self {
            Self::Narrow(_) => 1,
            Self::Wide => SQLWCHAR_SIZE,
            _ => 0,
        }
    }

    pub fn is_text(self) -> bool {
        matches!(self, Self::Narrow(_) | Self::Wide)
    }
}

/// Metadata reported by the driver for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    pub title: String,
    /// Declared type, after the misreported-VARCHAR correction.
    pub sql_type: SQLSMALLINT,
    pub column_size: SQLULEN,
    pub precision: SQLSMALLINT,
    pub nullable: SQLSMALLINT,
    pub unsigned: bool,
}

/// How a column is read back: fetch type, pre-allocated size and whether text beyond the
/// buffer is read by continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPlan {
    pub fetch_type: FetchType,
    /// Zero for columns whose length is only discovered at fetch time.
    pub buffer_size: usize,
    pub extendable: bool,
}

/// Read-only view of a described column, see [crate::Statement::columns].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub description: ColumnDescription,
    pub plan: FetchPlan,
}

/// Zeroed fetch buffer, aligned for any of the fixed-size native structs.
#[derive(Debug)]
pub(crate) struct FetchBuffer {
    words: Vec<u64>,
    len: usize,
}

impl FetchBuffer {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(size_of::<u64>())],
            len,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn as_mut_ptr(&mut self) -> SQLPOINTER {
        self.words.as_mut_ptr() as *mut c_void
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        // SAFETY: `words` owns at least `len` initialized bytes.
        unsafe { std::slice::from_raw_parts(self.words.as_ptr() as *const u8, self.len) }
    }
}

/// One described result column with its fetch buffer.
#[derive(Debug)]
pub struct Column {
    description: ColumnDescription,
    plan: FetchPlan,
    buffer: Option<FetchBuffer>,
}

impl Column {
    pub fn new(description: ColumnDescription, plan: FetchPlan) -> Self {
        let buffer = (plan.buffer_size > 0).then(|| FetchBuffer::new(plan.buffer_size));
        Self {
            description,
            plan,
            buffer,
        }
    }

    pub fn title(&self) -> &str {
        &self.description.title
    }

    pub fn description(&self) -> &ColumnDescription {
        &self.description
    }

    pub fn plan(&self) -> FetchPlan {
        self.plan
    }

    pub fn fetch_type(&self) -> FetchType {
        self.plan.fetch_type
    }

    pub fn info(&self) -> ColumnInfo {
        ColumnInfo {
            description: self.description.clone(),
            plan: self.plan,
        }
    }

    pub(crate) fn buffer_mut(&mut self) -> Option<&mut FetchBuffer> {
        self.buffer.as_mut()
    }

    pub(crate) fn buffer(&self) -> Option<&FetchBuffer> {
        self.buffer.as_ref()
    }
}

/// Derives the fetch plan for a declared column type.
///
/// `ceiling` caps the characters pre-allocated for long or unsized text, whose remainder
/// is read by continuation.
pub fn plan(
    description: &ColumnDescription,
    encoding: CharEncoding,
    ceiling: usize,
) -> Result<FetchPlan> {
    let fixed = |fetch_type, buffer_size| FetchPlan {
        fetch_type,
        buffer_size,
        extendable: false,
    };
    let unsigned = description.unsigned;

    let plan = match description.sql_type {
        SQL_BIT => fixed(FetchType::Bit, size_of::<u8>()),
        // Some drivers garble unsigned tiny values fetched as SQL_C_ULONG.
        SQL_TINYINT if unsigned => fixed(FetchType::UTinyInt, size_of::<u8>()),
        SQL_TINYINT => fixed(FetchType::SLong, size_of::<i32>()),
        SQL_SMALLINT | SQL_INTEGER if unsigned => fixed(FetchType::ULong, size_of::<u32>()),
        SQL_SMALLINT | SQL_INTEGER => fixed(FetchType::SLong, size_of::<i32>()),
        SQL_BIGINT if unsigned => fixed(FetchType::UBigInt, size_of::<u64>()),
        SQL_BIGINT => fixed(FetchType::SBigInt, size_of::<i64>()),
        SQL_DECIMAL | SQL_NUMERIC | SQL_REAL | SQL_FLOAT | SQL_DOUBLE => {
            fixed(FetchType::Double, size_of::<f64>())
        }
        SQL_TYPE_DATE => fixed(FetchType::Date, size_of::<DATE_STRUCT>()),
        SQL_TYPE_TIME => fixed(FetchType::Time, size_of::<TIME_STRUCT>()),
        SQL_TYPE_TIMESTAMP => fixed(FetchType::Timestamp, size_of::<TIMESTAMP_STRUCT>()),
        SQL_BINARY | SQL_VARBINARY | SQL_LONGVARBINARY => fixed(FetchType::Binary, 0),
        SQL_CHAR | SQL_VARCHAR | SQL_LONGVARCHAR => {
            let fetch_type = match encoding {
                CharEncoding::Utf16 => FetchType::Wide,
                CharEncoding::Utf8 => FetchType::Narrow(NarrowEncoding::Utf8),
                CharEncoding::Latin1 => FetchType::Narrow(NarrowEncoding::Latin1),
            };
            text_plan(description, fetch_type, ceiling)
        }
        SQL_WCHAR | SQL_WVARCHAR | SQL_WLONGVARCHAR => {
            text_plan(description, FetchType::Wide, ceiling)
        }
        other => {
            return Err(Error::unsupported(format!(
                "Unknown column SQL_XXX type {} for column {:?}",
                other, description.title
            )))
        }
    };
    Ok(plan)
}

fn text_plan(description: &ColumnDescription, fetch_type: FetchType, ceiling: usize) -> FetchPlan {
    let declared = description.column_size;
    let extendable = matches!(description.sql_type, SQL_LONGVARCHAR | SQL_WLONGVARCHAR)
        || declared == 0
        || declared > ceiling;
    let chars = match extendable {
        true if declared == 0 => ceiling,
        true => declared.min(ceiling),
        false => declared,
    };
    // Column sizes count characters, a UTF-8 character takes up to four bytes.
    let unit = match fetch_type {
        FetchType::Narrow(NarrowEncoding::Utf8) => 4,
        FetchType::Wide => SQLWCHAR_SIZE,
        _ => 1,
    };
    FetchPlan {
        fetch_type,
        buffer_size: chars * unit + fetch_type.terminator_size(),
        extendable,
    }
}

/// Maps the type name of a column reported as `SQL_VARCHAR` to its actual type.
///
/// Some drivers (SQLite's notably) report every column as `SQL_VARCHAR`.
pub fn resolve_type_name(name: &str) -> Result<SQLSMALLINT> {
    let sql_type = match name.to_ascii_uppercase().as_str() {
        "VARCHAR" => SQL_VARCHAR,
        "BINARY" => SQL_BINARY,
        "VARBINARY" => SQL_VARBINARY,
        "CHAR" => SQL_CHAR,
        "NCHAR" => SQL_WCHAR,
        "NVARCHAR" => SQL_WVARCHAR,
        "DECIMAL" => SQL_DECIMAL,
        _ => {
            return Err(Error::unsupported(format!(
                "SQL_VARCHAR reported by ODBC for unknown type: {}",
                name
            )))
        }
    };
    Ok(sql_type)
}

/// Describes columns `1..=count` of an executed statement and plans their fetch.
pub fn describe(
    functions: &FunctionTable,
    hstmt: Handle,
    count: SQLUSMALLINT,
    encoding: CharEncoding,
    ceiling: usize,
) -> Result<Vec<Column>> {
    (1..=count)
        .map(|number| {
            let description = describe_column(functions, hstmt, number)?;
            let plan = plan(&description, encoding, ceiling)?;
            Ok(Column::new(description, plan))
        })
        .collect()
}

fn describe_column(
    functions: &FunctionTable,
    hstmt: Handle,
    number: SQLUSMALLINT,
) -> Result<ColumnDescription> {
    let mut title: [SQLWCHAR; TITLE_BUFFER_SIZE] = [0; TITLE_BUFFER_SIZE];
    let mut title_len: SQLSMALLINT = 0;
    let mut sql_type: SQLSMALLINT = 0;
    let mut column_size: SQLULEN = 0;
    let mut precision: SQLSMALLINT = 0;
    let mut nullable: SQLSMALLINT = 0;

    let method = odbc_method!(functions, SQLDescribeColW);
    let rc = unsafe {
        method(
            hstmt.as_raw(),
            number,
            title.as_mut_ptr(),
            TITLE_BUFFER_SIZE as SQLSMALLINT,
            &mut title_len,
            &mut sql_type,
            &mut column_size,
            &mut precision,
            &mut nullable,
        )
    };
    diagnostics::check(functions, rc, HandleKind::Statement, Some(hstmt))?;
    let title_len = (title_len.max(0) as usize).min(TITLE_BUFFER_SIZE - 1);

    let unsigned = column_attribute(functions, hstmt, number, SQL_DESC_UNSIGNED)? == SQL_TRUE;

    if sql_type == SQL_VARCHAR {
        let name = type_name(functions, hstmt, number)?;
        sql_type = resolve_type_name(&name)?;
    }

    Ok(ColumnDescription {
        title: String::from_utf16_lossy(&title[..title_len]),
        sql_type,
        column_size,
        precision,
        nullable,
        unsigned,
    })
}

fn column_attribute(
    functions: &FunctionTable,
    hstmt: Handle,
    number: SQLUSMALLINT,
    field: SQLUSMALLINT,
) -> Result<SQLLEN> {
    let mut value: SQLLEN = 0;
    let method = odbc_method!(functions, SQLColAttributeW);
    let rc = unsafe {
        method(
            hstmt.as_raw(),
            number,
            field,
            null_mut(),
            0,
            null_mut(),
            &mut value,
        )
    };
    diagnostics::check(functions, rc, HandleKind::Statement, Some(hstmt))?;
    Ok(value)
}

fn type_name(functions: &FunctionTable, hstmt: Handle, number: SQLUSMALLINT) -> Result<String> {
    let mut name: [SQLWCHAR; TYPE_NAME_BUFFER_SIZE] = [0; TYPE_NAME_BUFFER_SIZE];
    let mut name_len: SQLSMALLINT = 0;
    let method = odbc_method!(functions, SQLColAttributeW);
    let rc = unsafe {
        method(
            hstmt.as_raw(),
            number,
            SQL_DESC_TYPE_NAME,
            name.as_mut_ptr() as SQLPOINTER,
            (TYPE_NAME_BUFFER_SIZE * SQLWCHAR_SIZE) as SQLSMALLINT,
            &mut name_len,
            null_mut(),
        )
    };
    diagnostics::check(functions, rc, HandleKind::Statement, Some(hstmt))?;

    // The reported length is in bytes; trust the terminator if it comes first.
    let reported = (name_len.max(0) as usize / SQLWCHAR_SIZE).min(TYPE_NAME_BUFFER_SIZE - 1);
    let len = name[..reported]
        .iter()
        .position(|c| *c == 0)
        .unwrap_or(reported);
    Ok(String::from_utf16_lossy(&name[..len]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Status;

    fn description(sql_type: SQLSMALLINT, column_size: SQLULEN, unsigned: bool) -> ColumnDescription {
        ColumnDescription {
            title: "C".into(),
            sql_type,
            column_size,
            precision: 0,
            nullable: 1,
            unsigned,
        }
    }

    fn plan_for(sql_type: SQLSMALLINT, column_size: SQLULEN, unsigned: bool) -> FetchPlan {
        plan(
            &description(sql_type, column_size, unsigned),
            CharEncoding::Utf16,
            32700,
        )
        .unwrap()
    }

    #[test]
    fn test_integer_plans() {
        assert_eq!(plan_for(SQL_BIT, 1, false).fetch_type, FetchType::Bit);
        assert_eq!(plan_for(SQL_TINYINT, 3, true).fetch_type, FetchType::UTinyInt);
        assert_eq!(plan_for(SQL_TINYINT, 3, false).fetch_type, FetchType::SLong);
        assert_eq!(plan_for(SQL_SMALLINT, 5, true).fetch_type, FetchType::ULong);
        assert_eq!(plan_for(SQL_INTEGER, 10, false).fetch_type, FetchType::SLong);
        assert_eq!(plan_for(SQL_BIGINT, 19, true).fetch_type, FetchType::UBigInt);
        assert_eq!(plan_for(SQL_BIGINT, 19, false).buffer_size, 8);
        assert_eq!(plan_for(SQL_NUMERIC, 10, false).fetch_type, FetchType::Double);
    }

    #[test]
    fn test_binary_is_deferred() {
        let plan = plan_for(SQL_VARBINARY, 100, false);
        assert_eq!(plan.fetch_type, FetchType::Binary);
        assert_eq!(plan.buffer_size, 0);
        assert!(Column::new(description(SQL_VARBINARY, 100, false), plan)
            .buffer()
            .is_none());
    }

    #[test]
    fn test_text_plans() {
        let plan = plan_for(SQL_WVARCHAR, 10, false);
        assert_eq!(plan.fetch_type, FetchType::Wide);
        assert_eq!(plan.buffer_size, 22);
        assert!(!plan.extendable);

        let narrow = super::plan(
            &description(SQL_VARCHAR, 10, false),
            CharEncoding::Latin1,
            32700,
        )
        .unwrap();
        assert_eq!(narrow.fetch_type, FetchType::Narrow(NarrowEncoding::Latin1));
        assert_eq!(narrow.buffer_size, 11);

        let narrow = super::plan(
            &description(SQL_CHAR, 10, false),
            CharEncoding::Utf8,
            32700,
        )
        .unwrap();
        assert_eq!(narrow.buffer_size, 41);

        // Narrow columns follow the wide policy.
        assert_eq!(plan_for(SQL_CHAR, 10, false).fetch_type, FetchType::Wide);
    }

    #[test]
    fn test_long_text_is_capped() {
        let plan = plan_for(SQL_WLONGVARCHAR, 1073741824, false);
        assert_eq!(plan.buffer_size, 32701 * 2);
        assert!(plan.extendable);

        let plan = plan_for(SQL_LONGVARCHAR, 100, false);
        assert_eq!(plan.buffer_size, 101 * 2);
        assert!(plan.extendable);

        let plan = plan_for(SQL_VARCHAR, 0, false);
        assert_eq!(plan.buffer_size, 32701 * 2);
        assert!(plan.extendable);
    }

    #[test]
    fn test_unknown_type() {
        let error = plan(&description(-154, 0, false), CharEncoding::Utf16, 32700).unwrap_err();
        assert_eq!(error.status, Status::Unsupported);
    }

    #[test]
    fn test_resolve_type_name() {
        assert_eq!(resolve_type_name("varchar").unwrap(), SQL_VARCHAR);
        assert_eq!(resolve_type_name("NVarChar").unwrap(), SQL_WVARCHAR);
        assert_eq!(resolve_type_name("nchar").unwrap(), SQL_WCHAR);
        assert_eq!(resolve_type_name("Decimal").unwrap(), SQL_DECIMAL);
        assert_eq!(resolve_type_name("BLOB").unwrap_err().status, Status::Unsupported);
    }

    #[test]
    fn test_fetch_buffer_alignment() {
        let mut buffer = FetchBuffer::new(13);
        assert_eq!(buffer.len(), 13);
        assert_eq!(buffer.bytes(), &[0u8; 13]);
        assert_eq!(buffer.as_mut_ptr() as usize % std::mem::align_of::<u64>(), 0);
    }
}
