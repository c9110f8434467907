use arrow::error::ArrowError;
use widestring::error::ContainsNul;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The driver reported a failure and supplied a diagnostic record.
    Native,
    /// The driver reported a failure but had no diagnostic record for it.
    NoDiagnostic,
    /// The diagnostic request itself was rejected (invalid handle or record number).
    BadDiagnostic,
    /// A return code that is undocumented or belongs to an unsupported mode of operation.
    UnexpectedReturn,
    InvalidArguments,
    Unsupported,
    Overflow,
    InvalidData,
    Internal,
    InvalidState,
    Load,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{status:?}: {message}{}", native_detail(.sqlstate, .native_code))]
pub struct Error {
    pub message: String,
    pub status: Status,
    pub native_code: i32,
    /// Five character SQLSTATE, empty when the error did not come from a driver.
    pub sqlstate: String,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn with_message_and_status(message: impl Into<String>, status: Status) -> Self {
        Self {
            message: message.into(),
            status,
            native_code: 0,
            sqlstate: String::new(),
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::with_message_and_status(message, Status::InvalidArguments)
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::with_message_and_status(message, Status::Unsupported)
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::with_message_and_status(message, Status::Internal)
    }

    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        Self::with_message_and_status(message, Status::InvalidState)
    }
}

fn native_detail(sqlstate: &str, native_code: &i32) -> String {
    match sqlstate.is_empty() {
        true => String::new(),
        false => format!(" (sqlstate: {}, native_code: {})", sqlstate, native_code),
    }
}

impl From<ArrowError> for Error {
    fn from(value: ArrowError) -> Self {
        Self::with_message_and_status(value.to_string(), Status::Internal)
    }
}

impl From<ContainsNul<u16>> for Error {
    fn from(value: ContainsNul<u16>) -> Self {
        Self::with_message_and_status(
            format!(
                "Interior null character was found at position {}",
                value.nul_position()
            ),
            Status::InvalidArguments,
        )
    }
}

#[cfg(feature = "driver_manager")]
impl From<libloading::Error> for Error {
    fn from(value: libloading::Error) -> Self {
        Self::with_message_and_status(value.to_string(), Status::Load)
    }
}
