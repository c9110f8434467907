use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::ffi::constants;

pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_LONG_TEXT_CEILING: usize = 32700;

#[cfg(target_os = "windows")]
pub const DEFAULT_DRIVER_MANAGER: &str = "odbc32.dll";
#[cfg(target_os = "macos")]
pub const DEFAULT_DRIVER_MANAGER: &str = "libodbc.2.dylib";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const DEFAULT_DRIVER_MANAGER: &str = "libodbc.so.2";

/// How text travels through narrow (`CHAR`, `VARCHAR`, `LONGVARCHAR`) columns and text
/// parameters.
///
/// `Utf16` lets the driver manager translate from wide characters, which every driver
/// supports; the narrow choices exist for drivers whose single-byte data is known to be
/// UTF-8 or Latin-1.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharEncoding {
    Utf8,
    #[default]
    Utf16,
    Latin1,
}

impl FromStr for CharEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" => Ok(Self::Utf8),
            "utf-16" | "ucs-2" => Ok(Self::Utf16),
            "latin-1" => Ok(Self::Latin1),
            _ => Err(Error::invalid_argument(format!(
                "Encoding must be utf-8, utf-16 or latin-1, got {:?}",
                s
            ))),
        }
    }
}

impl Display for CharEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Utf8 => "utf-8",
            Self::Utf16 => "utf-16",
            Self::Latin1 => "latin-1",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadWrite,
    ReadOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoCommit {
    On,
    Off,
}

impl From<AccessMode> for usize {
    fn from(value: AccessMode) -> Self {
        match value {
            AccessMode::ReadWrite => constants::SQL_MODE_READ_WRITE,
            AccessMode::ReadOnly => constants::SQL_MODE_READ_ONLY,
        }
    }
}

impl From<AutoCommit> for usize {
    fn from(value: AutoCommit) -> Self {
        match value {
            AutoCommit::On => constants::SQL_AUTOCOMMIT_ON,
            AutoCommit::Off => constants::SQL_AUTOCOMMIT_OFF,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentOptions {
    pub char_encoding: CharEncoding,
    pub login_timeout: Duration,
    /// Characters pre-allocated for long text columns, whose declared size is unusable.
    pub long_text_ceiling: usize,
    /// Library loaded by [crate::Environment::global].
    pub driver_manager: String,
}

impl Default for EnvironmentOptions {
    fn default() -> Self {
        Self {
            char_encoding: CharEncoding::default(),
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
            long_text_ceiling: DEFAULT_LONG_TEXT_CEILING,
            driver_manager: DEFAULT_DRIVER_MANAGER.into(),
        }
    }
}

impl EnvironmentOptions {
    pub const ENV_CHAR_ENCODING: &'static str = "ODBC_CORE_CHAR_ENCODING";
    pub const ENV_LOGIN_TIMEOUT: &'static str = "ODBC_CORE_LOGIN_TIMEOUT";
    pub const ENV_LONG_TEXT_CEILING: &'static str = "ODBC_CORE_LONG_TEXT_CEILING";
    pub const ENV_DRIVER_MANAGER: &'static str = "ODBC_CORE_DRIVER_MANAGER";

    /// Defaults overridden by the `ODBC_CORE_*` process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut options = Self::default();
        if let Some(value) = lookup(Self::ENV_CHAR_ENCODING) {
            options.char_encoding = value.parse()?;
        }
        if let Some(value) = lookup(Self::ENV_LOGIN_TIMEOUT) {
            let seconds: u64 = parse_number(Self::ENV_LOGIN_TIMEOUT, &value)?;
            options.login_timeout = Duration::from_secs(seconds);
        }
        if let Some(value) = lookup(Self::ENV_LONG_TEXT_CEILING) {
            let ceiling: usize = parse_number(Self::ENV_LONG_TEXT_CEILING, &value)?;
            if ceiling == 0 {
                return Err(Error::invalid_argument(format!(
                    "{} must be positive",
                    Self::ENV_LONG_TEXT_CEILING
                )));
            }
            options.long_text_ceiling = ceiling;
        }
        if let Some(value) = lookup(Self::ENV_DRIVER_MANAGER) {
            options.driver_manager = value;
        }
        Ok(options)
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::invalid_argument(format!("Invalid value for {}: {:?}", key, value)))
}
