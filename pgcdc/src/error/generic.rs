use std::error::Error;
use std::fmt::{self, Display};
use std::time::Duration;

pub type PgCdcResult<T> = Result<T, PgCdcError>;

#[derive(Debug)]
pub enum PgCdcError {
    InvalidConfigError(&'static str, String),
    InvalidConnectionStringError(String),
    UrlParseError(url::ParseError),
    ConnectTimeoutError(Duration),
    PostgresError(tokio_postgres::Error),
    LockRowMissingError(String),
    LockLostError(String),
    ListenerError(tokio_postgres::Error),
    ListenerClosedError,
    DecodeError(serde_json::Error),
    OutputClosedError,
    SerdeJsonError(serde_json::Error),
}

impl Display for PgCdcError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PgCdcError::InvalidConfigError(field, reason) => {
                write!(f, "Invalid value for field '{}': {}", field, reason)
            }
            PgCdcError::InvalidConnectionStringError(s) => {
                write!(f, "Invalid connection string: {}", s)
            }
            PgCdcError::UrlParseError(e) => write!(f, "Invalid connection URL: {}", e),
            PgCdcError::ConnectTimeoutError(d) => {
                write!(f, "Timed out connecting to Postgres after {:?}", d)
            }
            PgCdcError::PostgresError(e) => {
                write!(f, "Postgres error: {}", describe_postgres_error(e))
            }
            PgCdcError::LockRowMissingError(table) => {
                write!(f, "Lock row missing from lock table '{}'", table)
            }
            PgCdcError::LockLostError(reason) => {
                write!(f, "Leadership lock connection lost: {}", reason)
            }
            PgCdcError::ListenerError(e) => {
                write!(f, "Notification listener error: {}", describe_postgres_error(e))
            }
            PgCdcError::ListenerClosedError => write!(f, "Notification listener closed"),
            PgCdcError::DecodeError(e) => write!(f, "Malformed notification payload: {}", e),
            PgCdcError::OutputClosedError => write!(f, "Event output channel closed"),
            PgCdcError::SerdeJsonError(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl Error for PgCdcError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PgCdcError::UrlParseError(e) => Some(e),
            PgCdcError::PostgresError(e) | PgCdcError::ListenerError(e) => Some(e),
            PgCdcError::DecodeError(e) | PgCdcError::SerdeJsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<url::ParseError> for PgCdcError {
    fn from(error: url::ParseError) -> Self {
        PgCdcError::UrlParseError(error)
    }
}

impl From<tokio_postgres::Error> for PgCdcError {
    fn from(error: tokio_postgres::Error) -> Self {
        PgCdcError::PostgresError(error)
    }
}

impl From<serde_json::Error> for PgCdcError {
    fn from(error: serde_json::Error) -> Self {
        PgCdcError::SerdeJsonError(error)
    }
}

/// The driver's `Display` for server errors is just "db error"; pull the
/// server's message and SQLSTATE out when there is one.
pub fn describe_postgres_error(error: &tokio_postgres::Error) -> String {
    match error.as_db_error() {
        Some(db) => format!("{}: {} ({})", error, db.message(), db.code().code()),
        None => error.to_string(),
    }
}
