use crate::error::{PgCdcError, PgCdcResult};
use log::{debug, error};
use percent_encoding::percent_decode_str;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_postgres::tls::NoTlsStream;
use tokio_postgres::{Client, Config, Connection, NoTls, Socket};
use url::{Host, Url};

/// Deliberately short, so an unreachable database fails at construction
/// instead of stalling pipeline startup.
pub const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

pub type PgConnection = Connection<Socket, NoTlsStream>;

/// Rewrites a `postgres://` or `postgresql://` URL into key/value form.
/// Anything else is assumed to be key/value already and is returned trimmed.
///
/// Keys come out sorted; values are single-quoted.
pub fn normalize_connection_string(connection_string: &str) -> PgCdcResult<String> {
    let trimmed = connection_string.trim();
    if !(trimmed.starts_with("postgres://") || trimmed.starts_with("postgresql://")) {
        return Ok(trimmed.to_string());
    }

    let url = Url::parse(trimmed)?;
    let mut params: BTreeMap<String, String> = BTreeMap::new();

    if !url.username().is_empty() {
        params.insert("user".into(), decode(url.username())?);
    }
    if let Some(password) = url.password() {
        params.insert("password".into(), decode(password)?);
    }

    let host = match url.host() {
        Some(Host::Domain(domain)) => Some(decode(domain)?),
        Some(Host::Ipv4(addr)) => Some(addr.to_string()),
        Some(Host::Ipv6(addr)) => Some(addr.to_string()),
        None => None,
    };
    if let Some(host) = host {
        params.insert("host".into(), host);
    }
    if let Some(port) = url.port() {
        params.insert("port".into(), port.to_string());
    }

    let dbname = url.path().trim_start_matches('/');
    if !dbname.is_empty() {
        params.insert("dbname".into(), decode(dbname)?);
    }

    for (key, value) in url.query_pairs() {
        params.insert(key.into_owned(), value.into_owned());
    }

    let normalized = params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{}={}", key, quote_value(value)))
        .collect::<Vec<String>>()
        .join(" ");

    Ok(normalized)
}

/// Normalizes `connection_string` and parses it into a driver config.
pub fn parse_connection_string(connection_string: &str) -> PgCdcResult<Config> {
    let normalized = normalize_connection_string(connection_string)?;
    Config::from_str(&normalized)
        .map_err(|e| PgCdcError::InvalidConnectionStringError(e.to_string()))
}

pub async fn connect(config: &Config) -> PgCdcResult<(Client, PgConnection)> {
    match tokio::time::timeout(CONNECT_TIMEOUT, config.connect(NoTls)).await {
        Ok(connected) => {
            let (client, connection) = connected?;
            debug!("Connected to Postgres {:?}", config.get_dbname());
            Ok((client, connection))
        }
        Err(_) => Err(PgCdcError::ConnectTimeoutError(CONNECT_TIMEOUT)),
    }
}

/// Drives `connection` on its own task until it closes.
pub fn spawn_connection(connection: PgConnection, label: &'static str) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!("{} connection error: {}", label, e);
        }
    })
}

fn decode(component: &str) -> PgCdcResult<String> {
    percent_decode_str(component)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| PgCdcError::InvalidConnectionStringError(e.to_string()))
}

fn quote_value(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
