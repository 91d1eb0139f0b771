use crate::error::{PgCdcError, PgCdcResult};
use std::fmt::{self, Display};

/// Longest identifier Postgres keeps (`NAMEDATALEN - 1`).
pub const MAX_IDENTIFIER_LEN: usize = 63;

const LOCK_TABLE_PREFIX: &str = "lock_postgres_input_";

/// SQL-identifier-safe name that scopes every schema object a connector owns:
/// its trigger function, its per-table triggers, its lock table and its
/// notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectorIdentity(String);

impl ConnectorIdentity {
    pub fn new(name: &str) -> PgCdcResult<Self> {
        if name.trim().is_empty() {
            return Err(PgCdcError::InvalidConfigError(
                "name",
                "must not be empty".to_string(),
            ));
        }

        let mut id: String = name
            .to_lowercase()
            .chars()
            .map(|c| match c {
                'a'..='z' | '0'..='9' | '_' => c,
                _ => '_',
            })
            .collect();
        if id.starts_with(|c: char| c.is_ascii_digit()) {
            id.insert(0, '_');
        }

        // The lock table carries the longest fixed prefix of the derived names.
        let longest = LOCK_TABLE_PREFIX.len() + id.len();
        if longest > MAX_IDENTIFIER_LEN {
            return Err(PgCdcError::InvalidConfigError(
                "name",
                format!(
                    "'{}' derives the {} byte identifier '{}{}', Postgres allows {}",
                    name, longest, LOCK_TABLE_PREFIX, id, MAX_IDENTIFIER_LEN
                ),
            ));
        }

        Ok(ConnectorIdentity(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn channel(&self) -> &str {
        &self.0
    }

    pub fn trigger_function(&self) -> String {
        format!("process_record_{}", self.0)
    }

    pub fn lock_table(&self) -> String {
        format!("{}{}", LOCK_TABLE_PREFIX, self.0)
    }

    pub fn trigger_name(&self, table: &str) -> String {
        format!("{}_{}_trigger", table, self.0)
    }
}

impl Display for ConnectorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_name() {
        let id = ConnectorIdentity::new("test-input").unwrap();
        assert_eq!(id.as_str(), "test_input");
        assert_eq!(id.channel(), "test_input");
        assert_eq!(id.trigger_function(), "process_record_test_input");
        assert_eq!(id.lock_table(), "lock_postgres_input_test_input");
        assert_eq!(id.trigger_name("orders"), "orders_test_input_trigger");
    }

    #[test]
    fn test_replaces_every_non_identifier_character() {
        let id = ConnectorIdentity::new("My Input.v2-é").unwrap();
        assert_eq!(id.as_str(), "my_input_v2__");
    }

    #[test]
    fn test_leading_digit() {
        let id = ConnectorIdentity::new("1st-input").unwrap();
        assert_eq!(id.as_str(), "_1st_input");
    }

    #[test]
    fn test_empty_name() {
        assert!(ConnectorIdentity::new("").is_err());
        assert!(matches!(
            ConnectorIdentity::new("   "),
            Err(PgCdcError::InvalidConfigError("name", _))
        ));
    }

    #[test]
    fn test_name_length_limit() {
        let longest = "a".repeat(MAX_IDENTIFIER_LEN - LOCK_TABLE_PREFIX.len());
        let id = ConnectorIdentity::new(&longest).unwrap();
        assert_eq!(id.lock_table().len(), MAX_IDENTIFIER_LEN);

        let too_long = format!("{}b", longest);
        assert!(matches!(
            ConnectorIdentity::new(&too_long),
            Err(PgCdcError::InvalidConfigError("name", _))
        ));
        // The prefix added to a leading digit counts too.
        assert!(ConnectorIdentity::new(&format!("1{}", longest)).is_err());
    }
}
