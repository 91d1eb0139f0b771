use crate::event::Operation;
use crate::postgres_input::policy::{DecodePolicy, ListenerErrorPolicy};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PostgresInputConfig {
    pub name: String,
    /// Either a `postgres://` URL or a key/value connection string.
    pub connection_string: String,
    /// Declared operation filters. Every operation is currently delivered regardless.
    #[serde(default)]
    pub operations: Vec<Operation>,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default)]
    pub decode_policy: DecodePolicy,
    #[serde(default)]
    pub listener_error_policy: ListenerErrorPolicy,
}

fn default_schema() -> String {
    "public".to_string()
}

impl PostgresInputConfig {
    pub fn new(name: String, connection_string: String) -> Self {
        PostgresInputConfig {
            name,
            connection_string,
            operations: vec![],
            schema: default_schema(),
            decode_policy: DecodePolicy::default(),
            listener_error_policy: ListenerErrorPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_with_defaults() {
        let config: PostgresInputConfig = serde_json::from_value(json!({
            "name": "test-input",
            "connection_string": "host=localhost user=postgres",
        }))
        .unwrap();

        assert_eq!(
            config,
            PostgresInputConfig::new("test-input".into(), "host=localhost user=postgres".into())
        );
        assert_eq!(config.schema, "public");
    }

    #[test]
    fn test_deserialize_full() {
        let config: PostgresInputConfig = serde_json::from_value(json!({
            "name": "orders",
            "connection_string": "postgres://u:p@db/shop",
            "operations": ["create", "DELETE"],
            "schema": "sales",
            "decode_policy": "skip",
            "listener_error_policy": "reconnect",
        }))
        .unwrap();

        assert_eq!(config.operations, vec![Operation::Create, Operation::Delete]);
        assert_eq!(config.schema, "sales");
        assert_eq!(config.decode_policy, DecodePolicy::Skip);
        assert_eq!(config.listener_error_policy, ListenerErrorPolicy::Reconnect);
    }
}
