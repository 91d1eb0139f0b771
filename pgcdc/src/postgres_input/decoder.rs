use crate::error::{PgCdcError, PgCdcResult};
use crate::event::{Event, Operation, RowId};
use crate::postgres_input::identity::ConnectorIdentity;
use serde::Deserialize;

/// Payload written by the trigger function: `{"tbl": ..., "id": ..., "op": ...}`.
#[derive(Deserialize, Debug, PartialEq)]
pub struct TriggerPayload {
    #[serde(rename = "tbl")]
    pub table: String,
    #[serde(default)]
    pub id: RowId,
    #[serde(rename = "op")]
    pub operation: Operation,
}

#[derive(Debug, Clone)]
pub struct Decoder {
    trigger: String,
    lock_table: String,
}

impl Decoder {
    pub fn new(identity: &ConnectorIdentity) -> Self {
        Decoder {
            trigger: identity.as_str().to_string(),
            lock_table: identity.lock_table(),
        }
    }

    /// `Ok(None)` means the payload is valid but concerns the connector's own
    /// lock table, and is not an event.
    pub fn decode(&self, payload: &str) -> PgCdcResult<Option<Event>> {
        let payload: TriggerPayload =
            serde_json::from_str(payload).map_err(PgCdcError::DecodeError)?;

        if payload.table == self.lock_table {
            return Ok(None);
        }

        Ok(Some(Event {
            location: payload.table,
            operation: payload.operation,
            id: payload.id.to_string(),
            trigger: self.trigger.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> Decoder {
        Decoder::new(&ConnectorIdentity::new("test_input").unwrap())
    }

    #[test]
    fn test_decode() {
        let event = decoder()
            .decode(r#"{"tbl": "test", "id": "1", "op": "INSERT"}"#)
            .unwrap()
            .unwrap();

        assert_eq!(
            event,
            Event {
                location: "test".into(),
                operation: Operation::Create,
                id: "1".into(),
                trigger: "test_input".into(),
            }
        );
    }

    #[test]
    fn test_decode_id_forms() {
        let d = decoder();
        let numeric = d.decode(r#"{"tbl": "t", "id": 7, "op": "UPDATE"}"#).unwrap().unwrap();
        assert_eq!(numeric.id, "7");

        let null = d.decode(r#"{"tbl": "t", "id": null, "op": "DELETE"}"#).unwrap().unwrap();
        assert_eq!(null.id, "");
        assert_eq!(null.operation, Operation::Delete);

        let missing = d.decode(r#"{"tbl": "t", "op": "DELETE"}"#).unwrap().unwrap();
        assert_eq!(missing.id, "");
    }

    #[test]
    fn test_unknown_operation_is_not_an_error() {
        let event = decoder()
            .decode(r#"{"tbl": "t", "id": 1, "op": "TRUNCATE"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(event.operation, Operation::Unknown);
    }

    #[test]
    fn test_lock_table_is_filtered() {
        let decoded = decoder()
            .decode(r#"{"tbl": "lock_postgres_input_test_input", "id": "1", "op": "INSERT"}"#)
            .unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn test_another_connectors_lock_table_is_not_filtered() {
        let decoded = decoder()
            .decode(r#"{"tbl": "lock_postgres_input_other", "id": "1", "op": "INSERT"}"#)
            .unwrap();
        assert!(decoded.is_some());
    }

    #[test]
    fn test_malformed_payload() {
        let d = decoder();
        assert!(matches!(
            d.decode("some bollocks"),
            Err(PgCdcError::DecodeError(_))
        ));
        assert!(matches!(
            d.decode(r#"{"id": 1, "op": "INSERT"}"#),
            Err(PgCdcError::DecodeError(_))
        ));
        assert!(matches!(
            d.decode(r#"{"tbl": "t", "id": [1], "op": "INSERT"}"#),
            Err(PgCdcError::DecodeError(_))
        ));
    }
}
