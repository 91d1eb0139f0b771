use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display};

/// Identifier of the mutated row, as carried by a notification payload.
///
/// Producers disagree on how they encode ids, so integers, strings and null
/// are all accepted. Non-integral numbers keep their JSON text as a `String`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum RowId {
    Integer(i64),
    String(String),
    #[default]
    Null,
}

impl Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RowId::Integer(i) => write!(f, "{}", i),
            RowId::String(s) => write!(f, "{}", s),
            RowId::Null => Ok(()),
        }
    }
}

impl<'de> Deserialize<'de> for RowId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Null => Ok(RowId::Null),
            serde_json::Value::String(s) => Ok(RowId::String(s)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(RowId::Integer(i)),
                None => Ok(RowId::String(n.to_string())),
            },
            other => Err(D::Error::custom(format!(
                "row id must be an integer, string or null, got {}",
                other
            ))),
        }
    }
}

impl Serialize for RowId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            RowId::Integer(i) => serializer.serialize_i64(*i),
            RowId::String(s) => serializer.serialize_str(s),
            RowId::Null => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::from_str;

    #[test]
    fn test_deserialize_variants() {
        assert_eq!(from_str::<RowId>("42").unwrap(), RowId::Integer(42));
        assert_eq!(from_str::<RowId>("-7").unwrap(), RowId::Integer(-7));
        assert_eq!(from_str::<RowId>("\"42\"").unwrap(), RowId::String("42".into()));
        assert_eq!(from_str::<RowId>("null").unwrap(), RowId::Null);
        assert_eq!(from_str::<RowId>("1.5").unwrap(), RowId::String("1.5".into()));
        assert!(from_str::<RowId>("[1]").is_err());
        assert!(from_str::<RowId>("true").is_err());
    }

    #[test]
    fn test_canonical_string() {
        assert_eq!(RowId::Integer(1).to_string(), "1");
        assert_eq!(RowId::String("1".into()).to_string(), "1");
        assert_eq!(RowId::String("abc-123".into()).to_string(), "abc-123");
        assert_eq!(RowId::Null.to_string(), "");
    }
}
