use serde::{Deserialize, Deserializer, Serialize};
use std::convert::Infallible;
use std::str::FromStr;
use strum_macros::{AsRefStr, Display};

/// The kind of row mutation an event describes.
///
/// Both the trigger spelling (`INSERT`, `UPDATE`, `DELETE`) and the event
/// spelling (`create`, `update`, `delete`) are accepted, case-insensitively.
/// Anything else decodes to `Unknown` rather than failing.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
    Unknown,
}

impl FromStr for Operation {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "insert" | "create" => Ok(Operation::Create),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            _ => Ok(Operation::Unknown),
        }
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse::<Operation>().unwrap_or(Operation::Unknown))
    }
}
