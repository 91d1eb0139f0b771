use crate::event::operation::Operation;
use serde::{Deserialize, Serialize};

/// One captured row mutation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Event {
    /// Name of the table the mutation happened on.
    pub location: String,
    pub operation: Operation,
    /// Canonical string form of the row id.
    pub id: String,
    /// Identity of the connector that captured the mutation.
    pub trigger: String,
}
