use serde::{Deserialize, Serialize};
use strum_macros::Display;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    #[default]
    Unstarted,
    Unknown,
    Success,
    Fail,
}

/// Outcome of a single process run, with whatever log lines it produced, in order.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
pub struct ProcessStatus {
    pub name: String,
    pub status: Status,
    pub logs: Vec<String>,
}

impl ProcessStatus {
    pub fn new(name: String) -> Self {
        ProcessStatus {
            name,
            status: Status::Unstarted,
            logs: vec![],
        }
    }
}
