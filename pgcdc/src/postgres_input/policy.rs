use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// What a session does with a notification payload it cannot decode.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DecodePolicy {
    /// Log and drop the payload; the session carries on.
    Skip,
    /// End the session with a decode error.
    #[default]
    Fail,
}

/// What the listener does when its connection fails.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ListenerErrorPolicy {
    /// Every listener error ends the session.
    #[default]
    Fatal,
    /// Reconnect with backoff after transient failures. Terminal failures still end the session.
    Reconnect,
}
