pub mod config;
pub mod connection;
pub mod connector;
pub mod decoder;
pub mod identity;
pub mod listener;
pub mod lock;
pub mod policy;
pub mod schema;
pub mod session;

pub use config::PostgresInputConfig;
pub use connector::PostgresInput;
pub use policy::{DecodePolicy, ListenerErrorPolicy};
