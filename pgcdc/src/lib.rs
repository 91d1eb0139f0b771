//! Clusterable change-data-capture input for Postgres.
//!
//! Row mutations are captured with triggers that `pg_notify` a per-connector
//! channel. Redundant replicas coordinate through a row lock so that only one
//! of them listens at a time.

pub mod error;
pub mod event;
pub mod input;
pub mod postgres_input;
pub mod process;
