pub mod generic;

pub use generic::{PgCdcError, PgCdcResult};
