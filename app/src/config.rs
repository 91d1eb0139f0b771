use pgcdc::postgres_input::PostgresInputConfig;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub input: PostgresInputConfig,
    /// Upper bound on process runs in flight at once.
    #[serde(default = "default_max_concurrent_processes")]
    pub max_concurrent_processes: usize,
}

fn default_max_concurrent_processes() -> usize {
    1
}
