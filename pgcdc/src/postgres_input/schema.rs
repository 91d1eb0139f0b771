use crate::error::PgCdcResult;
use crate::postgres_input::identity::ConnectorIdentity;
use log::{debug, info};
use tokio_postgres::Client;

const LIST_TABLES_QUERY: &str = "SELECT tablename FROM pg_catalog.pg_tables \
     WHERE schemaname = $1 AND tablename != $2 ORDER BY tablename";

// Held until the transaction ends. Concurrent creation of the same function or
// table fails on a catalog unique index even with replace semantics.
const INSTRUMENT_LOCK_QUERY: &str = "SELECT pg_advisory_xact_lock(hashtext($1))";

/// Installs everything a connector needs in the target schema: the
/// notify-emitting trigger function, one trigger per table and the lock table.
///
/// Every statement replaces or skips what already exists, and runs under a
/// transaction-scoped advisory lock keyed on the connector, so any number of
/// replicas can run this at startup.
#[derive(Debug, Clone)]
pub struct SchemaInstrumenter {
    identity: ConnectorIdentity,
    schema: String,
}

impl SchemaInstrumenter {
    pub fn new(identity: ConnectorIdentity, schema: String) -> Self {
        SchemaInstrumenter { identity, schema }
    }

    /// Runs the whole installation in one transaction and returns the tables
    /// that received a trigger. On error the transaction is rolled back.
    pub async fn instrument(&self, client: &mut Client) -> PgCdcResult<Vec<String>> {
        let lock_table = self.identity.lock_table();
        let tx = client.transaction().await?;

        tx.execute(INSTRUMENT_LOCK_QUERY, &[&self.identity.as_str()])
            .await?;
        tx.batch_execute(&self.trigger_function_sql()).await?;

        let tables: Vec<String> = tx
            .query(LIST_TABLES_QUERY, &[&self.schema, &lock_table])
            .await?
            .iter()
            .map(|row| row.get(0))
            .collect();

        for table in &tables {
            debug!("Attaching trigger to {}.{}", self.schema, table);
            tx.batch_execute(&self.trigger_sql(table)).await?;
        }

        tx.batch_execute(&self.lock_table_sql()).await?;
        tx.commit().await?;

        info!(
            "Instrumented {} table(s) in schema '{}' for connector {}",
            tables.len(),
            self.schema,
            self.identity
        );
        Ok(tables)
    }

    pub fn trigger_function_sql(&self) -> String {
        let function = self.identity.trigger_function();
        format!(
            r#"CREATE OR REPLACE FUNCTION {qualified}() RETURNS TRIGGER AS ${tag}$
DECLARE
    rec RECORD;
BEGIN
    IF TG_OP = 'DELETE' THEN
        rec := OLD;
    ELSE
        rec := NEW;
    END IF;
    PERFORM pg_notify({channel}, json_build_object('tbl', TG_TABLE_NAME, 'id', to_jsonb(rec) -> 'id', 'op', TG_OP)::text);
    RETURN NULL;
END;
${tag}$ LANGUAGE plpgsql;"#,
            qualified = self.qualify(&function),
            tag = function,
            channel = quote_literal(self.identity.channel()),
        )
    }

    pub fn trigger_sql(&self, table: &str) -> String {
        let trigger = quote_identifier(&self.identity.trigger_name(table));
        let table = self.qualify(table);
        format!(
            "DROP TRIGGER IF EXISTS {trigger} ON {table};
CREATE TRIGGER {trigger}
AFTER INSERT OR UPDATE OR DELETE ON {table} FOR EACH ROW
EXECUTE PROCEDURE {function}();",
            trigger = trigger,
            table = table,
            function = self.qualify(&self.identity.trigger_function()),
        )
    }

    /// Creates the lock table and its single lockable row.
    pub fn lock_table_sql(&self) -> String {
        let table = self.qualify(&self.identity.lock_table());
        format!(
            "CREATE TABLE IF NOT EXISTS {table} (resource int PRIMARY KEY);
INSERT INTO {table} (resource) VALUES (1) ON CONFLICT (resource) DO NOTHING;",
            table = table,
        )
    }

    pub fn qualify(&self, name: &str) -> String {
        format!("{}.{}", quote_identifier(&self.schema), quote_identifier(name))
    }
}

pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

pub fn quote_literal(literal: &str) -> String {
    format!("'{}'", literal.replace('\'', "''"))
}
