//! Lazy provisioning of data tables from descriptors.

use crate::config::EngineConfig;
use crate::db::{Connector, SqlExecutor};
use crate::descriptor::{Descriptor, TableRef};
use crate::error::AppError;
use crate::sql::{ddl, QueryBuf};

/// Creates a descriptor's data table the first time it is used.
#[derive(Clone, Debug)]
pub struct SchemaProvisioner {
    config: EngineConfig,
}

impl SchemaProvisioner {
    pub fn new(config: &EngineConfig) -> Self {
        SchemaProvisioner {
            config: config.clone(),
        }
    }

    /// Backing table of `descriptor`, without touching the database.
    pub fn table_ref(&self, descriptor: &Descriptor) -> Result<TableRef, AppError> {
        descriptor.table_ref(self.config.default_schema(descriptor.kind()))
    }

    /// Provision the table when the descriptor reports it missing, then return it.
    ///
    /// All DDL runs in one transaction on `conn`; a failure part way leaves nothing behind.
    /// The decision rests only on the `is_table_exists` flag read with the descriptor, so two
    /// callers holding the same freshly fetched descriptor can both attempt the DDL. The
    /// loser fails on `CREATE TABLE` and its transaction rolls back; the table itself is
    /// created once.
    pub async fn ensure_table(
        &self,
        conn: &mut Connector,
        descriptor: &Descriptor,
    ) -> Result<TableRef, AppError> {
        let table = self.table_ref(descriptor)?;
        if descriptor.is_table_exists {
            return Ok(table);
        }

        let kind = descriptor.kind();
        let mut tx = conn.begin_transaction().await?;
        for stmt in ddl::provision_statements(kind, &table, &descriptor.description) {
            tx.execute_non_query(&QueryBuf::raw(stmt)).await?;
        }
        tx.commit().await?;
        tracing::info!(table = %table, kind = %kind, "data table provisioned");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{sample, DescriptorKind};

    #[test]
    fn blank_schema_uses_data_schema() {
        let config = EngineConfig::new("postgres://localhost/test").with_data_schema("catalog");
        let p = SchemaProvisioner::new(&config);
        let mut d = sample(DescriptorKind::Dictionary, "Genres");
        d.schema_name = Some("  ".into());
        assert_eq!(p.table_ref(&d).unwrap().full_name(), "catalog.genres");

        d.schema_name = Some("Media".into());
        assert_eq!(p.table_ref(&d).unwrap().full_name(), "media.genres");
    }

    #[test]
    fn invalid_table_name_is_rejected_before_sql() {
        let p = SchemaProvisioner::new(&EngineConfig::new("postgres://localhost/test"));
        let d = sample(DescriptorKind::Entity, "movies; drop table x");
        assert!(matches!(p.table_ref(&d), Err(AppError::InvalidIdentifier(_))));
    }
}
