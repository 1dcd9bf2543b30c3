//! Entry point for callers: resolve descriptors by kind and name, then run record
//! operations against them.

use crate::config::EngineConfig;
use crate::db::Database;
use crate::descriptor::{Descriptor, DescriptorKind, DescriptorResolver};
use crate::error::AppError;
use crate::service::{DictionaryStore, EntityStore, RecordStore};

pub struct Engine {
    db: Database,
    entities: DescriptorResolver,
    dictionaries: DescriptorResolver,
    entity_store: EntityStore,
    dictionary_store: DictionaryStore,
}

impl Engine {
    pub fn new(db: Database) -> Self {
        let config = db.config();
        Engine {
            entities: DescriptorResolver::new(DescriptorKind::Entity, config),
            dictionaries: DescriptorResolver::new(DescriptorKind::Dictionary, config),
            entity_store: EntityStore::new(db.clone()),
            dictionary_store: DictionaryStore::new(db.clone()),
            db,
        }
    }

    /// Connect a pool for `config` and build the engine on it.
    pub async fn connect(config: EngineConfig) -> Result<Self, AppError> {
        Ok(Self::new(Database::connect(config).await?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn resolver(&self, kind: DescriptorKind) -> &DescriptorResolver {
        match kind {
            DescriptorKind::Entity => &self.entities,
            DescriptorKind::Dictionary => &self.dictionaries,
        }
    }

    /// Descriptor by case-insensitive name; `None` when there is none.
    pub async fn resolve(&self, kind: DescriptorKind, name: &str) -> Result<Option<Descriptor>, AppError> {
        self.resolver(kind).get_by_name(&self.db, name).await
    }

    pub async fn resolve_by_id(&self, kind: DescriptorKind, id: i32) -> Result<Option<Descriptor>, AppError> {
        self.resolver(kind).get_by_id(&self.db, id).await
    }

    pub async fn descriptors(&self, kind: DescriptorKind) -> Result<Vec<Descriptor>, AppError> {
        self.resolver(kind).list_all(&self.db).await
    }

    /// Store serving records of `kind`.
    pub fn store(&self, kind: DescriptorKind) -> &dyn RecordStore {
        match kind {
            DescriptorKind::Entity => &self.entity_store,
            DescriptorKind::Dictionary => &self.dictionary_store,
        }
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entity_store
    }

    pub fn dictionaries(&self) -> &DictionaryStore {
        &self.dictionary_store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    async fn stores_and_resolvers_follow_kind() {
        let config = EngineConfig::new("postgres://postgres@127.0.0.1:1/none");
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        let engine = Engine::new(Database::from_pool(pool, config).unwrap());
        for kind in [DescriptorKind::Entity, DescriptorKind::Dictionary] {
            assert_eq!(engine.store(kind).kind(), kind);
            assert_eq!(engine.resolver(kind).kind(), kind);
        }
    }
}
