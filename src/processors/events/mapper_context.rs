use crate::{
    config::processor_config::AmmProcessorConfig,
    db::{
        cache::EntityCache,
        store::{Entity, Store},
    },
    utils::{
        errors::{ProcessorError, ProcessorResult},
        token_metadata::TokenContractReader,
    },
};

/// Everything an event mapper reads from or writes to.
///
/// Mappers clone entities out of the cache, mutate them and put them back.
/// Nothing reaches the store until the batch flushes.
pub struct MapperContext<'a, S: Store, R: TokenContractReader> {
    pub cache: &'a mut EntityCache,
    pub store: &'a S,
    pub token_reader: &'a R,
    pub config: &'a AmmProcessorConfig,
}

impl<'a, S: Store, R: TokenContractReader> MapperContext<'a, S, R> {
    pub fn new(
        cache: &'a mut EntityCache,
        store: &'a S,
        token_reader: &'a R,
        config: &'a AmmProcessorConfig,
    ) -> Self {
        Self {
            cache,
            store,
            token_reader,
            config,
        }
    }

    pub async fn load<E: Entity>(&mut self, id: &str) -> ProcessorResult<Option<E>> {
        Ok(self.cache.load::<E, S>(self.store, id).await?)
    }

    /// Loads an entity that must already exist.
    pub async fn require<E: Entity>(&mut self, id: &str) -> ProcessorResult<E> {
        self.load::<E>(id)
            .await?
            .ok_or_else(|| ProcessorError::missing(E::KIND, id))
    }

    pub fn put<E: Entity>(&mut self, entity: E) {
        self.cache.put(entity);
    }
}
