use crate::hooks::{HookKey, IdGenerator, IdHookRegistry};
use crate::mapping::{ColumnMapper, IdentityMapper};
use std::fmt;
use std::sync::Arc;

/// Role under which stores consult the id hook registry
pub const DEFAULT_HOOK_ROLE: &str = "sql";
/// Target under which stores consult the id hook registry
pub const DEFAULT_HOOK_TARGET: &str = "postgresql-store";

/// Immutable store configuration: column mapping and id hooks.
///
/// Built once before traffic starts and shared read-only afterwards.
#[derive(Clone)]
pub struct StoreConfig {
    mapper: Arc<dyn ColumnMapper>,
    id_hooks: IdHookRegistry,
    hook_key: HookKey,
}

impl StoreConfig {
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    pub fn mapper(&self) -> &dyn ColumnMapper {
        self.mapper.as_ref()
    }

    pub fn id_hooks(&self) -> &IdHookRegistry {
        &self.id_hooks
    }

    /// Key this store's inserts look up in the registry
    pub fn hook_key(&self) -> &HookKey {
        &self.hook_key
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("id_hooks", &self.id_hooks)
            .field("hook_key", &self.hook_key)
            .finish_non_exhaustive()
    }
}

pub struct StoreConfigBuilder {
    mapper: Arc<dyn ColumnMapper>,
    id_hooks: IdHookRegistry,
    hook_key: HookKey,
}

impl Default for StoreConfigBuilder {
    fn default() -> Self {
        Self {
            mapper: Arc::new(IdentityMapper),
            id_hooks: IdHookRegistry::new(),
            hook_key: HookKey::new(DEFAULT_HOOK_ROLE, DEFAULT_HOOK_TARGET),
        }
    }
}

impl StoreConfigBuilder {
    pub fn mapper(mut self, mapper: impl ColumnMapper + 'static) -> Self {
        self.mapper = Arc::new(mapper);
        self
    }

    pub fn shared_mapper(mut self, mapper: Arc<dyn ColumnMapper>) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn hook_key(mut self, key: HookKey) -> Self {
        self.hook_key = key;
        self
    }

    /// Register a generator; a second registration for the same key replaces the first
    pub fn id_hook(mut self, key: HookKey, generator: impl IdGenerator + 'static) -> Self {
        self.id_hooks.register(key, Arc::new(generator));
        self
    }

    /// Register a generator under this builder's hook key
    pub fn default_id_hook(self, generator: impl IdGenerator + 'static) -> Self {
        let key = self.hook_key.clone();
        self.id_hook(key, generator)
    }

    pub fn id_hooks(mut self, registry: IdHookRegistry) -> Self {
        self.id_hooks = registry;
        self
    }

    pub fn build(self) -> StoreConfig {
        StoreConfig {
            mapper: self.mapper,
            id_hooks: self.id_hooks,
            hook_key: self.hook_key,
        }
    }
}
