//! Pre-insert id generation hooks.

use crate::error::{Result, StoreError};
use crate::types::Canon;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Identity of the operation a hook applies to
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct HookKey {
    pub role: String,
    pub target: String,
}

impl HookKey {
    pub fn new(role: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for HookKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "role:{},target:{}", self.role, self.target)
    }
}

/// Supplies the id for an entity about to be inserted without one
#[async_trait]
pub trait IdGenerator: Send + Sync {
    async fn generate(&self, canon: &Canon, fields: &Map<String, Value>) -> Result<Value>;
}

#[async_trait]
impl<F> IdGenerator for F
where
    F: Fn(&Canon, &Map<String, Value>) -> Result<Value> + Send + Sync,
{
    async fn generate(&self, canon: &Canon, fields: &Map<String, Value>) -> Result<Value> {
        (self)(canon, fields)
    }
}

/// Random v4 UUID behind a fixed prefix, e.g. `test_6f1c...`
#[derive(Debug, Clone, Default)]
pub struct PrefixedUuid {
    prefix: String,
}

impl PrefixedUuid {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl IdGenerator for PrefixedUuid {
    async fn generate(&self, _canon: &Canon, _fields: &Map<String, Value>) -> Result<Value> {
        Ok(Value::String(format!("{}{}", self.prefix, uuid::Uuid::new_v4())))
    }
}

/// At most one generator per key
#[derive(Clone, Default)]
pub struct IdHookRegistry {
    hooks: HashMap<HookKey, Arc<dyn IdGenerator>>,
}

impl IdHookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generator, returning the one it replaced
    pub fn register(
        &mut self,
        key: HookKey,
        generator: Arc<dyn IdGenerator>,
    ) -> Option<Arc<dyn IdGenerator>> {
        let previous = self.hooks.insert(key.clone(), generator);
        if previous.is_some() {
            warn!("Replacing id hook for {}", key);
        } else {
            debug!("Registered id hook for {}", key);
        }
        previous
    }

    pub fn get(&self, key: &HookKey) -> Option<&Arc<dyn IdGenerator>> {
        self.hooks.get(key)
    }

    pub fn contains(&self, key: &HookKey) -> bool {
        self.hooks.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run the hook for `key`, if any. `Ok(None)` means the backend default
    /// id mechanism applies.
    pub async fn generate(
        &self,
        key: &HookKey,
        canon: &Canon,
        fields: &Map<String, Value>,
    ) -> Result<Option<Value>> {
        let Some(generator) = self.hooks.get(key) else {
            return Ok(None);
        };

        let id = generator.generate(canon, fields).await.map_err(|e| match e {
            StoreError::IdGeneration(_) => e,
            other => StoreError::IdGeneration(other.to_string()),
        })?;

        match id {
            Value::String(ref s) if !s.is_empty() => Ok(Some(id)),
            Value::Number(_) => Ok(Some(id)),
            other => Err(StoreError::IdGeneration(format!(
                "Hook {} returned an unusable id: {}",
                key, other
            ))),
        }
    }
}

impl fmt::Debug for IdHookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdHookRegistry")
            .field("keys", &self.hooks.keys().collect::<Vec<_>>())
            .finish()
    }
}
