use crate::error::Result;
use crate::types::{Canon, Entity, Query};
use async_trait::async_trait;
use serde_json::Value;

/// The entity action contract every backend implements.
///
/// Each action other than [`EntityStore::native`] acquires and releases its
/// own connection, on failure as well as on success.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Raw connection handle returned by [`EntityStore::native`]
    type Native: Send;

    /// Insert when the entity has no `id`, update otherwise. Returns the
    /// stored row, id included.
    async fn save(&self, entity: Entity) -> Result<Entity>;

    /// First matching entity, or `None` when nothing matches
    async fn load(&self, canon: &Canon, query: &Query) -> Result<Option<Entity>>;

    /// Every matching entity, in query order
    async fn list(&self, canon: &Canon, query: &Query) -> Result<Vec<Entity>>;

    /// Delete matching rows, returning how many were removed.
    /// Without `query.all` at most one row is deleted.
    async fn remove(&self, canon: &Canon, query: &Query) -> Result<u64>;

    /// Pooled connection for the caller to drive directly. The caller must
    /// release it.
    async fn native(&self, canon: &Canon) -> Result<Self::Native>;

    async fn load_by_id(&self, canon: &Canon, id: Value) -> Result<Option<Entity>> {
        self.load(canon, &Query::by_id(id)).await
    }
}
