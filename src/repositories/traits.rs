//! Repository trait definitions

use async_trait::async_trait;

use crate::errors::RepositoryResult;

/// Core repository trait shared by entity stores
///
/// # Type Parameters
///
/// * `T` - The entity type
/// * `ID` - The identifier type
#[async_trait]
pub trait Repository<T, ID: Send + 'static>: Send + Sync {
    /// Query type for filtering and searching
    type Query;

    /// Find entities matching a query
    async fn find_all(&self, query: Self::Query) -> RepositoryResult<Vec<T>>;

    /// Delete an entity by ID
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Entity deleted
    /// * `Err(RepositoryError)` - Entity not found or database error
    async fn delete(&self, id: ID) -> RepositoryResult<()>;
}
