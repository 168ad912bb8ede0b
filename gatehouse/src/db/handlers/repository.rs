//! Base repository trait for database operations.

use crate::db::errors::Result;

/// Common shape for repositories backing paginated list surfaces.
///
/// A repository is a data access layer for one table, wrapping a connection
/// or transaction. Entity-specific mutations (status/role/password updates,
/// window counts) are inherent methods on the concrete repositories; this
/// trait covers the operations every listable entity shares.
#[async_trait::async_trait]
pub trait Repository {
    /// The request type for creating entities
    type CreateRequest;

    /// The response/DTO type returned by operations
    type Response;

    /// The identifier type for lookups
    type Id: Send + Sync;

    /// The filter type for list operations
    type Filter: Send + Sync;

    /// Create a new entity
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// Get an entity by ID
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    /// List entities with filtering and pagination
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Count entities matching the filter, ignoring pagination
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64>;
}
