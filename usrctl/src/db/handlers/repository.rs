//! Base repository trait for database operations.

/// Contains the Repository trait.
///
/// A repository is a data access layer over one postgres table (plus whatever dependent
/// tables it owns). It provides methods for creating, reading, updating, and listing
/// entities with simple filters.
use crate::db::errors::Result;

/// Base repository trait providing common database operations
///
/// This trait has separate associated types for create requests, update requests, and responses.
#[async_trait::async_trait]
pub trait Repository {
    /// The request type for creating entities
    type CreateRequest;

    /// The request type for updating entities
    type UpdateRequest;

    /// The response/DTO type returned by operations
    type Response;

    /// The identifier type for lookups
    type Id: Send + Sync;

    /// The filter type for list operations
    type Filter: Send + Sync;

    /// Create a new entity, returning its external identifier
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Id>;

    /// Get an entity by ID
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    /// List entities with filtering and pagination
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Count entities matching the filter, ignoring sort and pagination
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64>;

    /// Update an entity by ID
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<()>;
}
