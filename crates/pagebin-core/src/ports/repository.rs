use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Site, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}

/// Site repository.
#[async_trait]
pub trait SiteRepository: BaseRepository<Site, Uuid> {
    /// Find a site by its slug.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Site>, RepoError>;

    /// Record one page view against a site. Returns the new total.
    async fn record_hit(&self, slug: &str) -> Result<u64, RepoError>;
}
