//! In-memory repositories backed by HashMaps with async RwLocks.
//!
//! Note: Data is lost on process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use pagebin_core::domain::{Site, User};
use pagebin_core::error::RepoError;
use pagebin_core::ports::{BaseRepository, SiteRepository, UserRepository};

/// In-memory user store keyed by id.
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: User) -> Result<User, RepoError> {
        self.users.write().await.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.users.write().await.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }
}

/// In-memory site store keyed by id, with slug lookups by scan.
pub struct InMemorySiteRepository {
    sites: RwLock<HashMap<Uuid, Site>>,
}

impl InMemorySiteRepository {
    pub fn new() -> Self {
        Self {
            sites: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySiteRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<Site, Uuid> for InMemorySiteRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Site>, RepoError> {
        Ok(self.sites.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: Site) -> Result<Site, RepoError> {
        let mut sites = self.sites.write().await;

        // Slug uniqueness is the one constraint the store enforces.
        let slug_taken = sites
            .values()
            .any(|s| s.slug == entity.slug && s.id != entity.id);
        if slug_taken {
            return Err(RepoError::Constraint(format!(
                "slug '{}' already in use",
                entity.slug
            )));
        }

        sites.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.sites.write().await.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl SiteRepository for InMemorySiteRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Site>, RepoError> {
        let sites = self.sites.read().await;
        Ok(sites.values().find(|s| s.slug == slug).cloned())
    }

    async fn record_hit(&self, slug: &str) -> Result<u64, RepoError> {
        let mut sites = self.sites.write().await;
        let site = sites
            .values_mut()
            .find(|s| s.slug == slug)
            .ok_or(RepoError::NotFound)?;

        site.hits += 1;
        Ok(site.hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_user_save_and_find_by_email() {
        let repo = InMemoryUserRepository::new();
        let user = User::new("a@example.com".into(), "hash".into());
        let saved = repo.save(user).await.unwrap();

        let found = repo.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, saved.id);
        assert!(repo.find_by_email("b@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_site_slug_uniqueness() {
        let repo = InMemorySiteRepository::new();
        let owner = Uuid::new_v4();

        repo.save(Site::new("demo".into(), "Demo".into(), owner))
            .await
            .unwrap();

        let dup = repo
            .save(Site::new("demo".into(), "Other".into(), owner))
            .await;
        assert!(matches!(dup, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_site_update_keeps_own_slug() {
        let repo = InMemorySiteRepository::new();
        let owner = Uuid::new_v4();

        let mut site = repo
            .save(Site::new("demo".into(), "Demo".into(), owner))
            .await
            .unwrap();
        site.name = "Renamed".into();

        // Re-saving under the same slug is not a conflict.
        let updated = repo.save(site).await.unwrap();
        assert_eq!(updated.name, "Renamed");
    }

    #[tokio::test]
    async fn test_record_hit_increments() {
        let repo = InMemorySiteRepository::new();
        let owner = Uuid::new_v4();
        repo.save(Site::new("demo".into(), "Demo".into(), owner))
            .await
            .unwrap();

        assert_eq!(repo.record_hit("demo").await.unwrap(), 1);
        assert_eq!(repo.record_hit("demo").await.unwrap(), 2);
        assert!(matches!(
            repo.record_hit("missing").await,
            Err(RepoError::NotFound)
        ));
    }
}
