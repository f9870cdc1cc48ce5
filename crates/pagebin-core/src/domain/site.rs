use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Slugs are DNS-label-ish: lowercase alphanumeric and hyphens, 3-63 chars,
/// no leading/trailing hyphen.
pub fn validate_slug(slug: &str) -> Result<(), DomainError> {
    if is_valid_slug(slug) {
        Ok(())
    } else {
        Err(DomainError::Validation(
            "Slug must be 3-63 lowercase alphanumeric characters or hyphens".to_string(),
        ))
    }
}

fn is_valid_slug(slug: &str) -> bool {
    let len_ok = (3..=63).contains(&slug.len());
    let chars_ok = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    len_ok && chars_ok && !slug.starts_with('-') && !slug.ends_with('-')
}

/// A file uploaded into a site bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteFile {
    pub name: String,
    pub content: String,
    pub uploaded_at: DateTime<Utc>,
}

impl SiteFile {
    pub fn new(name: String, content: String) -> Self {
        Self {
            name,
            content,
            uploaded_at: Utc::now(),
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.content.len()
    }
}

/// Site entity - a hosted static site addressed by slug.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub owner_id: Uuid,
    pub files: Vec<SiteFile>,
    pub hits: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Site {
    /// Create a new site with generated ID and timestamps.
    pub fn new(slug: String, name: String, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            slug,
            name,
            owner_id,
            files: Vec::new(),
            hits: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn file(&self, name: &str) -> Option<&SiteFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Add or replace a file by name.
    pub fn put_file(&mut self, file: SiteFile) {
        self.files.retain(|f| f.name != file.name);
        self.files.push(file);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_slugs() {
        assert!(is_valid_slug("my-site"));
        assert!(is_valid_slug("abc"));
        assert!(is_valid_slug("site-42"));
    }

    #[test]
    fn test_invalid_slugs() {
        assert!(!is_valid_slug("ab"));
        assert!(!is_valid_slug("My-Site"));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug("trailing-"));
        assert!(!is_valid_slug("has space"));
    }

    #[test]
    fn test_put_file_replaces_by_name() {
        let mut site = Site::new("demo".into(), "Demo".into(), Uuid::new_v4());
        site.put_file(SiteFile::new("index.html".into(), "<p>v1</p>".into()));
        site.put_file(SiteFile::new("index.html".into(), "<p>v2</p>".into()));

        assert_eq!(site.files.len(), 1);
        assert_eq!(site.file("index.html").unwrap().content, "<p>v2</p>");
    }
}
