//! User accounts and the repository abstraction behind them.

use crate::error::{MedShareError, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User as exposed over the API, without the password hash.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

impl User {
    pub fn new(new_user: NewUser) -> Self {
        let now = Utc::now();
        User {
            id: Uuid::new_v4().to_string(),
            email: normalize_email(&new_user.email),
            password_hash: new_user.password_hash,
            name: new_user.name,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Emails are compared case-insensitively and without surrounding whitespace.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Storage for user accounts.
///
/// `create` must check email uniqueness and insert atomically: two
/// concurrent calls with the same email yield one user and one `UserExists`.
pub trait UserRepository: Send + Sync {
    fn create(&self, new_user: NewUser) -> Result<User>;
    fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    fn find_by_id(&self, id: &str) -> Result<Option<User>>;
    /// Applies the provided fields and bumps `updated_at`. `None` when no
    /// such user exists.
    fn update_profile(&self, id: &str, name: Option<&str>) -> Result<Option<User>>;
    fn count(&self) -> Result<usize>;
}

#[derive(Default)]
struct UserTable {
    by_id: HashMap<String, User>,
    id_by_email: HashMap<String, String>,
}

/// Process-local repository; contents are lost on restart.
#[derive(Default)]
pub struct InMemoryUserRepository {
    table: RwLock<UserTable>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUserRepository {
    fn create(&self, new_user: NewUser) -> Result<User> {
        let user = User::new(new_user);

        // Check and insert under a single write lock.
        let mut table = self.table.write();
        if table.id_by_email.contains_key(&user.email) {
            return Err(MedShareError::UserExists);
        }
        table.id_by_email.insert(user.email.clone(), user.id.clone());
        table.by_id.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let table = self.table.read();
        Ok(table
            .id_by_email
            .get(&normalize_email(email))
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.table.read().by_id.get(id).cloned())
    }

    fn update_profile(&self, id: &str, name: Option<&str>) -> Result<Option<User>> {
        let mut table = self.table.write();
        let Some(user) = table.by_id.get_mut(id) else {
            return Ok(None);
        };
        if let Some(name) = name {
            user.name = name.to_string();
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    fn count(&self) -> Result<usize> {
        Ok(self.table.read().by_id.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            name: "Ada".to_string(),
        }
    }

    #[test]
    fn test_create_and_lookup() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(new_user("ada@example.com")).unwrap();

        assert_eq!(repo.find_by_id(&user.id).unwrap().unwrap(), user);
        assert_eq!(repo.find_by_email("ADA@example.com ").unwrap().unwrap().id, user.id);
        assert!(repo.find_by_email("bob@example.com").unwrap().is_none());
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("ada@example.com")).unwrap();
        let err = repo.create(new_user("Ada@Example.com")).unwrap_err();
        assert!(matches!(err, MedShareError::UserExists));
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_concurrent_registration_yields_one_user() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let repo = repo.clone();
                std::thread::spawn(move || repo.create(new_user("race@example.com")).is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_update_profile() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(new_user("ada@example.com")).unwrap();

        let updated = repo.update_profile(&user.id, Some("Ada L.")).unwrap().unwrap();
        assert_eq!(updated.name, "Ada L.");
        assert!(updated.updated_at >= user.updated_at);

        let unchanged = repo.update_profile(&user.id, None).unwrap().unwrap();
        assert_eq!(unchanged.name, "Ada L.");
        assert!(repo.update_profile("missing", Some("x")).unwrap().is_none());
    }

    #[test]
    fn test_public_view_has_no_hash() {
        let user = User::new(new_user("ada@example.com"));
        let json = serde_json::to_value(user.to_public()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json["createdAt"].is_string());
    }
}
