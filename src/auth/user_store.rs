//! User Storage
//! Mission: Look up user accounts by username, backed by SQLite

use crate::auth::models::{User, UserRole};
use crate::auth::password::hash_password;
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use tracing::info;
use uuid::Uuid;

/// Lookup criteria for [`UserRepository::find_one`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCriteria {
    pub username: String,
}

impl UserCriteria {
    pub fn username(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// Read side of user persistence used by the login flow.
///
/// `Ok(None)` means not found. `Err` is reserved for storage failures.
pub trait UserRepository: Send + Sync {
    fn find_one(&self, criteria: &UserCriteria) -> Result<Option<User>>;
}

/// User storage with SQLite backend
pub struct UserStore {
    db_path: String,
    bcrypt_cost: u32,
}

impl UserStore {
    /// Create a new user store and initialize database
    pub fn new(db_path: &str, bcrypt_cost: u32) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
            bcrypt_cost,
        };
        store.init_db()?;
        Ok(store)
    }

    /// Initialize database schema
    fn init_db(&self) -> Result<()> {
        let conn = self.connect()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create users table")?;

        Ok(())
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .with_context(|| format!("Failed to open user database at {}", self.db_path))
    }

    /// Create the bootstrap admin unless the username is already taken
    pub fn ensure_admin(&self, username: &str, password: &str) -> Result<()> {
        if self
            .find_one(&UserCriteria::username(username))?
            .is_some()
        {
            return Ok(());
        }

        self.create_user(username, password, UserRole::Admin)?;
        info!("🔐 Bootstrap admin user created (username: {})", username);
        Ok(())
    }

    /// Create a new user
    pub fn create_user(&self, username: &str, password: &str, role: UserRole) -> Result<User> {
        let password_hash =
            hash_password(password, self.bcrypt_cost).context("Failed to hash password")?;
        self.insert_user(username, password_hash, role)
    }

    /// Insert a user with an already computed hash
    pub fn insert_user(&self, username: &str, password_hash: String, role: UserRole) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash,
            role,
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO users (id, username, password_hash, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id.to_string(),
                user.username,
                user.password_hash,
                user.role.as_str(),
                user.created_at,
            ],
        )
        .context("Failed to insert user")?;

        info!("✅ Created user: {} ({})", user.username, user.role);

        Ok(user)
    }
}

impl UserRepository for UserStore {
    fn find_one(&self, criteria: &UserCriteria) -> Result<Option<User>> {
        let conn = self.connect()?;

        let mut stmt = conn.prepare(
            "SELECT id, username, password_hash, role, created_at
             FROM users WHERE username = ?1",
        )?;

        let user_result = stmt.query_row(params![criteria.username], |row| Ok(read_row(row)));

        match user_result {
            Ok(user) => user.map(Some),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e).context("Failed to query user"),
        }
    }
}

fn read_row(row: &Row<'_>) -> Result<User> {
    let id: String = row.get(0)?;
    let username: String = row.get(1)?;
    let role: String = row.get(3)?;

    let role = role
        .parse::<UserRole>()
        .map_err(|e| anyhow!("Corrupt role for user {}: {}", id, e))?;

    Ok(User {
        id: Uuid::parse_str(&id).with_context(|| format!("Corrupt user id: {}", id))?,
        username,
        password_hash: row.get(2)?,
        role,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (UserStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();
        let store = UserStore::new(db_path, 4).unwrap();
        (store, temp_file)
    }

    #[test]
    fn test_create_and_find_user() {
        let (store, _temp) = create_test_store();

        let alice = store
            .create_user("alice", "correct-secret", UserRole::User)
            .unwrap();

        let found = store
            .find_one(&UserCriteria::username("alice"))
            .unwrap()
            .unwrap();
        assert_eq!(found.id, alice.id);
        assert_eq!(found.role, UserRole::User);
        assert!(verify_password(&found.password_hash, "correct-secret").is_ok());
    }

    #[test]
    fn test_missing_user_is_none() {
        let (store, _temp) = create_test_store();
        assert!(store
            .find_one(&UserCriteria::username("nobody"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_username_is_case_sensitive() {
        let (store, _temp) = create_test_store();
        store.create_user("alice", "pw", UserRole::User).unwrap();

        assert!(store
            .find_one(&UserCriteria::username("Alice"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let (store, _temp) = create_test_store();
        store.create_user("alice", "pw", UserRole::User).unwrap();
        assert!(store.create_user("alice", "pw2", UserRole::Admin).is_err());
    }

    #[test]
    fn test_ensure_admin_is_idempotent() {
        let (store, _temp) = create_test_store();

        store.ensure_admin("root", "first").unwrap();
        store.ensure_admin("root", "second").unwrap();

        let root = store
            .find_one(&UserCriteria::username("root"))
            .unwrap()
            .unwrap();
        assert_eq!(root.role, UserRole::Admin);
        // The original password survives the second call
        assert!(verify_password(&root.password_hash, "first").is_ok());
    }

    #[test]
    fn test_unknown_role_is_an_error() {
        let (store, temp) = create_test_store();
        let conn = Connection::open(temp.path()).unwrap();
        conn.execute(
            "INSERT INTO users (id, username, password_hash, role, created_at)
             VALUES (?1, 'mallory', 'hash', 'superuser', '2025-01-01T00:00:00Z')",
            params![Uuid::new_v4().to_string()],
        )
        .unwrap();

        let err = store
            .find_one(&UserCriteria::username("mallory"))
            .unwrap_err();
        assert!(err.to_string().contains("Corrupt role"));
    }
}
