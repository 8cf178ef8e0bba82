//! SQLite persistence for user accounts

use crate::error::{MedShareError, Result};
use crate::users::{normalize_email, NewUser, User, UserRepository};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::sync::Mutex;

pub struct SqliteUserRepository {
    conn: Mutex<Connection>,
}

impl SqliteUserRepository {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| MedShareError::Database(format!("Failed to open database: {}", e)))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| MedShareError::Database(format!("Failed to open database: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| MedShareError::Database(format!("Failed to create users table: {}", e)))?;

        Ok(SqliteUserRepository {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| MedShareError::Database("Mutex poisoned".to_string()))
    }

    fn query_one(&self, sql: &str, key: &str) -> Result<Option<User>> {
        let conn = self.lock()?;
        conn.query_row(sql, params![key], row_to_user)
            .optional()
            .map_err(|e| MedShareError::Database(format!("Failed to query user: {}", e)))
    }
}

fn parse_timestamp(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        name: row.get(3)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

const SELECT_USER: &str = "SELECT id, email, password_hash, name, created_at, updated_at FROM users";

impl UserRepository for SqliteUserRepository {
    fn create(&self, new_user: NewUser) -> Result<User> {
        let user = User::new(new_user);
        let conn = self.lock()?;

        // The UNIQUE constraint makes check-and-insert a single statement.
        let result = conn.execute(
            "INSERT INTO users (id, email, password_hash, name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id,
                user.email,
                user.password_hash,
                user.name,
                user.created_at.to_rfc3339(),
                user.updated_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(user),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(MedShareError::UserExists)
            }
            Err(e) => Err(MedShareError::Database(format!("Failed to save user: {}", e))),
        }
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.query_one(
            &format!("{} WHERE email = ?1", SELECT_USER),
            &normalize_email(email),
        )
    }

    fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        self.query_one(&format!("{} WHERE id = ?1", SELECT_USER), id)
    }

    fn update_profile(&self, id: &str, name: Option<&str>) -> Result<Option<User>> {
        let now = Utc::now().to_rfc3339();
        {
            let conn = self.lock()?;
            let changed = conn
                .execute(
                    "UPDATE users SET name = COALESCE(?1, name), updated_at = ?2 WHERE id = ?3",
                    params![name, now, id],
                )
                .map_err(|e| MedShareError::Database(format!("Failed to update user: {}", e)))?;
            if changed == 0 {
                return Ok(None);
            }
        }
        self.find_by_id(id)
    }

    fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(|e| MedShareError::Database(format!("Failed to count users: {}", e)))?;
        Ok(count as usize)
    }
}
