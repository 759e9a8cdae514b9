//! Local user credential store.
//!
//! One SQLite table of user records: username, password, API key, and a
//! security question/answer pair for password recovery. Passwords are stored
//! as entered; a single-user desktop database, inherited behavior.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A registered user, as returned by [`UserStore::verify`].
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub username: String,
    pub api_key: String,
    pub security_question: String,
}

pub struct UserStore {
    conn: Mutex<Connection>,
}

impl UserStore {
    /// Open (or create) the store at `dir/confab.db`.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join("confab.db"))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// In-memory store; no file is touched.
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;

            CREATE TABLE IF NOT EXISTS users (
                username TEXT PRIMARY KEY,
                password TEXT NOT NULL,
                api_key TEXT NOT NULL DEFAULT '',
                security_question TEXT NOT NULL,
                security_answer TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )?;
        Ok(())
    }

    /// Register a new user. Returns `false` when the username is taken.
    pub fn add(
        &self,
        username: &str,
        password: &str,
        security_question: &str,
        security_answer: &str,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO users (username, password, security_question, security_answer)
             VALUES (?1, ?2, ?3, ?4)",
            params![username, password, security_question, security_answer],
        )?;
        if inserted == 0 {
            tracing::debug!(username, "registration rejected, username taken");
        }
        Ok(inserted == 1)
    }

    pub fn exists(&self, username: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Check a username/password pair. `None` covers both "no such user" and
    /// "wrong password"; callers must not distinguish the two.
    pub fn verify(&self, username: &str, password: &str) -> Result<Option<UserRecord>> {
        let conn = self.conn.lock().unwrap();
        let record = conn
            .query_row(
                "SELECT username, api_key, security_question FROM users
                 WHERE username = ?1 AND password = ?2",
                params![username, password],
                |row| {
                    Ok(UserRecord {
                        username: row.get(0)?,
                        api_key: row.get(1)?,
                        security_question: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    pub fn security_question(&self, username: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let question = conn
            .query_row(
                "SELECT security_question FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()?;
        Ok(question)
    }

    /// Reset a password, gated on the security answer. Returns `false` when
    /// the user is missing or the answer is wrong (again undistinguished).
    pub fn reset_password(
        &self,
        username: &str,
        security_answer: &str,
        new_password: &str,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE users SET password = ?3
             WHERE username = ?1 AND security_answer = ?2",
            params![username, security_answer, new_password],
        )?;
        Ok(updated == 1)
    }

    pub fn update_api_key(&self, username: &str, api_key: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE users SET api_key = ?2 WHERE username = ?1",
            params![username, api_key],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> UserStore {
        UserStore::open_in_memory().unwrap()
    }

    #[test]
    fn add_then_verify_round_trip() {
        let s = store();
        assert!(s.add("ada", "hunter2", "favorite engine?", "analytical").unwrap());
        assert!(s.exists("ada").unwrap());

        let record = s.verify("ada", "hunter2").unwrap().expect("valid login");
        assert_eq!(record.username, "ada");
        assert_eq!(record.api_key, "");
    }

    #[test]
    fn duplicate_username_rejected() {
        let s = store();
        assert!(s.add("ada", "one", "q", "a").unwrap());
        assert!(!s.add("ada", "two", "q", "a").unwrap());
        // Original password still wins.
        assert!(s.verify("ada", "one").unwrap().is_some());
        assert!(s.verify("ada", "two").unwrap().is_none());
    }

    #[test]
    fn wrong_password_and_unknown_user_look_the_same() {
        let s = store();
        s.add("ada", "hunter2", "q", "a").unwrap();
        assert!(s.verify("ada", "wrong").unwrap().is_none());
        assert!(s.verify("ghost", "hunter2").unwrap().is_none());
    }

    #[test]
    fn security_question_lookup() {
        let s = store();
        s.add("ada", "pw", "favorite engine?", "analytical").unwrap();
        assert_eq!(
            s.security_question("ada").unwrap().as_deref(),
            Some("favorite engine?")
        );
        assert!(s.security_question("ghost").unwrap().is_none());
    }

    #[test]
    fn reset_password_requires_matching_answer() {
        let s = store();
        s.add("ada", "old", "q", "analytical").unwrap();

        assert!(!s.reset_password("ada", "wrong answer", "new").unwrap());
        assert!(s.verify("ada", "old").unwrap().is_some());

        assert!(s.reset_password("ada", "analytical", "new").unwrap());
        assert!(s.verify("ada", "old").unwrap().is_none());
        assert!(s.verify("ada", "new").unwrap().is_some());
    }

    #[test]
    fn api_key_update_persists() {
        let s = store();
        s.add("ada", "pw", "q", "a").unwrap();
        s.update_api_key("ada", "sk-test-123").unwrap();
        let record = s.verify("ada", "pw").unwrap().unwrap();
        assert_eq!(record.api_key, "sk-test-123");
    }

    #[test]
    fn survives_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let s = UserStore::open(dir.path()).unwrap();
            s.add("ada", "pw", "q", "a").unwrap();
        }
        let s = UserStore::open(dir.path()).unwrap();
        assert!(s.exists("ada").unwrap());
    }
}
