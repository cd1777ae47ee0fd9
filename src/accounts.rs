use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{RegisterError, StoreError};

pub const MIN_PASSWORD_LEN: usize = 5;

/// Account store the session authenticates against
pub trait CredentialStore {
    fn authenticate(&self, username: &str, password: &str) -> bool;
    fn register(&self, username: &str, password: &str) -> Result<(), RegisterError>;
}

impl<S: CredentialStore + ?Sized> CredentialStore for Box<S> {
    fn authenticate(&self, username: &str, password: &str) -> bool {
        (**self).authenticate(username, password)
    }

    fn register(&self, username: &str, password: &str) -> Result<(), RegisterError> {
        (**self).register(username, password)
    }
}

/// Lowercase hex SHA-256 of the password
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// At least [`MIN_PASSWORD_LEN`] characters with an uppercase letter, a
/// lowercase letter and a digit.
pub fn validate_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Validates a registration form before it reaches the store.
pub fn check_registration(
    username: &str,
    password: &str,
    confirm: &str,
) -> Result<(), RegisterError> {
    if username.trim().is_empty() || password.trim().is_empty() || confirm.trim().is_empty() {
        return Err(RegisterError::MissingField);
    }
    if password.trim() != confirm.trim() {
        return Err(RegisterError::PasswordMismatch);
    }
    if !validate_password(password.trim()) {
        return Err(RegisterError::WeakPassword);
    }
    Ok(())
}

/// SQLite-backed user accounts
#[derive(Debug)]
pub struct UserDb {
    conn: Connection,
}

impl UserDb {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                username TEXT PRIMARY KEY,
                password TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        Ok(UserDb { conn })
    }

    fn stored_hash(&self, username: &str) -> rusqlite::Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT password FROM users WHERE username = ?1",
                [username],
                |row| row.get(0),
            )
            .optional()
    }
}

impl CredentialStore for UserDb {
    fn authenticate(&self, username: &str, password: &str) -> bool {
        let (username, password) = (username.trim(), password.trim());
        if username.is_empty() || password.is_empty() {
            return false;
        }
        match self.stored_hash(username) {
            Ok(Some(hash)) => hash == hash_password(password),
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, username, "credential lookup failed");
                false
            }
        }
    }

    fn register(&self, username: &str, password: &str) -> Result<(), RegisterError> {
        let (username, password) = (username.trim(), password.trim());
        if username.is_empty() || password.is_empty() {
            return Err(RegisterError::MissingField);
        }
        if !validate_password(password) {
            return Err(RegisterError::WeakPassword);
        }
        if self.stored_hash(username)?.is_some() {
            return Err(RegisterError::UsernameTaken(username.to_string()));
        }

        self.conn.execute(
            "INSERT INTO users (username, password, created_at) VALUES (?1, ?2, ?3)",
            params![username, hash_password(password), Local::now().to_rfc3339()],
        )?;
        info!(username, "registered user");
        Ok(())
    }
}

pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join("users.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_hash_password_is_sha256_hex() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Abcd1"));
        assert!(!validate_password("Ab1"));
        assert!(!validate_password("abcd1"));
        assert!(!validate_password("ABCD1"));
        assert!(!validate_password("Abcde"));
    }

    #[test]
    fn test_check_registration() {
        assert_matches!(check_registration("", "Abcd1", "Abcd1"), Err(RegisterError::MissingField));
        assert_matches!(
            check_registration("ann", "Abcd1", "Abcd2"),
            Err(RegisterError::PasswordMismatch)
        );
        assert_matches!(check_registration("ann", "abc", "abc"), Err(RegisterError::WeakPassword));
        assert_matches!(check_registration("ann", "Abcd1", "Abcd1"), Ok(()));
    }

    #[test]
    fn test_register_then_authenticate() {
        let db = UserDb::open_in_memory().unwrap();
        db.register("ann", "Secret1").unwrap();

        assert!(db.authenticate("ann", "Secret1"));
        assert!(db.authenticate("  ann ", " Secret1 "));
        assert!(!db.authenticate("ann", "secret1"));
        assert!(!db.authenticate("bob", "Secret1"));
        assert!(!db.authenticate("", ""));
    }

    #[test]
    fn test_register_rejects_duplicates_and_weak_passwords() {
        let db = UserDb::open_in_memory().unwrap();
        db.register("ann", "Secret1").unwrap();

        assert_matches!(
            db.register("ann", "Other22"),
            Err(RegisterError::UsernameTaken(name)) if name == "ann"
        );
        assert_matches!(db.register("bob", "weak"), Err(RegisterError::WeakPassword));
        assert_matches!(db.register(" ", "Secret1"), Err(RegisterError::MissingField));
        assert!(!db.authenticate("bob", "weak"));
    }

    #[test]
    fn test_passwords_are_not_stored_in_clear() {
        let db = UserDb::open_in_memory().unwrap();
        db.register("ann", "Secret1").unwrap();

        let stored = db.stored_hash("ann").unwrap().unwrap();
        assert_ne!(stored, "Secret1");
        assert_eq!(stored, hash_password("Secret1"));
    }
}
