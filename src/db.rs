//! Database module for TextAI
//! Handles SQLite storage for the single local user profile

use rusqlite::{params, Connection, OptionalExtension, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, info, warn};

/// Current schema version, tracked via PRAGMA user_version.
/// v1: base profile columns, v2: +login/password_hash, v3: +cloud_uid
const SCHEMA_VERSION: i64 = 3;

/// The single locally stored user row, keyed by the fixed id 1
#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub phone: String,
    pub email: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub login: String,
    pub password_hash: String,
    pub cloud_uid: Option<String>,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.migrate()?;
        debug!(path = %path.display(), "Database opened");
        Ok(db)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Create or upgrade the schema. Migrations are additive only.
    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS user_profile (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    age INTEGER NOT NULL,
                    gender TEXT NOT NULL,
                    phone TEXT NOT NULL,
                    email TEXT NOT NULL,
                    city TEXT NOT NULL,
                    state TEXT NOT NULL,
                    country TEXT NOT NULL
                );",
            )?;
        }
        if version < 2 {
            self.conn.execute_batch(
                "ALTER TABLE user_profile ADD COLUMN login TEXT NOT NULL DEFAULT '';
                 ALTER TABLE user_profile ADD COLUMN password_hash TEXT NOT NULL DEFAULT '';",
            )?;
        }
        if version < 3 {
            self.conn
                .execute_batch("ALTER TABLE user_profile ADD COLUMN cloud_uid TEXT;")?;
        }
        if version < SCHEMA_VERSION {
            self.conn
                .pragma_update(None, "user_version", SCHEMA_VERSION)?;
            info!(from = version, to = SCHEMA_VERSION, "Database schema migrated");
        }
        Ok(())
    }

    /// Insert or update the profile fields. Credentials and the cloud uid
    /// are managed separately and survive a re-registration.
    pub fn upsert_profile(&self, profile: &UserProfile) -> Result<()> {
        self.conn.execute(
            "INSERT INTO user_profile (id, name, age, gender, phone, email, city, state, country)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                age = excluded.age,
                gender = excluded.gender,
                phone = excluded.phone,
                email = excluded.email,
                city = excluded.city,
                state = excluded.state,
                country = excluded.country",
            params![
                profile.id,
                profile.name,
                profile.age,
                profile.gender,
                profile.phone,
                profile.email,
                profile.city,
                profile.state,
                profile.country
            ],
        )?;
        debug!(id = profile.id, "Profile saved");
        Ok(())
    }

    pub fn get_profile(&self, id: i64) -> Result<Option<UserProfile>> {
        self.conn
            .query_row(
                "SELECT id, name, age, gender, phone, email, city, state, country,
                        login, password_hash, cloud_uid
                 FROM user_profile WHERE id = ?1",
                params![id],
                map_profile,
            )
            .optional()
    }

    pub fn get_profile_by_login(&self, login: &str) -> Result<Option<UserProfile>> {
        self.conn
            .query_row(
                "SELECT id, name, age, gender, phone, email, city, state, country,
                        login, password_hash, cloud_uid
                 FROM user_profile WHERE login = ?1",
                params![login],
                map_profile,
            )
            .optional()
    }

    pub fn has_profile(&self, id: i64) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM user_profile WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Store login and hashed password for the given profile.
    /// The raw password never touches the database.
    pub fn set_credentials(&self, id: i64, login: &str, raw_password: &str) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE user_profile SET login = ?1, password_hash = ?2 WHERE id = ?3",
            params![login, sha256_hex(raw_password), id],
        )?;
        if updated == 0 {
            warn!(id = id, "set_credentials: no profile row to update");
        }
        Ok(())
    }

    pub fn set_cloud_uid(&self, id: i64, uid: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE user_profile SET cloud_uid = ?1 WHERE id = ?2",
            params![uid, id],
        )?;
        Ok(())
    }

    pub fn set_cloud_uid_by_login(&self, login: &str, uid: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE user_profile SET cloud_uid = ?1 WHERE login = ?2",
            params![uid, login],
        )?;
        Ok(())
    }

    /// Compare a raw password against the stored hash for the given login.
    pub fn authenticate(&self, login: &str, raw_password: &str) -> Result<bool> {
        let profile = match self.get_profile_by_login(login)? {
            Some(p) => p,
            None => return Ok(false),
        };
        Ok(!profile.password_hash.is_empty() && profile.password_hash == sha256_hex(raw_password))
    }

    pub fn delete_profile(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM user_profile WHERE id = ?1", params![id])?;
        Ok(())
    }
}

fn map_profile(row: &rusqlite::Row<'_>) -> Result<UserProfile> {
    Ok(UserProfile {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        gender: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
        city: row.get(6)?,
        state: row.get(7)?,
        country: row.get(8)?,
        login: row.get(9)?,
        password_hash: row.get(10)?,
        cloud_uid: row.get(11)?,
    })
}

/// Single unsalted SHA-256 digest, hex encoded
fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PROFILE_ID;

    fn sample_profile() -> UserProfile {
        UserProfile {
            id: PROFILE_ID,
            name: "Maria Silva".into(),
            age: 34,
            gender: "Feminino".into(),
            phone: "11 91234-5678".into(),
            email: "maria@example.com".into(),
            city: "São Paulo".into(),
            state: "SP".into(),
            country: "Brasil".into(),
            ..Default::default()
        }
    }

    #[test]
    fn fresh_database_is_at_latest_schema() {
        let db = Database::open_in_memory().unwrap();
        let version: i64 = db
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn upsert_and_fetch_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_profile(&sample_profile()).unwrap();

        let loaded = db.get_profile(PROFILE_ID).unwrap().unwrap();
        assert_eq!(loaded.name, "Maria Silva");
        assert_eq!(loaded.age, 34);
        assert_eq!(loaded.country, "Brasil");
        assert_eq!(loaded.login, "");
        assert_eq!(loaded.cloud_uid, None);
    }

    #[test]
    fn at_most_one_row_for_fixed_id() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_profile(&sample_profile()).unwrap();

        let mut again = sample_profile();
        again.name = "Maria S. Atualizada".into();
        db.upsert_profile(&again).unwrap();

        let count: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM user_profile", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(
            db.get_profile(PROFILE_ID).unwrap().unwrap().name,
            "Maria S. Atualizada"
        );
    }

    #[test]
    fn re_registration_keeps_credentials() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_profile(&sample_profile()).unwrap();
        db.set_credentials(PROFILE_ID, "maria", "s3nh4forte").unwrap();

        db.upsert_profile(&sample_profile()).unwrap();
        let loaded = db.get_profile(PROFILE_ID).unwrap().unwrap();
        assert_eq!(loaded.login, "maria");
        assert!(!loaded.password_hash.is_empty());
    }

    #[test]
    fn password_is_stored_hashed() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_profile(&sample_profile()).unwrap();
        db.set_credentials(PROFILE_ID, "maria", "s3nh4forte").unwrap();

        let loaded = db.get_profile(PROFILE_ID).unwrap().unwrap();
        assert_ne!(loaded.password_hash, "s3nh4forte");
        assert_eq!(loaded.password_hash, sha256_hex("s3nh4forte"));
        assert_eq!(loaded.password_hash.len(), 64);
    }

    #[test]
    fn authenticate_checks_hash() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_profile(&sample_profile()).unwrap();
        db.set_credentials(PROFILE_ID, "maria", "s3nh4forte").unwrap();

        assert!(db.authenticate("maria", "s3nh4forte").unwrap());
        assert!(!db.authenticate("maria", "errada").unwrap());
        assert!(!db.authenticate("desconhecida", "s3nh4forte").unwrap());
    }

    #[test]
    fn blank_credentials_never_authenticate() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_profile(&sample_profile()).unwrap();
        // no credentials set yet: empty stored hash must not match anything
        assert!(!db.authenticate("", "").unwrap());
    }

    #[test]
    fn cloud_uid_updates() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_profile(&sample_profile()).unwrap();
        db.set_credentials(PROFILE_ID, "maria", "s3nh4forte").unwrap();

        db.set_cloud_uid(PROFILE_ID, "uid-123").unwrap();
        assert_eq!(
            db.get_profile(PROFILE_ID).unwrap().unwrap().cloud_uid.as_deref(),
            Some("uid-123")
        );

        db.set_cloud_uid_by_login("maria", "uid-456").unwrap();
        assert_eq!(
            db.get_profile_by_login("maria")
                .unwrap()
                .unwrap()
                .cloud_uid
                .as_deref(),
            Some("uid-456")
        );
    }

    #[test]
    fn delete_clears_the_row() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_profile(&sample_profile()).unwrap();
        assert!(db.has_profile(PROFILE_ID).unwrap());

        db.delete_profile(PROFILE_ID).unwrap();
        assert!(!db.has_profile(PROFILE_ID).unwrap());
        assert!(db.get_profile(PROFILE_ID).unwrap().is_none());
    }

    #[test]
    fn migrates_v1_database_preserving_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");

        // Simulate a database created before the credential columns existed
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE user_profile (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    age INTEGER NOT NULL,
                    gender TEXT NOT NULL,
                    phone TEXT NOT NULL,
                    email TEXT NOT NULL,
                    city TEXT NOT NULL,
                    state TEXT NOT NULL,
                    country TEXT NOT NULL
                );
                INSERT INTO user_profile VALUES
                    (1, 'Rodolfo', 40, 'Masculino', '11 99999-0000',
                     'rodolfo@example.com', 'Campinas', 'SP', 'Brasil');",
            )
            .unwrap();
            conn.pragma_update(None, "user_version", 1).unwrap();
        }

        let db = Database::open(&path).unwrap();
        let version: i64 = db
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);

        let loaded = db.get_profile(1).unwrap().unwrap();
        assert_eq!(loaded.name, "Rodolfo");
        assert_eq!(loaded.login, "");
        assert_eq!(loaded.password_hash, "");
        assert_eq!(loaded.cloud_uid, None);

        // migrated rows accept credentials like fresh ones
        db.set_credentials(1, "rodolfo", "senha123").unwrap();
        assert!(db.authenticate("rodolfo", "senha123").unwrap());
    }

    #[test]
    fn sha256_is_deterministic_hex() {
        let a = sha256_hex("abc");
        assert_eq!(
            a,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(a, sha256_hex("abc"));
    }
}
