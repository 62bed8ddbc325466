//! Profile storage.

use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::{debug, info};

use super::model::{
    InboundConfig, InboundSecurity, MailProfile, OutboundConfig, OutboundSecurity, ProfileUpdate,
};
use super::validation::validate_profile;
use crate::error::{Result, StoreError};

const SELECT_PROFILE: &str = r"
    SELECT name,
           outbound_host, outbound_port, outbound_user, outbound_password, outbound_security,
           inbound_host, inbound_port, inbound_user, inbound_password, inbound_security
    FROM email_configs
";

/// Durable map from profile name to [`MailProfile`], backed by `SQLite`.
///
/// Each mutating call is a single statement or a single transaction, so a
/// profile is never partially written.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    pool: SqlitePool,
}

impl ProfileStore {
    /// Opens (creating if needed) the store at `database_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        debug!(path = database_path, "profile store opened");
        Ok(store)
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS email_configs (
                name TEXT PRIMARY KEY NOT NULL,
                outbound_host TEXT NOT NULL,
                outbound_port INTEGER NOT NULL,
                outbound_user TEXT NOT NULL,
                outbound_password TEXT NOT NULL,
                outbound_security TEXT NOT NULL,
                inbound_host TEXT NOT NULL,
                inbound_port INTEGER,
                inbound_user TEXT NOT NULL,
                inbound_password TEXT NOT NULL,
                inbound_security TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Stores a new profile and returns it as persisted.
    ///
    /// The name is trimmed before it is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for an invalid profile and
    /// [`StoreError::DuplicateName`] if the name is taken.
    pub async fn add(&self, mut profile: MailProfile) -> Result<MailProfile> {
        profile.name = profile.name.trim().to_string();
        validate_profile(&profile).map_err(StoreError::Validation)?;

        let out = &profile.outbound;
        let inb = &profile.inbound;
        let result = sqlx::query(
            r"
            INSERT INTO email_configs (
                name,
                outbound_host, outbound_port, outbound_user, outbound_password, outbound_security,
                inbound_host, inbound_port, inbound_user, inbound_password, inbound_security
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&profile.name)
        .bind(&out.host)
        .bind(i64::from(out.port))
        .bind(&out.user)
        .bind(&out.password)
        .bind(out.security.as_str())
        .bind(&inb.host)
        .bind(inb.port.map(i64::from))
        .bind(&inb.user)
        .bind(&inb.password)
        .bind(inb.security.as_str())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!(profile = %profile.name, "profile added");
                Ok(profile)
            }
            Err(err) if is_unique_violation(&err) => Err(StoreError::DuplicateName(profile.name)),
            Err(err) => Err(err.into()),
        }
    }

    /// Loads one profile; `None` if no profile has this name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn load_one(&self, name: &str) -> Result<Option<MailProfile>> {
        let row = sqlx::query(&format!("{SELECT_PROFILE} WHERE name = ?"))
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_profile).transpose()
    }

    /// Loads every profile, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn load_all(&self) -> Result<Vec<MailProfile>> {
        let rows = sqlx::query(&format!("{SELECT_PROFILE} ORDER BY name ASC"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_profile).collect()
    }

    /// Changes the supplied fields of an existing profile.
    ///
    /// Load, merge, validation and write happen in one transaction; on any
    /// error the stored profile is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the profile does not exist and
    /// [`StoreError::Validation`] if the merged profile is invalid.
    pub async fn update(&self, name: &str, update: ProfileUpdate) -> Result<MailProfile> {
        let name = name.trim();
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!("{SELECT_PROFILE} WHERE name = ?"))
            .bind(name)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Err(StoreError::NotFound(name.to_string()));
        };

        let mut profile = row_to_profile(&row)?;
        update.apply_to(&mut profile);
        validate_profile(&profile).map_err(StoreError::Validation)?;

        let out = &profile.outbound;
        let inb = &profile.inbound;
        sqlx::query(
            r"
            UPDATE email_configs SET
                outbound_host = ?, outbound_port = ?, outbound_user = ?,
                outbound_password = ?, outbound_security = ?,
                inbound_host = ?, inbound_port = ?, inbound_user = ?,
                inbound_password = ?, inbound_security = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE name = ?
            ",
        )
        .bind(&out.host)
        .bind(i64::from(out.port))
        .bind(&out.user)
        .bind(&out.password)
        .bind(out.security.as_str())
        .bind(&inb.host)
        .bind(inb.port.map(i64::from))
        .bind(&inb.user)
        .bind(&inb.password)
        .bind(inb.security.as_str())
        .bind(&profile.name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(profile = %profile.name, "profile updated");
        Ok(profile)
    }

    /// Removes a profile.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no profile has this name.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let name = name.trim();
        let result = sqlx::query("DELETE FROM email_configs WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(name.to_string()));
        }

        info!(profile = name, "profile deleted");
        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

fn row_to_profile(row: &SqliteRow) -> Result<MailProfile> {
    let outbound_security: String = row.try_get("outbound_security")?;
    let inbound_security: String = row.try_get("inbound_security")?;
    let inbound_port: Option<i64> = row.try_get("inbound_port")?;

    Ok(MailProfile {
        name: row.try_get("name")?,
        outbound: OutboundConfig {
            host: row.try_get("outbound_host")?,
            port: column_port(row.try_get("outbound_port")?)?,
            user: row.try_get("outbound_user")?,
            password: row.try_get("outbound_password")?,
            security: OutboundSecurity::parse(&outbound_security)
                .ok_or_else(|| decode_error(format!("bad outbound_security: {outbound_security}")))?,
        },
        inbound: InboundConfig {
            host: row.try_get("inbound_host")?,
            port: inbound_port.map(column_port).transpose()?,
            user: row.try_get("inbound_user")?,
            password: row.try_get("inbound_password")?,
            security: InboundSecurity::parse(&inbound_security)
                .ok_or_else(|| decode_error(format!("bad inbound_security: {inbound_security}")))?,
        },
    })
}

fn column_port(value: i64) -> Result<u16> {
    u16::try_from(value).map_err(|_| decode_error(format!("port out of range: {value}")))
}

fn decode_error(message: String) -> StoreError {
    StoreError::Database(sqlx::Error::Decode(message.into()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::profile::{ValidationError, sample_profile};

    #[tokio::test]
    async fn test_add_and_load() {
        let store = ProfileStore::in_memory().await.unwrap();

        let stored = store.add(sample_profile("work")).await.unwrap();
        let loaded = store.load_one("work").await.unwrap().unwrap();

        assert_eq!(stored, loaded);
        assert_eq!(loaded, sample_profile("work"));
    }

    #[tokio::test]
    async fn test_add_trims_name() {
        let store = ProfileStore::in_memory().await.unwrap();

        let stored = store.add(sample_profile("  work ")).await.unwrap();

        assert_eq!(stored.name, "work");
        assert!(store.load_one("work").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let store = ProfileStore::in_memory().await.unwrap();
        store.add(sample_profile("work")).await.unwrap();

        let mut other = sample_profile("work");
        other.outbound.host = "smtp.other.example".to_string();
        let err = store.add(other).await.unwrap_err();

        assert!(matches!(err, StoreError::DuplicateName(ref name) if name == "work"));
        let kept = store.load_one("work").await.unwrap().unwrap();
        assert_eq!(kept.outbound.host, "smtp.example.com");
        assert_eq!(store.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_profile_is_not_stored() {
        let store = ProfileStore::in_memory().await.unwrap();

        let err = store.add(sample_profile("")).await.unwrap_err();

        assert!(matches!(err, StoreError::Validation(ref errors) if errors == &[ValidationError::EmptyName]));
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let store = ProfileStore::in_memory().await.unwrap();
        assert!(store.load_one("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_all_is_ordered_by_name() {
        let store = ProfileStore::in_memory().await.unwrap();
        for name in ["zeta", "alpha", "mid"] {
            store.add(sample_profile(name)).await.unwrap();
        }

        let names: Vec<String> = store
            .load_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[tokio::test]
    async fn test_partial_update() {
        let store = ProfileStore::in_memory().await.unwrap();
        store.add(sample_profile("work")).await.unwrap();

        let update = ProfileUpdate {
            inbound_port: Some(Some(1993)),
            inbound_password: Some("rotated".to_string()),
            ..ProfileUpdate::default()
        };
        let updated = store.update("work", update).await.unwrap();

        let mut expected = sample_profile("work");
        expected.inbound.port = Some(1993);
        expected.inbound.password = "rotated".to_string();
        assert_eq!(updated, expected);
        assert_eq!(store.load_one("work").await.unwrap().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_update_clears_inbound_port() {
        let store = ProfileStore::in_memory().await.unwrap();
        let mut profile = sample_profile("work");
        profile.inbound.port = Some(1993);
        store.add(profile).await.unwrap();

        let update = ProfileUpdate {
            inbound_port: Some(None),
            ..ProfileUpdate::default()
        };
        store.update("work", update).await.unwrap();

        let stored = store.load_one("work").await.unwrap().unwrap();
        assert_eq!(stored.inbound.port, None);
        assert_eq!(stored, sample_profile("work"));
    }

    #[tokio::test]
    async fn test_update_missing_profile() {
        let store = ProfileStore::in_memory().await.unwrap();

        let err = store
            .update("ghost", ProfileUpdate::default())
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::NotFound(ref name) if name == "ghost"));
    }

    #[tokio::test]
    async fn test_invalid_update_leaves_profile_unchanged() {
        let store = ProfileStore::in_memory().await.unwrap();
        store.add(sample_profile("work")).await.unwrap();

        let update = ProfileUpdate {
            outbound_host: Some("smtp.new.example".to_string()),
            outbound_port: Some(0),
            ..ProfileUpdate::default()
        };
        let err = store.update("work", update).await.unwrap_err();

        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(
            store.load_one("work").await.unwrap().unwrap(),
            sample_profile("work")
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let store = ProfileStore::in_memory().await.unwrap();
        store.add(sample_profile("work")).await.unwrap();
        store.add(sample_profile("home")).await.unwrap();

        store.delete("work").await.unwrap();

        assert!(store.load_one("work").await.unwrap().is_none());
        let err = store.delete("work").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        let names: Vec<String> = store
            .load_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["home"]);
    }

    #[tokio::test]
    async fn test_reopen_file_store() {
        let dir = std::env::temp_dir().join(format!("mailbridge-store-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("profiles.db");
        let path = path.to_str().unwrap();
        let _ = std::fs::remove_file(path);

        {
            let store = ProfileStore::new(path).await.unwrap();
            store.add(sample_profile("work")).await.unwrap();
            store.pool.close().await;
        }

        let store = ProfileStore::new(path).await.unwrap();
        assert_eq!(
            store.load_one("work").await.unwrap().unwrap(),
            sample_profile("work")
        );
        store.pool.close().await;
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
