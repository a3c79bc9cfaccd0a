//! SQLite-backed cache of registry entries
//!
//! Entries are stored as JSON per `(registry, package)` together with the
//! time they were fetched. Lookups take a TTL; stale rows are treated as
//! misses and replaced on the next `put`. Packages the registry reported as
//! missing are remembered too, so repeated lookups stay offline.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::version::error::CacheError;
use crate::version::types::RegistryEntry;

/// Schema migrations
/// Each version contains a list of SQL statements to execute
const MIGRATIONS: &[&[&str]] = &[
    // v1: negative caching of packages the registry does not know
    &["ALTER TABLE registry_entries ADD COLUMN not_found INTEGER NOT NULL DEFAULT 0"],
];

/// A cache hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedEntry {
    Found(RegistryEntry),
    NotFound,
}

pub struct Cache {
    conn: Mutex<Connection>,
}

impl Cache {
    pub fn new(db_path: &Path) -> Result<Self, CacheError> {
        info!("Initializing cache database at {:?}", db_path);

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::with_connection(conn)
    }

    /// Cache living only for the lifetime of the process
    pub fn in_memory() -> Result<Self, CacheError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, CacheError> {
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.create_schema()?;
        debug!("Cache initialized");
        Ok(cache)
    }

    /// Acquire database connection lock with proper error handling
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }

    fn create_schema(&self) -> Result<(), CacheError> {
        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS registry_entries (
                registry TEXT NOT NULL,
                package_name TEXT NOT NULL,
                payload TEXT NOT NULL,
                fetched_at INTEGER NOT NULL,
                PRIMARY KEY (registry, package_name)
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_fetched_at ON registry_entries(fetched_at)",
            [],
        )?;

        Self::apply_migrations(&conn)?;
        Ok(())
    }

    /// Apply pending migrations based on user_version pragma
    fn apply_migrations(conn: &Connection) -> Result<(), CacheError> {
        let current_version: i32 =
            conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        for (i, statements) in MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i32;
            if version > current_version {
                for sql in *statements {
                    match conn.execute(sql, []) {
                        Ok(_) => {}
                        Err(rusqlite::Error::SqliteFailure(_, Some(ref msg)))
                            if msg.contains("duplicate column name") =>
                        {
                            debug!("Column already exists, skipping: {}", sql);
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                debug!("Applied migration v{}", version);
            }
        }

        let target_version = MIGRATIONS.len() as i32;
        if target_version > current_version {
            conn.pragma_update(None, "user_version", target_version)?;
        }

        Ok(())
    }

    fn now_ms() -> i64 {
        Utc::now().timestamp_millis()
    }

    /// Return the cached entry if it was fetched less than `ttl_ms` ago
    pub fn get_fresh(
        &self,
        registry: &str,
        package_name: &str,
        ttl_ms: i64,
    ) -> Result<Option<CachedEntry>, CacheError> {
        self.get_fresh_at(registry, package_name, ttl_ms, Self::now_ms())
    }

    fn get_fresh_at(
        &self,
        registry: &str,
        package_name: &str,
        ttl_ms: i64,
        now: i64,
    ) -> Result<Option<CachedEntry>, CacheError> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                r#"
                SELECT payload, fetched_at, not_found FROM registry_entries
                WHERE registry = ?1 AND package_name = ?2
                "#,
                (registry, package_name),
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, bool>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((payload, fetched_at, not_found)) = row else {
            return Ok(None);
        };

        if now - fetched_at >= ttl_ms {
            debug!("Cache entry for {}/{} is stale", registry, package_name);
            return Ok(None);
        }

        if not_found {
            return Ok(Some(CachedEntry::NotFound));
        }

        Ok(Some(CachedEntry::Found(serde_json::from_str(&payload)?)))
    }

    /// Store (or replace) the entry for a package
    pub fn put(&self, registry: &str, entry: &RegistryEntry) -> Result<(), CacheError> {
        self.put_at(registry, entry, Self::now_ms())
    }

    fn put_at(&self, registry: &str, entry: &RegistryEntry, now: i64) -> Result<(), CacheError> {
        let payload = serde_json::to_string(entry)?;
        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO registry_entries (registry, package_name, payload, fetched_at, not_found)
            VALUES (?1, ?2, ?3, ?4, 0)
            "#,
            (registry, &entry.name, payload, now),
        )?;
        Ok(())
    }

    /// Remember that the registry does not know `package_name`
    pub fn mark_not_found(&self, registry: &str, package_name: &str) -> Result<(), CacheError> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO registry_entries (registry, package_name, payload, fetched_at, not_found)
            VALUES (?1, ?2, '{}', ?3, 1)
            "#,
            (registry, package_name, Self::now_ms()),
        )?;
        Ok(())
    }

    /// Drop every cached entry; returns how many were removed
    pub fn clear(&self) -> Result<usize, CacheError> {
        let conn = self.lock_conn()?;
        let removed = conn.execute("DELETE FROM registry_entries", [])?;
        info!("Cleared {} cached registry entries", removed);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn entry(name: &str, latest: &str) -> RegistryEntry {
        RegistryEntry {
            name: name.to_string(),
            latest: Some(latest.to_string()),
            versions: vec![latest.to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn put_then_get_fresh_returns_entry() {
        let temp_dir = TempDir::new().unwrap();
        let cache = Cache::new(&temp_dir.path().join("nested/cache.db")).unwrap();

        cache.put("npm", &entry("react", "18.2.0")).unwrap();

        assert_eq!(
            cache.get_fresh("npm", "react", 60_000).unwrap(),
            Some(CachedEntry::Found(entry("react", "18.2.0")))
        );
        assert_eq!(cache.get_fresh("npm", "vue", 60_000).unwrap(), None);
    }

    #[rstest]
    #[case(1_000, 999, true)]
    #[case(1_000, 1_000, false)]
    #[case(1_000, 5_000, false)]
    fn get_fresh_honors_ttl(#[case] ttl: i64, #[case] age: i64, #[case] fresh: bool) {
        let cache = Cache::in_memory().unwrap();
        cache.put_at("npm", &entry("react", "18.2.0"), 10_000).unwrap();

        let result = cache.get_fresh_at("npm", "react", ttl, 10_000 + age).unwrap();

        assert_eq!(result.is_some(), fresh);
    }

    #[test]
    fn put_replaces_previous_entry() {
        let cache = Cache::in_memory().unwrap();
        cache.put("npm", &entry("react", "17.0.2")).unwrap();
        cache.put("npm", &entry("react", "18.2.0")).unwrap();

        let Some(CachedEntry::Found(found)) = cache.get_fresh("npm", "react", 60_000).unwrap()
        else {
            panic!("expected cached entry");
        };
        assert_eq!(found.latest.as_deref(), Some("18.2.0"));
    }

    #[test]
    fn entries_are_namespaced_by_registry() {
        let cache = Cache::in_memory().unwrap();
        cache.put("npm", &entry("react", "18.2.0")).unwrap();

        assert_eq!(cache.get_fresh("jsr", "react", 60_000).unwrap(), None);
    }

    #[test]
    fn mark_not_found_is_cached_until_replaced() {
        let cache = Cache::in_memory().unwrap();
        cache.mark_not_found("npm", "no-such-package").unwrap();

        assert_eq!(
            cache.get_fresh("npm", "no-such-package", 60_000).unwrap(),
            Some(CachedEntry::NotFound)
        );

        cache.put("npm", &entry("no-such-package", "1.0.0")).unwrap();
        assert!(matches!(
            cache.get_fresh("npm", "no-such-package", 60_000).unwrap(),
            Some(CachedEntry::Found(_))
        ));
    }

    #[test]
    fn clear_removes_everything() {
        let cache = Cache::in_memory().unwrap();
        cache.put("npm", &entry("react", "18.2.0")).unwrap();
        cache.mark_not_found("npm", "ghost").unwrap();

        assert_eq!(cache.clear().unwrap(), 2);
        assert_eq!(cache.get_fresh("npm", "react", 60_000).unwrap(), None);
    }

    #[test]
    fn reopening_database_keeps_entries_and_schema_version() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("cache.db");
        {
            let cache = Cache::new(&db_path).unwrap();
            cache.put("npm", &entry("react", "18.2.0")).unwrap();
        }

        let cache = Cache::new(&db_path).unwrap();
        assert!(cache.get_fresh("npm", "react", 60_000).unwrap().is_some());

        let conn = cache.lock_conn().unwrap();
        let version: i32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, MIGRATIONS.len() as i32);
    }

    #[test]
    fn migration_upgrades_database_created_without_not_found_column() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("cache.db");
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute(
                r#"
                CREATE TABLE registry_entries (
                    registry TEXT NOT NULL,
                    package_name TEXT NOT NULL,
                    payload TEXT NOT NULL,
                    fetched_at INTEGER NOT NULL,
                    PRIMARY KEY (registry, package_name)
                )
                "#,
                [],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO registry_entries VALUES ('npm', 'react', ?1, ?2)",
                (
                    serde_json::to_string(&entry("react", "18.2.0")).unwrap(),
                    Utc::now().timestamp_millis(),
                ),
            )
            .unwrap();
        }

        let cache = Cache::new(&db_path).unwrap();

        assert_eq!(
            cache.get_fresh("npm", "react", 60_000).unwrap(),
            Some(CachedEntry::Found(entry("react", "18.2.0")))
        );
    }
}
