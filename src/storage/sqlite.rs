//! SQLite catalog implementation

use std::path::Path;

use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use serde::Serialize;
use uuid::Uuid;

use super::schema;
use crate::record::{BookmarkRecord, ResourceLink, VolumeRecord};
use crate::{Error, Result};

/// Typed access to a catalog's bookmark, volume and resource tables
pub struct CatalogStore {
    conn: Connection,
}

impl CatalogStore {
    /// Open an existing catalog for reading and writing
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let store = Self { conn };
        store.verify_schema()?;
        Ok(store)
    }

    /// Open an existing catalog without write access (scratch catalogs)
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let store = Self { conn };
        store.verify_schema()?;
        Ok(store)
    }

    /// Open an in-memory catalog with an empty schema (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        for (entity, name) in schema::SEED_ENTITIES {
            self.conn.execute(
                "INSERT OR IGNORE INTO Z_PRIMARYKEY (Z_ENT, Z_NAME, Z_SUPER, Z_MAX) VALUES (?1, ?2, 0, 0)",
                params![entity, name],
            )?;
        }
        Ok(())
    }

    /// Fail with a schema error unless every required table exists
    pub fn verify_schema(&self) -> Result<()> {
        for table in schema::REQUIRED_TABLES {
            let count: i64 = self.conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [*table],
                |row| row.get(0),
            )?;
            if count == 0 {
                return Err(Error::Schema(format!("catalog has no {table} table")));
            }
        }
        Ok(())
    }

    // ========== Bookmark Operations ==========

    /// Every bookmark referenced by a resource, with its volume context.
    ///
    /// Resources without a volume yield records with `volume_name: None`.
    pub fn list_bookmark_records(&self) -> Result<Vec<BookmarkRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT DISTINCT
                ZFILESYSTEMBOOKMARK.Z_PK,
                ZFILESYSTEMVOLUME.ZNAME,
                ZFILESYSTEMVOLUME.ZVOLUMEUUIDSTRING,
                ZFILESYSTEMBOOKMARK.ZPATHRELATIVETOVOLUME,
                ZFILESYSTEMBOOKMARK.ZBOOKMARKDATA
            FROM ZFILESYSTEMBOOKMARK
            JOIN ZINTERNALRESOURCE ON ZINTERNALRESOURCE.ZFILESYSTEMBOOKMARK = ZFILESYSTEMBOOKMARK.Z_PK
            LEFT JOIN ZFILESYSTEMVOLUME ON ZFILESYSTEMVOLUME.Z_PK = ZINTERNALRESOURCE.ZFILESYSTEMVOLUME
            ORDER BY ZFILESYSTEMBOOKMARK.Z_PK
            "#,
        )?;

        let records = stmt
            .query_map([], |row| {
                Ok(BookmarkRecord {
                    primary_key: row.get(0)?,
                    volume_name: row.get(1)?,
                    volume_uuid: row.get(2)?,
                    relative_path: row.get(3)?,
                    bookmark_blob: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    /// Overwrite one bookmark blob; returns false when no row has that key
    pub fn update_bookmark(&self, primary_key: i64, blob: &[u8]) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE ZFILESYSTEMBOOKMARK SET ZBOOKMARKDATA = ?1 WHERE Z_PK = ?2",
            params![blob, primary_key],
        )?;
        Ok(changed > 0)
    }

    // ========== Volume Operations ==========

    pub fn list_volumes(&self) -> Result<Vec<VolumeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT Z_PK, ZNAME, ZUUID, ZVOLUMEUUIDSTRING FROM ZFILESYSTEMVOLUME ORDER BY Z_PK",
        )?;

        let volumes = stmt
            .query_map([], |row| self.row_to_volume(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(volumes)
    }

    pub fn volume(&self, primary_key: i64) -> Result<Option<VolumeRecord>> {
        self.conn
            .query_row(
                "SELECT Z_PK, ZNAME, ZUUID, ZVOLUMEUUIDSTRING FROM ZFILESYSTEMVOLUME WHERE Z_PK = ?1",
                [primary_key],
                |row| self.row_to_volume(row),
            )
            .optional()
            .map_err(Into::into)
    }

    fn find_volume(&self, name: &str, os_uuid: &str) -> Result<Option<VolumeRecord>> {
        self.conn
            .query_row(
                r#"
                SELECT Z_PK, ZNAME, ZUUID, ZVOLUMEUUIDSTRING FROM ZFILESYSTEMVOLUME
                WHERE ZNAME = ?1 AND ZVOLUMEUUIDSTRING = ?2
                ORDER BY Z_PK LIMIT 1
                "#,
                params![name, os_uuid],
                |row| self.row_to_volume(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Return the volume row for `(name, os_uuid)`, inserting it if absent.
    ///
    /// A new row takes its key from the entity's `Z_MAX` counter, which is
    /// advanced under the same savepoint as the insert.
    pub fn find_or_create_volume(&self, name: &str, os_uuid: &str) -> Result<VolumeRecord> {
        if let Some(existing) = self.find_volume(name, os_uuid)? {
            return Ok(existing);
        }

        let entity = self.entity_id_for(schema::ENTITY_FILE_SYSTEM_VOLUME)?;
        self.conn.execute_batch("SAVEPOINT create_volume")?;
        match self.insert_volume(entity, name, os_uuid) {
            Ok(volume) => {
                self.conn.execute_batch("RELEASE create_volume")?;
                tracing::info!(
                    "Created volume {} ({}) with primary key {}",
                    name,
                    os_uuid,
                    volume.primary_key
                );
                Ok(volume)
            }
            Err(e) => {
                if let Err(rollback) = self
                    .conn
                    .execute_batch("ROLLBACK TO create_volume; RELEASE create_volume")
                {
                    tracing::error!("Failed to roll back volume creation: {}", rollback);
                }
                Err(e)
            }
        }
    }

    fn insert_volume(&self, entity: i64, name: &str, os_uuid: &str) -> Result<VolumeRecord> {
        let counter: Option<i64> = self.conn.query_row(
            "SELECT Z_MAX FROM Z_PRIMARYKEY WHERE Z_NAME = ?1",
            [schema::ENTITY_FILE_SYSTEM_VOLUME],
            |row| row.get(0),
        )?;
        let highest: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(Z_PK), 0) FROM ZFILESYSTEMVOLUME",
            [],
            |row| row.get(0),
        )?;
        let primary_key = counter.unwrap_or(0).max(highest) + 1;
        let assigned_uuid = Uuid::new_v4().to_string().to_uppercase();

        self.conn.execute(
            r#"
            INSERT INTO ZFILESYSTEMVOLUME (Z_PK, Z_ENT, Z_OPT, ZNAME, ZUUID, ZVOLUMEUUIDSTRING)
            VALUES (?1, ?2, 1, ?3, ?4, ?5)
            "#,
            params![primary_key, entity, name, assigned_uuid, os_uuid],
        )?;
        self.conn.execute(
            "UPDATE Z_PRIMARYKEY SET Z_MAX = ?1 WHERE Z_NAME = ?2",
            params![primary_key, schema::ENTITY_FILE_SYSTEM_VOLUME],
        )?;

        Ok(VolumeRecord {
            primary_key,
            name: name.to_string(),
            assigned_uuid: Some(assigned_uuid),
            volume_uuid_string: Some(os_uuid.to_string()),
        })
    }

    fn row_to_volume(&self, row: &rusqlite::Row) -> rusqlite::Result<VolumeRecord> {
        Ok(VolumeRecord {
            primary_key: row.get(0)?,
            name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            assigned_uuid: row.get(2)?,
            volume_uuid_string: row.get(3)?,
        })
    }

    // ========== Resource Link Operations ==========

    /// Resources pointing at a bookmark, a volume, or both
    pub fn list_resource_links_with_volume_or_bookmark(&self) -> Result<Vec<ResourceLink>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT Z_PK, ZFILESYSTEMBOOKMARK, ZFILESYSTEMVOLUME
            FROM ZINTERNALRESOURCE
            WHERE ZFILESYSTEMVOLUME IS NOT NULL OR ZFILESYSTEMBOOKMARK IS NOT NULL
            ORDER BY Z_PK
            "#,
        )?;

        let links = stmt
            .query_map([], |row| {
                Ok(ResourceLink {
                    primary_key: row.get(0)?,
                    bookmark: row.get(1)?,
                    volume: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(links)
    }

    pub fn set_resource_link_volume(&self, link: i64, volume: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE ZINTERNALRESOURCE SET ZFILESYSTEMVOLUME = ?1 WHERE Z_PK = ?2",
            params![volume, link],
        )?;
        Ok(())
    }

    // ========== Entity Registry ==========

    /// Core Data entity type id for an entity name
    pub fn entity_id_for(&self, entity: &str) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT Z_ENT FROM Z_PRIMARYKEY WHERE Z_NAME = ?1",
                [entity],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| Error::Schema(format!("entity {entity} not found in Z_PRIMARYKEY")))
    }

    // ========== Transactions ==========

    /// Begin a write transaction
    pub fn begin_transaction(&mut self) -> Result<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    /// Commit a transaction
    pub fn commit(&mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    /// Rollback a transaction
    pub fn rollback(&mut self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    /// Run `f` in one transaction: commit on success, roll back on any error
    pub fn with_transaction<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.begin_transaction()?;
        let outcome = f(self).and_then(|value| {
            self.commit()?;
            Ok(value)
        });
        if outcome.is_err() && !self.conn.is_autocommit() {
            if let Err(e) = self.rollback() {
                tracing::error!("Rollback failed: {}", e);
            }
        }
        outcome
    }

    /// Get catalog statistics
    pub fn stats(&self) -> Result<CatalogStats> {
        let count = |sql: &str| -> Result<usize> {
            let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };
        Ok(CatalogStats {
            bookmarks: count("SELECT COUNT(*) FROM ZFILESYSTEMBOOKMARK")?,
            bookmarks_with_data: count(
                "SELECT COUNT(*) FROM ZFILESYSTEMBOOKMARK WHERE ZBOOKMARKDATA IS NOT NULL AND LENGTH(ZBOOKMARKDATA) > 0",
            )?,
            volumes: count("SELECT COUNT(*) FROM ZFILESYSTEMVOLUME")?,
            resources: count(
                "SELECT COUNT(*) FROM ZINTERNALRESOURCE WHERE ZFILESYSTEMVOLUME IS NOT NULL OR ZFILESYSTEMBOOKMARK IS NOT NULL",
            )?,
        })
    }
}

/// Row inserts used to build fixture catalogs
#[cfg(test)]
impl CatalogStore {
    pub(crate) fn insert_bookmark(&self, relative_path: &str, blob: Option<&[u8]>) -> i64 {
        self.conn
            .execute(
                "INSERT INTO ZFILESYSTEMBOOKMARK (Z_ENT, Z_OPT, ZPATHRELATIVETOVOLUME, ZBOOKMARKDATA) VALUES (22, 1, ?1, ?2)",
                params![relative_path, blob],
            )
            .unwrap();
        self.conn.last_insert_rowid()
    }

    pub(crate) fn insert_volume_row(&self, name: &str, os_uuid: &str) -> i64 {
        self.conn
            .execute(
                "INSERT INTO ZFILESYSTEMVOLUME (Z_ENT, Z_OPT, ZNAME, ZUUID, ZVOLUMEUUIDSTRING) VALUES (23, 1, ?1, 'ASSIGNED', ?2)",
                params![name, os_uuid],
            )
            .unwrap();
        let pk = self.conn.last_insert_rowid();
        self.conn
            .execute("UPDATE Z_PRIMARYKEY SET Z_MAX = ?1 WHERE Z_NAME = 'FileSystemVolume'", [pk])
            .unwrap();
        pk
    }

    pub(crate) fn insert_resource(&self, bookmark: Option<i64>, volume: Option<i64>) -> i64 {
        self.conn
            .execute(
                "INSERT INTO ZINTERNALRESOURCE (Z_ENT, Z_OPT, ZFILESYSTEMBOOKMARK, ZFILESYSTEMVOLUME) VALUES (31, 1, ?1, ?2)",
                params![bookmark, volume],
            )
            .unwrap();
        self.conn.last_insert_rowid()
    }

    pub(crate) fn bookmark_blob(&self, primary_key: i64) -> Option<Vec<u8>> {
        self.conn
            .query_row(
                "SELECT ZBOOKMARKDATA FROM ZFILESYSTEMBOOKMARK WHERE Z_PK = ?1",
                [primary_key],
                |row| row.get(0),
            )
            .unwrap()
    }

    pub(crate) fn resource_volume(&self, link: i64) -> Option<i64> {
        self.conn
            .query_row(
                "SELECT ZFILESYSTEMVOLUME FROM ZINTERNALRESOURCE WHERE Z_PK = ?1",
                [link],
                |row| row.get(0),
            )
            .unwrap()
    }

    pub(crate) fn volume_counter(&self) -> i64 {
        self.conn
            .query_row(
                "SELECT Z_MAX FROM Z_PRIMARYKEY WHERE Z_NAME = 'FileSystemVolume'",
                [],
                |row| row.get(0),
            )
            .unwrap()
    }

    pub(crate) fn execute_raw(&self, sql: &str) {
        self.conn.execute_batch(sql).unwrap();
    }
}

/// Catalog statistics
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub bookmarks: usize,
    pub bookmarks_with_data: usize,
    pub volumes: usize,
    pub resources: usize,
}

impl std::fmt::Display for CatalogStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Catalog Statistics:")?;
        writeln!(f, "  Bookmarks: {} ({} with bookmark data)", self.bookmarks, self.bookmarks_with_data)?;
        writeln!(f, "  Volumes: {}", self.volumes)?;
        writeln!(f, "  Linked resources: {}", self.resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmark::testing::path_bookmark;

    #[test]
    fn test_list_bookmark_records_joins_volume() {
        let store = CatalogStore::open_in_memory().unwrap();
        let volume = store.insert_volume_row("Backup", "UUID-B");
        let blob = path_bookmark("/Volumes/Backup/a.jpg");
        let with_volume = store.insert_bookmark("a.jpg", Some(blob.as_slice()));
        let without_volume = store.insert_bookmark("b.jpg", None);
        store.insert_resource(Some(with_volume), Some(volume));
        store.insert_resource(Some(without_volume), None);
        // Not referenced by any resource
        store.insert_bookmark("orphan.jpg", None);

        let records = store.list_bookmark_records().unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].primary_key, with_volume);
        assert_eq!(records[0].volume_name.as_deref(), Some("Backup"));
        assert_eq!(records[0].volume_uuid.as_deref(), Some("UUID-B"));
        assert_eq!(records[0].bookmark_blob.as_deref(), Some(blob.as_slice()));

        assert_eq!(records[1].primary_key, without_volume);
        assert_eq!(records[1].volume_name, None);
        assert_eq!(records[1].relative_path.as_deref(), Some("b.jpg"));
        assert_eq!(records[1].bookmark_blob, None);
    }

    #[test]
    fn test_update_bookmark() {
        let store = CatalogStore::open_in_memory().unwrap();
        let pk = store.insert_bookmark("a.jpg", None);
        assert!(store.update_bookmark(pk, b"new").unwrap());
        assert_eq!(store.bookmark_blob(pk).as_deref(), Some(b"new".as_slice()));
        assert!(!store.update_bookmark(pk + 100, b"new").unwrap());
    }

    #[test]
    fn test_find_or_create_volume_is_idempotent() {
        let store = CatalogStore::open_in_memory().unwrap();
        let existing = store.insert_volume_row("Backup", "OLD");
        let counter_before = store.volume_counter();

        let created = store.find_or_create_volume("Backup", "NEW").unwrap();
        assert_ne!(created.primary_key, existing);
        assert_eq!(created.primary_key, counter_before + 1);
        assert_eq!(store.volume_counter(), created.primary_key);
        assert_eq!(created.volume_uuid_string.as_deref(), Some("NEW"));
        let assigned = created.assigned_uuid.clone().unwrap();
        assert_eq!(assigned, assigned.to_uppercase());

        let again = store.find_or_create_volume("Backup", "NEW").unwrap();
        assert_eq!(again, created);
        assert_eq!(store.list_volumes().unwrap().len(), 2);
        assert_eq!(store.volume_counter(), created.primary_key);

        let found = store.find_or_create_volume("Backup", "OLD").unwrap();
        assert_eq!(found.primary_key, existing);
    }

    #[test]
    fn test_new_volume_key_skips_stale_counter() {
        let store = CatalogStore::open_in_memory().unwrap();
        store.insert_volume_row("A", "U1");
        store.insert_volume_row("B", "U2");
        store.execute_raw("UPDATE Z_PRIMARYKEY SET Z_MAX = 0 WHERE Z_NAME = 'FileSystemVolume'");

        let created = store.find_or_create_volume("C", "U3").unwrap();
        assert_eq!(created.primary_key, 3);
        assert_eq!(store.volume_counter(), 3);
    }

    #[test]
    fn test_missing_entity_is_schema_error() {
        let store = CatalogStore::open_in_memory().unwrap();
        store.execute_raw("DELETE FROM Z_PRIMARYKEY WHERE Z_NAME = 'FileSystemVolume'");

        assert!(matches!(store.entity_id_for("FileSystemVolume"), Err(Error::Schema(_))));
        assert!(matches!(store.find_or_create_volume("X", "Y"), Err(Error::Schema(_))));
        assert!(store.list_volumes().unwrap().is_empty());
    }

    #[test]
    fn test_entity_id_lookup() {
        let store = CatalogStore::open_in_memory().unwrap();
        assert_eq!(store.entity_id_for("FileSystemVolume").unwrap(), 23);
    }

    #[test]
    fn test_open_rejects_incomplete_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Photos.sqlite");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute(schema::CREATE_BOOKMARK_TABLE, []).unwrap();
        }
        assert!(matches!(CatalogStore::open(&path), Err(Error::Schema(_))));
        assert!(matches!(CatalogStore::open_read_only(&path), Err(Error::Schema(_))));
    }

    #[test]
    fn test_open_missing_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.sqlite");
        assert!(matches!(CatalogStore::open(&path), Err(Error::Storage(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let mut store = CatalogStore::open_in_memory().unwrap();
        let pk = store.insert_bookmark("a.jpg", Some(b"old".as_slice()));

        let result: Result<()> = store.with_transaction(|store| {
            store.update_bookmark(pk, b"new")?;
            Err(Error::Schema("boom".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(store.bookmark_blob(pk).as_deref(), Some(b"old".as_slice()));

        store
            .with_transaction(|store| store.update_bookmark(pk, b"new").map(|_| ()))
            .unwrap();
        assert_eq!(store.bookmark_blob(pk).as_deref(), Some(b"new".as_slice()));
    }

    #[test]
    fn test_stats() {
        let store = CatalogStore::open_in_memory().unwrap();
        let volume = store.insert_volume_row("Backup", "U");
        let a = store.insert_bookmark("a.jpg", Some(b"blob".as_slice()));
        let b = store.insert_bookmark("b.jpg", None);
        store.insert_resource(Some(a), Some(volume));
        store.insert_resource(Some(b), None);

        let stats = store.stats().unwrap();
        assert_eq!(stats.bookmarks, 2);
        assert_eq!(stats.bookmarks_with_data, 1);
        assert_eq!(stats.volumes, 1);
        assert_eq!(stats.resources, 2);
    }
}
