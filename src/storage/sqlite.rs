//! SQLite storage implementation

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    ContentRecord, ExifRecord, FaceRecord, LinkEdgeRecord, PerceptualHashRecord, SiteRecord,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database at the given path
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance under many writers
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (tests and ephemeral runs)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn is_unique_violation(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

impl Storage for SqliteStorage {
    fn insert_or_get_domain(&mut self, name: &str) -> StorageResult<i64> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM domains WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        match self
            .conn
            .execute("INSERT INTO domains (name) VALUES (?1)", params![name])
        {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            // Lost a race to a concurrent insert; the row exists now.
            Err(e) if Self::is_unique_violation(&e) => self
                .conn
                .query_row(
                    "SELECT id FROM domains WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .map_err(StorageError::from),
            Err(e) => Err(e.into()),
        }
    }

    fn insert_site(&mut self, url: &str, domain_id: i64) -> StorageResult<i64> {
        match self.conn.execute(
            "INSERT INTO sites (url, domain_id) VALUES (?1, ?2)",
            params![url, domain_id],
        ) {
            Ok(_) => {
                let id = self.conn.last_insert_rowid();
                if id == 0 {
                    return Err(StorageError::MissingIdentity(url.to_string()));
                }
                Ok(id)
            }
            Err(e) if Self::is_unique_violation(&e) => {
                Err(StorageError::ConstraintViolation(url.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>> {
        let site = self
            .conn
            .query_row(
                "SELECT id, url, domain_id FROM sites WHERE url = ?1",
                params![url],
                |row| {
                    Ok(SiteRecord {
                        id: row.get(0)?,
                        url: row.get(1)?,
                        domain_id: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(site)
    }

    fn site_urls(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT url FROM sites")?;
        let urls = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(urls)
    }

    fn insert_or_get_content_type(&mut self, name: &str) -> StorageResult<i64> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM content_types WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        self.conn.execute(
            "INSERT OR IGNORE INTO content_types (name) VALUES (?1)",
            params![name],
        )?;
        self.conn
            .query_row(
                "SELECT id FROM content_types WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .map_err(StorageError::from)
    }

    fn insert_link_edge(&mut self, edge: &LinkEdgeRecord) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO link_edges (time_found, origin_site_id, destination_site_id, rating)
             VALUES (?1, ?2, ?3, ?4)",
            params![edge.time_found, edge.origin, edge.destination, edge.rating],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_link_keyword(
        &mut self,
        link_edge_id: i64,
        visibility: u32,
        text: &str,
    ) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO link_keywords (link_edge_id, visibility, text) VALUES (?1, ?2, ?3)",
            params![link_edge_id, visibility, text],
        )?;
        Ok(())
    }

    fn insert_content(&mut self, record: &ContentRecord) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO contents
                (time_found, site_id, content_type_id, http_status, size, sha512, sha1)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.time_found,
                record.site_id,
                record.content_type_id,
                record.http_status,
                record.size as i64,
                record.sha512,
                record.sha1,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_error(
        &mut self,
        time: &str,
        url: &str,
        kind: &str,
        detail: &str,
    ) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO errors (time, url, kind, detail) VALUES (?1, ?2, ?3, ?4)",
            params![time, url, kind, detail],
        )?;
        Ok(())
    }

    fn insert_perceptual_hash(&mut self, record: &PerceptualHashRecord) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO perceptual_hashes
                (content_id, average_hash, difference_hash, perception_hash)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.content_id,
                record.average_hash as i64,
                record.difference_hash as i64,
                record.perception_hash as i64,
            ],
        )?;
        Ok(())
    }

    fn insert_exif(&mut self, record: &ExifRecord) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO exif_info (content_id, camera, timestamp, lat, long)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.content_id,
                record.camera,
                record.timestamp,
                record.latitude,
                record.longitude,
            ],
        )?;
        Ok(())
    }

    fn insert_face(&mut self, record: &FaceRecord) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO faces (content_id, descriptor, bounds) VALUES (?1, ?2, ?3)",
            params![record.content_id, record.descriptor, record.bounds],
        )?;
        Ok(())
    }

    fn store_file(&mut self, sha1: &str, bytes: &[u8]) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO files (sha1, bytes) VALUES (?1, ?2)",
            params![sha1, bytes],
        )?;
        Ok(())
    }

    fn count_contents(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM contents", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_link_edges(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM link_edges", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_errors_by_kind(&self, kind: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM errors WHERE kind = ?1",
            params![kind],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> SqliteStorage {
        SqliteStorage::new_in_memory().unwrap()
    }

    #[test]
    fn domain_insert_is_idempotent() {
        let mut s = storage();
        let a = s.insert_or_get_domain("example.com").unwrap();
        let b = s.insert_or_get_domain("example.com").unwrap();
        assert_eq!(a, b);

        let c = s.insert_or_get_domain("other.example").unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn duplicate_site_url_is_a_constraint_violation() {
        let mut s = storage();
        let domain = s.insert_or_get_domain("example.com").unwrap();
        let id = s.insert_site("https://example.com/", domain).unwrap();
        assert!(id > 0);

        match s.insert_site("https://example.com/", domain) {
            Err(StorageError::ConstraintViolation(url)) => {
                assert_eq!(url, "https://example.com/");
            }
            other => panic!("expected constraint violation, got {other:?}"),
        }

        let found = s.get_site_by_url("https://example.com/").unwrap().unwrap();
        assert_eq!(found.id, id);
    }

    #[test]
    fn site_urls_returns_everything() {
        let mut s = storage();
        let domain = s.insert_or_get_domain("example.com").unwrap();
        s.insert_site("https://example.com/", domain).unwrap();
        s.insert_site("https://example.com/about", domain).unwrap();

        let mut urls = s.site_urls().unwrap();
        urls.sort();
        assert_eq!(
            urls,
            vec!["https://example.com/", "https://example.com/about"]
        );
    }

    #[test]
    fn link_edge_and_keywords_roundtrip() {
        let mut s = storage();
        let domain = s.insert_or_get_domain("example.com").unwrap();
        let origin = s.insert_site("https://example.com/", domain).unwrap();
        let dest = s.insert_site("https://example.com/about", domain).unwrap();

        let edge_id = s
            .insert_link_edge(&LinkEdgeRecord {
                time_found: 1_700_000_000_000_000,
                origin,
                destination: dest,
                rating: 28.0,
            })
            .unwrap();
        assert!(edge_id > 0);
        s.insert_link_keyword(edge_id, 7, "About").unwrap();

        assert_eq!(s.count_link_edges().unwrap(), 1);
    }

    #[test]
    fn file_store_ignores_duplicate_fingerprints() {
        let mut s = storage();
        s.store_file("abcd", b"payload").unwrap();
        s.store_file("abcd", b"payload").unwrap();

        let count: i64 = s
            .conn
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn error_rows_are_counted_by_kind() {
        let mut s = storage();
        s.insert_error("2024-01-01T00:00:00Z", "https://x.example/", "fetch", "boom")
            .unwrap();
        s.insert_error(
            "2024-01-01T00:00:01Z",
            "https://x.example/big",
            "response-too-large",
            "500000000 bytes",
        )
        .unwrap();

        assert_eq!(s.count_errors_by_kind("fetch").unwrap(), 1);
        assert_eq!(s.count_errors_by_kind("response-too-large").unwrap(), 1);
        assert_eq!(s.count_errors_by_kind("markup-parse").unwrap(), 0);
    }
}
