//! Database schema definitions
//!
//! All SQL schema for the trawler database lives here.

use rusqlite::Connection;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Stable integer identities for hostnames
CREATE TABLE IF NOT EXISTS domains (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

-- Stable integer identities for canonical URLs
CREATE TABLE IF NOT EXISTS sites (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    domain_id INTEGER NOT NULL REFERENCES domains(id)
);

CREATE INDEX IF NOT EXISTS idx_sites_domain ON sites(domain_id);

-- Append-only history of discovered link edges
CREATE TABLE IF NOT EXISTS link_edges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    time_found INTEGER NOT NULL,
    origin_site_id INTEGER NOT NULL REFERENCES sites(id),
    destination_site_id INTEGER NOT NULL REFERENCES sites(id),
    rating REAL NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_link_edges_origin ON link_edges(origin_site_id);
CREATE INDEX IF NOT EXISTS idx_link_edges_destination ON link_edges(destination_site_id);

-- Keyword evidence tied to a link edge
CREATE TABLE IF NOT EXISTS link_keywords (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    link_edge_id INTEGER NOT NULL REFERENCES link_edges(id),
    visibility INTEGER NOT NULL,
    text TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_link_keywords_edge ON link_keywords(link_edge_id);

-- Interned content-type names
CREATE TABLE IF NOT EXISTS content_types (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

-- One row per fetched resource
CREATE TABLE IF NOT EXISTS contents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    time_found INTEGER NOT NULL,
    site_id INTEGER NOT NULL REFERENCES sites(id),
    content_type_id INTEGER NOT NULL REFERENCES content_types(id),
    http_status INTEGER NOT NULL,
    size INTEGER NOT NULL,
    sha512 TEXT NOT NULL,
    sha1 TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_contents_site ON contents(site_id);
CREATE INDEX IF NOT EXISTS idx_contents_sha1 ON contents(sha1);

-- Append-only structured failure records
CREATE TABLE IF NOT EXISTS errors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    time TEXT NOT NULL,
    url TEXT NOT NULL,
    kind TEXT NOT NULL,
    detail TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_errors_kind ON errors(kind);

-- Analyzer results
CREATE TABLE IF NOT EXISTS perceptual_hashes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content_id INTEGER NOT NULL REFERENCES contents(id),
    average_hash INTEGER NOT NULL,
    difference_hash INTEGER NOT NULL,
    perception_hash INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS exif_info (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content_id INTEGER NOT NULL REFERENCES contents(id),
    camera TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    lat REAL NOT NULL,
    long REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS faces (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content_id INTEGER NOT NULL REFERENCES contents(id),
    descriptor BLOB NOT NULL,
    bounds TEXT NOT NULL
);

-- Content-addressed file blobs
CREATE TABLE IF NOT EXISTS files (
    sha1 TEXT PRIMARY KEY,
    bytes BLOB NOT NULL
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
