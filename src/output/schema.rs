//! Database schema for the SQLite sink

use rusqlite::Connection;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per scraped page; a re-scrape replaces the row
CREATE TABLE IF NOT EXISTS pages (
    url TEXT PRIMARY KEY,
    captured_at TEXT NOT NULL,
    content TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pages_captured_at ON pages(captured_at);
"#;

/// Creates the tables if they do not exist yet
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
