//! Catalog search seam and a local SQLite FTS5 implementation.
//!
//! The resolver only needs `search(query) -> candidates`. Remote clients
//! (with their own auth, timeouts and paging) implement [`SearchCatalog`];
//! [`SqliteCatalog`] serves the same contract from a local index built
//! from a catalog export.

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::errors::SearchError;
use crate::models::CandidateResult;
use crate::normalize::normalize_component;

const WRITE_BATCH_SIZE: usize = 10_000;

/// Rows returned per FTS query
pub const DEFAULT_RESULT_LIMIT: usize = 25;

/// External search capability.
///
/// Result ordering and paging are opaque to the resolver. Implementations
/// report timeouts and transport problems as [`SearchError`].
pub trait SearchCatalog {
    fn search(&self, query: &str) -> Result<Vec<CandidateResult>, SearchError>;
}

impl<C: SearchCatalog + ?Sized> SearchCatalog for &C {
    fn search(&self, query: &str) -> Result<Vec<CandidateResult>, SearchError> {
        (**self).search(query)
    }
}

// ============================================================================
// SQLite FTS catalog
// ============================================================================

pub struct SqliteCatalog {
    conn: Connection,
    result_limit: usize,
}

impl SqliteCatalog {
    /// Open an existing catalog index
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open catalog index {:?}", path))?;
        Ok(Self::from_connection(conn))
    }

    /// Create a fresh catalog index at `path` (the file must not exist)
    pub fn create(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to create catalog index {:?}", path))?;
        let catalog = Self::from_connection(conn);
        catalog.create_schema()?;
        Ok(catalog)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory catalog")?;
        let catalog = Self::from_connection(conn);
        catalog.create_schema()?;
        Ok(catalog)
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            result_limit: DEFAULT_RESULT_LIMIT,
        }
    }

    pub fn with_result_limit(mut self, limit: usize) -> Self {
        self.result_limit = limit.max(1);
        self
    }

    fn create_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA temp_store = MEMORY;

                CREATE TABLE IF NOT EXISTS catalog (
                    id INTEGER PRIMARY KEY,
                    catalog_id TEXT NOT NULL UNIQUE,
                    artist TEXT NOT NULL,
                    title TEXT NOT NULL
                );

                CREATE VIRTUAL TABLE IF NOT EXISTS catalog_fts USING fts5(
                    title, artist,
                    content='catalog',
                    content_rowid='id',
                    tokenize='porter'
                );",
            )
            .context("Failed to create catalog schema")
    }

    /// Insert catalog entries in batched transactions and rebuild the FTS index.
    /// Entries whose catalog id is already present are skipped.
    /// Returns the number of rows actually inserted.
    pub fn insert_entries(&mut self, entries: &[CandidateResult]) -> Result<usize> {
        let mut inserted = 0;

        for chunk in entries.chunks(WRITE_BATCH_SIZE) {
            let tx = self.conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(
                    "INSERT OR IGNORE INTO catalog (catalog_id, artist, title) VALUES (?1, ?2, ?3)",
                )?;
                for entry in chunk {
                    inserted += stmt.execute(params![entry.catalog_id, entry.artist, entry.title])?;
                }
            }
            tx.commit()?;
        }

        self.conn
            .execute("INSERT INTO catalog_fts(catalog_fts) VALUES('rebuild')", [])
            .context("Failed to rebuild catalog FTS index")?;

        Ok(inserted)
    }

    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM catalog", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn optimize(&self) -> Result<()> {
        self.conn.execute_batch("VACUUM; ANALYZE;")?;
        Ok(())
    }
}

impl SearchCatalog for SqliteCatalog {
    fn search(&self, query: &str) -> Result<Vec<CandidateResult>, SearchError> {
        let Some(fts) = fts_query(query) else {
            return Ok(Vec::new());
        };

        let mut stmt = self.conn.prepare_cached(
            "SELECT c.catalog_id, c.artist, c.title
             FROM catalog_fts fts
             JOIN catalog c ON fts.rowid = c.id
             WHERE catalog_fts MATCH ?1
             ORDER BY bm25(catalog_fts)
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![fts, self.result_limit as i64], |row| {
            Ok(CandidateResult {
                catalog_id: row.get(0)?,
                artist: row.get(1)?,
                title: row.get(2)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }
}

/// Turn free text into an FTS5 query: every distinct normalized token, quoted, OR-ed.
/// Quoting keeps FTS operators ("-", "AND", parentheses) in scraped text literal.
/// Returns None when no searchable token remains.
pub fn fts_query(text: &str) -> Option<String> {
    let normalized = normalize_component(text);
    let mut tokens: Vec<&str> = Vec::new();
    for token in normalized.split_whitespace() {
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    if tokens.is_empty() {
        return None;
    }
    Some(
        tokens
            .iter()
            .map(|t| format!("\"{t}\""))
            .collect::<Vec<_>>()
            .join(" OR "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, artist: &str, title: &str) -> CandidateResult {
        CandidateResult::new(id, artist, title)
    }

    #[test]
    fn test_fts_query_quotes_tokens() {
        assert_eq!(
            fts_query("Kx5 ft. HAYLA - Escape (Remix)").as_deref(),
            Some("\"kx5\" OR \"ft\" OR \"hayla\" OR \"escape\" OR \"remix\"")
        );
        assert_eq!(fts_query("\"A\" \"a\"").as_deref(), Some("\"a\""));
        assert_eq!(fts_query("- !? -"), None);
    }

    #[test]
    fn test_search_finds_inserted_entries() {
        let mut catalog = SqliteCatalog::in_memory().unwrap();
        let inserted = catalog
            .insert_entries(&[
                entry("t1", "Kx5, HAYLA", "Escape (Spencer Brown Remix)"),
                entry("t2", "Fisher", "Losing It"),
                entry("t3", "Chris Lake", "Turn Off The Lights"),
            ])
            .unwrap();
        assert_eq!(inserted, 3);
        assert_eq!(catalog.len().unwrap(), 3);

        let results = catalog.search("Fisher - Losing It").unwrap();
        assert_eq!(results.first().map(|c| c.catalog_id.as_str()), Some("t2"));

        let results = catalog.search("\"Kx5 ft. HAYLA\" \"Escape\"").unwrap();
        assert!(results.iter().any(|c| c.catalog_id == "t1"));
    }

    #[test]
    fn test_duplicate_catalog_ids_ignored() {
        let mut catalog = SqliteCatalog::in_memory().unwrap();
        catalog.insert_entries(&[entry("t1", "A", "Song")]).unwrap();
        let inserted = catalog
            .insert_entries(&[entry("t1", "A", "Song"), entry("t2", "B", "Other")])
            .unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(catalog.len().unwrap(), 2);
    }

    #[test]
    fn test_untokenizable_query_returns_nothing() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        assert!(catalog.search("?!").unwrap().is_empty());
        assert!(catalog.is_empty().unwrap());
    }

    #[test]
    fn test_result_limit() {
        let mut catalog = SqliteCatalog::in_memory().unwrap().with_result_limit(2);
        let entries: Vec<_> = (0..5)
            .map(|i| entry(&format!("id{i}"), "Same Artist", &format!("Song {i}")))
            .collect();
        catalog.insert_entries(&entries).unwrap();
        assert_eq!(catalog.search("Same Artist").unwrap().len(), 2);
    }

    #[test]
    fn test_file_backed_catalog_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.sqlite3");
        {
            let mut catalog = SqliteCatalog::create(&path).unwrap();
            catalog.insert_entries(&[entry("t1", "Fisher", "Losing It")]).unwrap();
        }
        let reopened = SqliteCatalog::open(&path).unwrap();
        assert_eq!(reopened.search("losing").unwrap().len(), 1);
    }
}
