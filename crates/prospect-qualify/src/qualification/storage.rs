use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use super::domain::{Location, Prospect, ProspectId, UserId};
use super::repository::{ProspectRepository, RepositoryError, StoredProspect, UpsertReport};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS prospects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    prospect_id TEXT NOT NULL,
    company_country TEXT,
    company_state TEXT,
    qualified INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    last_updated TEXT NOT NULL,
    UNIQUE (user_id, prospect_id)
);
CREATE INDEX IF NOT EXISTS idx_prospects_qualified ON prospects (qualified);
";

const UPSERT: &str = "
INSERT INTO prospects
    (user_id, prospect_id, company_country, company_state, qualified, created_at, last_updated)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
ON CONFLICT (user_id, prospect_id) DO UPDATE SET
    company_country = excluded.company_country,
    company_state = excluded.company_state,
    qualified = excluded.qualified,
    last_updated = excluded.last_updated
";

/// SQLite-backed repository; writes are chunked, one transaction per chunk.
pub struct SqliteProspectRepository {
    conn: Mutex<Connection>,
    batch_size: usize,
}

impl SqliteProspectRepository {
    pub fn open<P: AsRef<Path>>(path: P, batch_size: usize) -> Result<Self, RepositoryError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, batch_size)
    }

    pub fn open_in_memory(batch_size: usize) -> Result<Self, RepositoryError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, batch_size)
    }

    fn with_connection(conn: Connection, batch_size: usize) -> Result<Self, RepositoryError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            batch_size: batch_size.max(1),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        self.conn
            .lock()
            .map_err(|_| RepositoryError::Unavailable("connection mutex poisoned".to_string()))
    }
}

impl ProspectRepository for SqliteProspectRepository {
    fn upsert_batch(&self, prospects: &[Prospect]) -> Result<UpsertReport, RepositoryError> {
        let mut report = UpsertReport::default();
        let mut conn = self.connection()?;

        for chunk in prospects.chunks(self.batch_size) {
            let tx = conn.transaction()?;
            {
                let mut exists = tx.prepare_cached(
                    "SELECT 1 FROM prospects WHERE user_id = ?1 AND prospect_id = ?2",
                )?;
                let mut upsert = tx.prepare_cached(UPSERT)?;
                let now = Utc::now();

                for prospect in chunk {
                    let Some((user_id, prospect_id)) = prospect.key() else {
                        warn!(
                            user_id = ?prospect.user_id,
                            prospect_id = ?prospect.prospect_id,
                            "prospect without a complete key was not stored"
                        );
                        report.skipped += 1;
                        continue;
                    };

                    let existing = exists
                        .query_row(params![user_id.0, prospect_id.0], |_| Ok(()))
                        .optional()?;

                    upsert.execute(params![
                        user_id.0,
                        prospect_id.0,
                        prospect.location.country,
                        prospect.location.state,
                        prospect.qualified,
                        now,
                    ])?;

                    if existing.is_some() {
                        report.updated += 1;
                    } else {
                        report.inserted += 1;
                    }
                }
            }
            tx.commit()?;
            debug!(rows = chunk.len(), "prospect chunk committed");
        }

        Ok(report)
    }

    fn qualified(&self, limit: usize) -> Result<Vec<StoredProspect>, RepositoryError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, prospect_id, company_country, company_state, qualified,
                    created_at, last_updated
             FROM prospects
             WHERE qualified = 1
             ORDER BY id
             LIMIT ?1",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let prospects = stmt
            .query_map(params![limit], |row| {
                Ok(StoredProspect {
                    user_id: UserId(row.get(0)?),
                    prospect_id: ProspectId(row.get(1)?),
                    location: Location::new(row.get(2)?, row.get(3)?),
                    qualified: row.get(4)?,
                    created_at: row.get(5)?,
                    last_updated: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(prospects)
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        let conn = self.connection()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM prospects", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qualification::domain::ProspectRow;

    fn prospect(user: &str, id: &str, country: &str, qualified: bool) -> Prospect {
        let mut prospect = Prospect::from_row(ProspectRow {
            user_id: Some(user.to_string()),
            prospect_id: Some(id.to_string()),
            country: Some(country.to_string()),
            state: None,
        });
        prospect.qualified = qualified;
        prospect
    }

    #[test]
    fn upsert_overwrites_existing_keys() {
        let repository = SqliteProspectRepository::open_in_memory(2).expect("open");

        let first = repository
            .upsert_batch(&[
                prospect("u1", "p1", "US", true),
                prospect("u1", "p2", "UK", false),
                prospect("u2", "p1", "FR", true),
            ])
            .expect("first run");
        assert_eq!(first.inserted, 3);
        assert_eq!(first.updated, 0);
        let before = repository.qualified(10).expect("qualified");
        assert_eq!(before[1].user_id, UserId("u2".to_string()));
        let created_at = before[1].created_at;

        let second = repository
            .upsert_batch(&[
                prospect("u1", "p1", "US", false),
                prospect("u1", "p2", "DE", true),
            ])
            .expect("second run");
        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, 2);
        assert_eq!(repository.count().expect("count"), 3);

        let qualified = repository.qualified(10).expect("qualified");
        let keys: Vec<(&str, &str)> = qualified
            .iter()
            .map(|stored| (stored.user_id.0.as_str(), stored.prospect_id.0.as_str()))
            .collect();
        assert_eq!(keys, vec![("u1", "p2"), ("u2", "p1")]);
        assert_eq!(qualified[0].location, Location::country("DE"));
        assert!(qualified[0].last_updated >= qualified[0].created_at);

        assert_eq!(qualified[1].created_at, created_at);
        let rewritten = repository
            .upsert_batch(&[prospect("u2", "p1", "FR", true)])
            .expect("third run");
        assert_eq!(rewritten.updated, 1);
        let after = repository.qualified(10).expect("qualified");
        assert_eq!(after[1].user_id, UserId("u2".to_string()));
        assert_eq!(after[1].created_at, created_at);
        assert!(after[1].last_updated >= created_at);
    }

    #[test]
    fn incomplete_keys_are_skipped() {
        let repository = SqliteProspectRepository::open_in_memory(10).expect("open");
        let mut missing_user = prospect("u1", "p1", "US", true);
        missing_user.user_id = None;

        let report = repository
            .upsert_batch(&[missing_user, prospect("u1", "p2", "US", true)])
            .expect("upsert");

        assert_eq!(report.skipped, 1);
        assert_eq!(report.written(), 1);
        assert_eq!(repository.count().expect("count"), 1);
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let repository = SqliteProspectRepository::open_in_memory(10).expect("open");
        let report = repository.upsert_batch(&[]).expect("upsert");
        assert_eq!(report, UpsertReport::default());
        assert_eq!(repository.count().expect("count"), 0);
    }

    #[test]
    fn reopening_a_file_keeps_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("prospects.db");

        {
            let repository = SqliteProspectRepository::open(&path, 100).expect("open");
            repository
                .upsert_batch(&[prospect("u1", "p1", "US", true)])
                .expect("upsert");
        }

        let repository = SqliteProspectRepository::open(&path, 100).expect("reopen");
        assert_eq!(repository.count().expect("count"), 1);
        assert_eq!(repository.qualified(1).expect("qualified").len(), 1);
    }
}
