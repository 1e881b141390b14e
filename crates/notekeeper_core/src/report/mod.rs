//! Read-only note statistics for summary views.
//!
//! # Responsibility
//! - Count notes overall and by completion state.
//! - Group note counts by creation day and by category.
//!
//! # Invariants
//! - Never mutates the store.
//! - Every figure is recomputed from the store on each call; nothing is
//!   cached.
//! - `summary()` reads all figures from one snapshot, so category buckets
//!   always sum to `total`.

use crate::db::with_read_transaction;
use crate::repo::{ensure_schema, RepoError, RepoResult};
use rusqlite::Connection;
use serde::Serialize;

/// Number of notes created on one day (`YYYY-MM-DD`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateCount {
    pub date: String,
    pub count: u64,
}

/// Number of notes in one category; `category: None` is the uncategorized
/// bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: Option<String>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: u64,
    pub completed: u64,
    pub incomplete: u64,
    pub by_date: Vec<DateCount>,
    pub by_category: Vec<CategoryCount>,
}

/// Aggregates counts over the `notes` table.
pub struct ReportAggregator<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ReportAggregator<'conn> {
    /// Constructs an aggregator from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(conn, "notes", &["date", "category", "completed"])?;
        Ok(Self { conn })
    }

    pub fn total_count(&self) -> RepoResult<u64> {
        count(self.conn, "SELECT COUNT(*) FROM notes;")
    }

    pub fn completed_count(&self) -> RepoResult<u64> {
        count(self.conn, "SELECT COUNT(*) FROM notes WHERE completed = 1;")
    }

    pub fn incomplete_count(&self) -> RepoResult<u64> {
        count(self.conn, "SELECT COUNT(*) FROM notes WHERE completed = 0;")
    }

    /// Notes per creation day, newest day first.
    pub fn counts_by_date(&self) -> RepoResult<Vec<DateCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT substr(date, 1, 10) AS day, COUNT(*) AS count
             FROM notes
             GROUP BY day
             ORDER BY day DESC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut buckets = Vec::new();
        while let Some(row) = rows.next()? {
            buckets.push(DateCount {
                date: row.get("day")?,
                count: to_count(row.get("count")?)?,
            });
        }
        Ok(buckets)
    }

    /// Notes per category name; the uncategorized bucket sorts first.
    pub fn counts_by_category(&self) -> RepoResult<Vec<CategoryCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, COUNT(*) AS count
             FROM notes
             GROUP BY category
             ORDER BY category ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut buckets = Vec::new();
        while let Some(row) = rows.next()? {
            buckets.push(CategoryCount {
                category: row.get("category")?,
                count: to_count(row.get("count")?)?,
            });
        }
        Ok(buckets)
    }

    /// All figures from a single read snapshot.
    pub fn summary(&self) -> RepoResult<ReportSummary> {
        with_read_transaction(self.conn, "report_summary", |tx| {
            let snapshot = ReportAggregator { conn: tx };
            Ok(ReportSummary {
                total: snapshot.total_count()?,
                completed: snapshot.completed_count()?,
                incomplete: snapshot.incomplete_count()?,
                by_date: snapshot.counts_by_date()?,
                by_category: snapshot.counts_by_category()?,
            })
        })
    }
}

fn count(conn: &Connection, sql: &str) -> RepoResult<u64> {
    let value: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    to_count(value)
}

fn to_count(value: i64) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative row count `{value}`")))
}
