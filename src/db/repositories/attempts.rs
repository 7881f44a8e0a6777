use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::{
    connection::Database,
    helpers::{format_date, parse_date, parse_datetime, to_i64, to_u64},
    models::{AttemptRecord, InsertOutcome},
};

const SELECT_COLUMNS: &str =
    "SELECT id, user_id, display_name, date, score, duration_ms, submitted_at FROM attempts";

fn row_to_attempt(row: &Row) -> Result<AttemptRecord> {
    let id: String = row.get("id")?;
    let date: String = row.get("date")?;
    let score: i64 = row.get("score")?;
    let duration_ms: i64 = row.get("duration_ms")?;
    let submitted_at: String = row.get("submitted_at")?;

    Ok(AttemptRecord {
        id: Uuid::parse_str(&id).with_context(|| format!("invalid attempt id '{id}'"))?,
        user_id: row.get("user_id")?,
        display_name: row.get("display_name")?,
        date: parse_date(&date, "date")?,
        score: u32::try_from(to_u64(score, "score")?).context("score out of range")?,
        duration_ms: to_u64(duration_ms, "duration_ms")?,
        submitted_at: parse_datetime(&submitted_at, "submitted_at")?,
    })
}

impl Database {
    /// Inserts `attempt` unless one already exists for its user and date.
    ///
    /// The `UNIQUE (user_id, date)` constraint decides; there is no separate
    /// existence check to race against.
    pub async fn insert_attempt_if_absent(&self, attempt: &AttemptRecord) -> Result<InsertOutcome> {
        let record = attempt.clone();
        self.execute(move |conn| {
            let inserted = conn
                .execute(
                    "INSERT INTO attempts (id, user_id, display_name, date, score, duration_ms, submitted_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT (user_id, date) DO NOTHING",
                    params![
                        record.id.to_string(),
                        record.user_id,
                        record.display_name,
                        format_date(record.date),
                        i64::from(record.score),
                        to_i64(record.duration_ms)?,
                        record.submitted_at.to_rfc3339(),
                    ],
                )
                .with_context(|| "failed to insert attempt")?;

            Ok(if inserted == 1 {
                InsertOutcome::Inserted
            } else {
                InsertOutcome::AlreadyExists
            })
        })
        .await
    }

    pub async fn attempt_exists(&self, user_id: &str, date: NaiveDate) -> Result<bool> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM attempts WHERE user_id = ?1 AND date = ?2",
                    params![user_id, format_date(date)],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    pub async fn get_attempt(&self, user_id: &str, date: NaiveDate) -> Result<Option<AttemptRecord>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut stmt =
                conn.prepare(&format!("{SELECT_COLUMNS} WHERE user_id = ?1 AND date = ?2"))?;
            let mut rows = stmt.query(params![user_id, format_date(date)])?;
            let attempt = match rows.next()? {
                Some(row) => Some(row_to_attempt(row)?),
                None => None,
            };
            Ok(attempt)
        })
        .await
    }

    /// All attempts by one user, newest day first.
    pub async fn get_attempts_for_user(&self, user_id: &str) -> Result<Vec<AttemptRecord>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut stmt =
                conn.prepare(&format!("{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY date DESC"))?;
            let mut rows = stmt.query(params![user_id])?;
            let mut attempts = Vec::new();
            while let Some(row) = rows.next()? {
                attempts.push(row_to_attempt(row)?);
            }
            Ok(attempts)
        })
        .await
    }

    /// Attempts dated within `from..=to`.
    pub async fn get_attempts_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<AttemptRecord>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE date >= ?1 AND date <= ?2 ORDER BY date ASC, submitted_at ASC"
            ))?;
            let mut rows = stmt.query(params![format_date(from), format_date(to)])?;
            let mut attempts = Vec::new();
            while let Some(row) = rows.next()? {
                attempts.push(row_to_attempt(row)?);
            }
            Ok(attempts)
        })
        .await
    }
}
