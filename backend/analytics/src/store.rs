use anyhow::{Context, Result};
use chrono::SecondsFormat;
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use tracing::info;

use routeforge_core::{OutcomeEvent, ProviderId};

/// SQLite-backed append-only log of routing outcomes.
pub struct AnalyticsStore {
    conn: Connection,
}

/// Aggregate outcome figures for one provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSummary {
    /// `None` groups failures that never reached a provider.
    pub provider: Option<ProviderId>,
    pub attempts: u64,
    pub successes: u64,
    pub avg_response_time_ms: f64,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl ProviderSummary {
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.successes as f64 / self.attempts as f64
        }
    }
}

const SELECT_COLUMNS: &str = "id, timestamp, event_type, task_category, provider_used, model_name,
     response_time_ms, input_tokens, output_tokens, success, error_message";

impl AnalyticsStore {
    /// Open or create the store at the given path.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let store = Self { conn };
        store.init_schema()?;
        info!(path = %path, "Analytics store opened");
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite")?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS outcomes (
                id TEXT PRIMARY KEY,
                timestamp TEXT NOT NULL,
                event_type TEXT NOT NULL,
                task_category TEXT NOT NULL,
                provider_used TEXT,
                model_name TEXT,
                response_time_ms INTEGER NOT NULL,
                input_tokens INTEGER NOT NULL,
                output_tokens INTEGER NOT NULL,
                success INTEGER NOT NULL,
                error_message TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_outcomes_timestamp ON outcomes(timestamp);
            CREATE INDEX IF NOT EXISTS idx_outcomes_provider ON outcomes(provider_used);",
        )?;
        Ok(())
    }

    pub fn insert(&self, event: &OutcomeEvent) -> Result<()> {
        self.conn.execute(
            "INSERT INTO outcomes (id, timestamp, event_type, task_category, provider_used, model_name,
                                   response_time_ms, input_tokens, output_tokens, success, error_message)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                event.id.to_string(),
                event.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
                event.event_type,
                event.task_category.as_str(),
                event.provider_used.map(|p| p.as_str()),
                event.model_name,
                event.response_time_ms as i64,
                event.input_tokens as i64,
                event.output_tokens as i64,
                event.success,
                event.error_message,
            ],
        )?;
        Ok(())
    }

    pub fn count(&self) -> Result<usize> {
        let count: usize = self
            .conn
            .query_row("SELECT COUNT(*) FROM outcomes", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Most recent outcomes first.
    pub fn recent(&self, limit: usize) -> Result<Vec<OutcomeEvent>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM outcomes ORDER BY timestamp DESC, rowid DESC LIMIT ?1"
        ))?;

        let events = stmt
            .query_map(params![limit as i64], raw_event)?
            .filter_map(|r| r.ok())
            .filter_map(RawEvent::into_event)
            .collect();

        Ok(events)
    }

    /// Attempts, successes, mean latency and token totals per provider.
    pub fn provider_summary(&self) -> Result<Vec<ProviderSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT provider_used, COUNT(*), SUM(success), AVG(response_time_ms),
                    SUM(input_tokens), SUM(output_tokens)
             FROM outcomes GROUP BY provider_used ORDER BY provider_used",
        )?;

        let rows = stmt
            .query_map([], |row| {
                let provider: Option<String> = row.get(0)?;
                let attempts: i64 = row.get(1)?;
                let successes: i64 = row.get(2)?;
                let avg: f64 = row.get(3)?;
                let input: i64 = row.get(4)?;
                let output: i64 = row.get(5)?;
                Ok(ProviderSummary {
                    provider: provider.and_then(|p| p.parse().ok()),
                    attempts: attempts as u64,
                    successes: successes as u64,
                    avg_response_time_ms: avg,
                    input_tokens: input as u64,
                    output_tokens: output as u64,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }
}

struct RawEvent {
    id: String,
    timestamp: String,
    event_type: String,
    task_category: String,
    provider_used: Option<String>,
    model_name: Option<String>,
    response_time_ms: i64,
    input_tokens: i64,
    output_tokens: i64,
    success: bool,
    error_message: Option<String>,
}

fn raw_event(row: &Row<'_>) -> rusqlite::Result<RawEvent> {
    Ok(RawEvent {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        event_type: row.get(2)?,
        task_category: row.get(3)?,
        provider_used: row.get(4)?,
        model_name: row.get(5)?,
        response_time_ms: row.get(6)?,
        input_tokens: row.get(7)?,
        output_tokens: row.get(8)?,
        success: row.get(9)?,
        error_message: row.get(10)?,
    })
}

impl RawEvent {
    /// Rows that no longer parse are skipped.
    fn into_event(self) -> Option<OutcomeEvent> {
        let provider_used = match self.provider_used {
            Some(p) => Some(p.parse().ok()?),
            None => None,
        };
        Some(OutcomeEvent {
            id: uuid::Uuid::parse_str(&self.id).ok()?,
            timestamp: chrono::DateTime::parse_from_rfc3339(&self.timestamp)
                .ok()?
                .with_timezone(&chrono::Utc),
            event_type: self.event_type,
            task_category: self.task_category.parse().ok()?,
            provider_used,
            model_name: self.model_name,
            response_time_ms: self.response_time_ms as u64,
            input_tokens: self.input_tokens as u64,
            output_tokens: self.output_tokens as u64,
            success: self.success,
            error_message: self.error_message,
        })
    }
}
