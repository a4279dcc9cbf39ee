//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `ScanStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use carbon_lens_core::domain::{HistorySummary, ScanRecord, UserProfile};
use carbon_lens_core::ports::{PortError, PortResult, ScanStore};
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `ScanStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ScanRecordRow {
    record: Json<ScanRecord>,
}

#[derive(FromRow)]
struct SummaryRow {
    summary: Json<HistorySummary>,
}

#[derive(FromRow)]
struct ProfileRow {
    profile: Json<UserProfile>,
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

async fn write_summary(conn: &mut PgConnection, summary: &HistorySummary) -> PortResult<()> {
    sqlx::query(
        "INSERT INTO history_summary (id, summary, updated_at) VALUES (1, $1, now())
         ON CONFLICT (id) DO UPDATE SET summary = EXCLUDED.summary, updated_at = now()",
    )
    .bind(Json(summary))
    .execute(conn)
    .await
    .map_err(unexpected)?;
    Ok(())
}

//=========================================================================================
// `ScanStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ScanStore for DbAdapter {
    async fn get_scan_history(&self) -> PortResult<Vec<ScanRecord>> {
        let rows = sqlx::query_as::<_, ScanRecordRow>(
            "SELECT record FROM scan_records ORDER BY scanned_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(rows.into_iter().map(|row| row.record.0).collect())
    }

    async fn save_scan_record(&self, record: &ScanRecord, summary: &HistorySummary) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query("INSERT INTO scan_records (id, scanned_at, record) VALUES ($1, $2, $3)")
            .bind(record.id)
            .bind(record.scanned_at)
            .bind(Json(record))
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        write_summary(&mut tx, summary).await?;

        tx.commit().await.map_err(unexpected)
    }

    async fn delete_scan_record(&self, id: Uuid, summary: &HistorySummary) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query("DELETE FROM scan_records WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        write_summary(&mut tx, summary).await?;

        tx.commit().await.map_err(unexpected)
    }

    async fn clear_scan_history(&self) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query("DELETE FROM scan_records")
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        write_summary(&mut tx, &HistorySummary::default()).await?;

        tx.commit().await.map_err(unexpected)
    }

    async fn get_history_summary(&self) -> PortResult<Option<HistorySummary>> {
        let row = sqlx::query_as::<_, SummaryRow>("SELECT summary FROM history_summary WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(row.map(|r| r.summary.0))
    }

    async fn get_user_profile(&self) -> PortResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>("SELECT profile FROM user_profile WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(row.map(|r| r.profile.0))
    }

    async fn save_user_profile(&self, profile: &UserProfile) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO user_profile (id, profile, updated_at) VALUES (1, $1, now())
             ON CONFLICT (id) DO UPDATE SET profile = EXCLUDED.profile, updated_at = now()",
        )
        .bind(Json(profile))
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }
}
