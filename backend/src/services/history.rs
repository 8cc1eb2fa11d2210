//! Prediction history persistence

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use shared::{HistoryItem, PredictionRecord, RiskLevel};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;

use crate::error::{AppError, AppResult};

/// Storage for completed predictions
#[async_trait]
pub trait PredictionStore: Send + Sync {
    /// Persist one record, returning its id
    async fn save(&self, record: &PredictionRecord) -> AppResult<i64>;

    /// Up to `limit` summaries, newest first
    async fn recent(&self, limit: u32) -> AppResult<Vec<HistoryItem>>;

    fn is_ready(&self) -> bool;
}

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS predictions_v2 (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        area TEXT NOT NULL,
        item TEXT NOT NULL,
        year INTEGER NOT NULL,
        average_rain_fall_mm_per_year REAL NOT NULL,
        pesticides_tonnes REAL NOT NULL,
        avg_temp REAL NOT NULL,
        farm_area_hectares REAL NOT NULL,
        predicted_yield_hg_ha REAL NOT NULL,
        predicted_yield_t_ha REAL NOT NULL,
        risk_level TEXT NOT NULL,
        warnings TEXT NOT NULL,
        expected_production_tons REAL DEFAULT 0,
        food_security_level TEXT DEFAULT 'Watch',
        food_security_notes TEXT DEFAULT '[]',
        planting_schedule TEXT DEFAULT '{}',
        advisory TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
"#;

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_predictions_v2_created_at ON predictions_v2 (created_at DESC)";

#[derive(Debug, FromRow)]
struct HistoryRow {
    area: String,
    item: String,
    year: i32,
    predicted_yield_hg_ha: f64,
    predicted_yield_t_ha: f64,
    risk_level: String,
    created_at: DateTime<Utc>,
}

impl From<HistoryRow> for HistoryItem {
    fn from(row: HistoryRow) -> Self {
        HistoryItem {
            area: row.area,
            item: row.item,
            year: row.year,
            predicted_yield_hg_ha: row.predicted_yield_hg_ha,
            predicted_yield_t_ha: row.predicted_yield_t_ha,
            risk_level: RiskLevel::from_str(&row.risk_level).unwrap_or(RiskLevel::Medium),
            created_at: row.created_at,
        }
    }
}

/// SQLite-backed store. Holds no pool when the database could not be opened,
/// in which case writes fail and reads return nothing.
#[derive(Clone)]
pub struct SqlitePredictionStore {
    pool: Option<SqlitePool>,
}

impl SqlitePredictionStore {
    /// Open (creating if needed) the database file and its schema
    pub async fn open(path: &Path, max_connections: u32) -> Self {
        match Self::try_open(path, max_connections).await {
            Ok(pool) => {
                tracing::info!("Prediction history stored in {}", path.display());
                Self { pool: Some(pool) }
            }
            Err(e) => {
                tracing::error!("Prediction history unavailable ({}): {}", path.display(), e);
                Self::unavailable()
            }
        }
    }

    async fn try_open(path: &Path, max_connections: u32) -> AppResult<SqlitePool> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::StorageError(format!("cannot create {}: {}", parent.display(), e)))?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;
        Self::init_schema(&pool).await?;
        Ok(pool)
    }

    /// Use an existing pool, creating the schema on it
    pub async fn from_pool(pool: SqlitePool) -> AppResult<Self> {
        Self::init_schema(&pool).await?;
        Ok(Self { pool: Some(pool) })
    }

    /// Private in-memory database, mostly useful in tests
    pub async fn in_memory() -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    pub fn unavailable() -> Self {
        Self { pool: None }
    }

    async fn init_schema(pool: &SqlitePool) -> AppResult<()> {
        sqlx::query(CREATE_TABLE).execute(pool).await?;
        sqlx::query(CREATE_INDEX).execute(pool).await?;
        Ok(())
    }

    fn pool(&self) -> AppResult<&SqlitePool> {
        self.pool
            .as_ref()
            .ok_or_else(|| AppError::StorageError("database is not initialized".to_string()))
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> AppResult<String> {
    serde_json::to_string(value).map_err(|e| AppError::StorageError(e.to_string()))
}

#[async_trait]
impl PredictionStore for SqlitePredictionStore {
    async fn save(&self, record: &PredictionRecord) -> AppResult<i64> {
        let pool = self.pool()?;
        let input = &record.input;
        let response = &record.response;

        let result = sqlx::query(
            r#"
            INSERT INTO predictions_v2 (
                area, item, year, average_rain_fall_mm_per_year, pesticides_tonnes, avg_temp,
                farm_area_hectares, predicted_yield_hg_ha, predicted_yield_t_ha, risk_level,
                warnings, expected_production_tons, food_security_level, food_security_notes,
                planting_schedule, advisory, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.area)
        .bind(&input.item)
        .bind(input.year)
        .bind(input.avg_rainfall_mm_per_year)
        .bind(input.pesticides_tonnes)
        .bind(input.avg_temp_c)
        .bind(input.farm_area_hectares)
        .bind(response.predicted_yield_hg_ha)
        .bind(response.predicted_yield_t_ha)
        .bind(response.risk_level.as_str())
        .bind(to_json(&response.warnings)?)
        .bind(response.expected_production_tons)
        .bind(response.food_security_level.as_str())
        .bind(to_json(&response.food_security_notes)?)
        .bind(to_json(&response.planting_schedule)?)
        .bind(&response.advisory)
        // Fixed-width timestamps keep text ordering chronological
        .bind(record.created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn recent(&self, limit: u32) -> AppResult<Vec<HistoryItem>> {
        let Some(pool) = self.pool.as_ref() else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT area, item, year, predicted_yield_hg_ha, predicted_yield_t_ha, risk_level, created_at
            FROM predictions_v2
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(HistoryItem::from).collect())
    }

    fn is_ready(&self) -> bool {
        self.pool.is_some()
    }
}
