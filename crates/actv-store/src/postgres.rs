//! PostgreSQL code store.
//!
//! The redemption transition is a single statement:
//!
//! ```sql
//! UPDATE activation_codes
//!    SET status = 'used', device_hash = $2, license_id = $3, used_at = $4
//!  WHERE code = $1 AND status = 'unused'
//! RETURNING …
//! ```
//!
//! Postgres row locking makes concurrent updates of the same row serialize,
//! and the second one re-evaluates `status = 'unused'` against the committed
//! row, so at most one caller gets a row back. Every call is bounded by the
//! configured timeout; a timeout surfaces as [`StoreError::Timeout`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use actv_core::{CodeId, DeviceHash, LicenseId, Timestamp};
use actv_state::{ActivationCode, CodeLifecycle, CodeStatus, Redemption};

use crate::error::StoreError;
use crate::store::{CodeStats, CodeStore, NewCode, ReserveOutcome, SeedReport};

const SELECT_COLUMNS: &str = "code, plan, expires_at, status, device_hash, license_id, used_at";

/// Postgres-backed code store.
#[derive(Debug, Clone)]
pub struct PgCodeStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgCodeStore {
    /// Connect, then apply embedded migrations.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let options: PgConnectOptions = url.parse()?;
        Self::connect_with(options, timeout).await
    }

    /// Connect with explicit options (for example a `search_path`), then
    /// apply embedded migrations into that schema.
    pub async fn connect_with(
        options: PgConnectOptions,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(timeout)
            .connect_with(options)
            .await?;
        tracing::info!("Connected to PostgreSQL");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {e}")))?;
        tracing::info!("Database migrations applied");

        Ok(Self::from_pool(pool, timeout))
    }

    /// Wrap an existing pool. Migrations are assumed applied.
    pub fn from_pool(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn timed<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = Result<T, sqlx::Error>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => {
                let after_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(op, after_ms, "code store call timed out");
                Err(StoreError::Timeout { op, after_ms })
            }
        }
    }
}

#[async_trait]
impl CodeStore for PgCodeStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn exists(&self, code: &CodeId) -> Result<bool, StoreError> {
        self.timed(
            "exists",
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM activation_codes WHERE code = $1)",
            )
            .bind(code.as_str())
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn lookup(&self, code: &CodeId) -> Result<Option<ActivationCode>, StoreError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM activation_codes WHERE code = $1");
        let row = self
            .timed(
                "lookup",
                sqlx::query_as::<_, CodeRow>(&sql)
                    .bind(code.as_str())
                    .fetch_optional(&self.pool),
            )
            .await?;
        row.map(CodeRow::into_record).transpose()
    }

    async fn reserve(
        &self,
        code: &CodeId,
        redemption: Redemption,
    ) -> Result<ReserveOutcome, StoreError> {
        let sql = format!(
            "UPDATE activation_codes
                SET status = 'used', device_hash = $2, license_id = $3, used_at = $4
              WHERE code = $1 AND status = 'unused'
             RETURNING {SELECT_COLUMNS}"
        );
        let updated = self
            .timed(
                "reserve",
                sqlx::query_as::<_, CodeRow>(&sql)
                    .bind(code.as_str())
                    .bind(redemption.device_hash.as_str())
                    .bind(redemption.license_id.as_str())
                    .bind(*redemption.used_at.as_datetime())
                    .fetch_optional(&self.pool),
            )
            .await?;

        if let Some(row) = updated {
            return Ok(ReserveOutcome::Reserved(row.into_record()?));
        }
        if self.exists(code).await? {
            Ok(ReserveOutcome::AlreadyUsed)
        } else {
            Ok(ReserveOutcome::NotFound)
        }
    }

    async fn stats(&self) -> Result<CodeStats, StoreError> {
        let (total, used) = self
            .timed(
                "stats",
                sqlx::query_as::<_, (i64, i64)>(
                    "SELECT COUNT(*), COUNT(*) FILTER (WHERE status = 'used')
                       FROM activation_codes",
                )
                .fetch_one(&self.pool),
            )
            .await?;
        Ok(CodeStats::from_counts(
            u64::try_from(total).unwrap_or(0),
            u64::try_from(used).unwrap_or(0),
        ))
    }

    async fn seed(&self, codes: &[NewCode]) -> Result<SeedReport, StoreError> {
        let pool = &self.pool;
        let inserted = self
            .timed("seed", async move {
                let mut tx = pool.begin().await?;
                let mut inserted = 0u64;
                for entry in codes {
                    let result = sqlx::query(
                        "INSERT INTO activation_codes (code, plan, expires_at, status)
                         VALUES ($1, $2, $3, 'unused')
                         ON CONFLICT (code) DO NOTHING",
                    )
                    .bind(entry.code.as_str())
                    .bind(entry.plan.as_str())
                    .bind(*entry.expires_at.as_datetime())
                    .execute(&mut *tx)
                    .await?;
                    inserted += result.rows_affected();
                }
                tx.commit().await?;
                Ok::<u64, sqlx::Error>(inserted)
            })
            .await?;
        Ok(SeedReport {
            inserted,
            skipped: codes.len() as u64 - inserted,
        })
    }

    async fn next_license_serial(&self) -> Result<u64, StoreError> {
        let value = self
            .timed(
                "next_license_serial",
                sqlx::query_scalar::<_, i64>("SELECT nextval('license_serial_seq')")
                    .fetch_one(&self.pool),
            )
            .await?;
        u64::try_from(value).map_err(|_| StoreError::Corrupt {
            key: "license_serial_seq".to_string(),
            reason: format!("negative serial {value}"),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.timed(
            "ping",
            sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.pool),
        )
        .await
        .map(|_| ())
    }
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct CodeRow {
    code: String,
    plan: String,
    expires_at: DateTime<Utc>,
    status: String,
    device_hash: Option<String>,
    license_id: Option<String>,
    used_at: Option<DateTime<Utc>>,
}

impl CodeRow {
    fn into_record(self) -> Result<ActivationCode, StoreError> {
        let corrupt = |reason: String| StoreError::Corrupt {
            key: self.code.clone(),
            reason,
        };
        let code = CodeId::new(self.code.clone()).map_err(|e| corrupt(e.to_string()))?;
        let plan = self.plan.parse().map_err(corrupt)?;
        let lifecycle = match self.status.as_str() {
            s if s == CodeStatus::Unused.as_str() => CodeLifecycle::Unused,
            s if s == CodeStatus::Used.as_str() => {
                let (Some(device_hash), Some(license_id), Some(used_at)) =
                    (&self.device_hash, &self.license_id, self.used_at)
                else {
                    return Err(corrupt("used code without redemption binding".into()));
                };
                CodeLifecycle::Used(Redemption {
                    device_hash: DeviceHash::new(device_hash.clone())
                        .map_err(|e| corrupt(e.to_string()))?,
                    license_id: LicenseId::new(license_id.clone())
                        .map_err(|e| corrupt(e.to_string()))?,
                    used_at: Timestamp::from_utc(used_at),
                })
            }
            other => return Err(corrupt(format!("unknown status {other:?}"))),
        };
        Ok(ActivationCode {
            code,
            plan,
            expires_at: Timestamp::from_utc(self.expires_at),
            lifecycle,
        })
    }
}
