//! Stored-procedure storage
//!
//! All persistence and business rules live in the `stew_player_stats` schema.
//! The gateway only invokes procedures by name with positional parameters,
//! each call bounded by a timeout.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use shared::{IpInfoResponse, PlayerInfoResponse, SessionIdResponse};
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    PgPool, Row,
};
use thiserror::Error;
use uuid::Uuid;

use crate::config::DatabaseConfig;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("stored procedure {procedure} failed: {source}")]
    Procedure {
        procedure: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("stored procedure {procedure} timed out after {timeout:?}")]
    Timeout {
        procedure: &'static str,
        timeout: Duration,
    },
}

impl StoreError {
    pub fn procedure(&self) -> &'static str {
        match self {
            StoreError::Procedure { procedure, .. } | StoreError::Timeout { procedure, .. } => {
                procedure
            }
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Player statistics procedures, called only with validated values
#[async_trait]
pub trait PlayerStatsStore: Send + Sync {
    async fn add_player_info(&self, uuid: &str, name: &str, version: &str) -> StoreResult<()>;

    async fn get_player_info(&self, uuid: &str) -> StoreResult<Option<PlayerInfoResponse>>;

    async fn update_player_info(&self, uuid: &str, name: &str, version: &str) -> StoreResult<()>;

    async fn add_ip_info(&self, ip: &str) -> StoreResult<()>;

    async fn get_ip_info(&self, ip: &str) -> StoreResult<Vec<IpInfoResponse>>;

    async fn handle_player_login(&self, uuid: &str, ip_id: &str) -> StoreResult<()>;

    async fn get_session_id(&self, uuid: &str) -> StoreResult<Option<SessionIdResponse>>;

    async fn update_login_session(&self, id: &str) -> StoreResult<()>;
}

/// Open the Postgres pool; fails when the first connection cannot be made.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .idle_timeout(Duration::from_secs(5 * 60))
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(config.connect_options())
        .await
}

pub struct PgPlayerStatsStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgPlayerStatsStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn bounded<T, F>(&self, procedure: &'static str, call: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(|source| StoreError::Procedure { procedure, source }),
            Err(_) => Err(StoreError::Timeout {
                procedure,
                timeout: self.timeout,
            }),
        }
    }

    async fn execute<'q>(
        &self,
        procedure: &'static str,
        sql: &'q str,
        params: &[&'q str],
    ) -> StoreResult<()> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(*param);
        }
        self.bounded(procedure, query.execute(&self.pool))
            .await
            .map(|_| ())
    }

    async fn fetch<'q>(
        &self,
        procedure: &'static str,
        sql: &'q str,
        params: &[&'q str],
    ) -> StoreResult<Vec<PgRow>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(*param);
        }
        self.bounded(procedure, query.fetch_all(&self.pool)).await
    }
}

fn decode<T>(procedure: &'static str, decoded: Result<T, sqlx::Error>) -> StoreResult<T> {
    decoded.map_err(|source| StoreError::Procedure { procedure, source })
}

#[async_trait]
impl PlayerStatsStore for PgPlayerStatsStore {
    async fn add_player_info(&self, uuid: &str, name: &str, version: &str) -> StoreResult<()> {
        self.execute(
            "add_player_info",
            "SELECT stew_player_stats.add_player_info($1::uuid, $2, $3::integer);",
            &[uuid, name, version],
        )
        .await
    }

    async fn get_player_info(&self, uuid: &str) -> StoreResult<Option<PlayerInfoResponse>> {
        const PROCEDURE: &str = "get_player_info";
        let rows = self
            .fetch(
                PROCEDURE,
                "SELECT * FROM stew_player_stats.get_player_info($1::uuid);",
                &[uuid],
            )
            .await?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };
        // a composite-returning procedure may answer one all-NULL row
        Ok(Some(PlayerInfoResponse {
            uuid: decode(PROCEDURE, row.try_get::<Option<Uuid>, _>(0))?,
            name: decode(PROCEDURE, row.try_get::<Option<String>, _>(1))?.unwrap_or_default(),
            version: decode(PROCEDURE, row.try_get::<Option<i32>, _>(2))?.unwrap_or_default(),
        }))
    }

    async fn update_player_info(&self, uuid: &str, name: &str, version: &str) -> StoreResult<()> {
        self.execute(
            "update_player_info",
            "SELECT stew_player_stats.update_player_info($1::uuid, $2, $3::integer);",
            &[uuid, name, version],
        )
        .await
    }

    async fn add_ip_info(&self, ip: &str) -> StoreResult<()> {
        self.execute(
            "add_ip_info",
            "SELECT stew_player_stats.add_ip_info($1::inet);",
            &[ip],
        )
        .await
    }

    async fn get_ip_info(&self, ip: &str) -> StoreResult<Vec<IpInfoResponse>> {
        const PROCEDURE: &str = "get_ip_info";
        let rows = self
            .fetch(
                PROCEDURE,
                "SELECT * FROM stew_player_stats.get_ip_info($1::inet);",
                &[ip],
            )
            .await?;

        rows.iter()
            .map(|row| {
                decode(PROCEDURE, row.try_get::<i64, _>(0)).map(|id| IpInfoResponse { id })
            })
            .collect()
    }

    async fn handle_player_login(&self, uuid: &str, ip_id: &str) -> StoreResult<()> {
        self.execute(
            "handle_player_logins",
            "SELECT stew_player_stats.handle_player_logins($1::uuid, $2::bigint);",
            &[uuid, ip_id],
        )
        .await
    }

    async fn get_session_id(&self, uuid: &str) -> StoreResult<Option<SessionIdResponse>> {
        const PROCEDURE: &str = "get_session_id";
        let rows = self
            .fetch(
                PROCEDURE,
                "SELECT * FROM stew_player_stats.get_session_id($1::uuid);",
                &[uuid],
            )
            .await?;

        rows.first()
            .map(|row| decode(PROCEDURE, row.try_get::<i64, _>(0)).map(|id| SessionIdResponse { id }))
            .transpose()
    }

    async fn update_login_session(&self, id: &str) -> StoreResult<()> {
        self.execute(
            "update_login_session",
            "SELECT stew_player_stats.update_login_session($1::bigint);",
            &[id],
        )
        .await
    }
}
