//! Postgres-backed store on a deadpool connection pool.

use crate::{
    row::EntityRow,
    sql::Statement,
    store::{StoreConn, StoreError, StorePort},
};
use async_trait::async_trait;
use deadpool_postgres::{
    Config, ManagerConfig, Object, Pool, RecyclingMethod, Runtime,
};
use std::env;
use tokio_postgres::{NoTls, types::ToSql};

///
/// PgConfig
///
/// Connection settings, read from the environment with sensible local
/// defaults. The password has no default.
///

#[derive(Clone, Debug)]
pub struct PgConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub pool_size: usize,
}

impl PgConfig {
    /// Read `ACREDB_DB_*` variables, falling back to local defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let var = |name: &str, default: &str| {
            env::var(name).unwrap_or_else(|_| default.to_owned())
        };

        Self {
            host: var("ACREDB_DB_HOST", "localhost"),
            port: var("ACREDB_DB_PORT", "5432").parse().unwrap_or(5432),
            dbname: var("ACREDB_DB_NAME", "acredb"),
            user: var("ACREDB_DB_USER", "postgres"),
            password: var("ACREDB_DB_PASSWORD", ""),
            pool_size: var("ACREDB_DB_POOL_SIZE", "16").parse().unwrap_or(16),
        }
    }
}

///
/// PgStore
///

#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    /// Build the pool. Connections are verified on recycle, not up front;
    /// the first checkout surfaces a bad configuration.
    pub fn connect(config: &PgConfig) -> Result<Self, StoreError> {
        let mut cfg = Config::new();
        cfg.host = Some(config.host.clone());
        cfg.port = Some(config.port);
        cfg.dbname = Some(config.dbname.clone());
        cfg.user = Some(config.user.clone());
        cfg.password = Some(config.password.clone());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        if let Some(pool_cfg) = cfg.pool.as_mut() {
            pool_cfg.max_size = config.pool_size;
        } else {
            cfg.pool = Some(deadpool_postgres::PoolConfig::new(config.pool_size));
        }

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|err| StoreError::pool(err.to_string()))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl StorePort for PgStore {
    async fn connection(&self) -> Result<Box<dyn StoreConn>, StoreError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|err| StoreError::pool(err.to_string()))?;

        Ok(Box::new(PgConn { client }))
    }
}

///
/// PgConn
///

pub struct PgConn {
    client: Object,
}

impl PgConn {
    async fn control(&mut self, sql: &str) -> Result<(), StoreError> {
        self.client
            .batch_execute(sql)
            .await
            .map_err(|err| StoreError::tx(format!("{sql}: {err}")))
    }
}

#[async_trait]
impl StoreConn for PgConn {
    async fn query(&mut self, stmt: &Statement) -> Result<Vec<EntityRow>, StoreError> {
        let params: Vec<&(dyn ToSql + Sync)> = stmt
            .params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect();

        let rows = self
            .client
            .query(stmt.sql.as_str(), &params)
            .await
            .map_err(|err| StoreError::query(err.to_string()))?;

        Ok(rows.iter().map(EntityRow::from_pg).collect())
    }

    async fn execute(&mut self, stmt: &Statement) -> Result<u64, StoreError> {
        let params: Vec<&(dyn ToSql + Sync)> = stmt
            .params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect();

        self.client
            .execute(stmt.sql.as_str(), &params)
            .await
            .map_err(|err| StoreError::query(err.to_string()))
    }

    async fn begin(&mut self) -> Result<(), StoreError> {
        self.control("BEGIN").await
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.control("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.control("ROLLBACK").await
    }
}
