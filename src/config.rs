use anyhow::{bail, Context};

use crate::cars::services::StatusPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub database: Option<DatabaseConfig>,
    pub cors_allowed_origins: Vec<String>,
    pub status_policy: StatusPolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match lookup("APP_PORT") {
            Some(v) => v.parse::<u16>().context("APP_PORT must be a port number")?,
            None => 5000,
        };

        let storage = match lookup("STORAGE_BACKEND").as_deref().map(str::trim) {
            None | Some("") | Some("postgres") => StorageBackend::Postgres,
            Some("memory") => StorageBackend::Memory,
            Some(other) => bail!("unknown STORAGE_BACKEND '{other}'"),
        };

        let database = match storage {
            StorageBackend::Postgres => {
                let url = lookup("DATABASE_URL").context("DATABASE_URL is required")?;
                let max_connections = lookup("DB_MAX_CONNECTIONS")
                    .and_then(|v| v.parse::<u32>().ok())
                    .unwrap_or(10);
                Some(DatabaseConfig {
                    url,
                    max_connections,
                })
            }
            StorageBackend::Memory => None,
        };

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let status_policy = match lookup("CAR_STATUS_POLICY").as_deref().map(str::trim) {
            None | Some("") | Some("permissive") => StatusPolicy::Permissive,
            Some("strict") => StatusPolicy::Strict,
            Some(other) => bail!("unknown CAR_STATUS_POLICY '{other}'"),
        };

        Ok(Self {
            host,
            port,
            storage,
            database,
            cors_allowed_origins,
            status_policy,
        })
    }

    /// Settings for tests and local runs without a database.
    pub fn in_memory() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            storage: StorageBackend::Memory,
            database: None,
            cors_allowed_origins: Vec::new(),
            status_policy: StatusPolicy::Permissive,
        }
    }
}
