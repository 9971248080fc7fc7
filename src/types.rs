use crate::modules::dish::repository::{DishStore, MemoryDishStore, PgDishStore};
pub use crate::utils::database;
use async_trait::async_trait;
use std::env;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub enum AppEnvironment {
    Production,
    Development,
}

impl AppEnvironment {
    pub fn from(raw_environment: String) -> Self {
        match raw_environment.as_str() {
            "production" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
        }
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub host: String,
    pub environment: AppEnvironment,
    pub port: u16,
    pub url: String,
}

#[derive(Clone)]
pub struct Context {
    pub app: AppContext,
    pub dishes: Arc<dyn DishStore>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DatabaseConfig {
    /// Dishes are kept in memory when unset.
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub environment: AppEnvironment,
    pub port: u16,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub database: DatabaseConfig,
    pub app: AppConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid PORT number `{0}`")]
    InvalidPort(String),
    #[error("invalid DATABASE_MAX_CONNECTIONS `{0}`")]
    InvalidMaxConnections(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("failed to connect to the database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidMaxConnections(raw))?,
            None => 4,
        };
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let environment = lookup("APP_ENV").unwrap_or_default();
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => 8000,
        };
        let url = lookup("URL").unwrap_or_else(|| format!("http://{}:{}", host, port));

        Ok(Self {
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            app: AppConfig {
                host,
                environment: AppEnvironment::from(environment),
                port,
                url,
            },
        })
    }
}

#[async_trait]
pub trait ToContext {
    async fn to_context(self) -> Result<Context, ContextError>;
}

#[async_trait]
impl ToContext for Config {
    async fn to_context(self) -> Result<Context, ContextError> {
        let dishes: Arc<dyn DishStore> = match self.database.url {
            Some(url) => {
                let db_conn = database::connect(&url, self.database.max_connections).await?;
                database::migrate(&db_conn).await?;
                Arc::new(PgDishStore::new(db_conn.pool))
            }
            None => {
                tracing::warn!("DATABASE_URL not set, dishes will be kept in memory");
                Arc::new(MemoryDishStore::default())
            }
        };

        Ok(Context {
            app: AppContext {
                host: self.app.host,
                environment: self.app.environment,
                port: self.app.port,
                url: self.app.url,
            },
            dishes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();

        assert_eq!(config.database.url, None);
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.app.host, "0.0.0.0");
        assert_eq!(config.app.port, 8000);
        assert_eq!(config.app.url, "http://0.0.0.0:8000");
        assert_eq!(config.app.environment, AppEnvironment::Development);
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("DATABASE_URL", "postgres://localhost/divoora"),
            ("PORT", "3000"),
            ("APP_ENV", "production"),
        ])
        .unwrap();

        assert_eq!(
            config.database.url.as_deref(),
            Some("postgres://localhost/divoora")
        );
        assert_eq!(config.app.url, "http://0.0.0.0:3000");
        assert_eq!(config.app.environment, AppEnvironment::Production);
        assert_eq!(config.app.environment.as_str(), "production");
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(matches!(
            config(&[("PORT", "eighty")]),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            config(&[("DATABASE_MAX_CONNECTIONS", "-1")]),
            Err(ConfigError::InvalidMaxConnections(_))
        ));
    }

    #[tokio::test]
    async fn memory_store_without_database_url() {
        let ctx = config(&[]).unwrap().to_context().await.unwrap();

        assert_eq!(ctx.app.port, 8000);
        assert_eq!(
            ctx.dishes
                .count(&crate::utils::filter::Where::default())
                .await
                .unwrap(),
            0
        );
    }
}
