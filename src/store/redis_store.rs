//! Redis backend for [`CachedStore`].

use log::info;
use redis::Commands;

use super::{CachedStore, RemoteBackend, StoreFactory, ThreadStore};
use crate::config::RedisConfig;
use crate::error::{MigrateError, Result};

/// [`RemoteBackend`] over a synchronous Redis connection.
pub struct RedisBackend {
    conn: redis::Connection,
}

impl RedisBackend {
    pub fn new(conn: redis::Connection) -> Self {
        Self { conn }
    }
}

impl RemoteBackend for RedisBackend {
    fn get(&mut self, key: &str) -> Result<Option<String>> {
        self.conn
            .get(key)
            .map_err(|e| MigrateError::backend(format!("fetching {}", key), e))
    }

    fn exists(&mut self, key: &str) -> Result<bool> {
        self.conn
            .exists(key)
            .map_err(|e| MigrateError::backend(format!("checking {}", key), e))
    }

    fn set_many(&mut self, entries: &[(String, String)]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut pipe = redis::pipe();
        for (key, value) in entries {
            pipe.set(key, value).ignore();
        }
        pipe.query::<()>(&mut self.conn)
            .map_err(|e| MigrateError::backend(format!("writing {} threads", entries.len()), e))
    }
}

/// Opens Redis-backed stores from one shared client.
pub struct RedisStoreFactory {
    client: redis::Client,
    endpoint: String,
}

impl RedisStoreFactory {
    /// Connects and pings the server.
    ///
    /// Every failure here is a configuration error: the run has not started
    /// processing channels yet.
    pub fn connect(config: &RedisConfig) -> Result<Self> {
        let info = config.connection_info()?;
        let client = redis::Client::open(info).map_err(|e| {
            MigrateError::invalid_config(format!("invalid redis endpoint '{}': {}", config.endpoint, e))
        })?;

        let mut conn = client.get_connection().map_err(|e| {
            MigrateError::invalid_config(format!("cannot reach redis at '{}': {}", config.endpoint, e))
        })?;
        redis::cmd("PING").query::<String>(&mut conn).map_err(|e| {
            MigrateError::invalid_config(format!("redis at '{}' did not answer PING: {}", config.endpoint, e))
        })?;
        info!("Using redis at {} for thread storage", config.endpoint);

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

impl StoreFactory for RedisStoreFactory {
    fn open(&mut self, channel: &str) -> Result<Box<dyn ThreadStore>> {
        let conn = self
            .client
            .get_connection()
            .map_err(|e| MigrateError::backend(format!("connecting for channel {}", channel), e))?;
        Ok(Box::new(CachedStore::new(RedisBackend::new(conn), channel)))
    }

    fn describe(&self) -> String {
        format!("redis ({})", self.endpoint)
    }
}
