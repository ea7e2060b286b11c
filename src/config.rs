use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// Directory backing the local object storage
    pub media_root: PathBuf,
    /// Public URL prefix under which stored media is served
    pub media_base_url: String,
    pub session_ttl_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            media_root: env::var("MEDIA_ROOT")
                .unwrap_or_else(|_| "./media".to_string())
                .into(),
            media_base_url: env::var("MEDIA_BASE_URL")
                .unwrap_or_else(|_| "/media".to_string())
                .trim_end_matches('/')
                .to_string(),
            session_ttl_seconds: env::var("SESSION_TTL_SECONDS")
                .unwrap_or_else(|_| "604800".to_string())
                .parse()
                .context("SESSION_TTL_SECONDS must be a number of seconds")?,
        })
    }
}
