use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub integration_rps: u32,
    pub public_rps: u32,
    pub bot_tick_seconds: u64,
    pub bot_batch_size: i64,
    pub bot_pacing_ms: u64,
    pub audit_metadata_max_bytes: usize,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            integration_rps: get_env_parse_or("INTEGRATION_RPS", 50)?,
            public_rps: get_env_parse_or("PUBLIC_RPS", 20)?,
            bot_tick_seconds: get_env_parse_or("BOT_TICK_SECONDS", 30)?,
            bot_batch_size: get_env_parse_or("BOT_BATCH_SIZE", 5)?,
            bot_pacing_ms: get_env_parse_or("BOT_PACING_MS", 500)?,
            audit_metadata_max_bytes: get_env_parse_or("AUDIT_METADATA_MAX_BYTES", 4096)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
