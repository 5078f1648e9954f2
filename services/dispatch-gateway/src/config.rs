use std::env;

use anyhow::Context;
use lifelink_core::DispatchConfig;

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub api_key: String,
    pub journal_path: String,
    pub dispatch: DispatchConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = env::var("LIFELINK_API_KEY").context("LIFELINK_API_KEY must be set")?;
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);
        let journal_path = env::var("LIFELINK_JOURNAL_PATH")
            .unwrap_or_else(|_| "lifelink-journal.db".to_string());

        let dispatch = match env::var("LIFELINK_CONFIG") {
            Ok(path) => DispatchConfig::from_file(&path)
                .with_context(|| format!("loading dispatch config from {path}"))?,
            Err(_) => DispatchConfig::default_config(),
        };

        Ok(Config {
            port,
            api_key,
            journal_path,
            dispatch,
        })
    }
}
