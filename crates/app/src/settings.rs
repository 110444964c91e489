//! Handles settings for the application. Configuration is written in
//! `settings.toml`; every section is optional and falls back to the
//! defaults below.

use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
    /// When set, run the scripted walkthrough against an in-process
    /// server instead of serving forever.
    #[serde(default)]
    pub demo: bool,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .set_default("app.level", "info")?
            .set_default("demo", true)?
            .build()?;

        settings.try_deserialize()
    }
}
