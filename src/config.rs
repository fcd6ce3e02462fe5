use std::{collections::HashMap, env, time::Duration};

use thiserror::Error;

const DB_URL: &str = "DB_URL";
const ADMIN_ID: &str = "ADMIN_ID";
const ROLE_CHAT_ID: &str = "ROLE_CHAT_ID";
const SELECTION_TIMEOUT_SECS: &str = "SELECTION_TIMEOUT_SECS";

const DEFAULT_SELECTION_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is not a valid number: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Settings read once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    /// Telegram user id allowed to do everything.
    pub admin_id: i64,
    /// Members of this chat hold the editor role.
    pub role_chat_id: Option<i64>,
    pub selection_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(env::vars())
    }

    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self, ConfigError> {
        let vars = vars.into_iter().collect::<HashMap<_, _>>();

        let database_url = vars
            .get(DB_URL)
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing(DB_URL))?
            .clone();
        let admin_id = number(&vars, ADMIN_ID)?.ok_or(ConfigError::Missing(ADMIN_ID))?;
        let role_chat_id = number(&vars, ROLE_CHAT_ID)?;
        let selection_timeout = number::<u64>(&vars, SELECTION_TIMEOUT_SECS)?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SELECTION_TIMEOUT);

        Ok(Self {
            database_url,
            admin_id,
            role_chat_id,
            selection_timeout,
        })
    }
}

fn number<T: std::str::FromStr>(
    vars: &HashMap<String, String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match vars.get(name).map(|value| value.trim()) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| ConfigError::Invalid {
            name,
            value: value.to_string(),
        }),
    }
}
