use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

#[cfg(feature = "logging")]
use tracing_subscriber::filter::LevelFilter;

/// Database configuration.
#[derive(Deserialize)]
pub struct Database {
    /// Database URL string.
    pub url: String,
}

/// Implementation of [`serde`]'s deserializer for [`FromStr`] types.
#[cfg(feature = "logging")]
fn deserialize_from_str<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error,
    D: serde::de::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    std::str::FromStr::from_str(&s).map_err(serde::de::Error::custom)
}

/// Logging configuration.
#[cfg(feature = "logging")]
#[derive(Deserialize)]
pub struct Logging {
    /// Log level.
    #[serde(deserialize_with = "deserialize_from_str")]
    pub level: LevelFilter,
}

#[cfg(feature = "logging")]
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::WARN,
        }
    }
}

/// GitHub API configuration.
#[derive(Deserialize)]
pub struct GitHub {
    /// Base URL of the REST API.
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Token used to authenticate API requests.
    pub token: String,

    /// `User-Agent` header value, which is mandatory for GitHub API requests.
    #[serde(default = "default_github_user_agent")]
    pub user_agent: String,
}

fn default_github_api_url() -> String {
    String::from("https://api.github.com")
}

fn default_github_user_agent() -> String {
    String::from("assignment-repos")
}

/// Search indexing configuration.
#[derive(Deserialize)]
pub struct Search {
    /// Queue indexing requests for a search backend.
    ///
    /// When disabled, index updates are discarded.
    #[serde(default = "default_search_enabled")]
    pub enabled: bool,
}

impl Default for Search {
    fn default() -> Self {
        Self {
            enabled: default_search_enabled(),
        }
    }
}

fn default_search_enabled() -> bool {
    true
}

/// General configuration.
#[derive(Deserialize)]
pub struct Config {
    /// General database configuration.
    pub database: Database,

    /// Logging configuration.
    #[cfg(feature = "logging")]
    #[serde(default)]
    pub logging: Logging,

    /// GitHub API configuration.
    #[serde(default)]
    pub github: Option<GitHub>,

    /// Search indexing configuration.
    #[serde(default)]
    pub search: Search,
}

impl Config {
    /// Create new config using default configuration file or environment variables.
    ///
    /// See [`Env`] for more details on how to use environment variables configuration.
    ///
    /// [`Env`]: figment::providers::Env
    pub fn new(path: Option<PathBuf>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    fn figment(path: Option<PathBuf>) -> Figment {
        Figment::new()
            .merge(Toml::file(path.unwrap_or(PathBuf::from("Config.toml"))))
            .merge(Env::prefixed("CONFIG_").split("_"))
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::Config;

    #[test]
    fn defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "Config.toml",
                r#"
                [database]
                url = "postgres://localhost/classroom"
                "#,
            )?;

            let config = Config::new(None).expect("unable to load config");

            assert_eq!(config.database.url, "postgres://localhost/classroom");
            assert!(config.github.is_none());
            assert!(config.search.enabled);

            Ok(())
        });
    }

    #[test]
    fn github_section() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "Custom.toml",
                r#"
                [database]
                url = "sqlite::memory:"

                [github]
                token = "secret"

                [search]
                enabled = false
                "#,
            )?;

            let config = Config::new(Some("Custom.toml".into())).expect("unable to load config");
            let github = config.github.expect("github section is missing");

            assert_eq!(github.api_url, "https://api.github.com");
            assert_eq!(github.token, "secret");
            assert_eq!(github.user_agent, "assignment-repos");
            assert!(!config.search.enabled);

            Ok(())
        });
    }

    #[test]
    fn environment_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "Config.toml",
                r#"
                [database]
                url = "sqlite::memory:"
                "#,
            )?;

            jail.set_env("CONFIG_DATABASE_URL", "postgres://db/classroom");

            let config = Config::new(None).expect("unable to load config");

            assert_eq!(config.database.url, "postgres://db/classroom");

            Ok(())
        });
    }
}
