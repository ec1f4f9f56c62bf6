use std::time::Duration;

use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

const DEFAULT_DATABASE: &str = "scorecard";
const APP_NAME: &str = "scorecard-back";
/// Health pings from the storage supervisor must fail fast on an outage.
const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings of the MongoDB tournament store.
#[derive(Clone)]
pub struct MongoConfig {
    pub options: ClientOptions,
    pub database_name: String,
}

impl MongoConfig {
    /// Parse a connection string; `database` falls back to `scorecard` when
    /// absent or blank. Settings given in the URI take precedence.
    pub async fn from_uri(uri: &str, database: Option<&str>) -> MongoResult<Self> {
        let mut options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;
        if options.app_name.is_none() {
            options.app_name = Some(APP_NAME.to_owned());
        }
        if options.server_selection_timeout.is_none() {
            options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);
        }

        let database_name = database
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_DATABASE)
            .to_owned();

        Ok(Self {
            options,
            database_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn defaults_fill_in_what_the_uri_leaves_out() {
        let config = MongoConfig::from_uri("mongodb://localhost:27017", Some("  "))
            .await
            .unwrap();
        assert_eq!(config.database_name, "scorecard");
        assert_eq!(config.options.app_name.as_deref(), Some("scorecard-back"));
        assert_eq!(
            config.options.server_selection_timeout,
            Some(Duration::from_secs(5))
        );
    }

    #[tokio::test]
    async fn uri_settings_win_over_defaults() {
        let config = MongoConfig::from_uri(
            "mongodb://localhost:27017/?appName=kiosk&serverSelectionTimeoutMS=750",
            Some("league"),
        )
        .await
        .unwrap();
        assert_eq!(config.database_name, "league");
        assert_eq!(config.options.app_name.as_deref(), Some("kiosk"));
        assert_eq!(
            config.options.server_selection_timeout,
            Some(Duration::from_millis(750))
        );
    }

    #[tokio::test]
    async fn malformed_uri_is_reported() {
        assert!(matches!(
            MongoConfig::from_uri("postgres://nope", None).await,
            Err(MongoDaoError::InvalidUri { .. })
        ));
    }
}
