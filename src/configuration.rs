use std::env;
use std::env::current_dir;
use std::fmt::Display;
use std::time::Duration;

use anyhow::Context;
use config::Config;
use config::ConfigError;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::postgres::PgConnectOptions;
use sqlx::postgres::PgPoolOptions;

use crate::email_client::EmailClient;
use crate::release::ReleaseConfig;
use crate::waitlist_store::RestStore;
use crate::waitlist_store::WaitlistStore;

/// Global configuration, loaded from `configuration/*.yaml` and `APP_*` env
/// vars. See `get_configuration`.
#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub release: ReleaseConfig,
    pub waitlist: WaitlistSettings,
    pub support_email: SupportEmailSettings,
}

/// Server configuration
#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    /// Should be localhost on dev machine, 0.0.0.0 on prod
    pub host: String,

    /// Port 0 lets the OS pick one (used by the test suite)
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Rest,
    Postgres,
}

/// Where waitlist signups are persisted. Only the section matching `backend`
/// needs to be present.
#[derive(Deserialize, Clone)]
pub struct WaitlistSettings {
    pub backend: StoreBackend,
    pub rest: Option<RestStoreSettings>,
    pub database: Option<DatabaseSettings>,
}

impl WaitlistSettings {
    pub fn store(&self) -> Result<WaitlistStore, anyhow::Error> {
        match self.backend {
            StoreBackend::Rest => {
                let rest = self
                    .rest
                    .clone()
                    .context("waitlist.backend is `rest` but waitlist.rest is missing")?;
                Ok(WaitlistStore::Rest(rest.client()?))
            }
            StoreBackend::Postgres => {
                let db = self
                    .database
                    .as_ref()
                    .context("waitlist.backend is `postgres` but waitlist.database is missing")?;
                Ok(WaitlistStore::Postgres(
                    PgPoolOptions::new().connect_lazy_with(db.connection()),
                ))
            }
        }
    }
}

/// Hosted database exposing a PostgREST-style API
#[derive(Deserialize, Clone)]
pub struct RestStoreSettings {
    pub base_url: String,
    /// Public ("anon") key; sent both as `apikey` and as a bearer token
    pub anon_key: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl RestStoreSettings {
    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    pub fn client(self) -> Result<RestStore, anyhow::Error> {
        let timeout = self.timeout();
        RestStore::new(self.base_url, self.anon_key, timeout)
    }
}

/// Database configuration
#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: Secret<String>,
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub database_name: String,

    /// Should be `true` in production.
    /// https://www.postgresql.org/docs/current/libpq-ssl.html#LIBPQ-SSL-SSLMODE-STATEMENTS
    pub require_ssl: bool,
}

impl DatabaseSettings {
    /// Return connection to a named database (declared in config file). The db
    /// password is concealed.
    pub fn connection(&self) -> PgConnectOptions {
        self.connection_without_db().database(&self.database_name)
    }

    /// Return connection to the Postgres instance (instead of a specific db),
    /// i.e. `database_name` is unset. This is typically used to init a
    /// randomised db for testing.
    pub fn connection_without_db(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .username(&self.username)
            .password(self.password.expose_secret())
            .host(&self.host)
            .port(self.port)
            .ssl_mode(match self.require_ssl {
                true => sqlx::postgres::PgSslMode::Require,
                false => sqlx::postgres::PgSslMode::Prefer,
            })
    }
}

/// Transactional email API used to relay support requests.
#[derive(Deserialize, Clone)]
pub struct SupportEmailSettings {
    pub base_url: String,
    /// Display-name form is allowed, e.g. `Support <help@example.com>`
    pub sender: String,
    /// Where support requests are delivered
    pub inbox: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
    /// Left unset outside production; requests are then only logged.
    #[serde(default)]
    pub api_key: Option<Secret<String>>,
}

impl SupportEmailSettings {
    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    /// `None` when no API key is configured (an empty key counts as none).
    pub fn client(self) -> Result<Option<EmailClient>, anyhow::Error> {
        let timeout = self.timeout();
        let Some(api_key) = self
            .api_key
            .filter(|key| !key.expose_secret().trim().is_empty())
        else {
            return Ok(None);
        };
        let client = EmailClient::new(self.base_url, self.sender, self.inbox, api_key, timeout)?;
        Ok(Some(client))
    }
}

#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Display for Environment {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Environment::Local => "local",
                Environment::Production => "production",
            }
        )?;
        Ok(())
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            e => Err(format!("Invalid environment: {e} (use `local` or `production`)")),
        }
    }
}

/// Load yaml configuration files at `<project_root>/configuration`, then
/// override with `APP_`-prefixed env vars.
///
/// ```sh
///     APP_APPLICATION__PORT=5001
///     APP_WAITLIST__REST__ANON_KEY=...
///     APP_SUPPORT_EMAIL__API_KEY=...
/// ```
///
/// Missing required fields fail immediately, and the server will not start.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let cfg_dir = current_dir()
        .map_err(|e| ConfigError::Foreign(Box::new(e)))?
        .join("configuration");

    let env: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or("local".to_string())
        .try_into()
        .map_err(ConfigError::Message)?;

    let settings = Config::builder()
        .add_source(config::File::from(cfg_dir.join("base.yaml")))
        .add_source(config::File::from(cfg_dir.join(format!("{env}.yaml"))))
        .add_source(
            // env vars are -always- parsed as String, `serde-aux` is required to parse other
            // types
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
