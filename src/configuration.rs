use crate::domain::UserEmail;
use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use sqlx::ConnectOptions;
use std::time::Duration;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub email_client: EmailClientSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub admin: Option<AdminSettings>,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
    pub require_ssl: bool,
}

impl DatabaseSettings {
    pub fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };
        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(self.password.expose_secret())
            .port(self.port)
            .ssl_mode(ssl_mode)
    }

    pub fn with_db(&self) -> PgConnectOptions {
        let mut options = self.without_db().database(&self.database_name);
        options.log_statements(tracing::log::LevelFilter::Trace);
        options
    }
}

/// SMTP relay used for both the feedback inbox and trip forecasts.
#[derive(serde::Deserialize, Clone)]
pub struct EmailClientSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub username: String,
    pub password: Secret<String>,
    pub sender_email: String,
    pub admin_email: String,
    pub require_tls: bool,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl EmailClientSettings {
    pub fn sender(&self) -> Result<UserEmail, String> {
        UserEmail::parse(self.sender_email.clone())
    }

    pub fn admin_recipient(&self) -> Result<UserEmail, String> {
        UserEmail::parse(self.admin_email.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub token_ttl_days: i64,
}

impl JwtSettings {
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.token_ttl_days)
    }

    pub fn ensure_secret(&self) -> Result<(), String> {
        if self.secret.expose_secret().trim().is_empty() {
            return Err("The JWT signing secret must not be empty.".into());
        }
        Ok(())
    }
}

/// Account created with the `admin` role at startup when its email is free.
#[derive(serde::Deserialize, Clone)]
pub struct AdminSettings {
    pub name: String,
    pub email: String,
    pub password: Secret<String>,
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    load_configuration(environment)
}

/// Only `local.yaml` ships a signing secret; elsewhere it must come from
/// `APP_JWT__SECRET`.
pub fn load_configuration(environment: Environment) -> Result<Settings, config::ConfigError> {
    let base_path =
        std::env::current_dir().map_err(|e| config::ConfigError::Foreign(Box::new(e)))?;
    let configuration_directory = base_path.join("configuration");

    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        // E.g. `APP_APPLICATION__PORT=5001` sets `Settings.application.port`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;
    settings
        .jwt
        .ensure_secret()
        .map_err(config::ConfigError::Message)?;
    Ok(settings)
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}
