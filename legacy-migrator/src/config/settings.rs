//! Settings read from the environment.
use legacy_migrator_pipeline::embeddings::{EmbeddingConfig, DEFAULT_EMBEDDING_MODEL};
use legacy_migrator_pipeline::loader::{LoaderConfig, RetryConfig};
use legacy_migrator_pipeline::orchestrator::{MigrationConfig, PhaseSwitches, DEFAULT_STATUS_ID};
use sqlx::postgres::PgConnectOptions;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::ConfigError;

const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_EMBEDDINGS_BATCH_DELAY_MS: u64 = 1_000;

/// Where one of the two databases lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseSettings {
    Url {
        url: String,
        max_connections: u32,
    },
    Parts {
        host: String,
        port: u16,
        user: String,
        password: Option<String>,
        name: String,
        max_connections: u32,
    },
}

impl DatabaseSettings {
    /// Reads `<PREFIX>_DATABASE_URL`, or falls back to
    /// `<PREFIX>_DB_HOST`, `_PORT`, `_USER`, `_PASSWORD` and `_NAME`.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let max_connections = parse_or(
            &format!("{prefix}_MAX_CONNECTIONS"),
            DEFAULT_MAX_CONNECTIONS,
        )?;
        if max_connections == 0 {
            return Err(ConfigError::invalid(
                format!("{prefix}_MAX_CONNECTIONS"),
                "0",
                "must be at least 1",
            ));
        }

        if let Some(url) = var(&format!("{prefix}_DATABASE_URL")) {
            return Ok(Self::Url {
                url,
                max_connections,
            });
        }

        Ok(Self::Parts {
            host: required(&format!("{prefix}_DB_HOST"))?,
            port: parse_or(&format!("{prefix}_DB_PORT"), DEFAULT_DB_PORT)?,
            user: required(&format!("{prefix}_DB_USER"))?,
            password: var(&format!("{prefix}_DB_PASSWORD")),
            name: required(&format!("{prefix}_DB_NAME"))?,
            max_connections,
        })
    }

    pub fn max_connections(&self) -> u32 {
        match self {
            Self::Url {
                max_connections, ..
            }
            | Self::Parts {
                max_connections, ..
            } => *max_connections,
        }
    }

    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        match self {
            Self::Url { url, .. } => PgConnectOptions::from_str(url)
                .map_err(|e| ConfigError::invalid("database url", redact(url), e)),
            Self::Parts {
                host,
                port,
                user,
                password,
                name,
                ..
            } => {
                let options = PgConnectOptions::new()
                    .host(host)
                    .port(*port)
                    .username(user)
                    .database(name);
                Ok(match password {
                    Some(password) => options.password(password),
                    None => options,
                })
            }
        }
    }

    /// Host and database name, safe to log.
    pub fn describe(&self) -> String {
        match self {
            Self::Url { url, .. } => redact(url),
            Self::Parts {
                host, port, name, ..
            } => format!("{host}:{port}/{name}"),
        }
    }
}

/// Everything the binary needs to run one migration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub legacy: DatabaseSettings,
    pub target: DatabaseSettings,
    pub migration: MigrationConfig,
    /// `None` when `EMBEDDINGS_API_URL` is unset or the phase is skipped.
    pub embeddings: Option<EmbeddingConfig>,
}

impl Settings {
    /// Reads all settings from the environment.
    ///
    /// # Environment Variables
    ///
    /// - `LEGACY_DATABASE_URL` or `LEGACY_DB_*`: legacy database (required)
    /// - `TARGET_DATABASE_URL` or `TARGET_DB_*`: target database (required)
    /// - `LEGACY_MAX_CONNECTIONS`, `TARGET_MAX_CONNECTIONS`: pool sizes (default: 5)
    /// - `MIGRATION_BATCH_SIZE`: rows per upsert (default: 100)
    /// - `MIGRATION_CONFLICT`: `overwrite` or `skip` (default: overwrite)
    /// - `MIGRATION_MISSING_REFERENCE`: `reject` or `nullify` (default: reject)
    /// - `MIGRATION_MAX_RETRIES`: retries per batch (default: 3)
    /// - `MIGRATION_RETRY_BASE_MS`, `MIGRATION_RETRY_MAX_DELAY_MS`: backoff (default: 200, 5000)
    /// - `MIGRATION_PROJECT_MAPPING`: `split` or `cases_only` (default: split)
    /// - `MIGRATION_STATUS_ID`: key of the status row (default: legacy_migration)
    /// - `SKIP_<PHASE>`: disables a phase
    /// - `EMBEDDINGS_API_URL`, `EMBEDDINGS_API_KEY`, `EMBEDDINGS_MODEL`,
    ///   `EMBEDDINGS_BATCH_DELAY_MS`: embedding side path
    pub fn from_env() -> Result<Self, ConfigError> {
        let legacy = DatabaseSettings::from_env("LEGACY")?;
        let target = DatabaseSettings::from_env("TARGET")?;
        let migration = migration_config()?;

        let embeddings = match var("EMBEDDINGS_API_URL") {
            Some(url) if migration.phases.embeddings => Some(EmbeddingConfig {
                api_url: url,
                api_key: var("EMBEDDINGS_API_KEY"),
                model: var("EMBEDDINGS_MODEL")
                    .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
                batch_size: migration.loader.batch_size,
                batch_delay: Duration::from_millis(parse_or(
                    "EMBEDDINGS_BATCH_DELAY_MS",
                    DEFAULT_EMBEDDINGS_BATCH_DELAY_MS,
                )?),
            }),
            _ => None,
        };

        Ok(Self {
            legacy,
            target,
            migration,
            embeddings,
        })
    }
}

fn migration_config() -> Result<MigrationConfig, ConfigError> {
    let defaults = LoaderConfig::default();
    let batch_size = parse_or("MIGRATION_BATCH_SIZE", defaults.batch_size)?;
    if batch_size == 0 {
        return Err(ConfigError::invalid(
            "MIGRATION_BATCH_SIZE",
            "0",
            "must be at least 1",
        ));
    }

    let retry = RetryConfig {
        max_retries: parse_or("MIGRATION_MAX_RETRIES", defaults.retry.max_retries)?,
        base_delay_ms: parse_or("MIGRATION_RETRY_BASE_MS", defaults.retry.base_delay_ms)?,
        max_delay_ms: parse_or("MIGRATION_RETRY_MAX_DELAY_MS", defaults.retry.max_delay_ms)?,
    };

    let phases = PhaseSwitches {
        practices: !flag("SKIP_PRACTICES")?,
        profiles: !flag("SKIP_PROFILES")?,
        practice_members: !flag("SKIP_PRACTICE_MEMBERS")?,
        patients: !flag("SKIP_PATIENTS")?,
        cases: !flag("SKIP_CASES")?,
        case_files: !flag("SKIP_CASE_FILES")?,
        embeddings: !flag("SKIP_EMBEDDINGS")?,
    };

    Ok(MigrationConfig {
        loader: LoaderConfig {
            batch_size,
            conflict_policy: parse_or("MIGRATION_CONFLICT", defaults.conflict_policy)?,
            retry,
        },
        missing_reference: parse_or("MIGRATION_MISSING_REFERENCE", Default::default())?,
        project_mapping: parse_or("MIGRATION_PROJECT_MAPPING", Default::default())?,
        phases,
        status_id: var("MIGRATION_STATUS_ID").unwrap_or_else(|| DEFAULT_STATUS_ID.to_string()),
    })
}

/// Non-empty value of `name`.
fn var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(name: &str) -> Result<String, ConfigError> {
    var(name).ok_or_else(|| ConfigError::missing(name))
}

fn parse_or<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    match var(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(name, raw, e)),
        None => Ok(default),
    }
}

/// `1`, `true`, `yes` and `on` enable a switch; `0`, `false`, `no` and `off` disable it.
fn flag(name: &str) -> Result<bool, ConfigError> {
    let Some(raw) = var(name) else {
        return Ok(false);
    };
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(name, raw, "expected a boolean")),
    }
}

/// Drops the password from a connection URL.
fn redact(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.rsplit_once('@') {
        Some((credentials, host)) => {
            let user = credentials.split(':').next().unwrap_or_default();
            format!("{scheme}://{user}:***@{host}")
        }
        None => url.to_string(),
    }
}
