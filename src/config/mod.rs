//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    num::{NonZeroU32, NonZeroU64},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

mod cli;

pub use cli::*;

use crate::application::context::{
    DEFAULT_IMAGE_BUCKET, DEFAULT_MAX_IMAGE_BYTES, DEFAULT_PAGE_SIZE,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "vitamins";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_STATE_DIR: &str = ".vitamins";
const MAX_PAGE_SIZE: u32 = 100;

/// Fully-resolved client settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub backend: BackendSettings,
    pub storage: StorageSettings,
    pub listing: ListingSettings,
    pub client: ClientSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct BackendSettings {
    /// Base URL of the hosted backend. Commands that only work locally run without it.
    pub url: Option<Url>,
    pub anon_key: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub bucket: String,
    pub max_image_bytes: NonZeroU64,
}

#[derive(Debug, Clone)]
pub struct ListingSettings {
    pub page_size: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub state_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("VITAMINS").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    backend: RawBackendSettings,
    storage: RawStorageSettings,
    listing: RawListingSettings,
    client: RawClientSettings,
    logging: RawLoggingSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &ClientOverrides) {
        if let Some(url) = overrides.backend_url.as_ref() {
            self.backend.url = Some(url.clone());
        }
        if let Some(key) = overrides.anon_key.as_ref() {
            self.backend.anon_key = Some(key.clone());
        }
        if let Some(dir) = overrides.state_dir.as_ref() {
            self.client.state_dir = Some(dir.clone());
        }
        if let Some(size) = overrides.page_size {
            self.listing.page_size = Some(size.into());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            backend,
            storage,
            listing,
            client,
            logging,
        } = raw;

        Ok(Self {
            backend: build_backend_settings(backend)?,
            storage: build_storage_settings(storage)?,
            listing: build_listing_settings(listing)?,
            client: build_client_settings(client)?,
            logging: build_logging_settings(logging)?,
        })
    }
}

fn build_backend_settings(backend: RawBackendSettings) -> Result<BackendSettings, LoadError> {
    let url = match non_blank(backend.url) {
        Some(value) => {
            let parsed = Url::parse(&value)
                .map_err(|err| LoadError::invalid("backend.url", format!("{err}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(LoadError::invalid(
                    "backend.url",
                    "scheme must be http or https",
                ));
            }
            Some(parsed)
        }
        None => None,
    };

    let timeout_secs = backend.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "backend.timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(BackendSettings {
        url,
        anon_key: non_blank(backend.anon_key),
        timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_storage_settings(storage: RawStorageSettings) -> Result<StorageSettings, LoadError> {
    let bucket = non_blank(storage.bucket).unwrap_or_else(|| DEFAULT_IMAGE_BUCKET.to_string());
    if bucket.contains('/') {
        return Err(LoadError::invalid(
            "storage.bucket",
            "bucket name must not contain `/`",
        ));
    }

    let max_bytes = storage.max_image_bytes.unwrap_or(DEFAULT_MAX_IMAGE_BYTES);
    let max_image_bytes = NonZeroU64::new(max_bytes)
        .ok_or_else(|| LoadError::invalid("storage.max_image_bytes", "must be greater than zero"))?;

    Ok(StorageSettings {
        bucket,
        max_image_bytes,
    })
}

fn build_listing_settings(listing: RawListingSettings) -> Result<ListingSettings, LoadError> {
    let page_size = non_zero_u32(
        listing.page_size.unwrap_or(DEFAULT_PAGE_SIZE.into()),
        "listing.page_size",
    )?;
    if page_size.get() > MAX_PAGE_SIZE {
        return Err(LoadError::invalid(
            "listing.page_size",
            format!("must not exceed {MAX_PAGE_SIZE}"),
        ));
    }

    Ok(ListingSettings { page_size })
}

fn build_client_settings(client: RawClientSettings) -> Result<ClientSettings, LoadError> {
    let state_dir = client
        .state_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));
    if state_dir.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "client.state_dir",
            "path must not be empty",
        ));
    }

    Ok(ClientSettings { state_dir })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawBackendSettings {
    url: Option<String>,
    anon_key: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStorageSettings {
    bucket: Option<String>,
    max_image_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawListingSettings {
    page_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawClientSettings {
    state_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests;
