use std::env;
use std::time::Duration;

use thiserror::Error;

/// Default base URL of the remote product API.
pub const DEFAULT_PRODUCT_API_URL: &str = "https://aladin-chat-server.onrender.com";

/// Minimum `SECRET_KEY` length accepted by the cookie signing key.
pub const MIN_SECRET_LEN: usize = 64;

/// Upload preset configured for catalog images.
pub const DEFAULT_UPLOAD_PRESET: &str = "art_img";

/// Errors raised while reading the server configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),
    #[error("{name} has invalid value `{value}`")]
    Invalid { name: &'static str, value: String },
}

/// Settings shared by the server and its routes.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    /// Secret used to sign session and flash cookies; random when absent.
    pub secret: Option<String>,
    /// Cookie domain; host-only cookies when absent.
    pub domain: Option<String>,
    pub product_api_url: String,
    pub product_api_timeout: Duration,
    pub cloudinary_cloud_name: String,
    pub cloudinary_upload_preset: String,
    /// Console sessions untouched for this long are dropped.
    pub session_idle_timeout: Duration,
}

impl ServerConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read the configuration through `lookup`, which returns a variable's value when set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: value.clone(),
            })?,
            None => 8080,
        };

        let product_api_timeout = match lookup("PRODUCT_API_TIMEOUT_SECS") {
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "PRODUCT_API_TIMEOUT_SECS",
                        value,
                    });
                }
            },
            None => Duration::from_secs(15),
        };

        let session_idle_timeout = match lookup("SESSION_IDLE_MINUTES") {
            Some(value) => match value.parse::<u64>() {
                Ok(minutes) if minutes > 0 => Duration::from_secs(minutes * 60),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "SESSION_IDLE_MINUTES",
                        value,
                    });
                }
            },
            None => Duration::from_secs(30 * 60),
        };

        let secret = lookup("SECRET_KEY").filter(|value| !value.is_empty());
        if let Some(len) = secret.as_ref().map(String::len).filter(|len| *len < MIN_SECRET_LEN) {
            return Err(ConfigError::Invalid {
                name: "SECRET_KEY",
                value: format!("{len} bytes, need at least {MIN_SECRET_LEN}"),
            });
        }

        let cloudinary_cloud_name = lookup("CLOUDINARY_CLOUD_NAME")
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::Missing("CLOUDINARY_CLOUD_NAME"))?;

        Ok(Self {
            address: lookup("ADDRESS").unwrap_or("127.0.0.1".to_string()),
            port,
            secret,
            domain: lookup("DOMAIN").filter(|value| !value.trim().is_empty()),
            product_api_url: lookup("PRODUCT_API_URL")
                .unwrap_or(DEFAULT_PRODUCT_API_URL.to_string()),
            product_api_timeout,
            cloudinary_cloud_name,
            cloudinary_upload_preset: lookup("CLOUDINARY_UPLOAD_PRESET")
                .unwrap_or(DEFAULT_UPLOAD_PRESET.to_string()),
            session_idle_timeout,
        })
    }
}
