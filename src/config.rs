use std::{env, fmt::Display, str::FromStr, time::Duration};

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

/// Administrator account created at startup when absent.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub token_secret: String,
    pub token_ttl: Duration,
    pub client_url: String,
    pub mailbox_capacity: usize,
    pub session_queue_capacity: usize,
    pub trust_client_prices: bool,
    pub payment_key_id: String,
    pub image_max_bytes: usize,
    pub admin: Option<AdminBootstrap>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                warn!("JWT_SECRET not set, using a random per-process secret; tokens will not survive a restart");
                let mut secret = [0u8; 32];
                OsRng.fill_bytes(&mut secret);
                hex::encode(secret)
            }
        };

        let admin = match (lookup("ADMIN_EMAIL"), lookup("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminBootstrap {
                name: lookup("ADMIN_NAME").unwrap_or_else(|| "Admin".to_string()),
                email,
                password,
            }),
            _ => {
                info!("ADMIN_EMAIL/ADMIN_PASSWORD not set, no administrator is bootstrapped");
                None
            }
        };

        Ok(Self {
            port: try_load(&lookup, "PORT", "5000")?,
            token_secret,
            token_ttl: Duration::from_secs(try_load(&lookup, "TOKEN_TTL_SECS", "604800")?),
            client_url: try_load(&lookup, "CLIENT_URL", "http://localhost:5173")?,
            mailbox_capacity: positive(try_load(&lookup, "MAILBOX_CAPACITY", "100")?, "MAILBOX_CAPACITY")?,
            session_queue_capacity: positive(
                try_load(&lookup, "SESSION_QUEUE_CAPACITY", "64")?,
                "SESSION_QUEUE_CAPACITY",
            )?,
            trust_client_prices: try_load(&lookup, "TRUST_CLIENT_PRICES", "true")?,
            payment_key_id: try_load(&lookup, "RAZORPAY_KEY_ID", "rzp_test_demo")?,
            image_max_bytes: try_load(&lookup, "IMAGE_MAX_BYTES", "524288")?,
            admin,
        })
    }
}

fn try_load<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    value.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key: key.to_string(),
            value: value.clone(),
            reason: e.to_string(),
        }
    })
}

fn positive(value: usize, key: &str) -> Result<usize, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            key: key.to_string(),
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.token_ttl, Duration::from_secs(7 * 24 * 60 * 60));
        assert_eq!(config.client_url, "http://localhost:5173");
        assert_eq!(config.mailbox_capacity, 100);
        assert_eq!(config.session_queue_capacity, 64);
        assert!(config.trust_client_prices);
        assert_eq!(config.payment_key_id, "rzp_test_demo");
        assert!(config.admin.is_none());
        assert_eq!(config.token_secret.len(), 64);
        assert!(config.token_secret.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_overrides_and_admin_bootstrap() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("JWT_SECRET", "topsecret"),
            ("TRUST_CLIENT_PRICES", "false"),
            ("ADMIN_EMAIL", "owner@example.com"),
            ("ADMIN_PASSWORD", "adminpass"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.token_secret, "topsecret");
        assert!(!config.trust_client_prices);
        let admin = config.admin.unwrap();
        assert_eq!(admin.name, "Admin");
        assert_eq!(admin.email, "owner@example.com");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Config::from_lookup(lookup(&[("PORT", "not-a-port")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "PORT"));

        let err = Config::from_lookup(lookup(&[("MAILBOX_CAPACITY", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "MAILBOX_CAPACITY"));
    }
}
