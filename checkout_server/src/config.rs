use std::{env, io::Write};

use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use scs_common::{parse_boolean_flag, Secret};
use serde_json::json;
use stripe_tools::StripeConfig;
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_SCS_HOST: &str = "127.0.0.1";
const DEFAULT_SCS_PORT: u16 = 8360;
const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// Payment gateway settings. Shared with the `stripe_tools` client.
    pub stripe: StripeConfig,
    /// SMTP settings for the payment-succeeded notification hook. `None` disables the hook entirely.
    pub email: Option<EmailConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SCS_HOST.to_string(),
            port: DEFAULT_SCS_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            stripe: StripeConfig::default(),
            email: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SCS_HOST").ok().unwrap_or_else(|| DEFAULT_SCS_HOST.into());
        let port = env::var("SCS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SCS_PORT. {e} Using the default, {DEFAULT_SCS_PORT}, instead."
                    );
                    DEFAULT_SCS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SCS_PORT);
        let database_url = env::var("SCS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SCS_DATABASE_URL is not set. Please set it to the URL for the checkout database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let stripe = StripeConfig::new_from_env_or_default();
        let email = EmailConfig::from_env();
        Self { host, port, database_url, auth, stripe, email }
    }
}

//-------------------------------------------------  AuthConfig  ------------------------------------------------------

/// Access tokens are HS256 JWTs. The secret is shared with the identity collaborator that issues tokens to buyers,
/// so both sides must be configured with the same value of `SCS_JWT_SECRET`.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT signing secret has not been set. I'm using a random value for this session. DO NOT \
             operate on production like this, since no other service will be able to issue valid tokens. 🚨️🚨️🚨️"
        );
        let secret: String = thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect();
        match &mut tmpfile {
            Some((f, p)) => {
                let key_data = json!({ "jwt_secret": secret }).to_string();
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The JWT signing secret for this session was written to {}. If this is a production \
                         instance, you are doing it wrong! Set the SCS_JWT_SECRET environment variable instead. \
                         🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the JWT signing secret to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT signing secret.");
            },
        }
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("SCS_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [SCS_JWT_SECRET]")))?;
        if secret.len() < 32 {
            return Err(ServerError::ConfigurationError(
                "SCS_JWT_SECRET must be at least 32 characters long.".to_string(),
            ));
        }
        Ok(Self { jwt_secret: Secret::new(secret) })
    }
}

//-------------------------------------------------  EmailConfig  -----------------------------------------------------

#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: Secret<String>,
    /// The `From:` address on outgoing notification mail.
    pub from_address: String,
}

impl EmailConfig {
    /// Load the SMTP configuration, or `None` when no host is configured. An unset host is a supported deployment
    /// mode and simply disables the notification hook. `SCS_EMAIL_NOTIFICATIONS=off` disables the hook even when a
    /// relay is configured.
    pub fn from_env() -> Option<Self> {
        if !parse_boolean_flag(env::var("SCS_EMAIL_NOTIFICATIONS").ok(), true) {
            info!("🪛️ SCS_EMAIL_NOTIFICATIONS is off. Payment notification emails are disabled.");
            return None;
        }
        let smtp_host = match env::var("SCS_SMTP_HOST") {
            Ok(host) => host,
            Err(_) => {
                info!("🪛️ SCS_SMTP_HOST is not set. Payment notification emails are disabled.");
                return None;
            },
        };
        let smtp_port = env::var("SCS_SMTP_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(DEFAULT_SMTP_PORT);
        let smtp_username = env::var("SCS_SMTP_USERNAME").ok().unwrap_or_else(|| {
            warn!("🪛️ SCS_SMTP_USERNAME is not set. Trying to connect to the relay without credentials.");
            String::default()
        });
        let smtp_password = Secret::new(env::var("SCS_SMTP_PASSWORD").ok().unwrap_or_default());
        let from_address = env::var("SCS_EMAIL_FROM").ok().unwrap_or_else(|| {
            warn!("🪛️ SCS_EMAIL_FROM is not set. Using no-reply@localhost as the sender address.");
            "no-reply@localhost".to_string()
        });
        Some(Self { smtp_host, smtp_port, smtp_username, smtp_password, from_address })
    }
}
