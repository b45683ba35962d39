//! Portal configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPFLOOR_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `SHOPFLOOR_BASE_URL` - Public URL of the portal
//! - `SHOPFLOOR_ADMIN_PHONE` - Phone number that, with the admin name, signs in as admin
//! - `SHOPFLOOR_ADMIN_EMAIL` - Email accepted by the admin login page
//!
//! ## Optional
//! - `SHOPFLOOR_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOPFLOOR_PORT` - Listen port (default: 3000)
//! - `SHOPFLOOR_ADMIN_NAME` - Display name of the admin identity (default: Admin)
//! - `SHOPFLOOR_LABEL_LOOKUP_URL` - Base of the product URL encoded on labels
//!   (default: <https://example.com/product>)
//! - `SHOPFLOOR_IMAGE_FETCH_TIMEOUT_SECS` - Per-image timeout for catalog uploads (default: 15)
//! - `SHOPFLOOR_BILL_DISCOUNT_PERCENT` - Discount applied on printed bills (default: 5)
//! - `SHOPFLOOR_STORE_NAME`, `SHOPFLOOR_STORE_ADDRESS`, `SHOPFLOOR_STORE_PHONE`,
//!   `SHOPFLOOR_STORE_VAT` - Receipt header
//! - `SHOPFLOOR_LOG_JSON` - Emit JSON logs when set
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! ## Optional (TLS)
//! - `SHOPFLOOR_TLS_CERT` - PEM-encoded certificate chain
//! - `SHOPFLOOR_TLS_KEY` - PEM-encoded private key

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use shopfloor_core::Email;

const DEFAULT_LOOKUP_URL: &str = "https://example.com/product";
const DEFAULT_DISCOUNT_PERCENT: &str = "5";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Portal application configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the portal
    pub base_url: String,
    /// The identity that the gate treats as store staff
    pub admin: AdminIdentityConfig,
    /// Label and bill printing settings
    pub print: PrintConfig,
    /// Catalog upload settings
    pub catalog: CatalogConfig,
    /// Emit JSON logs instead of text
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Administrator identity checked by the identity gate.
///
/// Implements `Debug` manually to redact the phone number.
#[derive(Clone)]
pub struct AdminIdentityConfig {
    /// Display name submitted on the customer sign-up form
    pub name: String,
    /// Phone number submitted alongside the name
    pub phone: SecretString,
    /// Email accepted by the admin login page
    pub email: Email,
}

impl std::fmt::Debug for AdminIdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminIdentityConfig")
            .field("name", &self.name)
            .field("phone", &"[REDACTED]")
            .field("email", &self.email)
            .finish()
    }
}

/// Print output settings.
#[derive(Debug, Clone)]
pub struct PrintConfig {
    /// Base URL for per-product lookup links encoded on labels
    pub label_lookup_url: Url,
    /// Percentage discount applied on bills
    pub bill_discount_percent: Decimal,
    /// Receipt header
    pub store: StoreInfo,
}

/// Store details printed at the top of a receipt.
#[derive(Debug, Clone)]
pub struct StoreInfo {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub vat_number: String,
}

/// Catalog upload settings.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Timeout for fetching one product image
    pub image_fetch_timeout: Duration,
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("SHOPFLOOR_TLS_CERT");
        let key_pem = get_optional_env("SHOPFLOOR_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "SHOPFLOOR_TLS_*".to_string(),
                "Both SHOPFLOOR_TLS_CERT and SHOPFLOOR_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl PortalConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("SHOPFLOOR_DATABASE_URL")?;
        let host = parse_env("SHOPFLOOR_HOST", "127.0.0.1")?;
        let port = parse_env("SHOPFLOOR_PORT", "3000")?;
        let base_url = get_required_env("SHOPFLOOR_BASE_URL")?;

        let admin = AdminIdentityConfig::from_env()?;
        let print = PrintConfig::from_env()?;
        let catalog = CatalogConfig {
            image_fetch_timeout: Duration::from_secs(parse_env(
                "SHOPFLOOR_IMAGE_FETCH_TIMEOUT_SECS",
                "15",
            )?),
        };

        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.0);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            admin,
            print,
            catalog,
            log_json: get_optional_env("SHOPFLOOR_LOG_JSON").is_some(),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls: TlsConfig::from_env()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the portal is served over HTTPS (secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl AdminIdentityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let email_raw = get_required_env("SHOPFLOOR_ADMIN_EMAIL")?;
        let email = Email::parse(&email_raw).map_err(|e| {
            ConfigError::InvalidEnvVar("SHOPFLOOR_ADMIN_EMAIL".to_string(), e.to_string())
        })?;
        let phone = get_required_env("SHOPFLOOR_ADMIN_PHONE")?;
        if phone.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "SHOPFLOOR_ADMIN_PHONE".to_string(),
                "must not be blank".to_string(),
            ));
        }

        Ok(Self {
            name: get_env_or_default("SHOPFLOOR_ADMIN_NAME", "Admin"),
            phone: SecretString::from(phone),
            email,
        })
    }
}

impl PrintConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let label_lookup_url = parse_env::<Url>("SHOPFLOOR_LABEL_LOOKUP_URL", DEFAULT_LOOKUP_URL)?;
        let bill_discount_percent =
            parse_env::<Decimal>("SHOPFLOOR_BILL_DISCOUNT_PERCENT", DEFAULT_DISCOUNT_PERCENT)?;
        if bill_discount_percent.is_sign_negative() || bill_discount_percent > Decimal::ONE_HUNDRED
        {
            return Err(ConfigError::InvalidEnvVar(
                "SHOPFLOOR_BILL_DISCOUNT_PERCENT".to_string(),
                "must be between 0 and 100".to_string(),
            ));
        }

        Ok(Self {
            label_lookup_url,
            bill_discount_percent,
            store: StoreInfo {
                name: get_env_or_default("SHOPFLOOR_STORE_NAME", "Shopfloor Mart"),
                address: get_env_or_default("SHOPFLOOR_STORE_ADDRESS", ""),
                phone: get_env_or_default("SHOPFLOOR_STORE_PHONE", ""),
                vat_number: get_env_or_default("SHOPFLOOR_STORE_VAT", ""),
            },
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
