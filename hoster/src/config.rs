use std::path::PathBuf;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Error loading configuration from the environment.
#[derive(Debug)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "config error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

fn missing(key: &str) -> ConfigError {
    ConfigError(format!("missing required environment variable {key}"))
}

/// Everything the binary needs to boot, resolved once at startup from
/// `.env` plus the process environment. `.env` never overwrites a
/// variable that is already set.
#[derive(Debug, Clone)]
pub struct HosterConfig {
    pub bind_addr: String,
    pub storage_dsn: String,
    pub base_domain: String,
    pub gateway_secret: Option<String>,
    pub credential_encryption_key: [u8; 32],
    pub payment_provider_api_key: Option<String>,
    pub config_dir: PathBuf,
    pub node_health_period: Duration,
    pub cloud_provisioner_period: Duration,
    pub invoice_generator_period: Duration,
}

impl HosterConfig {
    /// Loads `.env` (without overwriting already-set variables) then reads
    /// every key from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let bind_addr = env_or("HOSTER_BIND_ADDR", "0.0.0.0:8080");
        let storage_dsn = require_env("HOSTER_STORAGE_DSN")?;
        let base_domain = require_env("HOSTER_BASE_DOMAIN")?;
        let gateway_secret = std::env::var("HOSTER_GATEWAY_SECRET").ok().filter(|s| !s.is_empty());
        let credential_encryption_key = decode_key(&require_env("HOSTER_CREDENTIAL_ENCRYPTION_KEY")?)?;
        let payment_provider_api_key =
            std::env::var("HOSTER_PAYMENT_PROVIDER_API_KEY").ok().filter(|s| !s.is_empty());
        let config_dir = PathBuf::from(env_or("HOSTER_CONFIG_DIR", "./config"));

        let node_health_period = duration_or("HOSTER_NODE_HEALTH_PERIOD_SECS", hoster_workers::DEFAULT_NODE_HEALTH_PERIOD)?;
        let cloud_provisioner_period =
            duration_or("HOSTER_CLOUD_PROVISIONER_PERIOD_SECS", hoster_workers::DEFAULT_CLOUD_PROVISIONER_PERIOD)?;
        let invoice_generator_period =
            duration_or("HOSTER_INVOICE_GENERATOR_PERIOD_SECS", hoster_workers::DEFAULT_INVOICE_GENERATOR_PERIOD)?;

        Ok(Self {
            bind_addr,
            storage_dsn,
            base_domain,
            gateway_secret,
            credential_encryption_key,
            payment_provider_api_key,
            config_dir,
            node_health_period,
            cloud_provisioner_period,
            invoice_generator_period,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn require_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| missing(key))
}

fn duration_or(key: &str, default: Duration) -> Result<Duration, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError(format!("{key} must be an integer number of seconds, got '{raw}'"))),
        Err(_) => Ok(default),
    }
}

/// Accepts either raw base64 or a `base64:`-prefixed value, decoding to
/// exactly 32 bytes for AES-256-GCM.
fn decode_key(raw: &str) -> Result<[u8; 32], ConfigError> {
    let raw = raw.strip_prefix("base64:").unwrap_or(raw);
    let bytes = BASE64
        .decode(raw)
        .map_err(|e| ConfigError(format!("HOSTER_CREDENTIAL_ENCRYPTION_KEY is not valid base64: {e}")))?;
    bytes
        .try_into()
        .map_err(|v: Vec<u8>| ConfigError(format!("HOSTER_CREDENTIAL_ENCRYPTION_KEY must decode to 32 bytes, got {}", v.len())))
}
