use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    /// Session and invitation token signing
    pub jwt: JwtAuthConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub otp: OtpConfig,
    #[serde(default)]
    pub cookies: CookieConfig,
    #[serde(default)]
    pub guarantors: GuarantorConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Upper bound for request bodies, multipart uploads included.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(cfg: &DatabaseConfig) -> Self {
        Self {
            url: cfg.url.clone(),
            max_connections: cfg.max_connections,
            min_connections: cfg.min_connections,
            connect_timeout_secs: cfg.connect_timeout_secs,
            idle_timeout_secs: cfg.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default)]
    pub hsts_enabled: bool,

    /// Requests per minute per client on the public auth and guarantor form
    /// endpoints. 0 disables limiting.
    #[serde(default = "default_auth_rate_limit")]
    pub auth_rate_limit_per_minute: u32,

    /// Key clients by the first `X-Forwarded-For` entry
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtAuthConfig {
    /// HMAC secret shared by session and invitation tokens
    pub secret: String,

    /// Session token lifetime in seconds (default: 86400 = 24 hours)
    #[serde(default = "default_session_expiry")]
    pub session_expiry_secs: i64,

    /// Invitation token lifetime in days
    #[serde(default = "default_invitation_ttl_days")]
    pub invitation_ttl_days: i64,

    /// Clock skew tolerance in seconds
    #[serde(default)]
    pub leeway_secs: u64,
}

/// Email provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// When false, messages are logged and reported as sent.
    #[serde(default)]
    pub enabled: bool,

    /// `console` or `sendgrid`
    #[serde(default = "default_email_provider")]
    pub provider: String,

    #[serde(default)]
    pub sendgrid_api_key: String,

    #[serde(default = "default_sendgrid_url")]
    pub sendgrid_url: String,

    #[serde(default = "default_sender_email")]
    pub sender_email: String,

    #[serde(default = "default_sender_name")]
    pub sender_name: String,

    /// Email template style: html or plain
    #[serde(default = "default_template_style")]
    pub template_style: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            hsts_enabled: false,
            auth_rate_limit_per_minute: default_auth_rate_limit(),
            trust_proxy_headers: false,
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_email_provider(),
            sendgrid_api_key: String::new(),
            sendgrid_url: default_sendgrid_url(),
            sender_email: default_sender_email(),
            sender_name: default_sender_name(),
            template_style: default_template_style(),
        }
    }
}

/// S3-compatible object storage for resumes and avatars.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub bucket: String,

    #[serde(default = "default_storage_region")]
    pub region: String,

    /// Custom endpoint for S3-compatible providers. Empty uses AWS.
    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub access_key_id: String,

    #[serde(default)]
    pub secret_access_key: String,

    /// Base of the public URL returned for stored objects.
    #[serde(default)]
    pub public_base_url: String,

    #[serde(default)]
    pub default_avatar_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bucket: String::new(),
            region: default_storage_region(),
            endpoint: String::new(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            public_base_url: String::new(),
            default_avatar_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtpConfig {
    #[serde(default = "default_otp_length")]
    pub length: usize,

    #[serde(default = "default_otp_ttl_minutes")]
    pub ttl_minutes: i64,

    /// Wrong guesses allowed before a code is discarded
    #[serde(default = "default_otp_max_attempts")]
    pub max_attempts: i32,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            length: default_otp_length(),
            ttl_minutes: default_otp_ttl_minutes(),
            max_attempts: default_otp_max_attempts(),
        }
    }
}

/// Session cookie attributes.
#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    #[serde(default = "default_cookie_name")]
    pub name: String,

    #[serde(default = "default_cookie_secure")]
    pub secure: bool,

    /// Strict, Lax or None
    #[serde(default = "default_same_site")]
    pub same_site: String,

    #[serde(default)]
    pub domain: String,

    #[serde(default = "default_cookie_path")]
    pub path: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
            secure: default_cookie_secure(),
            same_site: default_same_site(),
            domain: String::new(),
            path: default_cookie_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuarantorConfig {
    /// Frontend origin hosting the guarantor form.
    #[serde(default = "default_form_base_url")]
    pub form_base_url: String,
}

impl Default for GuarantorConfig {
    fn default() -> Self {
        Self {
            form_base_url: default_form_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_jobs_enabled")]
    pub enabled: bool,

    #[serde(default = "default_invitation_sweep_minutes")]
    pub invitation_sweep_minutes: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            enabled: default_jobs_enabled(),
            invitation_sweep_minutes: default_invitation_sweep_minutes(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_body_size() -> usize {
    10 * 1024 * 1024
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_session_expiry() -> i64 {
    shared::jwt::DEFAULT_SESSION_EXPIRY_SECS
}
fn default_invitation_ttl_days() -> i64 {
    domain::models::guarantor::INVITATION_TTL_DAYS
}
fn default_email_provider() -> String {
    "console".to_string()
}
fn default_sendgrid_url() -> String {
    "https://api.sendgrid.com/v3/mail/send".to_string()
}
fn default_sender_email() -> String {
    "noreply@applicant-tracking.app".to_string()
}
fn default_sender_name() -> String {
    "Applicant Tracking".to_string()
}
fn default_template_style() -> String {
    "html".to_string()
}
fn default_storage_region() -> String {
    "us-east-1".to_string()
}
fn default_otp_length() -> usize {
    shared::crypto::OTP_LENGTH
}
fn default_auth_rate_limit() -> u32 {
    20
}

fn default_otp_max_attempts() -> i32 {
    5
}

fn default_otp_ttl_minutes() -> i64 {
    10
}
fn default_cookie_name() -> String {
    "accessToken".to_string()
}
fn default_cookie_secure() -> bool {
    true
}
fn default_same_site() -> String {
    "Strict".to_string()
}
fn default_cookie_path() -> String {
    "/".to_string()
}
fn default_form_base_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_jobs_enabled() -> bool {
    true
}
fn default_invitation_sweep_minutes() -> u64 {
    15
}

/// Shortest accepted HMAC secret.
pub const MIN_JWT_SECRET_BYTES: usize = 32;

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with ATS__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("ATS")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Defaults are embedded so tests do not depend on the config directory.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30
            max_body_size = 10485760

            [database]
            url = ""
            max_connections = 20
            min_connections = 5
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [jwt]
            secret = "test-secret-that-is-long-enough-0123456789"
            session_expiry_secs = 86400
            invitation_ttl_days = 7
            leeway_secs = 0

            [email]
            enabled = false
            provider = "console"
            sender_email = "test@example.com"
            sender_name = "Test"
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "ATS__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.jwt.secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigValidationError::InvalidValue(format!(
                "jwt.secret must be at least {} bytes",
                MIN_JWT_SECRET_BYTES
            )));
        }

        if self.storage.enabled && self.storage.bucket.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "storage.bucket is required when storage is enabled".to_string(),
            ));
        }

        if self.email.enabled
            && self.email.provider == "sendgrid"
            && self.email.sendgrid_api_key.is_empty()
        {
            return Err(ConfigValidationError::MissingRequired(
                "email.sendgrid_api_key is required for the sendgrid provider".to_string(),
            ));
        }

        Ok(())
    }

    /// Bind address. Falls back to all interfaces on an unparsable host.
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], self.server.port)))
    }
}
