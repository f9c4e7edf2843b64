use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub llm: LlmConfig,
    pub geocoding: GeocodingConfig,
    pub notify: NotifyConfig,
    pub webhook: WebhookConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    /// Public base URL used to build citizen-facing tracking links
    pub tracking_base_url: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Dinas session token verification. Token issuance lives in the
/// provisioning tooling, not in this service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_leeway: Duration,
}

/// OpenAI-compatible chat completions endpoint used by the classifier
/// and the address resolver's last-resort judgement.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    pub nominatim_base_url: String,
    /// Service city appended to queries that do not mention it
    pub city: String,
    pub country_code: String,
    /// Service-area bounding box: (south, north, west, east)
    pub bbox: (f64, f64, f64, f64),
}

#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// "whatsapp" or "sms"
    pub provider: String,
    pub whatsapp_api_url: String,
    pub whatsapp_api_key: String,
    pub sms_api_url: String,
    pub sms_account_sid: String,
    pub sms_auth_token: String,
    pub sms_from_number: String,
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Shared secret required on the internal ticket-creation endpoint
    pub internal_secret: String,
    /// Hosts allowed for resolution photo URLs
    pub photo_host_allowlist: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            llm: LlmConfig::from_env()?,
            geocoding: GeocodingConfig::from_env()?,
            notify: NotifyConfig::from_env()?,
            webhook: WebhookConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let tracking_base_url = env::var("TRACKING_BASE_URL")
            .unwrap_or_else(|_| "https://aduan.bandung.go.id/lacak".to_string());

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            tracking_base_url,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800;

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl AuthConfig {
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60;

    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET environment variable is required".to_string())?;

        let jwt_leeway_secs = env::var("JWT_LEEWAY")
            .unwrap_or_else(|_| Self::DEFAULT_JWT_LEEWAY_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "JWT_LEEWAY must be a valid number".to_string())?;

        Ok(Self {
            jwt_secret,
            jwt_leeway: Duration::from_secs(jwt_leeway_secs),
        })
    }
}

impl LlmConfig {
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

    pub fn from_env() -> Result<Self, String> {
        let api_base =
            env::var("LLM_API_BASE").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let api_key = env::var("LLM_API_KEY")
            .map_err(|_| "LLM_API_KEY environment variable is required".to_string())?;

        let model = env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let request_timeout_secs = env::var("LLM_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_REQUEST_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "LLM_REQUEST_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            api_base,
            api_key,
            model,
            request_timeout_secs,
        })
    }
}

impl GeocodingConfig {
    pub fn from_env() -> Result<Self, String> {
        let nominatim_base_url = env::var("NOMINATIM_BASE_URL")
            .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string());

        let city = env::var("SERVICE_CITY").unwrap_or_else(|_| "Bandung".to_string());
        let country_code = env::var("SERVICE_COUNTRY_CODE").unwrap_or_else(|_| "id".to_string());

        // Bandung city proper plus a margin for the metro edge
        let bbox = (-7.05, -6.82, 107.52, 107.75);

        Ok(Self {
            nominatim_base_url,
            city,
            country_code,
            bbox,
        })
    }
}

impl NotifyConfig {
    pub fn from_env() -> Result<Self, String> {
        let provider = env::var("NOTIFY_PROVIDER").unwrap_or_else(|_| "whatsapp".to_string());
        if provider != "whatsapp" && provider != "sms" {
            return Err(format!(
                "NOTIFY_PROVIDER must be 'whatsapp' or 'sms', got '{}'",
                provider
            ));
        }

        let whatsapp_api_url = env::var("WHATSAPP_API_URL")
            .unwrap_or_else(|_| "https://api.fonnte.com/send".to_string());
        let whatsapp_api_key = env::var("WHATSAPP_API_KEY").unwrap_or_default();

        let sms_api_url = env::var("SMS_API_URL").unwrap_or_default();
        let sms_account_sid = env::var("SMS_ACCOUNT_SID").unwrap_or_default();
        let sms_auth_token = env::var("SMS_AUTH_TOKEN").unwrap_or_default();
        let sms_from_number = env::var("SMS_FROM_NUMBER").unwrap_or_default();

        Ok(Self {
            provider,
            whatsapp_api_url,
            whatsapp_api_key,
            sms_api_url,
            sms_account_sid,
            sms_auth_token,
            sms_from_number,
        })
    }
}

impl WebhookConfig {
    pub fn from_env() -> Result<Self, String> {
        let internal_secret = env::var("INTERNAL_API_SECRET")
            .map_err(|_| "INTERNAL_API_SECRET environment variable is required".to_string())?;

        let photo_host_allowlist = env::var("PHOTO_HOST_ALLOWLIST")
            .unwrap_or_else(|_| "storage.aduan.bandung.go.id".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            internal_secret,
            photo_host_allowlist,
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Aduan Kota API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Municipal complaint intake and routing API".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}
