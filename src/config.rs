use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub redis_url: String,
    pub jwt_secret: String,
    pub jwt_expiry_seconds: u64,
    pub mail_api_key: String,
    pub mail_api_url: String,
    pub email_sender: String,
    pub email_sender_name: String,
    pub reply_address_key: String,
    pub reply_address_salt: String,
    pub reply_address_domain: String,
    pub invite_max_in_flight: usize,
    pub invite_batch_timeout: Duration,
    pub app_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiry_seconds: env::var("JWT_EXPIRY_SECONDS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .unwrap_or(900),
            mail_api_key: required("MAIL_API_KEY")?,
            mail_api_url: env::var("MAIL_API_URL")
                .unwrap_or_else(|_| "https://api.sendwithus.com/api/v1/send".to_string()),
            email_sender: required("EMAIL_SENDER")?,
            email_sender_name: env::var("EMAIL_SENDER_NAME").unwrap_or_else(|_| "Hylo".to_string()),
            reply_address_key: required("REPLY_ADDRESS_KEY")?,
            reply_address_salt: required("REPLY_ADDRESS_SALT")?,
            reply_address_domain: required("REPLY_ADDRESS_DOMAIN")?,
            invite_max_in_flight: env::var("INVITE_MAX_IN_FLIGHT")
                .unwrap_or_else(|_| "8".to_string())
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidMaxInFlight)?
                .max(1),
            invite_batch_timeout: Duration::from_secs(
                env::var("INVITE_BATCH_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "45".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidBatchTimeout)?,
            ),
            app_url: env::var("APP_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Outer HTTP timeout; leaves an invite batch room to answer with the
    /// outcomes it recorded before its own deadline.
    pub fn request_timeout(&self) -> Duration {
        self.invite_batch_timeout + Duration::from_secs(15)
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server port")]
    InvalidPort,
    #[error("INVITE_MAX_IN_FLIGHT must be a positive integer")]
    InvalidMaxInFlight,
    #[error("INVITE_BATCH_TIMEOUT_SECS must be a whole number of seconds")]
    InvalidBatchTimeout,
    #[error("{0} environment variable is required")]
    Missing(&'static str),
}
