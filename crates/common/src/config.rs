use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Redis connection string (sweep lease)
    pub redis_url: String,

    /// Push gateway base URL deliveries are POSTed to
    pub push_gateway_url: String,

    /// Bearer token for the push gateway
    pub push_gateway_token: Option<String>,

    /// Per-request timeout for push gateway calls, in seconds (default: 10)
    pub push_timeout_secs: u64,

    /// Interval between retry sweeps, in seconds (default: 60)
    pub sweep_interval_secs: u64,

    /// Fixed delay between records within one sweep, in milliseconds (default: 100)
    pub sweep_record_delay_ms: u64,

    /// Interval between retention cleanup runs, in seconds (default: 3600)
    pub cleanup_interval_secs: u64,

    /// Age in days past which terminal retry records are deleted (default: 7)
    pub cleanup_days_old: i64,

    /// Maximum delivery attempts per retry record (default: 3)
    pub retry_max_attempts: i32,

    /// First retry delay in milliseconds (default: 5000)
    pub retry_base_delay_ms: u64,

    /// Exponential backoff multiplier between attempts (default: 2)
    pub retry_backoff_multiplier: f64,

    /// Backoff cap in milliseconds (default: 300000 = 5 min)
    pub retry_max_delay_ms: u64,

    /// Service API listen port (default: 3000)
    pub api_port: u16,

    /// Static API key for the service API; unset disables auth (dev mode)
    pub api_key: Option<String>,

    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub db_max_connections: u32,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            push_gateway_url: std::env::var("PUSH_GATEWAY_URL").map_err(|_| {
                anyhow::anyhow!("PUSH_GATEWAY_URL environment variable is required")
            })?,
            push_gateway_token: std::env::var("PUSH_GATEWAY_TOKEN").ok(),
            push_timeout_secs: std::env::var("PUSH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PUSH_TIMEOUT_SECS must be a valid u64"))?,
            sweep_interval_secs: std::env::var("SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SWEEP_INTERVAL_SECS must be a valid u64"))?,
            sweep_record_delay_ms: std::env::var("SWEEP_RECORD_DELAY_MS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SWEEP_RECORD_DELAY_MS must be a valid u64"))?,
            cleanup_interval_secs: std::env::var("CLEANUP_INTERVAL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("CLEANUP_INTERVAL_SECS must be a valid u64"))?,
            cleanup_days_old: std::env::var("CLEANUP_DAYS_OLD")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("CLEANUP_DAYS_OLD must be a valid i64"))?,
            retry_max_attempts: std::env::var("RETRY_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RETRY_MAX_ATTEMPTS must be a valid i32"))?,
            retry_base_delay_ms: std::env::var("RETRY_BASE_DELAY_MS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RETRY_BASE_DELAY_MS must be a valid u64"))?,
            retry_backoff_multiplier: std::env::var("RETRY_BACKOFF_MULTIPLIER")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RETRY_BACKOFF_MULTIPLIER must be a valid f64"))?,
            retry_max_delay_ms: std::env::var("RETRY_MAX_DELAY_MS")
                .unwrap_or_else(|_| "300000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RETRY_MAX_DELAY_MS must be a valid u64"))?,
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("API_PORT must be a valid u16"))?,
            api_key: std::env::var("API_KEY").ok(),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
        })
    }
}
