use std::{env, str::FromStr, time::Duration};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub db_max_connections: u32,
    pub db_connect_timeout: Duration,
    pub db_idle_timeout: Duration,
    pub run_migrations: bool,
    pub low_stock_threshold: i32,
    pub payment_expire_minutes: i64,
    pub payment_gateway_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 3000);
        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 10),
            db_connect_timeout: Duration::from_secs(parse_or("DB_CONNECT_TIMEOUT_SECS", 10)),
            db_idle_timeout: Duration::from_secs(parse_or("DB_IDLE_TIMEOUT_SECS", 300)),
            run_migrations: parse_or("RUN_MIGRATIONS", true),
            low_stock_threshold: parse_or("LOW_STOCK_THRESHOLD", 10),
            payment_expire_minutes: parse_or("PAYMENT_EXPIRE_MINUTES", 15),
            payment_gateway_url: env::var("PAYMENT_GATEWAY_URL")
                .unwrap_or_else(|_| "https://mock-payment.local".to_string()),
        })
    }

    /// Config for tests and tools that only need a database.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            jwt_secret: "test-secret".to_string(),
            db_max_connections: 5,
            db_connect_timeout: Duration::from_secs(10),
            db_idle_timeout: Duration::from_secs(300),
            run_migrations: true,
            low_stock_threshold: 10,
            payment_expire_minutes: 15,
            payment_gateway_url: "https://mock-payment.local".to_string(),
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}
