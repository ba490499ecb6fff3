use std::env;

use anyhow::Context;

use crate::delivery::DeliveryPolicy;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub delivery: DeliveryPolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parsed_or("APP_PORT", 3000);
        let jwt_ttl_hours = parsed_or("JWT_TTL_HOURS", 24);

        let defaults = DeliveryPolicy::default();
        let delivery = DeliveryPolicy {
            capital_fee: parsed_or("DELIVERY_CAPITAL_FEE", defaults.capital_fee),
            base_fee: parsed_or("DELIVERY_BASE_FEE", defaults.base_fee),
            reduced_fee: parsed_or("DELIVERY_REDUCED_FEE", defaults.reduced_fee),
            reduced_threshold: parsed_or("DELIVERY_FREE_THRESHOLD", defaults.reduced_threshold),
        };

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            jwt_ttl_hours,
            delivery,
        })
    }
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
