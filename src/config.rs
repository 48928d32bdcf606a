use std::env;

use rust_decimal::Decimal;

use crate::services::heating_bill::{BillingConfig, CostSplit};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub environment: String,
    pub api_prefix: String,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub rate_limit_enabled: bool,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst_size: u32,
    pub request_timeout_seconds: u64,
    pub supabase_db_url: Option<String>,
    pub db_pool_max_connections: u32,
    pub db_pool_min_connections: u32,
    pub db_pool_acquire_timeout_seconds: u64,
    pub db_pool_idle_timeout_seconds: u64,
    pub fetch_timeout_seconds: u64,
    pub heating_bill_use_mock: bool,
    pub billing_base_cost_percent: Decimal,
    pub billing_consumption_cost_percent: Decimal,
    pub co2_price_per_tonne: Option<Decimal>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = EnvVars { lookup };
        Self {
            app_name: vars.or("APP_NAME", "Heating Bill API"),
            environment: vars.or("ENVIRONMENT", "development"),
            api_prefix: normalize_prefix(&vars.or("API_PREFIX", "/v1")),
            host: vars.or("HOST", "0.0.0.0"),
            port: vars.parse_or("PORT", 8000),
            cors_origins: parse_csv(&vars.or("CORS_ORIGINS", "http://localhost:3000")),
            rate_limit_enabled: vars.bool_or("RATE_LIMIT_ENABLED", true),
            rate_limit_per_second: vars.parse_or("RATE_LIMIT_PER_SECOND", 10),
            rate_limit_burst_size: vars.parse_or("RATE_LIMIT_BURST_SIZE", 100),
            request_timeout_seconds: vars.parse_or("REQUEST_TIMEOUT_SECONDS", 30),
            supabase_db_url: vars.opt("SUPABASE_DB_URL").or_else(|| vars.opt("DATABASE_URL")),
            db_pool_max_connections: vars.parse_or("DB_POOL_MAX_CONNECTIONS", 5),
            db_pool_min_connections: vars.parse_or("DB_POOL_MIN_CONNECTIONS", 1),
            db_pool_acquire_timeout_seconds: vars.parse_or("DB_POOL_ACQUIRE_TIMEOUT_SECONDS", 5),
            db_pool_idle_timeout_seconds: vars.parse_or("DB_POOL_IDLE_TIMEOUT_SECONDS", 600),
            fetch_timeout_seconds: vars.parse_or("FETCH_TIMEOUT_SECONDS", 10),
            heating_bill_use_mock: vars.bool_or("HEATING_BILL_USE_MOCK", false),
            billing_base_cost_percent: vars
                .parse_or("BILLING_BASE_COST_PERCENT", Decimal::from(30)),
            billing_consumption_cost_percent: vars
                .parse_or("BILLING_CONSUMPTION_COST_PERCENT", Decimal::from(70)),
            co2_price_per_tonne: vars
                .opt("CO2_PRICE_PER_TONNE")
                .and_then(|raw| raw.parse::<Decimal>().ok()),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.trim().eq_ignore_ascii_case("production")
    }

    /// Server-wide billing defaults; documents and requests override these.
    pub fn billing_config(&self) -> BillingConfig {
        BillingConfig {
            co2_price_per_tonne: self.co2_price_per_tonne,
            ..BillingConfig::with_split(CostSplit {
                base_cost_percent: self.billing_base_cost_percent,
                consumption_cost_percent: self.billing_consumption_cost_percent,
            })
        }
    }
}

struct EnvVars<F> {
    lookup: F,
}

impl<F> EnvVars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn opt(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.opt(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T>(&self, key: &str, default: T) -> T
    where
        T: std::str::FromStr + Copy,
    {
        self.opt(key)
            .and_then(|raw| raw.parse::<T>().ok())
            .unwrap_or(default)
    }

    fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.opt(key).as_deref().map(str::to_ascii_lowercase) {
            Some(value) if value == "1" || value == "true" || value == "yes" || value == "on" => {
                true
            }
            Some(value) if value == "0" || value == "false" || value == "no" || value == "off" => {
                false
            }
            Some(_) => default,
            None => default,
        }
    }
}

fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn normalize_prefix(raw: &str) -> String {
    let mut prefix = raw.trim().to_string();
    if prefix.is_empty() {
        return "/v1".to_string();
    }
    if !prefix.starts_with('/') {
        prefix.insert(0, '/');
    }
    while prefix.ends_with('/') && prefix.len() > 1 {
        prefix.pop();
    }
    prefix
}
