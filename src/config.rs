// config.rs
use std::str::FromStr;

use anyhow::Context;
use sqlx::types::BigDecimal;
use tracing_subscriber::filter::LevelFilter;
use uuid::Uuid;

use crate::service::{
    retry::DEFAULT_MAX_CONFLICT_RETRIES,
    settlement::{BidPayoutTiming, SettlementTerms, DEFAULT_COMMISSION_RATE},
};

#[derive(Debug, Clone)]
pub struct Config {
    /// When unset the service runs on the in-memory store.
    pub database_url: Option<String>,
    pub port: u16,
    pub commission_rate: BigDecimal,
    pub platform_admin_id: Uuid,
    pub bid_payout_timing: BidPayoutTiming,
    pub max_conflict_retries: u32,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub run_migrations: bool,
    pub log_level: LevelFilter,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn init() -> anyhow::Result<Config> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
        let var = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(v) => v.parse::<u16>().context("PORT must be a port number")?,
            None => 8000,
        };

        let commission_rate = BigDecimal::from_str(
            var("COMMISSION_RATE")
                .as_deref()
                .unwrap_or(DEFAULT_COMMISSION_RATE),
        )
        .context("COMMISSION_RATE must be a decimal percentage")?;
        if commission_rate < BigDecimal::from(0) || commission_rate > BigDecimal::from(100) {
            anyhow::bail!("COMMISSION_RATE must be between 0 and 100");
        }

        let platform_admin_id = match var("PLATFORM_ADMIN_ID") {
            Some(v) => Uuid::parse_str(v.trim()).context("PLATFORM_ADMIN_ID must be a UUID")?,
            None => Uuid::nil(),
        };

        let bid_payout_timing = match var("BID_PAYOUT_TIMING") {
            Some(v) => v.parse::<BidPayoutTiming>()?,
            None => BidPayoutTiming::default(),
        };

        let max_conflict_retries = match var("MAX_CONFLICT_RETRIES") {
            Some(v) => v.parse::<u32>().context("MAX_CONFLICT_RETRIES must be a number")?,
            None => DEFAULT_MAX_CONFLICT_RETRIES,
        };

        let db_max_connections = match var("DB_MAX_CONNECTIONS") {
            Some(v) => v.parse::<u32>().context("DB_MAX_CONNECTIONS must be a number")?,
            None => 20,
        };
        let db_min_connections = match var("DB_MIN_CONNECTIONS") {
            Some(v) => v.parse::<u32>().context("DB_MIN_CONNECTIONS must be a number")?,
            None => 5,
        };

        let run_migrations = match var("RUN_MIGRATIONS") {
            Some(v) => v.trim().parse::<bool>().context("RUN_MIGRATIONS must be true or false")?,
            None => true,
        };

        let log_level = match var("LOG_LEVEL") {
            Some(v) => v.parse::<LevelFilter>().context("LOG_LEVEL must be a tracing level")?,
            None => LevelFilter::DEBUG,
        };

        let cors_origins = var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["http://localhost:5173".to_string(), "http://localhost:8000".to_string()]);

        Ok(Config {
            database_url: var("DATABASE_URL"),
            port,
            commission_rate,
            platform_admin_id,
            bid_payout_timing,
            max_conflict_retries,
            db_max_connections,
            db_min_connections,
            run_migrations,
            log_level,
            cors_origins,
        })
    }

    #[cfg(test)]
    pub fn init_for_tests() -> Config {
        Self::from_lookup(|_| None).expect("default configuration is valid")
    }

    pub fn settlement_terms(&self) -> SettlementTerms {
        SettlementTerms {
            commission_rate: self.commission_rate.clone(),
            admin_id: self.platform_admin_id,
        }
    }
}
