use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub bind_addr: String,
    pub catalog_path: Option<String>,
    pub scheduling: SchedulingPolicy,
}

/// Policy knobs for slot generation, commits and cancellations.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulingPolicy {
    pub slot_granularity_minutes: u32,
    pub min_lead_time_minutes: u32,
    pub cancellation_cutoff_minutes: u32,
    pub auto_confirm: bool,
    pub booking_lock_timeout_ms: u64,
    pub utc_offset_minutes: i32,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            slot_granularity_minutes: 15,
            min_lead_time_minutes: 0,
            cancellation_cutoff_minutes: 0,
            auto_confirm: false,
            booking_lock_timeout_ms: 500,
            utc_offset_minutes: 0,
        }
    }
}

impl SchedulingPolicy {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mut slot_granularity_minutes =
            parse_var("SLOT_GRANULARITY_MINUTES", defaults.slot_granularity_minutes);
        if slot_granularity_minutes == 0 {
            warn!("SLOT_GRANULARITY_MINUTES must be positive, using default");
            slot_granularity_minutes = defaults.slot_granularity_minutes;
        }

        Self {
            slot_granularity_minutes,
            min_lead_time_minutes: parse_var("MIN_LEAD_TIME_MINUTES", defaults.min_lead_time_minutes),
            cancellation_cutoff_minutes: parse_var(
                "CANCELLATION_CUTOFF_MINUTES",
                defaults.cancellation_cutoff_minutes,
            ),
            auto_confirm: parse_var("AUTO_CONFIRM_BOOKINGS", defaults.auto_confirm),
            booking_lock_timeout_ms: parse_var(
                "BOOKING_LOCK_TIMEOUT_MS",
                defaults.booking_lock_timeout_ms,
            ),
            utc_offset_minutes: parse_var("BUSINESS_UTC_OFFSET_MINUTES", defaults.utc_offset_minutes),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| {
                    warn!("BIND_ADDR not set, using default");
                    "0.0.0.0:3000".to_string()
                }),
            catalog_path: env::var("CATALOG_PATH").ok(),
            scheduling: SchedulingPolicy::from_env(),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty()
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value {:?}, using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}
