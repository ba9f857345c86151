use crate::attendance::policy::AttendancePolicy;
use chrono::NaiveTime;
use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_read_per_min: u32,
    pub rate_write_per_min: u32,

    pub api_prefix: String,

    /// Late threshold + required hours, applied uniformly by every view.
    pub attendance: AttendancePolicy,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let late_after = env::var("LATE_AFTER")
            .unwrap_or_else(|_| "08:00".to_string());
        let late_after = NaiveTime::parse_from_str(&late_after, "%H:%M")
            .expect("LATE_AFTER must be HH:MM");

        let required_hours = env::var("REQUIRED_HOURS")
            .unwrap_or_else(|_| "8".to_string())
            .parse()
            .expect("REQUIRED_HOURS must be a number");

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),

            rate_read_per_min: env::var("RATE_READ_PER_MIN")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .unwrap(),
            rate_write_per_min: env::var("RATE_WRITE_PER_MIN")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            attendance: AttendancePolicy {
                late_after,
                required_hours,
            },
        }
    }
}
