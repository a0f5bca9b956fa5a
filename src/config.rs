use std::fmt;

use anyhow::Context;
use serde::Deserialize;
use time::{macros::format_description, Time, UtcOffset};

/// Fallback signing secret for local development. Anyone who knows it can mint
/// tokens, so it must never be used in production.
pub const INSECURE_DEFAULT_JWT_SECRET: &str = "insecure-default-jwt-secret";

#[derive(Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("ttl_minutes", &self.ttl_minutes)
            .field("refresh_ttl_minutes", &self.refresh_ttl_minutes)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceConfig {
    /// Offset of the school's wall clock (`SCHOOL_UTC_OFFSET`). Decides which calendar
    /// day a scan lands on and the local time compared against `late_cutoff`.
    ///
    /// Defaults to UTC, not the server's zone. Deployments outside UTC must set it or
    /// late marking is wrong: with the default, a school at UTC+7 sees every arrival
    /// before 14:30 local marked present.
    pub utc_offset: UtcOffset,
    /// Check-ins strictly after this local time are marked late.
    pub late_cutoff: Time,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            utc_offset: UtcOffset::UTC,
            late_cutoff: time::macros::time!(7:30),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub attendance: AttendanceConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = std::env::var("APP_PORT")
            .or_else(|_| std::env::var("PORT"))
            .unwrap_or_else(|_| "1323".into())
            .parse::<u16>()
            .context("APP_PORT must be a port number")?;

        let secret = match std::env::var("JWT_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ => {
                tracing::warn!(
                    "JWT_SECRET is not set; using the built-in insecure default. \
                     Do not run like this in production"
                );
                INSECURE_DEFAULT_JWT_SECRET.to_string()
            }
        };
        let jwt = JwtConfig {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "attendance-system".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 7),
        };

        let mut attendance = AttendanceConfig::default();
        match std::env::var("SCHOOL_UTC_OFFSET") {
            Ok(v) => attendance.utc_offset = parse_utc_offset(&v)?,
            Err(_) => tracing::warn!(
                "SCHOOL_UTC_OFFSET is not set; scan days and late marking use UTC"
            ),
        }
        if let Ok(v) = std::env::var("LATE_CUTOFF") {
            attendance.late_cutoff = parse_cutoff(&v)?;
        }

        Ok(Self {
            database_url,
            host,
            port,
            jwt,
            attendance,
        })
    }
}

/// Parses `+07:00` / `-03:30` style offsets.
pub fn parse_utc_offset(value: &str) -> anyhow::Result<UtcOffset> {
    UtcOffset::parse(
        value.trim(),
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )
    .with_context(|| format!("SCHOOL_UTC_OFFSET must look like +07:00, got {value:?}"))
}

/// Parses `HH:MM` wall-clock times.
pub fn parse_cutoff(value: &str) -> anyhow::Result<Time> {
    Time::parse(value.trim(), format_description!("[hour]:[minute]"))
        .with_context(|| format!("LATE_CUTOFF must look like 07:30, got {value:?}"))
}
