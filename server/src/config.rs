use anyhow::{Context, Result, anyhow};
use axum_extra::extract::cookie::Key;
use base64::{Engine as _, engine::general_purpose::STANDARD};

/// Bytes of key material the private cookie jar needs.
const COOKIE_KEY_LEN: usize = 64;

#[derive(Clone)]
pub struct AppConfig {
    pub cookie_key: Key,
    pub secure_cookies: bool,
    pub session_ttl_days: i64,
    pub cors_allowed_origins: Vec<String>,
    pub firebase_api_key: String,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
    pub razorpay_webhook_secret: String,
    pub free_seat_limit: i32,
    pub default_leave_balance: i32,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source; `load` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| anyhow!("missing env {}", key))
        };
        let flag = |key: &str, default: bool| {
            lookup(key)
                .map(|val| matches!(val.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(default)
        };
        let number = |key: &str, default: i64| -> Result<i64> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<i64>()
                    .with_context(|| format!("invalid {}", key)),
                None => Ok(default),
            }
        };

        let cookie_secret = required("COOKIE_SECRET_BASE64")?;
        let secret_bytes = STANDARD
            .decode(cookie_secret.as_bytes())
            .context("invalid COOKIE_SECRET_BASE64")?;
        if secret_bytes.len() < COOKIE_KEY_LEN {
            return Err(anyhow!(
                "COOKIE_SECRET_BASE64 must decode to at least {} bytes",
                COOKIE_KEY_LEN
            ));
        }
        let cookie_key = Key::from(&secret_bytes[..COOKIE_KEY_LEN]);

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".into())
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        let session_ttl_days = number("SESSION_TTL_DAYS", 14)?;
        if session_ttl_days < 1 {
            return Err(anyhow!("SESSION_TTL_DAYS must be positive"));
        }
        let free_seat_limit = i32::try_from(number("FREE_SEAT_LIMIT", 5)?)
            .context("FREE_SEAT_LIMIT out of range")?;
        let default_leave_balance = default_leave_balance(&lookup)?;

        Ok(Self {
            cookie_key,
            secure_cookies: flag("SECURE_COOKIES", true),
            session_ttl_days,
            cors_allowed_origins,
            firebase_api_key: required("FIREBASE_API_KEY")?,
            razorpay_key_id: required("RAZORPAY_KEY_ID")?,
            razorpay_key_secret: required("RAZORPAY_KEY_SECRET")?,
            razorpay_webhook_secret: required("RAZORPAY_WEBHOOK_SECRET")?,
            free_seat_limit,
            default_leave_balance,
        })
    }
}

/// `DEFAULT_LEAVE_BALANCE`, or 20 when unset. Also used by `seed`, which
/// does not need the rest of the config.
pub fn default_leave_balance<F>(lookup: F) -> Result<i32>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup("DEFAULT_LEAVE_BALANCE") else {
        return Ok(20);
    };
    let balance = raw
        .trim()
        .parse::<i32>()
        .context("invalid DEFAULT_LEAVE_BALANCE")?;
    if balance < 0 {
        return Err(anyhow!("DEFAULT_LEAVE_BALANCE must not be negative"));
    }
    Ok(balance)
}
