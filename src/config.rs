use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "CareFollow";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8001";
const DEFAULT_JWT_SECRET: &str = "care-follow-secret-key-2024";
const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;
/// Token lifetimes outside `1..=MAX_TOKEN_TTL_DAYS` are rejected.
pub const MAX_TOKEN_TTL_DAYS: i64 = 3650;
const DEFAULT_PATIENT_TEMP_PASSWORD: &str = "temp123";
const DEFAULT_IDENTITY_SESSION_URL: &str =
    "https://demobackend.emergentagent.com/auth/v1/env/oauth/session-data";
const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-5.2";
const DEFAULT_TTS_BASE_URL: &str = "https://api.elevenlabs.io/v1";
/// "Rachel" multilingual voice.
const DEFAULT_TTS_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
const DEFAULT_TTS_MODEL_ID: &str = "eleven_multilingual_v2";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 120;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "carefollow_lib=info,carefollow=info,tower_http=warn"
}

/// Get the application data directory
/// ~/CareFollow/ on all platforms. Falls back to the working directory
/// when no home directory can be determined (containers).
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default SQLite database location.
pub fn default_database_path() -> PathBuf {
    app_data_dir().join("carefollow.db")
}

/// Credentials and endpoint for the text generation service.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

/// Credentials and voice for the speech synthesis service.
/// Absent from [`AppConfig`] when no API key is configured.
#[derive(Debug, Clone)]
pub struct SpeechSettings {
    pub base_url: String,
    pub api_key: String,
    pub voice_id: String,
    pub model_id: String,
}

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    /// PBKDF2 rounds for newly hashed passwords. Stored hashes carry
    /// their own count, so lowering this never breaks existing logins.
    pub password_iterations: u32,
    pub patient_temp_password: String,
    pub identity_session_url: String,
    pub llm: LlmSettings,
    pub speech: Option<SpeechSettings>,
    pub upstream_timeout: Duration,
}

impl AppConfig {
    /// Build the configuration from environment variables, applying
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("CAREFOLLOW_BIND_ADDR")
            .and_then(|v| match v.parse::<SocketAddr>() {
                Ok(addr) => Some(addr),
                Err(e) => {
                    tracing::warn!(value = %v, error = %e, "Invalid CAREFOLLOW_BIND_ADDR, using default");
                    None
                }
            })
            .unwrap_or_else(|| {
                DEFAULT_BIND_ADDR
                    .parse()
                    .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8001)))
            });

        let speech = get("ELEVENLABS_API_KEY").map(|api_key| SpeechSettings {
            base_url: get("TTS_BASE_URL").unwrap_or_else(|| DEFAULT_TTS_BASE_URL.into()),
            api_key,
            voice_id: get("TTS_VOICE_ID").unwrap_or_else(|| DEFAULT_TTS_VOICE_ID.into()),
            model_id: get("TTS_MODEL_ID").unwrap_or_else(|| DEFAULT_TTS_MODEL_ID.into()),
        });

        Self {
            bind_addr,
            database_path: get("CAREFOLLOW_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_database_path),
            jwt_secret: get("JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.into()),
            token_ttl_days: token_ttl_days(get("TOKEN_TTL_DAYS")),
            password_iterations: parse_or(
                get("PASSWORD_ITERATIONS"),
                crate::crypto::password::DEFAULT_ITERATIONS,
            ),
            patient_temp_password: get("PATIENT_TEMP_PASSWORD")
                .unwrap_or_else(|| DEFAULT_PATIENT_TEMP_PASSWORD.into()),
            identity_session_url: get("IDENTITY_SESSION_URL")
                .unwrap_or_else(|| DEFAULT_IDENTITY_SESSION_URL.into()),
            llm: LlmSettings {
                base_url: get("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.into()),
                api_key: get("LLM_API_KEY").unwrap_or_default(),
                model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.into()),
            },
            speech,
            upstream_timeout: Duration::from_secs(parse_or(
                get("UPSTREAM_TIMEOUT_SECS"),
                DEFAULT_UPSTREAM_TIMEOUT_SECS,
            )),
        }
    }
}

fn token_ttl_days(value: Option<String>) -> i64 {
    let days = parse_or(value.clone(), DEFAULT_TOKEN_TTL_DAYS);
    if (1..=MAX_TOKEN_TTL_DAYS).contains(&days) {
        return days;
    }
    tracing::warn!(
        value = value.as_deref().unwrap_or_default(),
        max = MAX_TOKEN_TTL_DAYS,
        "TOKEN_TTL_DAYS out of range, using default"
    );
    DEFAULT_TOKEN_TTL_DAYS
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
