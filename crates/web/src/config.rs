//! Server configuration from environment variables

use std::net::SocketAddr;
use std::time::Duration;

use todo_core::remote::SupabaseConfig;
use todo_core::store::DEFAULT_TABLE;
use todo_core::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8081";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_IDLE_SECS: u64 = 60 * 60 * 24;

/// Where task rows and accounts live
#[derive(Debug, Clone)]
pub enum Backend {
    Supabase(SupabaseConfig),
    /// In-process store; data is lost on restart
    Memory,
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Supabase(_) => "supabase",
            Self::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub bind_addr: SocketAddr,
    pub backend: Backend,
    pub table: String,
    pub secure_cookie: bool,
    pub session_idle: Duration,
}

impl WebConfig {
    /// Read the configuration once at startup
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_raw = var("TODO_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| Error::Config(format!("Invalid TODO_BIND_ADDR '{}': {}", bind_raw, e)))?;

        let timeout = Duration::from_secs(env_u64(
            var("TODO_HTTP_TIMEOUT_SECS"),
            DEFAULT_HTTP_TIMEOUT_SECS,
        ));

        let backend = match var("TODO_BACKEND").as_deref().unwrap_or("supabase") {
            "supabase" => {
                let url = var("SUPABASE_URL")
                    .ok_or_else(|| Error::Config("SUPABASE_URL is not set".into()))?;
                let anon_key = var("SUPABASE_ANON_KEY")
                    .ok_or_else(|| Error::Config("SUPABASE_ANON_KEY is not set".into()))?;
                Backend::Supabase(SupabaseConfig::new(url, anon_key).with_timeout(timeout))
            }
            "memory" => Backend::Memory,
            other => {
                return Err(Error::Config(format!(
                    "Unknown TODO_BACKEND '{}' (expected supabase or memory)",
                    other
                )))
            }
        };

        Ok(Self {
            bind_addr,
            backend,
            table: var("TODO_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            secure_cookie: env_flag(var("TODO_SECURE_COOKIE"), false),
            session_idle: Duration::from_secs(env_u64(
                var("TODO_SESSION_IDLE_SECS"),
                DEFAULT_SESSION_IDLE_SECS,
            )),
        })
    }
}

fn env_flag(raw: Option<String>, default: bool) -> bool {
    match raw {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        None => default,
    }
}

fn env_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|value| value.parse().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}
