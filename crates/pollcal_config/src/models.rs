use serde::{Deserialize, Serialize};

// --- Database Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. DATABASE_URL loaded via APP_DATABASE__URL
}

// --- Remote Calendar Provider Config ---
// Holds the OAuth application credentials and endpoint locations of the one
// external calendar provider the engine talks to.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    /// Provider name used to key stored credentials, e.g. "google".
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
    /// OAuth token endpoint (refresh-token grant).
    pub token_url: String,
    /// Base URL for the calendar REST API (list calendars, freebusy, events).
    pub api_base_url: String,
    /// Per-request timeout for remote calls. Falls back to the shared
    /// HTTP client default when unset.
    pub timeout_secs: Option<u64>,
}

// --- Availability Check Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CalendarCheckConfig {
    /// How long a cached busy/free answer stays valid.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: i64,
    /// Availability checks allowed per (user, poll) in a sliding minute.
    #[serde(default = "default_checks_per_minute")]
    pub checks_per_minute: u32,
}

fn default_cache_ttl_secs() -> i64 {
    300
}

fn default_checks_per_minute() -> u32 {
    10
}

impl Default for CalendarCheckConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            checks_per_minute: default_checks_per_minute(),
        }
    }
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_calendar: bool,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub provider: Option<ProviderConfig>,
    #[serde(default)]
    pub calendar_check: CalendarCheckConfig,
}
