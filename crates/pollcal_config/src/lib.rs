pub mod models;
pub mod secrets;

pub use models::{AppConfig, CalendarCheckConfig, DatabaseConfig, ProviderConfig};
pub use secrets::{EncryptionKey, SecretError};

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;

static DOTENV: OnceCell<()> = OnceCell::new();

/// Load `.env` exactly once per process. Later calls are no-ops.
pub fn ensure_dotenv_loaded() {
    DOTENV.get_or_init(|| {
        let _ = dotenv::dotenv();
    });
}

/// Loads the application configuration.
///
/// Sources, in increasing precedence:
/// 1. `config/default` (any format the `config` crate understands, optional)
/// 2. `config/{RUN_ENV}` (optional)
/// 3. environment variables with the `APP_` prefix and `__` separator,
///    e.g. `APP_DATABASE__URL` overrides `database.url`.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();
    let run_env = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".to_string());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{}", run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?
        .try_deserialize()
}
