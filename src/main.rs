//! User management REST API.
//! Reads configuration from TOML file (~/.config/user-api/config.toml).

use tracing::{error, info};

use user_api::server::{init_tracing, run};
use user_api::{default_config_path, AppConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = std::env::var("USER_API_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| default_config_path());
    let config = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            init_tracing(&cfg.logging);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            let cfg = AppConfig::from_env();
            init_tracing(&cfg.logging);
            error!("Failed to load config: {}. Using defaults.", e);
            cfg
        }
    };

    info!("Starting user management API...");
    run(config).await
}
