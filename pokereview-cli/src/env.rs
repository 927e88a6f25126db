//! `.env` loading
//!
//! Priority: process environment > `./.env` > `~/.pokereview/.env`.
//! dotenvy never overwrites variables that are already set.

use tracing::debug;

use pokereview_server::AppConfig;

pub fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded .env from current directory: {}", path.display());
    }

    let env_file = AppConfig::config_dir().join(".env");
    if env_file.exists() {
        match dotenvy::from_path(&env_file) {
            Ok(()) => debug!("Loaded .env from {}", env_file.display()),
            Err(e) => debug!("Failed to load {}: {}", env_file.display(), e),
        }
    }
}
