// Configuration module entry point
// Loads layered configuration and holds the shared application state

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{Config, UploadConfig};

/// Environment variable prefix, e.g. `IMAGE_HOST_SERVER__PORT=8080`
const ENV_PREFIX: &str = "IMAGE_HOST";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3333)?
            .set_default("storage.upload_dir", "uploads")?
            .set_default("storage.public_prefix", "/uploads")?
            .set_default("upload.max_body_size", 10_485_760)? // 10MiB
            .set_default("upload.field_name", "image")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.idle_timeout", 75)?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut cfg: Self = settings.try_deserialize()?;
        cfg.storage.public_prefix = normalize_prefix(&cfg.storage.public_prefix);
        check_prefix(&cfg.storage.public_prefix)?;
        Ok(cfg)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

/// Leading slash, no trailing slash: `uploads/` becomes `/uploads`
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    format!("/{trimmed}")
}

/// The static route can't own the root or live under `/api`
fn check_prefix(prefix: &str) -> Result<(), config::ConfigError> {
    if prefix == "/" || prefix == "/api" || prefix.starts_with("/api/") {
        return Err(config::ConfigError::Message(format!(
            "storage.public_prefix '{prefix}' collides with the root or /api routes"
        )));
    }
    Ok(())
}
