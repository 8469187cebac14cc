//! Application-wide constants

use std::time::Duration;

/// Directory and file names under the Lumen home directory
pub mod fs {
    pub const HOME_DIR_NAME: &str = ".lumen";
    pub const HOME_ENV_VAR: &str = "LUMEN_HOME";
    pub const CONFIG_FILE_NAME: &str = "config.toml";
    pub const CATALOG_FILE_NAME: &str = "assets.json";
    pub const ASSETS_DIR_NAME: &str = "assets";
    pub const LOGS_DIR_NAME: &str = "logs";
    pub const LOG_FILE_NAME: &str = "lumen.log";
}

/// Presence session timing
pub mod session {
    use super::Duration;

    /// How often the published presence is refreshed
    pub const REFRESH_INTERVAL: Duration = Duration::from_secs(15);
    /// Upper bound on a single publish call
    pub const PUBLISH_TIMEOUT: Duration = Duration::from_secs(10);
    /// Upper bound on opening the transport
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Asset catalog limits
pub mod assets {
    /// Largest accepted source image (8 MiB)
    pub const MAX_ASSET_BYTES: u64 = 8 * 1024 * 1024;
}
