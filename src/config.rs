use std::env;

/// Client configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Storage
    pub store_dir: String,

    // Xtream API
    pub fetch_timeout_ms: u64,
    pub user_agent: String,
    pub accept_invalid_certs: bool,

    // EPG
    pub epg_window_limit: usize,
    pub short_epg_limit: u32,

    // Bootstrap
    pub refresh_on_startup: bool,
    pub strict_bootstrap: bool,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            // Storage
            store_dir: env::var("STORE_DIR").unwrap_or_else(|_| ".ativeplay".to_string()),

            // Xtream API
            fetch_timeout_ms: env::var("FETCH_TIMEOUT_MS")
                .unwrap_or_else(|_| "30000".to_string())
                .parse()
                .unwrap_or(30_000), // 30 seconds

            user_agent: env::var("USER_AGENT").unwrap_or_else(|_| "AtivePlay/1.0".to_string()),

            // Many panels serve self-signed certificates
            accept_invalid_certs: env_flag("ACCEPT_INVALID_CERTS", true),

            // EPG
            epg_window_limit: env::var("EPG_WINDOW_LIMIT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),

            short_epg_limit: env::var("SHORT_EPG_LIMIT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),

            // Bootstrap
            refresh_on_startup: env_flag("REFRESH_ON_STARTUP", true),
            strict_bootstrap: env_flag("STRICT_BOOTSTRAP", false),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: ".ativeplay".to_string(),
            fetch_timeout_ms: 30_000,
            user_agent: "AtivePlay/1.0".to_string(),
            accept_invalid_certs: true,
            epg_window_limit: 10,
            short_epg_limit: 5,
            refresh_on_startup: true,
            strict_bootstrap: false,
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| parse_flag(&v))
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_default_bounds() {
        let config = Config::default();
        assert_eq!(config.epg_window_limit, 10);
        assert!(config.refresh_on_startup);
        assert!(!config.strict_bootstrap);
    }
}
