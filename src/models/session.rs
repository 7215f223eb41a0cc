use serde::{Deserialize, Serialize};

/// Panel connection details persisted under the `apiConfig` key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub auth: Credentials,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl ApiConfig {
    pub fn new(base_url: &str, username: &str, password: &str) -> Self {
        Self {
            base_url: base_url.trim().to_string(),
            auth: Credentials {
                username: username.to_string(),
                password: password.to_string(),
            },
        }
    }

    /// All of base URL, username and password are non-empty
    pub fn is_complete(&self) -> bool {
        !self.base_url.is_empty() && !self.auth.username.is_empty() && !self.auth.password.is_empty()
    }

    /// Base URL without trailing slashes
    pub fn server(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn is_https(&self) -> bool {
        self.base_url.to_ascii_lowercase().starts_with("https")
    }
}

/// Top-level lifecycle gate deciding which UI is mounted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppStatus {
    NeedsLoad,
    NeedsAuth,
    Ready,
}

impl Default for AppStatus {
    fn default() -> Self {
        Self::NeedsLoad
    }
}

impl std::fmt::Display for AppStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppStatus::NeedsLoad => write!(f, "needsLoad"),
            AppStatus::NeedsAuth => write!(f, "needsAuth"),
            AppStatus::Ready => write!(f, "ready"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_config_completeness() {
        assert!(ApiConfig::new("http://panel:8080", "user", "pass").is_complete());
        assert!(!ApiConfig::new("", "user", "pass").is_complete());
        assert!(!ApiConfig::new("http://panel", "", "pass").is_complete());
        assert!(!ApiConfig::new("http://panel", "user", "").is_complete());
        assert!(!ApiConfig::default().is_complete());
    }

    #[test]
    fn test_api_config_wire_format() {
        let config = ApiConfig::new("http://panel/", "u", "p");
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"baseUrl":"http://panel/","auth":{"username":"u","password":"p"}}"#);
        assert_eq!(config.server(), "http://panel");
    }

    #[test]
    fn test_partial_persisted_config_is_incomplete() {
        let config: ApiConfig = serde_json::from_str(r#"{"baseUrl":"http://panel"}"#).unwrap();
        assert!(!config.is_complete());
    }
}
