use std::time::Duration;

/// Session and login configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub session_ttl: Duration,
    pub cookie_name: String,
    pub cookie_secure: bool,
    /// Allows password login by UID, for development and test deployments.
    pub dev_auth_enabled: bool,
    pub dev_auth_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(12 * 60 * 60),
            cookie_name: "boac_session".to_string(),
            cookie_secure: true,
            dev_auth_enabled: false,
            dev_auth_password: None,
        }
    }
}

impl AuthConfig {
    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SESSION_TTL_HOURS`: Session TTL in hours (default: 12)
    /// - `COOKIE_NAME`: Session cookie name (default: `boac_session`)
    /// - `COOKIE_SECURE`: Whether to set secure flag on cookies (default: true)
    /// - `DEV_AUTH_ENABLED`: Enables `/auth/dev_auth_login` (default: false)
    /// - `DEV_AUTH_PASSWORD`: Shared password for dev auth
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let session_ttl = std::env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(|hours| Duration::from_secs(hours * 60 * 60))
            .unwrap_or(defaults.session_ttl);

        let cookie_secure = std::env::var("COOKIE_SECURE")
            .map(|v| is_truthy(&v))
            .unwrap_or(defaults.cookie_secure);

        let dev_auth_enabled = std::env::var("DEV_AUTH_ENABLED")
            .map(|v| is_truthy(&v))
            .unwrap_or(defaults.dev_auth_enabled);

        Self {
            session_ttl,
            cookie_name: std::env::var("COOKIE_NAME").unwrap_or(defaults.cookie_name),
            cookie_secure,
            dev_auth_enabled,
            dev_auth_password: std::env::var("DEV_AUTH_PASSWORD").ok(),
        }
    }

    /// Dev auth settings for tests and local runs.
    pub fn with_dev_auth(mut self, password: impl Into<String>) -> Self {
        self.dev_auth_enabled = true;
        self.dev_auth_password = Some(password.into());
        self
    }

    pub(crate) fn session_ttl_seconds(&self) -> i64 {
        i64::try_from(self.session_ttl.as_secs()).unwrap_or(i64::MAX)
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.session_ttl_seconds(), 43_200);
        assert_eq!(config.cookie_name, "boac_session");
        assert!(!config.dev_auth_enabled);
    }

    #[test]
    fn test_with_dev_auth() {
        let config = AuthConfig::default().with_dev_auth("another megaphone man");
        assert!(config.dev_auth_enabled);
        assert_eq!(
            config.dev_auth_password.as_deref(),
            Some("another megaphone man")
        );
    }
}
