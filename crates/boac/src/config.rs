use std::{env, time::Duration};

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoacEnv {
    Development,
    Production,
}

impl BoacEnv {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file (default: "boac.db")
    pub sqlite_path: String,
    /// Root directory of the attachment file store (default: "attachments")
    pub attachments_dir: String,
    /// Per-file attachment limit in megabytes (default: 20)
    pub max_attachment_size_mb: u64,
    /// Departments offering drop-in advising (default: COENG, QCADV)
    pub drop_in_departments: Vec<String>,
    /// Raw JSON array of `[pattern, vue_path]` pairs
    pub vue_paths: Option<String>,
    /// Dev server of the Vue front-end, if any
    pub vue_localhost_base_url: Option<String>,
    /// Legacy front-end entry point (default: "index.html")
    pub index_html: String,
    /// Vue front-end entry point (default: "vue/index.html")
    pub index_html_vue: String,
    pub environment: BoacEnv,
    /// Request timeout in seconds (default: 30)
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SQLITE_PATH` - SQLite database path (default: "boac.db")
    /// - `ATTACHMENTS_DIR` - attachment root directory (default: "attachments")
    /// - `MAX_ATTACHMENT_SIZE_MB` - per-file upload limit (default: 20)
    /// - `DEPARTMENTS_SUPPORTING_DROP_INS` - comma-separated department codes
    /// - `VUE_PATHS` - JSON array of `[pattern, vue_path]` redirects
    /// - `VUE_LOCALHOST_BASE_URL` - redirect target in front-end development
    /// - `INDEX_HTML` / `INDEX_HTML_VUE` - front-end entry points
    /// - `BOAC_ENV` - "development" or "production" (default: "production")
    /// - `REQUEST_TIMEOUT_SECS` - request timeout (default: 30)
    pub fn from_env() -> Self {
        Self {
            sqlite_path: env::var("SQLITE_PATH").unwrap_or_else(|_| "boac.db".to_string()),
            attachments_dir: env::var("ATTACHMENTS_DIR")
                .unwrap_or_else(|_| "attachments".to_string()),
            max_attachment_size_mb: env::var("MAX_ATTACHMENT_SIZE_MB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
            drop_in_departments: env::var("DEPARTMENTS_SUPPORTING_DROP_INS")
                .map(|v| parse_list(&v))
                .unwrap_or_else(|_| vec!["COENG".to_string(), "QCADV".to_string()]),
            vue_paths: non_blank(env::var("VUE_PATHS").ok()),
            vue_localhost_base_url: non_blank(env::var("VUE_LOCALHOST_BASE_URL").ok()),
            index_html: env::var("INDEX_HTML").unwrap_or_else(|_| "index.html".to_string()),
            index_html_vue: env::var("INDEX_HTML_VUE")
                .unwrap_or_else(|_| "vue/index.html".to_string()),
            environment: env::var("BOAC_ENV")
                .ok()
                .and_then(|v| BoacEnv::parse(&v))
                .unwrap_or(BoacEnv::Production),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == BoacEnv::Development
    }

    pub fn max_attachment_bytes(&self) -> usize {
        usize::try_from(self.max_attachment_size_mb.saturating_mul(1024 * 1024))
            .unwrap_or(usize::MAX)
    }

    /// Body limit for multipart requests: room for several files at the limit.
    pub fn request_body_limit(&self) -> usize {
        self.max_attachment_bytes().saturating_mul(4)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
