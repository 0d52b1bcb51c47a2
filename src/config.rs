use std::env;
use std::time::Duration;

use crate::error::{ApiError, ApiResult};

pub const DEFAULT_API_VERSION: u32 = 8;
pub const DEFAULT_API_REPORTS_VERSION: u32 = 2;
pub const DEFAULT_API_BASE_URL: &str = "https://api.track.toggl.com/api";
pub const DEFAULT_API_BASE_REPORTS_URL: &str = "https://api.track.toggl.com/reports/api";
pub const DEFAULT_USER_AGENT: &str = concat!("toggl_client/", env!("CARGO_PKG_VERSION"));

/// Env var holding the API token, read by `Config::token_from_env`
pub const TOKEN_ENV_VAR: &str = "TOGGL_API_KEY";

/// Options the `Api` is constructed with. Never changes once the client exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub api_version: u32,
    pub api_reports_version: u32,
    pub api_base_url: String,
    pub api_base_reports_url: String,
    /// Sent as the `User-Agent` header, and as the `user_agent` param the reports API requires.
    pub user_agent: String,
    /// Per-request timeout. `None` waits forever.
    pub timeout: Option<Duration>,

    /// Historical options. Accepted so older callers keep compiling; nothing reads them.
    pub api_username: Option<String>,
    pub api_password: Option<String>,
    pub api_workspace_name: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION,
            api_reports_version: DEFAULT_API_REPORTS_VERSION,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_base_reports_url: DEFAULT_API_BASE_REPORTS_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
            api_username: None,
            api_password: None,
            api_workspace_name: None,
        }
    }
}

impl Config {
    pub fn with_api_version(mut self, version: u32) -> Self {
        self.api_version = version;
        self
    }

    pub fn with_api_reports_version(mut self, version: u32) -> Self {
        self.api_reports_version = version;
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_api_base_reports_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_reports_url = url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Core API root, e.g. `https://api.track.toggl.com/api/v8`
    pub fn api_url(&self) -> String {
        format!(
            "{}/v{}",
            self.api_base_url.trim_end_matches('/'),
            self.api_version
        )
    }

    /// Reports API root, e.g. `https://api.track.toggl.com/reports/api/v2`
    pub fn reports_url(&self) -> String {
        format!(
            "{}/v{}",
            self.api_base_reports_url.trim_end_matches('/'),
            self.api_reports_version
        )
    }

    /// Defaults overridden by whatever `TOGGL_*` variables are set. A `.env` file in the
    /// working directory is loaded first if there is one.
    pub fn from_env() -> ApiResult<Self> {
        dotenv::dotenv().ok();
        let mut config = Config::default();
        if let Ok(url) = env::var("TOGGL_API_BASE_URL") {
            config.api_base_url = url;
        }
        if let Ok(url) = env::var("TOGGL_API_BASE_REPORTS_URL") {
            config.api_base_reports_url = url;
        }
        if let Ok(user_agent) = env::var("TOGGL_USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Ok(secs) = env::var("TOGGL_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ApiError::invalid(format!("TOGGL_TIMEOUT_SECS is not a number: {:?}", secs))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Reads the API token from `TOGGL_API_KEY`
    pub fn token_from_env() -> ApiResult<String> {
        dotenv::dotenv().ok();
        match env::var(TOKEN_ENV_VAR) {
            Ok(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(ApiError::invalid(format!(
                "need to set the {} env var",
                TOKEN_ENV_VAR
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_urls() {
        let config = Config::default();
        assert_eq!(config.api_url(), "https://api.track.toggl.com/api/v8");
        assert_eq!(
            config.reports_url(),
            "https://api.track.toggl.com/reports/api/v2"
        );
        assert!(config.timeout.is_none());
    }

    #[test]
    fn overrides_and_trailing_slash() {
        let config = Config::default()
            .with_api_base_url("http://localhost:1234/api/")
            .with_api_version(9)
            .with_api_base_reports_url("http://localhost:1234/reports/")
            .with_api_reports_version(3)
            .with_user_agent("me@example.com")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.api_url(), "http://localhost:1234/api/v9");
        assert_eq!(config.reports_url(), "http://localhost:1234/reports/v3");
        assert_eq!(config.user_agent, "me@example.com");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }

    const ENV_VARS: [&str; 5] = [
        TOKEN_ENV_VAR,
        "TOGGL_API_BASE_URL",
        "TOGGL_API_BASE_REPORTS_URL",
        "TOGGL_USER_AGENT",
        "TOGGL_TIMEOUT_SECS",
    ];

    // Everything touching the process environment lives in this one test.
    #[test]
    fn loads_from_env() {
        for var in ENV_VARS {
            env::remove_var(var);
        }

        assert_eq!(Config::from_env().unwrap(), Config::default());
        assert!(matches!(
            Config::token_from_env(),
            Err(ApiError::InvalidArgument(_))
        ));
        assert!(matches!(
            crate::api::Api::from_env(),
            Err(ApiError::InvalidArgument(_))
        ));

        env::set_var(TOKEN_ENV_VAR, "   ");
        assert!(matches!(
            Config::token_from_env(),
            Err(ApiError::InvalidArgument(_))
        ));

        env::set_var(TOKEN_ENV_VAR, "secret");
        env::set_var("TOGGL_API_BASE_URL", "http://localhost:9000/api");
        env::set_var("TOGGL_API_BASE_REPORTS_URL", "http://localhost:9000/reports");
        env::set_var("TOGGL_USER_AGENT", "env@example.com");
        env::set_var("TOGGL_TIMEOUT_SECS", " 7 ");
        assert_eq!(Config::token_from_env().unwrap(), "secret");
        let config = Config::from_env().unwrap();
        assert_eq!(config.api_url(), "http://localhost:9000/api/v8");
        assert_eq!(config.reports_url(), "http://localhost:9000/reports/v2");
        assert_eq!(config.user_agent, "env@example.com");
        assert_eq!(config.timeout, Some(Duration::from_secs(7)));

        let api = crate::api::Api::from_env().unwrap();
        assert_eq!(api.api_url(), "http://localhost:9000/api/v8");
        assert_eq!(api.config().timeout, Some(Duration::from_secs(7)));

        env::set_var("TOGGL_TIMEOUT_SECS", "soon");
        assert!(matches!(
            Config::from_env(),
            Err(ApiError::InvalidArgument(_))
        ));

        for var in ENV_VARS {
            env::remove_var(var);
        }
    }
}
