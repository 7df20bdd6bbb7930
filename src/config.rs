// Client configuration.
// OAuth application credentials and the endpoints the client talks to.

use std::fmt;

use url::Url;

use crate::error::{GistError, Result};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
pub const DEFAULT_SCOPE: &str = "gist";

const CLIENT_ID_VAR: &str = "GISTKIT_CLIENT_ID";
const CLIENT_SECRET_VAR: &str = "GISTKIT_CLIENT_SECRET";
const API_BASE_VAR: &str = "GISTKIT_API_BASE";

/// Settings shared by the API client and the OAuth flow.
#[derive(Clone)]
pub struct GistConfig {
    pub client_id: String,
    pub client_secret: String,
    pub api_base: Url,
    pub authorize_url: Url,
    pub token_url: Url,
    /// OAuth scope requested at login.
    pub scope: String,
    pub user_agent: String,
}

impl GistConfig {
    /// Create a config for the given OAuth application, pointing at github.com.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_base: Url::parse(DEFAULT_API_BASE)?,
            authorize_url: Url::parse(DEFAULT_AUTHORIZE_URL)?,
            token_url: Url::parse(DEFAULT_TOKEN_URL)?,
            scope: DEFAULT_SCOPE.to_string(),
            user_agent: format!("gistkit/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Create a config from the GISTKIT_CLIENT_ID and GISTKIT_CLIENT_SECRET
    /// environment variables. GISTKIT_API_BASE optionally overrides the API base.
    pub fn from_env() -> Result<Self> {
        let client_id = required_var(CLIENT_ID_VAR)?;
        let client_secret = required_var(CLIENT_SECRET_VAR)?;
        let config = Self::new(client_id, client_secret)?;

        match std::env::var(API_BASE_VAR) {
            Ok(base) if !base.is_empty() => config.with_api_base(&base),
            _ => Ok(config),
        }
    }

    pub fn with_api_base(mut self, base: &str) -> Result<Self> {
        let url = Url::parse(base)?;
        if url.cannot_be_a_base() {
            return Err(GistError::Config(format!("API base cannot be a base URL: {}", base)));
        }
        self.api_base = url;
        Ok(self)
    }

    pub fn with_oauth_urls(mut self, authorize_url: &str, token_url: &str) -> Result<Self> {
        self.authorize_url = Url::parse(authorize_url)?;
        self.token_url = Url::parse(token_url)?;
        Ok(self)
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl fmt::Debug for GistConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GistConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("api_base", &self.api_base.as_str())
            .field("authorize_url", &self.authorize_url.as_str())
            .field("token_url", &self.token_url.as_str())
            .field("scope", &self.scope)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn required_var(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(GistError::Config(format!("Missing {} environment variable", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GistConfig::new("id", "secret").unwrap();
        assert_eq!(config.api_base.as_str(), "https://api.github.com/");
        assert_eq!(config.authorize_url.as_str(), DEFAULT_AUTHORIZE_URL);
        assert_eq!(config.token_url.as_str(), DEFAULT_TOKEN_URL);
        assert_eq!(config.scope, "gist");
        assert!(config.user_agent.starts_with("gistkit/"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = GistConfig::new("id", "hunter2").unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_rejects_bad_api_base() {
        let config = GistConfig::new("id", "secret").unwrap();
        assert!(matches!(
            config.clone().with_api_base("not a url"),
            Err(GistError::MalformedUrl(_))
        ));
        assert!(matches!(
            config.with_api_base("mailto:someone@example.com"),
            Err(GistError::Config(_))
        ));
    }
}
