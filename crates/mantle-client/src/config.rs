//! Client configuration.

use std::fmt;

/// Default Mantle app API URL.
pub const DEFAULT_BASE_URL: &str = "https://appapi.heymantle.com/v1";

/// Credentials and endpoint used by [`crate::MantleClient`].
///
/// Validation happens when the client is built, not here, so a config can be
/// assembled piecemeal.
#[derive(Clone)]
pub struct ClientConfig {
    /// Mantle app identifier, sent on every request.
    pub app_id: String,

    /// Server-side app API key. Never ship this to a browser.
    pub api_key: Option<String>,

    /// Per-customer API token, safe for client-side use.
    pub customer_api_token: Option<String>,

    /// API base URL (default: `https://appapi.heymantle.com/v1`).
    pub base_url: String,
}

impl ClientConfig {
    /// Create a config for an app with no credentials yet.
    #[must_use]
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            api_key: None,
            customer_api_token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Set the app API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the customer API token.
    #[must_use]
    pub fn with_customer_api_token(mut self, token: impl Into<String>) -> Self {
        self.customer_api_token = Some(token.into());
        self
    }

    /// Set the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `MANTLE_APP_ID`, `MANTLE_API_KEY`, `MANTLE_CUSTOMER_API_TOKEN`
    /// and `MANTLE_API_URL`. Blank values count as unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            app_id: get("MANTLE_APP_ID").unwrap_or_default(),
            api_key: get("MANTLE_API_KEY"),
            customer_api_token: get("MANTLE_CUSTOMER_API_TOKEN"),
            base_url: get("MANTLE_API_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("ClientConfig")
            .field("app_id", &self.app_id)
            .field("api_key", &redact(&self.api_key))
            .field("customer_api_token", &redact(&self.customer_api_token))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Client options for customization.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: none, the transport waits).
    pub timeout_seconds: Option<u64>,

    /// Set when the client runs in a browser or other untrusted frontend.
    /// Building a client with an API key is then refused.
    pub browser_context: bool,
}

impl ClientOptions {
    /// Options with a request timeout.
    #[must_use]
    pub fn with_timeout(seconds: u64) -> Self {
        Self {
            timeout_seconds: Some(seconds),
            ..Self::default()
        }
    }

    /// Options for a browser/frontend execution context.
    #[must_use]
    pub fn browser() -> Self {
        Self {
            browser_context: true,
            ..Self::default()
        }
    }
}
