//! Mantle HTTP client implementation.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use crate::case::camelize_keys;
use crate::config::{ClientConfig, ClientOptions};
use crate::error::ClientError;
use crate::types::{
    CancelSubscriptionBody, CappedAmountBody, IdentifyParams, InvoiceQuery, Method,
    SubscribeParams, UsageEvent, UsageMetricReportParams,
};

const APP_ID_HEADER: &str = "X-Mantle-App-Id";
const API_KEY_HEADER: &str = "X-Mantle-App-Api-Key";
const CUSTOMER_TOKEN_HEADER: &str = "X-Mantle-Customer-Api-Token";

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

/// Mantle app API client.
///
/// Every endpoint validates its arguments before touching the network, so a
/// [`ClientError::Validation`] means no request was sent.
///
/// Responses are returned as parsed JSON without looking at the HTTP status.
/// An error reported by the API as a JSON body (`{"error": "..."}`) comes back
/// as `Ok`; check the payload for an `error` key.
#[derive(Debug, Clone)]
pub struct MantleClient {
    client: Client,
    config: ClientConfig,
    base_url: Url,
}

impl MantleClient {
    /// Create a new Mantle client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the app ID is missing, if neither
    /// credential is set, or if the base URL is not an absolute HTTP(S) URL.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Self::with_options(config, &ClientOptions::default())
    }

    /// Create a new Mantle client with custom options.
    ///
    /// # Errors
    ///
    /// As [`MantleClient::new`], plus a config error when an API key is
    /// supplied in a browser context, and an HTTP error if the transport
    /// cannot be built.
    pub fn with_options(config: ClientConfig, options: &ClientOptions) -> Result<Self, ClientError> {
        let base_url = validate_config(&config, options)?;

        let mut builder = Client::builder();
        if let Some(secs) = options.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            config,
            base_url,
        })
    }

    /// Create a client on top of an existing `reqwest` client.
    ///
    /// `options.timeout_seconds` is ignored; configure the given client instead.
    ///
    /// # Errors
    ///
    /// Same configuration checks as [`MantleClient::with_options`].
    pub fn with_http_client(
        config: ClientConfig,
        options: &ClientOptions,
        client: Client,
    ) -> Result<Self, ClientError> {
        let base_url = validate_config(&config, options)?;
        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// The configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a raw request to the Mantle API.
    ///
    /// `path` is resolved below the base URL (`customer` on `.../v1` becomes
    /// `.../v1/customer`). `method` must be one of GET, POST, PUT or DELETE.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UnsupportedMethod`] before any I/O for other
    /// methods, [`ClientError::Validation`] if `path` is an absolute URL or
    /// climbs out of the base path, and an HTTP or JSON error if the request
    /// or response parsing fails.
    pub async fn request(
        &self,
        path: &str,
        method: &str,
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let method: Method = method.parse()?;
        self.send(path, method, body).await
    }

    /// Identify a customer, creating or updating it in Mantle.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the platform's identifier is missing,
    /// otherwise any request error.
    pub async fn identify(&self, params: &IdentifyParams) -> Result<Value, ClientError> {
        params.validate()?;
        self.send("identify", Method::Post, Some(params)).await
    }

    /// Get the current customer.
    ///
    /// Returns the `customer` value of the response, or `Value::Null` if the
    /// response has none.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_customer(&self) -> Result<Value, ClientError> {
        let mut response = self.get("customer").await?;
        Ok(response
            .get_mut("customer")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    /// Subscribe the current customer to one plan or a set of plans.
    ///
    /// # Errors
    ///
    /// Returns a validation error unless exactly one of `plan_id` and
    /// `plan_ids` is set, otherwise any request error.
    pub async fn subscribe(&self, params: &SubscribeParams) -> Result<Value, ClientError> {
        params.validate()?;
        self.send("subscriptions", Method::Post, Some(params)).await
    }

    /// Cancel the current customer's subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn cancel_subscription(
        &self,
        cancel_reason: Option<&str>,
    ) -> Result<Value, ClientError> {
        let body = CancelSubscriptionBody { cancel_reason };
        self.send("subscriptions", Method::Delete, Some(&body)).await
    }

    /// Update the capped amount of a usage-billed subscription.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `id` is empty or `capped_amount` is not
    /// a finite number, otherwise any request error.
    pub async fn update_subscription_capped_amount(
        &self,
        id: &str,
        capped_amount: f64,
    ) -> Result<Value, ClientError> {
        if id.trim().is_empty() {
            return Err(ClientError::required("id"));
        }
        if !capped_amount.is_finite() {
            return Err(ClientError::Validation(
                "cappedAmount is required and must be a finite number".into(),
            ));
        }

        let body = CappedAmountBody { id, capped_amount };
        self.send("subscriptions", Method::Put, Some(&body)).await
    }

    /// Send a single usage event.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the event name is empty, otherwise any
    /// request error.
    pub async fn send_usage_event(&self, event: &UsageEvent) -> Result<Value, ClientError> {
        event.validate()?;
        self.send("usage_events", Method::Post, Some(event)).await
    }

    /// Send a batch of usage events.
    ///
    /// Each event may be a [`UsageEvent`] or any value serializing to a JSON
    /// object; its top-level keys are converted from `snake_case` to
    /// `camelCase`. Nested values such as `properties` are sent as given. An
    /// empty batch is sent as-is.
    ///
    /// # Errors
    ///
    /// Returns a validation error if an event is not a JSON object, a JSON
    /// error if one cannot be serialized, otherwise any request error.
    pub async fn send_usage_events<E: Serialize>(
        &self,
        events: &[E],
    ) -> Result<Value, ClientError> {
        let events = events
            .iter()
            .enumerate()
            .map(|(i, event)| match serde_json::to_value(event)? {
                Value::Object(map) => Ok(Value::Object(camelize_keys(map))),
                _ => Err(ClientError::Validation(format!(
                    "usage event at index {i} must be a JSON object"
                ))),
            })
            .collect::<Result<Vec<_>, ClientError>>()?;

        let mut body = Map::new();
        body.insert("events".into(), Value::Array(events));
        self.send("usage_events", Method::Post, Some(&body)).await
    }

    /// List invoices.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_invoices(&self, query: &InvoiceQuery) -> Result<Value, ClientError> {
        self.get(&format!("invoices?{}", query.to_query())).await
    }

    /// Get a usage metric report.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the metric ID is empty or the period is
    /// not one of daily, weekly, monthly or yearly, otherwise any request error.
    pub async fn usage_metric_report(
        &self,
        params: &UsageMetricReportParams,
    ) -> Result<Value, ClientError> {
        let path = params.to_path()?;
        self.get(&path).await
    }

    async fn get(&self, path: &str) -> Result<Value, ClientError> {
        self.send(path, Method::Get, None::<&Value>).await
    }

    /// Resolve `path` below the base URL. The result must keep the base
    /// origin and path prefix.
    fn resolve(&self, path: &str) -> Result<Url, ClientError> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        if url.origin() != self.base_url.origin() || !url.path().starts_with(self.base_url.path())
        {
            return Err(ClientError::Validation(format!(
                "path {path:?} resolves outside the base URL"
            )));
        }
        Ok(url)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        path: &str,
        method: Method,
        body: Option<&B>,
    ) -> Result<Value, ClientError> {
        let result = self.try_send(path, method, body).await;
        if let Err(e) = &result {
            tracing::error!(path, error = %e, "Mantle API request failed");
        }
        result
    }

    async fn try_send<B: Serialize + ?Sized>(
        &self,
        path: &str,
        method: Method,
        body: Option<&B>,
    ) -> Result<Value, ClientError> {
        let url = self.resolve(path)?;
        tracing::debug!(%method, path, "Mantle API request");

        let mut request = self
            .client
            .request(method.to_reqwest(), url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header(APP_ID_HEADER, &self.config.app_id);

        if let Some(key) = non_blank(self.config.api_key.as_ref()) {
            request = request.header(API_KEY_HEADER, key);
        }
        if let Some(token) = non_blank(self.config.customer_api_token.as_ref()) {
            request = request.header(CUSTOMER_TOKEN_HEADER, token);
        }
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }

        Self::execute(request).await
    }

    /// Send the request and parse the body as JSON, whatever the status.
    async fn execute(request: reqwest::RequestBuilder) -> Result<Value, ClientError> {
        let response = request.send().await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Check a config and return its base URL, normalized to end in `/`.
fn validate_config(config: &ClientConfig, options: &ClientOptions) -> Result<Url, ClientError> {
    if config.app_id.trim().is_empty() {
        return Err(ClientError::Config("appId is required".into()));
    }

    let api_key = non_blank(config.api_key.as_ref());
    let token = non_blank(config.customer_api_token.as_ref());
    if api_key.is_none() && token.is_none() {
        return Err(ClientError::Config(
            "apiKey or customerApiToken is required".into(),
        ));
    }
    if options.browser_context && api_key.is_some() {
        return Err(ClientError::Config(
            "apiKey must not be used in a browser context, use customerApiToken instead".into(),
        ));
    }

    let mut base_url = Url::parse(&config.base_url)
        .map_err(|e| ClientError::Config(format!("invalid baseUrl {:?}: {e}", config.base_url)))?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(ClientError::Config(format!(
            "baseUrl must use http or https, got {:?}",
            base_url.scheme()
        )));
    }
    if !base_url.path().ends_with('/') {
        let path = format!("{}/", base_url.path());
        base_url.set_path(&path);
    }

    Ok(base_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_BASE_URL;
    use tracing_test::traced_test;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> ClientConfig {
        ClientConfig::new("app_1").with_api_key("key")
    }

    #[test]
    fn client_creation() {
        let client = MantleClient::new(config()).unwrap();
        assert_eq!(client.base_url.as_str(), format!("{DEFAULT_BASE_URL}/"));
        assert_eq!(client.config().app_id, "app_1");
    }

    #[test]
    fn client_keeps_trailing_slash() {
        let client =
            MantleClient::new(config().with_base_url("http://localhost:4000/v1/")).unwrap();
        assert_eq!(client.base_url.as_str(), "http://localhost:4000/v1/");
    }

    #[test]
    fn missing_app_id() {
        let err = MantleClient::new(ClientConfig::new("").with_api_key("key")).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("appId"));
    }

    #[test]
    fn missing_credentials() {
        let err = MantleClient::new(ClientConfig::new("app_1")).unwrap_err();
        assert!(err.is_config());

        let blank = ClientConfig::new("app_1").with_customer_api_token("");
        assert!(MantleClient::new(blank).unwrap_err().is_config());
    }

    #[test]
    fn api_key_refused_in_browser() {
        let err = MantleClient::with_options(config(), &ClientOptions::browser()).unwrap_err();
        assert!(err.to_string().contains("browser"));

        let token_only = ClientConfig::new("app_1").with_customer_api_token("tok");
        assert!(MantleClient::with_options(token_only, &ClientOptions::browser()).is_ok());
    }

    #[test]
    fn bad_base_url() {
        let err = MantleClient::new(config().with_base_url("not a url")).unwrap_err();
        assert!(err.is_config());

        let err = MantleClient::new(config().with_base_url("ftp://example.com/v1")).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn resolve_appends_below_base() {
        let client = MantleClient::new(config()).unwrap();
        assert_eq!(
            client.resolve("customer").unwrap().as_str(),
            "https://appapi.heymantle.com/v1/customer"
        );
        assert_eq!(
            client.resolve("/usage_metric/m1/report?period=daily").unwrap().as_str(),
            "https://appapi.heymantle.com/v1/usage_metric/m1/report?period=daily"
        );
    }

    #[test]
    fn resolve_stays_below_base() {
        let client = MantleClient::new(config()).unwrap();
        for path in [
            "https://other.example.com/x",
            "../customer",
            "usage_metric/../../v2/customer",
        ] {
            let err = client.resolve(path).unwrap_err();
            assert!(err.is_validation(), "{path}: {err}");
        }
        assert!(client.resolve("usage_metric/../customer").is_ok());
        assert_eq!(
            client.resolve("//other.example.com/x").unwrap().as_str(),
            "https://appapi.heymantle.com/v1/other.example.com/x"
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn rejected_path_is_logged() {
        let client = MantleClient::new(config()).unwrap();
        let err = client
            .request("https://other.example.com/steal", "GET", None)
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(logs_contain("Mantle API request failed"));
        assert!(logs_contain("other.example.com"));
    }

    #[tokio::test]
    #[traced_test]
    async fn parse_failure_is_logged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/customer"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client =
            MantleClient::new(config().with_base_url(format!("{}/v1", server.uri()))).unwrap();
        let err = client.get_customer().await.unwrap_err();

        assert!(matches!(err, ClientError::Parse(_)));
        assert!(logs_contain("Mantle API request failed"));
        assert!(logs_contain("customer"));
    }
}
