//! Request parameter types for the Mantle client.
//!
//! Bodies serialize with `camelCase` keys and leave unset optional fields out
//! entirely rather than sending `null`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ClientError;

/// Default platform for identify and subscribe calls.
pub const DEFAULT_PLATFORM: &str = "shopify";

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Non-blank value of an optional string.
fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

#[allow(clippy::ref_option)]
fn is_blank_field(value: &Option<String>) -> bool {
    is_blank(value.as_deref())
}

#[allow(clippy::ref_option)]
fn is_empty_list(value: &Option<Vec<String>>) -> bool {
    value.as_ref().map_or(true, Vec::is_empty)
}

/// HTTP methods accepted by [`crate::MantleClient::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Upper-case method name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl FromStr for Method {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            _ => Err(ClientError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for identifying a customer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyParams {
    /// Platform-specific customer ID (Shopify shop ID, your own user ID, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_id: Option<String>,
    /// `*.myshopify.com` domain of the shop.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub myshopify_domain: Option<String>,
    /// Platform name (default: `"shopify"`).
    pub platform: String,
    /// Platform access token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Customer name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Customer email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Arbitrary custom fields stored on the customer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<Map<String, Value>>,
}

impl Default for IdentifyParams {
    fn default() -> Self {
        Self {
            platform_id: None,
            myshopify_domain: None,
            platform: DEFAULT_PLATFORM.to_string(),
            access_token: None,
            name: None,
            email: None,
            custom_fields: None,
        }
    }
}

impl IdentifyParams {
    /// Check the platform-specific identifier requirements.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] when the platform's identifier is missing.
    pub fn validate(&self) -> Result<(), ClientError> {
        let platform_id = self.platform_id.as_deref();
        match self.platform.as_str() {
            "shopify" if is_blank(platform_id) && is_blank(self.myshopify_domain.as_deref()) => {
                Err(ClientError::Validation(
                    "platformId or myshopifyDomain is required for the shopify platform".into(),
                ))
            }
            p @ ("web" | "mantle") if is_blank(platform_id) => Err(ClientError::Validation(
                format!("platformId is required for the {p} platform"),
            )),
            _ => Ok(()),
        }
    }
}

/// Parameters for subscribing the current customer to a plan.
///
/// Exactly one of `plan_id` and `plan_ids` must be set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeParams {
    /// Single plan to subscribe to.
    #[serde(skip_serializing_if = "is_blank_field")]
    pub plan_id: Option<String>,
    /// Several plans to subscribe to at once.
    #[serde(skip_serializing_if = "is_empty_list")]
    pub plan_ids: Option<Vec<String>>,
    /// Discount to apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_id: Option<String>,
    /// Where the platform redirects after confirmation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    /// Billing provider (default: `"shopify"`).
    pub billing_provider: String,
}

impl Default for SubscribeParams {
    fn default() -> Self {
        Self {
            plan_id: None,
            plan_ids: None,
            discount_id: None,
            return_url: None,
            billing_provider: DEFAULT_PLATFORM.to_string(),
        }
    }
}

impl SubscribeParams {
    /// Subscribe to a single plan.
    #[must_use]
    pub fn plan(plan_id: impl Into<String>) -> Self {
        Self {
            plan_id: Some(plan_id.into()),
            ..Self::default()
        }
    }

    /// Subscribe to several plans.
    #[must_use]
    pub fn plans<I, S>(plan_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            plan_ids: Some(plan_ids.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Check that exactly one plan mode is used.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] when neither or both of
    /// `plan_id` and `plan_ids` are set.
    pub fn validate(&self) -> Result<(), ClientError> {
        let single = !is_blank_field(&self.plan_id);
        let multi = !is_empty_list(&self.plan_ids);
        match (single, multi) {
            (false, false) => Err(ClientError::Validation(
                "either planId or planIds is required".into(),
            )),
            (true, true) => Err(ClientError::Validation(
                "planId and planIds are mutually exclusive".into(),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CancelSubscriptionBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CappedAmountBody<'a> {
    pub id: &'a str,
    pub capped_amount: f64,
}

/// A usage event for metering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageEvent {
    /// Name of the event, matched against usage metrics.
    pub event_name: String,
    /// Customer the event belongs to. Defaults to the token's customer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Idempotency key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// When the event happened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Free-form event properties.
    pub properties: Map<String, Value>,
}

impl UsageEvent {
    /// Create an event with no optional fields and empty properties.
    #[must_use]
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            customer_id: None,
            event_id: None,
            timestamp: None,
            properties: Map::new(),
        }
    }

    /// Set the customer ID.
    #[must_use]
    pub fn with_customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Set the idempotency key.
    #[must_use]
    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    /// Use a random UUID as the idempotency key.
    #[must_use]
    pub fn with_generated_event_id(self) -> Self {
        self.with_event_id(uuid::Uuid::new_v4().to_string())
    }

    /// Set the timestamp (RFC 3339, millisecond precision).
    #[must_use]
    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at.to_rfc3339_opts(SecondsFormat::Millis, true));
        self
    }

    /// Add a property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ClientError> {
        if self.event_name.trim().is_empty() {
            return Err(ClientError::required("eventName"));
        }
        Ok(())
    }
}

/// Aggregation period for usage metric reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportPeriod {
    /// Per day.
    #[default]
    Daily,
    /// Per week.
    Weekly,
    /// Per month.
    Monthly,
    /// Per year.
    Yearly,
}

impl ReportPeriod {
    /// All valid periods, in wire form.
    pub const ALL: [&'static str; 4] = ["daily", "weekly", "monthly", "yearly"];

    /// Wire name of the period.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl FromStr for ReportPeriod {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(ClientError::Validation(format!(
                "invalid period {other:?}, must be one of: {}",
                Self::ALL.join(", ")
            ))),
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query for listing invoices.
#[derive(Debug, Clone)]
pub struct InvoiceQuery {
    /// Zero-based page (default: 0).
    pub page: u32,
    /// Page size (default: 10).
    pub limit: u32,
    /// Restrict to one customer.
    pub customer_id: Option<String>,
}

impl Default for InvoiceQuery {
    fn default() -> Self {
        Self {
            page: 0,
            limit: 10,
            customer_id: None,
        }
    }
}

impl InvoiceQuery {
    pub(crate) fn to_query(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("page", &self.page.to_string())
            .append_pair("limit", &self.limit.to_string());
        if let Some(customer_id) = present(self.customer_id.as_ref()) {
            query.append_pair("customerId", customer_id);
        }
        query.finish()
    }
}

/// Parameters for a usage metric report.
#[derive(Debug, Clone)]
pub struct UsageMetricReportParams {
    /// Usage metric ID.
    pub id: String,
    /// Restrict to one customer.
    pub customer_id: Option<String>,
    /// One of `daily`, `weekly`, `monthly`, `yearly` (default: `daily`).
    pub period: String,
    /// Report start date.
    pub start_date: Option<String>,
    /// Report end date.
    pub end_date: Option<String>,
}

impl UsageMetricReportParams {
    /// Daily report for a metric.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            customer_id: None,
            period: ReportPeriod::default().to_string(),
            start_date: None,
            end_date: None,
        }
    }

    /// Set the period.
    #[must_use]
    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.period = period.into();
        self
    }

    /// Validate and build the request path, including the query string.
    ///
    /// The metric ID is percent-encoded as a single path segment.
    pub(crate) fn to_path(&self) -> Result<String, ClientError> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(ClientError::required("id"));
        }
        if matches!(id, "." | "..") {
            return Err(ClientError::Validation(format!("invalid usage metric id {id:?}")));
        }
        let period: ReportPeriod = self.period.parse()?;

        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair("period", period.as_str());
        if let Some(start) = present(self.start_date.as_ref()) {
            query.append_pair("startDate", start);
        }
        if let Some(end) = present(self.end_date.as_ref()) {
            query.append_pair("endDate", end);
        }
        if let Some(customer_id) = present(self.customer_id.as_ref()) {
            query.append_pair("customerId", customer_id);
        }

        Ok(format!(
            "usage_metric/{}/report?{}",
            urlencoding::encode(id),
            query.finish()
        ))
    }
}
