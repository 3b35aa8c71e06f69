//! Mantle Client SDK.
//!
//! Typed access to the Mantle app API: customer identification, subscriptions,
//! usage events, invoices and usage metric reports.
//!
//! # Example
//!
//! ```no_run
//! use mantle_client::{ClientConfig, IdentifyParams, MantleClient, UsageEvent};
//!
//! # async fn example() -> Result<(), mantle_client::ClientError> {
//! let client = MantleClient::new(
//!     ClientConfig::new("your-app-id").with_api_key("your-app-api-key"),
//! )?;
//!
//! let identified = client
//!     .identify(&IdentifyParams {
//!         platform_id: Some("12345".to_string()),
//!         myshopify_domain: Some("my-store.myshopify.com".to_string()),
//!         ..IdentifyParams::default()
//!     })
//!     .await?;
//! println!("Customer token: {}", identified["apiToken"]);
//!
//! client
//!     .send_usage_event(&UsageEvent::new("api_call").with_generated_event_id())
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod case;
mod client;
mod config;
mod error;
mod types;

pub use client::MantleClient;
pub use config::{ClientConfig, ClientOptions, DEFAULT_BASE_URL};
pub use error::ClientError;
pub use types::*;
