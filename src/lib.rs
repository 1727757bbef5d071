//! OAuth 2.0 client for a marketplace REST API.
//!
//! The client builds authorization URLs, exchanges authorization codes, refreshes expired
//! tokens transparently, and wraps the API endpoints over a pluggable HTTP transport.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ext;
pub mod flows;
pub mod http;
pub mod market;
pub mod oauth;
pub mod obs;
pub mod store;
#[cfg(feature = "reqwest")]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{config::ClientConfig, flows::MarketClient, http::ReqwestTransport};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = MarketClient<ReqwestTransport>;

	/// Builds a reqwest transport that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}

	/// Builds a [`ClientConfig`] whose API base and token endpoints point at `base_url`.
	pub fn test_config(base_url: &str, client_id: &str, client_secret: &str) -> ClientConfig {
		ClientConfig::builder(
			Url::parse(base_url).expect("Failed to parse test API base URL."),
			client_id,
			client_secret,
		)
		.redirect_uri(
			Url::parse("https://app.example.com/callback")
				.expect("Failed to parse test redirect URI."),
		)
		.build()
		.expect("Failed to build test client configuration.")
	}

	/// Constructs a [`MarketClient`] backed by the reqwest transport used across integration
	/// tests.
	pub fn build_reqwest_test_client(
		base_url: &str,
		client_id: &str,
		client_secret: &str,
	) -> ReqwestTestClient {
		MarketClient::with_transport(
			test_config(base_url, client_id, client_secret),
			test_reqwest_transport(),
		)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
