//! Demonstrates plugging a non-reqwest HTTP stack into [`MarketClient`].
//!
//! 1. Implement [`HttpTransport`] so every response that reaches the client is returned as `Ok`,
//!    whatever its status.
//! 2. Report network failures through [`TransportError::network`].
//! 3. Pass the transport to [`MarketClient::with_transport`] and seed a token.

// std
use std::{
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	sync::atomic::{AtomicUsize, Ordering},
};
// crates.io
use color_eyre::Result;
use oauth2::{
	HttpRequest, HttpResponse,
	http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
};
use url::Url;
// self
use market_oauth2_client::{
	auth::Token,
	config::ClientConfig,
	error::TransportError,
	flows::MarketClient,
	http::{HttpTransport, TransportFuture},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let client =
		MarketClient::<MockTransport>::with_transport(demo_config()?, MockTransport::success())
			.with_token(demo_token()?);
	let profile = client.username().await?;
	let username = profile.get("username").and_then(|value| value.as_str()).unwrap_or("<none>");

	println!("Username served by the mock transport: {username}.");
	println!(
		"The first call hit an expired token; refreshes performed: {}.",
		client.refresh_metrics.successes()
	);

	let failing = MarketClient::<MockTransport>::with_transport(
		demo_config()?,
		MockTransport::failure(MockTransportError::DnsFailure { host: "api.example.com" }),
	)
	.with_token(demo_token()?);

	match failing.username().await {
		Ok(_) => println!("Mock transport unexpectedly succeeded."),
		Err(e) => println!("Transport error surfaced by the client: {e}."),
	}

	Ok(())
}

fn demo_config() -> Result<ClientConfig> {
	Ok(ClientConfig::builder(
		Url::parse("https://api.example.com/v3/")?,
		"demo-client",
		"demo-secret",
	)
	.build()?)
}

fn demo_token() -> Result<Token> {
	Ok(Token::builder().access_token("access-demo").refresh_token("refresh-demo").build()?)
}

#[derive(Clone, Debug)]
enum MockTransportError {
	DnsFailure { host: &'static str },
}
impl Display for MockTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::DnsFailure { host } => write!(f, "DNS lookup failed for {host}"),
		}
	}
}
impl StdError for MockTransportError {}

/// Answers the first API call with an expiry signal, then serves canned JSON.
struct MockTransport {
	failure: Option<MockTransportError>,
	api_calls: AtomicUsize,
}
impl MockTransport {
	fn success() -> Self {
		Self { failure: None, api_calls: AtomicUsize::new(0) }
	}

	fn failure(error: MockTransportError) -> Self {
		Self { failure: Some(error), api_calls: AtomicUsize::new(0) }
	}

	fn respond(&self, request: &HttpRequest) -> (StatusCode, &'static str) {
		if request.uri().path() == "/token" {
			return (
				StatusCode::OK,
				r#"{"access_token":"access-fresh","token_type":"bearer","expires_in":3600}"#,
			);
		}

		match self.api_calls.fetch_add(1, Ordering::SeqCst) {
			0 => (
				StatusCode::UNAUTHORIZED,
				r#"{"error":"invalid_token","error_description":"Token already expired"}"#,
			),
			_ => (StatusCode::OK, r#"{"username":"demo-user"}"#),
		}
	}
}
impl HttpTransport for MockTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let outcome = match &self.failure {
			Some(error) => Err(TransportError::network(error.clone())),
			None => {
				let (status, body) = self.respond(&request);
				let mut response = HttpResponse::new(body.as_bytes().to_vec());

				*response.status_mut() = status;
				response
					.headers_mut()
					.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

				Ok(response)
			},
		};

		Box::pin(async move { outcome })
	}
}
