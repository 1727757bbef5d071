#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use market_oauth2_client::{_preludet::*, auth::TokenSecret, error::AuthError};

const CLIENT_ID: &str = "client-it";
const CLIENT_SECRET: &str = "secret-it";

#[tokio::test]
async fn start_authorization_and_exchange_successfully_store_tokens() {
	let server = MockServer::start_async().await;
	let client = build_reqwest_test_client(&server.url("/v1/"), CLIENT_ID, CLIENT_SECRET);
	let session = client.start_authorization().expect("Authorization session should start.");

	assert_eq!(session.redirect_uri.as_str(), "https://app.example.com/callback");
	assert_eq!(session.state.len(), 32);
	assert!(session.validate_state(session.state.as_str()).is_ok());
	assert_eq!(session.authorize_url.path(), "/authorization");

	let authorize_pairs: HashMap<_, _> = session.authorize_url.query_pairs().into_owned().collect();

	assert_eq!(authorize_pairs.get("response_type"), Some(&"code".into()));
	assert_eq!(authorize_pairs.get("client_id"), Some(&CLIENT_ID.into()));
	assert_eq!(
		authorize_pairs.get("redirect_uri"),
		Some(&"https://app.example.com/callback".into())
	);
	assert_eq!(authorize_pairs.get("state"), Some(&session.state));

	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200)
				.header("content-type", "application/json")
				.body(
					"{\"access_token\":\"access-success\",\"refresh_token\":\"refresh-success\",\"token_type\":\"bearer\",\"expires_in\":3600}",
				);
		})
		.await;
	let state = session.state.clone();
	let token = client
		.exchange_session(session, &state, "auth-code-123")
		.await
		.expect("Authorization code exchange should succeed.");

	mock.assert_async().await;

	assert_eq!(token.access_token.expose(), "access-success");
	assert_eq!(token.refresh_token.as_ref().map(TokenSecret::expose), Some("refresh-success"));
	assert!(!token.is_expired());

	let stored = client.token().expect("Exchanged token should be stored.");

	assert_eq!(stored.access_token.expose(), "access-success");
}

#[tokio::test]
async fn exchange_session_rejects_mismatched_state_without_network() {
	let server = MockServer::start_async().await;
	let client = build_reqwest_test_client(&server.url("/v1/"), CLIENT_ID, CLIENT_SECRET);
	let session = client.start_authorization().expect("Authorization session should start.");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(500);
		})
		.await;
	let err = client
		.exchange_session(session, "forged-state", "auth-code-123")
		.await
		.expect_err("Mismatched state should fail.");

	assert!(matches!(err, Error::Auth(AuthError::StateMismatch)));

	mock.assert_calls_async(0).await;

	assert!(client.token().is_none());
}

#[tokio::test]
async fn exchange_code_classifies_invalid_grant() {
	let server = MockServer::start_async().await;
	let client = build_reqwest_test_client(&server.url("/v1/"), CLIENT_ID, CLIENT_SECRET);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"code already used\"}");
		})
		.await;
	let redirect = Url::parse("https://app.example.com/callback")
		.expect("Redirect URI should parse successfully.");
	let err = client
		.exchange_code("auth-code-used", &redirect)
		.await
		.expect_err("Reused codes should be rejected.");

	mock.assert_async().await;

	match err {
		Error::Auth(AuthError::InvalidGrant { reason }) =>
			assert!(reason.contains("code already used")),
		other => panic!("Unexpected error variant: {other:?}."),
	}

	assert!(client.token().is_none());
}

#[tokio::test]
async fn exchange_code_reports_unreachable_token_endpoint() {
	let client = build_reqwest_test_client("http://127.0.0.1:9/v1/", CLIENT_ID, CLIENT_SECRET);
	let redirect = Url::parse("https://app.example.com/callback")
		.expect("Redirect URI should parse successfully.");
	let err = client
		.exchange_code("auth-code", &redirect)
		.await
		.expect_err("Closed ports cannot issue tokens.");

	assert!(matches!(err, Error::Auth(AuthError::Transport(_))));
}
