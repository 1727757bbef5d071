//! Token-endpoint facade built on the `oauth2` crate.
//!
//! The facade sends every grant through the client's [`HttpTransport`] (via
//! [`TransportHandle`]) with credentials in the form body, and maps `oauth2` request errors
//! into [`AuthError`] variants.

pub use oauth2;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RedirectUrl, RefreshToken, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicErrorResponseType, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::{Token, TokenSecret},
	config::{ClientConfig, source},
	error::{AuthError, ConfigError, TransportError},
	http::{HttpTransport, ResponseMetadata, ResponseMetadataSlot, TransportHandle},
};

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type FacadeTokenResponse = oauth2::basic::BasicTokenResponse;

/// Issues `authorization_code` and `refresh_token` grants against the token endpoint.
pub(crate) struct TokenFacade<'t, T>
where
	T: ?Sized + HttpTransport,
{
	oauth_client: ConfiguredBasicClient,
	transport: &'t T,
}
impl<'t, T> TokenFacade<'t, T>
where
	T: ?Sized + HttpTransport,
{
	pub(crate) fn from_config(config: &ClientConfig, transport: &'t T) -> Result<Self> {
		let auth_url = AuthUrl::new(config.authorization_endpoint.to_string()).map_err(|source| {
			ConfigError::InvalidUrl { key: source::AUTHORIZATION_ENDPOINT, source }
		})?;
		let token_url = TokenUrl::new(config.token_endpoint.to_string())
			.map_err(|source| ConfigError::InvalidUrl { key: source::TOKEN_ENDPOINT, source })?;
		let oauth_client = BasicClient::new(ClientId::new(config.client_id.clone()))
			.set_client_secret(ClientSecret::new(config.client_secret.clone()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_auth_type(AuthType::RequestBody);

		Ok(Self { oauth_client, transport })
	}

	/// Exchanges an authorization code for a token pair.
	pub(crate) async fn exchange_code(&self, code: &str, redirect_uri: &Url) -> Result<Token> {
		let meta = ResponseMetadataSlot::default();
		let handle = TransportHandle::new(self.transport, meta.clone());
		let redirect_url = RedirectUrl::new(redirect_uri.to_string())
			.map_err(|source| ConfigError::InvalidUrl { key: source::APP_REDIRECT_URI, source })?;
		let response = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.set_redirect_uri(Cow::Owned(redirect_url))
			.request_async(&handle)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		map_token_response(response)
	}

	/// Redeems `refresh_token` for a new access token.
	///
	/// The returned token carries a refresh token only when the provider rotated it.
	pub(crate) async fn refresh_token(
		&self,
		refresh_token: &TokenSecret,
		redirect_uri: Option<&Url>,
	) -> Result<Token> {
		let meta = ResponseMetadataSlot::default();
		let handle = TransportHandle::new(self.transport, meta.clone());
		let refresh_secret = RefreshToken::new(refresh_token.expose().to_owned());
		let mut request = self.oauth_client.exchange_refresh_token(&refresh_secret);

		if let Some(redirect) = redirect_uri {
			request = request.add_extra_param("redirect_uri", redirect.to_string());
		}

		let response = request
			.request_async(&handle)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		map_token_response(response)
	}
}

fn map_token_response(response: FacadeTokenResponse) -> Result<Token> {
	let mut builder = Token::builder()
		.access_token(response.access_token().secret().to_owned())
		.token_type(response.token_type().as_ref().to_owned())
		.issued_at(OffsetDateTime::now_utc());

	if let Some(lifetime) = response.expires_in().and_then(|value| Duration::try_from(value).ok())
	{
		builder = builder.expires_in(lifetime);
	}
	if let Some(refresh) = response.refresh_token() {
		builder = builder.refresh_token(refresh.secret().to_owned());
	}

	builder.build().map_err(|err| {
		AuthError::Rejected { message: err.to_string(), status: None }.into()
	})
}

fn map_request_error(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<TransportError>>,
) -> Error {
	let status = meta.and_then(|value| value.status);

	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(response, status),
		RequestTokenError::Request(error) => map_transport_error(error, status),
		RequestTokenError::Parse(source, _body) =>
			AuthError::MalformedResponse { source, status }.into(),
		RequestTokenError::Other(message) => AuthError::Rejected { message, status }.into(),
	}
}

fn map_server_response_error(response: BasicErrorResponse, status: Option<u16>) -> Error {
	let reason = match response.error_description() {
		Some(description) => format!("{}: {description}", response.error().as_ref()),
		None => response.error().as_ref().to_owned(),
	};

	match response.error() {
		BasicErrorResponseType::InvalidGrant => AuthError::InvalidGrant { reason },
		BasicErrorResponseType::InvalidClient | BasicErrorResponseType::UnauthorizedClient =>
			AuthError::InvalidClient { reason },
		_ => AuthError::Rejected { message: reason, status },
	}
	.into()
}

fn map_transport_error(err: HttpClientError<TransportError>, status: Option<u16>) -> Error {
	match err {
		HttpClientError::Reqwest(inner) => AuthError::Transport(*inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => AuthError::Transport(TransportError::Io(inner)).into(),
		HttpClientError::Other(message) => AuthError::Rejected { message, status }.into(),
		_ => AuthError::Rejected {
			message: "HTTP client error occurred while calling the token endpoint".into(),
			status,
		}
		.into(),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::{
		HttpRequest, HttpResponse,
		http::{HeaderValue, Response, StatusCode, header::CONTENT_TYPE},
	};
	// self
	use super::*;
	use crate::http::TransportFuture;

	struct CannedTransport {
		status: StatusCode,
		body: &'static str,
		requests: Mutex<Vec<String>>,
	}
	impl CannedTransport {
		fn new(status: StatusCode, body: &'static str) -> Self {
			Self { status, body, requests: Mutex::new(Vec::new()) }
		}
	}
	impl HttpTransport for CannedTransport {
		fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
			self.requests.lock().push(String::from_utf8_lossy(request.body()).into_owned());

			let mut response: HttpResponse = Response::new(self.body.as_bytes().to_vec());

			*response.status_mut() = self.status;
			response
				.headers_mut()
				.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

			Box::pin(async move { Ok(response) })
		}
	}

	fn config() -> ClientConfig {
		ClientConfig::builder(
			Url::parse("https://api.example.com/v1/").expect("Base URL fixture should parse."),
			"client-id",
			"client-secret",
		)
		.build()
		.expect("Configuration fixture should build.")
	}

	#[tokio::test]
	async fn exchange_code_posts_credentials_in_body() {
		let transport = CannedTransport::new(
			StatusCode::OK,
			r#"{"access_token":"a1","refresh_token":"r1","token_type":"bearer","expires_in":3600}"#,
		);
		let config = config();
		let facade = TokenFacade::from_config(&config, &transport).expect("Facade should build.");
		let redirect = Url::parse("https://app.example.com/cb").expect("Redirect should parse.");
		let token = facade.exchange_code("code-1", &redirect).await.expect("Exchange should work.");

		assert_eq!(token.access_token.expose(), "a1");
		assert_eq!(token.refresh_token.as_ref().map(TokenSecret::expose), Some("r1"));
		assert!(token.expires_at.is_some());

		let body = transport.requests.lock().first().cloned().expect("One request expected.");

		assert!(body.contains("grant_type=authorization_code"));
		assert!(body.contains("code=code-1"));
		assert!(body.contains("client_id=client-id"));
		assert!(body.contains("client_secret=client-secret"));
		assert!(body.contains("redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb"));
	}

	#[tokio::test]
	async fn refresh_sends_redirect_uri_and_classifies_invalid_grant() {
		let transport = CannedTransport::new(
			StatusCode::BAD_REQUEST,
			r#"{"error":"invalid_grant","error_description":"refresh token revoked"}"#,
		);
		let config = config();
		let facade = TokenFacade::from_config(&config, &transport).expect("Facade should build.");
		let redirect = Url::parse("https://app.example.com/cb").expect("Redirect should parse.");
		let err = facade
			.refresh_token(&TokenSecret::new("r-stale"), Some(&redirect))
			.await
			.expect_err("Invalid grant should fail the refresh.");

		match err {
			Error::Auth(AuthError::InvalidGrant { reason }) =>
				assert!(reason.contains("refresh token revoked")),
			other => panic!("Unexpected error variant: {other:?}."),
		}

		let body = transport.requests.lock().first().cloned().expect("One request expected.");

		assert!(body.contains("grant_type=refresh_token"));
		assert!(body.contains("refresh_token=r-stale"));
		assert!(body.contains("redirect_uri="));
	}

	#[tokio::test]
	async fn malformed_success_body_is_reported_with_status() {
		let transport = CannedTransport::new(StatusCode::OK, r#"{"unexpected":true}"#);
		let config = config();
		let facade = TokenFacade::from_config(&config, &transport).expect("Facade should build.");
		let err = facade
			.refresh_token(&TokenSecret::new("r"), None)
			.await
			.expect_err("Bodies without access_token cannot be decoded.");

		assert!(matches!(
			err,
			Error::Auth(AuthError::MalformedResponse { status: Some(200), .. })
		));
	}
}
