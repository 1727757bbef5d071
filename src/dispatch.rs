//! Request dispatcher: encodes parameters, signs, sends, and classifies responses.
//!
//! [`MarketClient::dispatch`] performs exactly one transport round trip. When the API rejects
//! the bearer token with the `Token already expired` description, the dispatcher refreshes the
//! token once and reports [`Dispatch::Refreshed`] instead of an error; re-sending the request is
//! left to the caller (see [`MarketClient::send`](crate::flows::MarketClient::send)).

// crates.io
use oauth2::{
	HttpRequest, HttpResponse,
	http::{
		HeaderValue, Method, Request,
		header::{CONTENT_TYPE, USER_AGENT},
	},
};
use serde::de::DeserializeOwned;
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{AuthError, ConfigError, RemoteError},
	flows::MarketClient,
	http::HttpTransport,
};

/// `error_description` the API uses to reject an expired access token.
pub const TOKEN_EXPIRED_DESCRIPTION: &str = "Token already expired";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const BODY_PREVIEW_LIMIT: usize = 256;

/// HTTP verbs the API surface uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RequestMethod {
	/// Parameters travel in the query string.
	#[default]
	Get,
	/// Parameters travel in a form-encoded body.
	Post,
}
impl RequestMethod {
	fn as_http(self) -> Method {
		match self {
			RequestMethod::Get => Method::GET,
			RequestMethod::Post => Method::POST,
		}
	}
}

/// Description of a single API request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestSpec {
	/// Absolute endpoint URL.
	pub url: Url,
	/// Request parameters; encoded into the query (GET) or the body (POST).
	pub parameters: BTreeMap<String, String>,
	/// HTTP verb.
	pub method: RequestMethod,
	/// Whether the bearer token must be attached.
	pub requires_auth: bool,
}
impl RequestSpec {
	/// Authenticated GET request for `url`.
	pub fn get(url: Url) -> Self {
		Self { url, parameters: BTreeMap::new(), method: RequestMethod::Get, requires_auth: true }
	}

	/// Authenticated POST request for `url`.
	pub fn post(url: Url) -> Self {
		Self { method: RequestMethod::Post, ..Self::get(url) }
	}

	/// Adds or replaces a parameter.
	pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.parameters.insert(key.into(), value.into());

		self
	}

	/// Adds the parameter only when `value` is present.
	pub fn param_opt(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
		match value {
			Some(value) => self.param(key, value),
			None => self,
		}
	}

	/// Marks the request as not requiring the bearer token.
	pub fn unauthenticated(mut self) -> Self {
		self.requires_auth = false;

		self
	}
}

/// Raw success payload (JSON text as sent by the API).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiPayload(Vec<u8>);
impl ApiPayload {
	/// Returns the raw bytes.
	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	/// Consumes the payload, returning the raw bytes.
	pub fn into_bytes(self) -> Vec<u8> {
		self.0
	}

	/// Decodes the payload as JSON, reporting the failing path on error.
	pub fn decode<D>(&self) -> Result<D>
	where
		D: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.0);

		serde_path_to_error::deserialize(&mut de).map_err(|source| Error::Decode { source })
	}
}

/// Outcome of a single transport invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseEnvelope {
	/// 2xx response.
	Success(ApiPayload),
	/// Any other status, with the body kept for diagnosis.
	Failure {
		/// HTTP status code.
		status: u16,
		/// Response body as received.
		raw_body: Vec<u8>,
	},
}
impl From<HttpResponse> for ResponseEnvelope {
	fn from(response: HttpResponse) -> Self {
		let status = response.status();
		let body = response.into_body();

		if status.is_success() {
			Self::Success(ApiPayload(body))
		} else {
			Self::Failure { status: status.as_u16(), raw_body: body }
		}
	}
}

/// Result of [`MarketClient::dispatch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatch {
	/// The API answered successfully.
	Completed(ApiPayload),
	/// The token had expired and was refreshed; the request was not re-sent.
	Refreshed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Attempt {
	First,
	Retry,
}

enum Rejection {
	TokenExpired,
	Remote(RemoteError),
}

impl<T> MarketClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Sends `spec` once; refreshes the token when the API reports it expired.
	pub async fn dispatch(&self, spec: &RequestSpec) -> Result<Dispatch> {
		self.dispatch_attempt(spec, Attempt::First).await
	}

	pub(crate) async fn dispatch_attempt(
		&self,
		spec: &RequestSpec,
		attempt: Attempt,
	) -> Result<Dispatch> {
		let access_token = if spec.requires_auth {
			Some(self.store.access_token().ok_or(AuthError::MissingAccessToken)?)
		} else {
			None
		};
		let request = self.build_request(spec, access_token.as_ref())?;
		let response = self.transport.execute(request).await?;
		let (status, raw_body) = match ResponseEnvelope::from(response) {
			ResponseEnvelope::Success(payload) => return Ok(Dispatch::Completed(payload)),
			ResponseEnvelope::Failure { status, raw_body } => (status, raw_body),
		};

		match (classify_failure(status, &raw_body), access_token) {
			(Rejection::TokenExpired, Some(sent)) => match attempt {
				Attempt::First => {
					self.refresh_if_stale(&sent).await?;

					Ok(Dispatch::Refreshed)
				},
				Attempt::Retry => Err(Error::TokenExpired),
			},
			(Rejection::TokenExpired, None) =>
				Err(remote_error(status, &raw_body, Some(TOKEN_EXPIRED_DESCRIPTION.into())).into()),
			(Rejection::Remote(err), _) => Err(err.into()),
		}
	}

	/// Builds the HTTP request for `spec`, signing it with `access_token` when provided.
	pub fn build_request(
		&self,
		spec: &RequestSpec,
		access_token: Option<&TokenSecret>,
	) -> Result<HttpRequest> {
		let mut url = spec.url.clone();
		let body = if spec.method == RequestMethod::Get && !spec.parameters.is_empty() {
			url.query_pairs_mut().extend_pairs(&spec.parameters);

			Vec::new()
		} else {
			form_urlencoded::Serializer::new(String::new())
				.extend_pairs(&spec.parameters)
				.finish()
				.into_bytes()
		};
		let user_agent = HeaderValue::from_str(&self.config.user_agent)
			.map_err(|_| ConfigError::InvalidHeader { name: "user-agent" })?;
		let mut request = Request::builder()
			.method(spec.method.as_http())
			.uri(url.as_str())
			.header(USER_AGENT, user_agent)
			.header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
			.body(body)
			.map_err(ConfigError::from)?;

		if let Some(token) = access_token {
			self.signer.sign(&mut request, token)?;
		}

		Ok(request)
	}
}

fn classify_failure(status: u16, raw_body: &[u8]) -> Rejection {
	let json = serde_json::from_slice::<serde_json::Value>(raw_body).ok();
	let field = |name: &str| {
		json.as_ref()
			.and_then(|value| value.get(name))
			.and_then(serde_json::Value::as_str)
			.map(str::to_owned)
	};
	let description = field("error_description");

	if description.as_deref() == Some(TOKEN_EXPIRED_DESCRIPTION) {
		return Rejection::TokenExpired;
	}

	let description = description.or_else(|| field("description")).or_else(|| field("message"));
	let mut err = remote_error(status, raw_body, description);

	err.error = field("error");

	Rejection::Remote(err)
}

fn remote_error(status: u16, raw_body: &[u8], description: Option<String>) -> RemoteError {
	let message = description.unwrap_or_else(|| body_preview(status, raw_body));

	RemoteError { status, error: None, message }
}

fn body_preview(status: u16, raw_body: &[u8]) -> String {
	let text = String::from_utf8_lossy(raw_body);
	let text = text.trim();

	if text.is_empty() {
		return format!("HTTP {status}");
	}

	text.chars().take(BODY_PREVIEW_LIMIT).collect()
}
