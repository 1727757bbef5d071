//! Client-level error types shared across flows, the dispatcher, and the endpoint façade.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token acquisition or refresh failed.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// The API answered with a non-success status.
	#[error(transparent)]
	Remote(#[from] RemoteError),

	/// The API still reported an expired token after a successful refresh.
	#[error("Access token was rejected as expired after a refresh.")]
	TokenExpired,
	/// The response body could not be decoded into the requested type.
	#[error("API response could not be decoded.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A required setting is missing or blank.
	#[error("Setting `{key}` is required.")]
	MissingSetting {
		/// Configuration key.
		key: &'static str,
	},
	/// A setting holds a value that is not a valid URL.
	#[error("Setting `{key}` is not a valid URL.")]
	InvalidUrl {
		/// Configuration key.
		key: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The API base URL cannot carry path segments (e.g. `mailto:` or `data:` URLs).
	#[error("Setting `{key}` must be a hierarchical URL.")]
	OpaqueUrl {
		/// Configuration key.
		key: &'static str,
	},
	/// A header value contains characters HTTP does not allow.
	#[error("Header `{name}` has an invalid value.")]
	InvalidHeader {
		/// Header name.
		name: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Failures raised while obtaining or refreshing tokens.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// An authenticated request was attempted before any token was issued.
	#[error("No access token is available; complete the authorization code exchange first.")]
	MissingAccessToken,
	/// The stored token carries no refresh token.
	#[error("Stored token is missing a refresh token.")]
	MissingRefreshToken,
	/// The `state` returned with the authorization redirect does not match.
	#[error("Authorization state mismatch.")]
	StateMismatch,
	/// Provider rejected the grant (e.g., bad code or refresh token).
	#[error("Token endpoint rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Client authentication failed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Token endpoint returned any other error.
	#[error("Token endpoint returned an error: {message}.")]
	Rejected {
		/// Provider- or client-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint responded with malformed JSON.
	#[error("Token endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Network failure while calling the token endpoint.
	#[error("Token endpoint could not be reached.")]
	Transport(#[source] TransportError),
}

/// Non-success response returned by the API.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("API request failed with status {status}: {message}.")]
pub struct RemoteError {
	/// HTTP status code.
	pub status: u16,
	/// Machine-readable `error` field, when the body carried one.
	pub error: Option<String>,
	/// Human-readable description (`error_description`, or a body preview).
	pub message: String,
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
