//! Client configuration assembled once at construction time.
//!
//! [`ClientConfig`] replaces process-wide settings lookups: build it with
//! [`ClientConfig::builder`] or read it from any [`ConfigSource`] via
//! [`ClientConfig::from_source`], then hand it to the client by value.

pub mod source;

pub use source::ConfigSource;

// crates.io
use oauth2::http::HeaderValue;
// self
use crate::{_prelude::*, error::ConfigError};

/// Validated, immutable client settings.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
	/// Base URL every endpoint path is resolved against; always ends with `/`.
	pub api_base_url: Url,
	/// Page the end-user is sent to for approving the application.
	pub authorization_endpoint: Url,
	/// Endpoint used for code exchanges and refreshes.
	pub token_endpoint: Url,
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret; never printed by `Debug`.
	pub client_secret: String,
	/// Value of the `User-Agent` header on API requests.
	pub user_agent: String,
	/// Redirect URI registered with the application, if configured.
	pub redirect_uri: Option<Url>,
}
impl ClientConfig {
	/// `User-Agent` used when none is configured.
	pub const DEFAULT_USER_AGENT: &'static str =
		concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

	/// Creates a builder seeded with the mandatory settings.
	pub fn builder(
		api_base_url: Url,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> ClientConfigBuilder {
		ClientConfigBuilder::new(api_base_url, client_id, client_secret)
	}

	/// Reads and validates settings from a key-value source.
	pub fn from_source<S>(settings: &S) -> Result<Self, ConfigError>
	where
		S: ?Sized + ConfigSource,
	{
		let api_base_url = required_url(settings, source::API_BASE_URL)?;
		let mut builder = Self::builder(
			api_base_url,
			settings.get(source::CLIENT_ID, ""),
			settings.get(source::CLIENT_SECRET, ""),
		)
		.user_agent(settings.get(source::APP_USER_AGENT, Self::DEFAULT_USER_AGENT));

		if let Some(redirect) = optional_url(settings, source::APP_REDIRECT_URI)? {
			builder = builder.redirect_uri(redirect);
		}
		if let Some(endpoint) = optional_url(settings, source::AUTHORIZATION_ENDPOINT)? {
			builder = builder.authorization_endpoint(endpoint);
		}
		if let Some(endpoint) = optional_url(settings, source::TOKEN_ENDPOINT)? {
			builder = builder.token_endpoint(endpoint);
		}

		builder.build()
	}

	/// Appends path segments (e.g. `["market", "user:alice"]`) to the API base URL.
	///
	/// Each segment is percent-encoded on its own, so a caller-supplied value containing `/`,
	/// `?` or `#` stays inside its segment.
	pub fn endpoint<I, S>(&self, segments: I) -> Result<Url, ConfigError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut url = self.api_base_url.clone();

		url.path_segments_mut()
			.map_err(|_| ConfigError::OpaqueUrl { key: source::API_BASE_URL })?
			.pop_if_empty()
			.extend(segments);

		Ok(url)
	}

	/// Returns the redirect URI or fails when none was configured.
	pub fn require_redirect_uri(&self) -> Result<&Url, ConfigError> {
		self.redirect_uri
			.as_ref()
			.ok_or(ConfigError::MissingSetting { key: source::APP_REDIRECT_URI })
	}
}
impl Debug for ClientConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientConfig")
			.field("api_base_url", &self.api_base_url.as_str())
			.field("authorization_endpoint", &self.authorization_endpoint.as_str())
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("client_id", &self.client_id)
			.field("client_secret_set", &!self.client_secret.is_empty())
			.field("user_agent", &self.user_agent)
			.field("redirect_uri", &self.redirect_uri.as_ref().map(Url::as_str))
			.finish()
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	api_base_url: Url,
	client_id: String,
	client_secret: String,
	user_agent: Option<String>,
	redirect_uri: Option<Url>,
	authorization_endpoint: Option<Url>,
	token_endpoint: Option<Url>,
}
impl ClientConfigBuilder {
	fn new(
		api_base_url: Url,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Self {
		Self {
			api_base_url,
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			user_agent: None,
			redirect_uri: None,
			authorization_endpoint: None,
			token_endpoint: None,
		}
	}

	/// Overrides the `User-Agent` header value.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());

		self
	}

	/// Sets the registered redirect URI.
	pub fn redirect_uri(mut self, url: Url) -> Self {
		self.redirect_uri = Some(url);

		self
	}

	/// Overrides the authorization endpoint (defaults to `/authorization` on the API origin).
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Overrides the token endpoint (defaults to `/token` on the API origin).
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Validates the collected settings and produces a [`ClientConfig`].
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let client_id = non_blank(self.client_id, source::CLIENT_ID)?;
		let client_secret = non_blank(self.client_secret, source::CLIENT_SECRET)?;
		let user_agent = self
			.user_agent
			.map(|value| value.trim().to_owned())
			.filter(|value| !value.is_empty())
			.unwrap_or_else(|| ClientConfig::DEFAULT_USER_AGENT.into());

		HeaderValue::from_str(&user_agent)
			.map_err(|_| ConfigError::InvalidHeader { name: "user-agent" })?;

		let mut api_base_url = self.api_base_url;

		if api_base_url.cannot_be_a_base() {
			return Err(ConfigError::OpaqueUrl { key: source::API_BASE_URL });
		}
		if !api_base_url.path().ends_with('/') {
			let path = format!("{}/", api_base_url.path());

			api_base_url.set_path(&path);
		}

		let authorization_endpoint = match self.authorization_endpoint {
			Some(url) => url,
			None => origin_join(&api_base_url, "/authorization", source::AUTHORIZATION_ENDPOINT)?,
		};
		let token_endpoint = match self.token_endpoint {
			Some(url) => url,
			None => origin_join(&api_base_url, "/token", source::TOKEN_ENDPOINT)?,
		};

		Ok(ClientConfig {
			api_base_url,
			authorization_endpoint,
			token_endpoint,
			client_id,
			client_secret,
			user_agent,
			redirect_uri: self.redirect_uri,
		})
	}
}

fn non_blank(value: String, key: &'static str) -> Result<String, ConfigError> {
	let trimmed = value.trim();

	if trimmed.is_empty() {
		Err(ConfigError::MissingSetting { key })
	} else {
		Ok(trimmed.to_owned())
	}
}

fn origin_join(base: &Url, path: &str, key: &'static str) -> Result<Url, ConfigError> {
	base.join(path).map_err(|source| ConfigError::InvalidUrl { key, source })
}

fn required_url<S>(settings: &S, key: &'static str) -> Result<Url, ConfigError>
where
	S: ?Sized + ConfigSource,
{
	optional_url(settings, key)?.ok_or(ConfigError::MissingSetting { key })
}

fn optional_url<S>(settings: &S, key: &'static str) -> Result<Option<Url>, ConfigError>
where
	S: ?Sized + ConfigSource,
{
	let raw = settings.get(key, "");
	let raw = raw.trim();

	if raw.is_empty() {
		return Ok(None);
	}

	Url::parse(raw).map(Some).map_err(|source| ConfigError::InvalidUrl { key, source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn settings(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
		pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
	}

	#[test]
	fn from_source_derives_endpoints_from_origin() {
		let config = ClientConfig::from_source(&settings(&[
			(source::API_BASE_URL, "https://api.example.com/v1"),
			(source::CLIENT_ID, "client"),
			(source::CLIENT_SECRET, "secret"),
			(source::APP_REDIRECT_URI, "https://app.example.com/callback"),
		]))
		.expect("Complete settings should produce a configuration.");

		assert_eq!(config.api_base_url.as_str(), "https://api.example.com/v1/");
		assert_eq!(config.authorization_endpoint.as_str(), "https://api.example.com/authorization");
		assert_eq!(config.token_endpoint.as_str(), "https://api.example.com/token");
		assert_eq!(config.user_agent, ClientConfig::DEFAULT_USER_AGENT);
		assert_eq!(
			config.require_redirect_uri().map(Url::as_str).ok(),
			Some("https://app.example.com/callback")
		);
		assert_eq!(
			config.endpoint(["market", "user:alice"]).map(String::from).ok(),
			Some("https://api.example.com/v1/market/user:alice".to_owned())
		);
		assert_eq!(
			config.endpoint(["market", "user:a/b c"]).map(String::from).ok(),
			Some("https://api.example.com/v1/market/user:a%2Fb%20c".to_owned())
		);
	}

	#[test]
	fn builder_rejects_opaque_base_url() {
		let err = ClientConfig::builder(
			Url::parse("mailto:api@example.com").expect("Opaque URL fixture should parse."),
			"client",
			"secret",
		)
		.build()
		.expect_err("Opaque base URLs cannot carry endpoint paths.");

		assert!(matches!(err, ConfigError::OpaqueUrl { key: source::API_BASE_URL }));
	}

	#[test]
	fn from_source_reports_missing_settings() {
		let err = ClientConfig::from_source(&settings(&[(source::CLIENT_ID, "client")]))
			.expect_err("Missing base URL must be rejected.");

		assert!(matches!(err, ConfigError::MissingSetting { key: source::API_BASE_URL }));

		let err = ClientConfig::from_source(&settings(&[
			(source::API_BASE_URL, "https://api.example.com/"),
			(source::CLIENT_ID, "client"),
			(source::CLIENT_SECRET, "   "),
		]))
		.expect_err("Blank client secret must be rejected.");

		assert!(matches!(err, ConfigError::MissingSetting { key: source::CLIENT_SECRET }));
	}

	#[test]
	fn from_source_rejects_invalid_urls() {
		let err = ClientConfig::from_source(&settings(&[
			(source::API_BASE_URL, "https://api.example.com/"),
			(source::CLIENT_ID, "client"),
			(source::CLIENT_SECRET, "secret"),
			(source::APP_REDIRECT_URI, "not a url"),
		]))
		.expect_err("Unparseable redirect URI must be rejected.");

		assert!(matches!(err, ConfigError::InvalidUrl { key: source::APP_REDIRECT_URI, .. }));
	}

	#[test]
	fn builder_rejects_header_unsafe_user_agent() {
		let err = ClientConfig::builder(
			Url::parse("https://api.example.com/").expect("Base URL fixture should parse."),
			"client",
			"secret",
		)
		.user_agent("agent\nwith-newline")
		.build()
		.expect_err("User agents with control characters must be rejected.");

		assert!(matches!(err, ConfigError::InvalidHeader { name: "user-agent" }));
	}

	#[test]
	fn debug_hides_client_secret() {
		let config = ClientConfig::builder(
			Url::parse("https://api.example.com/").expect("Base URL fixture should parse."),
			"client",
			"very-secret",
		)
		.build()
		.expect("Minimal configuration should build.");

		assert!(!format!("{config:?}").contains("very-secret"));
		assert!(matches!(
			config.require_redirect_uri(),
			Err(ConfigError::MissingSetting { key: source::APP_REDIRECT_URI })
		));
	}
}
