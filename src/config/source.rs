//! Key-value configuration providers.

// self
use crate::_prelude::*;

/// API base URL setting; endpoint paths are resolved against it.
pub const API_BASE_URL: &str = "api_base_url";
/// OAuth client identifier setting.
pub const CLIENT_ID: &str = "client_id";
/// OAuth client secret setting.
pub const CLIENT_SECRET: &str = "client_secret";
/// `User-Agent` header setting.
pub const APP_USER_AGENT: &str = "app_user_agent";
/// Redirect URI registered with the marketplace application.
pub const APP_REDIRECT_URI: &str = "app_redirect_uri";
/// Optional override for the authorization endpoint.
pub const AUTHORIZATION_ENDPOINT: &str = "authorization_endpoint";
/// Optional override for the token endpoint.
pub const TOKEN_ENDPOINT: &str = "token_endpoint";

/// Read-only settings lookup supplied by the host application.
///
/// The client reads every key exactly once while building a
/// [`ClientConfig`](crate::config::ClientConfig); later changes in the source are not observed.
pub trait ConfigSource {
	/// Returns the value stored under `key`, or `default` when the key is absent.
	fn get(&self, key: &str, default: &str) -> String;
}
impl ConfigSource for HashMap<String, String> {
	fn get(&self, key: &str, default: &str) -> String {
		HashMap::get(self, key).cloned().unwrap_or_else(|| default.to_owned())
	}
}
impl ConfigSource for BTreeMap<String, String> {
	fn get(&self, key: &str, default: &str) -> String {
		BTreeMap::get(self, key).cloned().unwrap_or_else(|| default.to_owned())
	}
}
impl<F> ConfigSource for F
where
	F: Fn(&str) -> Option<String>,
{
	fn get(&self, key: &str, default: &str) -> String {
		self(key).unwrap_or_else(|| default.to_owned())
	}
}
