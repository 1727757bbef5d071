//! Request signing contracts that attach the client's token to outbound requests.

// crates.io
use oauth2::{
	HttpRequest,
	http::{HeaderValue, header::AUTHORIZATION},
};
// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Describes how an access token is attached to an outbound API request.
pub trait RequestSigner
where
	Self: Send + Sync,
{
	/// Injects authorization state derived from `access_token` into `request`.
	fn sign(&self, request: &mut HttpRequest, access_token: &TokenSecret)
	-> Result<(), ConfigError>;
}

/// Default signer writing `Authorization: bearer <token>`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BearerSigner;
impl RequestSigner for BearerSigner {
	fn sign(
		&self,
		request: &mut HttpRequest,
		access_token: &TokenSecret,
	) -> Result<(), ConfigError> {
		let mut value = HeaderValue::from_str(&format!("bearer {}", access_token.expose()))
			.map_err(|_| ConfigError::InvalidHeader { name: "authorization" })?;

		value.set_sensitive(true);
		request.headers_mut().insert(AUTHORIZATION, value);

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::Request;
	// self
	use super::*;

	#[test]
	fn bearer_signer_sets_sensitive_header() {
		let mut request = Request::new(Vec::new());

		BearerSigner
			.sign(&mut request, &TokenSecret::new("abc123"))
			.expect("Plain tokens should be accepted.");

		let header = request.headers().get(AUTHORIZATION).expect("Header should be set.");

		assert_eq!(header.to_str().ok(), Some("bearer abc123"));
		assert!(header.is_sensitive());
	}

	#[test]
	fn bearer_signer_rejects_control_characters() {
		let mut request = Request::new(Vec::new());
		let err = BearerSigner
			.sign(&mut request, &TokenSecret::new("bad\ntoken"))
			.expect_err("Tokens with newlines cannot be sent as headers.");

		assert!(matches!(err, ConfigError::InvalidHeader { name: "authorization" }));
	}
}
