//! Issued token structs, expiry helpers, and builders.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Errors produced by [`TokenBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TokenBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
}

/// Token pair issued by the marketplace token endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
	/// Access token secret sent as the bearer credential; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Token type reported by the provider (normally `bearer`).
	pub token_type: String,
	/// Instant the token was received.
	pub issued_at: OffsetDateTime,
	/// Expiry instant derived from `expires_in`, when the provider reported one.
	pub expires_at: Option<OffsetDateTime>,
}
impl Token {
	const DEFAULT_TOKEN_TYPE: &'static str = "bearer";

	/// Returns a builder for constructing tokens.
	pub fn builder() -> TokenBuilder {
		TokenBuilder::default()
	}

	/// Returns `true` if the provider-reported lifetime has elapsed at `instant`.
	///
	/// Tokens without a reported lifetime never expire locally; the API remains the authority.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}

	/// Convenience helper that checks expiry against the current UTC instant.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Folds a refresh response into the current token.
	///
	/// The access token, type, and lifetime always come from `refreshed`. The refresh token is
	/// replaced only when the provider rotated it; otherwise the current one is kept.
	pub fn rotate(&self, refreshed: Token) -> Token {
		let Token { access_token, refresh_token, token_type, issued_at, expires_at } = refreshed;

		Token {
			access_token,
			refresh_token: refresh_token.or_else(|| self.refresh_token.clone()),
			token_type,
			issued_at,
			expires_at,
		}
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("token_type", &self.token_type)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`Token`].
#[derive(Clone, Debug, Default)]
pub struct TokenBuilder {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	token_type: Option<String>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl TokenBuilder {
	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Overrides the token type (defaults to `bearer`).
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Consumes the builder and produces a [`Token`].
	pub fn build(self) -> Result<Token, TokenBuilderError> {
		let access_token = self
			.access_token
			.filter(|secret| !secret.expose().is_empty())
			.ok_or(TokenBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => Some(instant),
			(None, Some(delta)) => Some(issued_at + delta),
			(None, None) => None,
		};

		Ok(Token {
			access_token,
			refresh_token: self.refresh_token,
			token_type: self.token_type.unwrap_or_else(|| Token::DEFAULT_TOKEN_TYPE.into()),
			issued_at,
			expires_at,
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn builder_handles_relative_expiry() {
		let token = Token::builder()
			.access_token("secret")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_in(Duration::minutes(30))
			.build()
			.expect("Token builder should support relative expiry calculations.");

		assert_eq!(token.expires_at, Some(macros::datetime!(2025-01-01 00:30 UTC)));
		assert_eq!(token.token_type, "bearer");
		assert!(!token.is_expired_at(macros::datetime!(2025-01-01 00:29 UTC)));
		assert!(token.is_expired_at(macros::datetime!(2025-01-01 00:30 UTC)));
	}

	#[test]
	fn builder_rejects_blank_access_token() {
		let err = Token::builder()
			.access_token("")
			.build()
			.expect_err("Empty access tokens must be rejected.");

		assert_eq!(err, TokenBuilderError::MissingAccessToken);
	}

	#[test]
	fn token_without_lifetime_never_expires_locally() {
		let token = Token::builder()
			.access_token("open-ended")
			.build()
			.expect("Token builder should accept tokens without a lifetime.");

		assert!(!token.is_expired());
	}

	#[test]
	fn rotate_keeps_refresh_token_unless_replaced() {
		let current = Token::builder()
			.access_token("access-old")
			.refresh_token("refresh-old")
			.build()
			.expect("Current token fixture should build.");
		let refreshed = Token::builder()
			.access_token("access-new")
			.build()
			.expect("Refreshed token fixture should build.");
		let kept = current.rotate(refreshed);

		assert_eq!(kept.access_token.expose(), "access-new");
		assert_eq!(kept.refresh_token.as_ref().map(TokenSecret::expose), Some("refresh-old"));

		let rotated = current.rotate(
			Token::builder()
				.access_token("access-newer")
				.refresh_token("refresh-new")
				.build()
				.expect("Rotated token fixture should build."),
		);

		assert_eq!(rotated.refresh_token.as_ref().map(TokenSecret::expose), Some("refresh-new"));
	}

	#[test]
	fn debug_output_redacts_secrets() {
		let token = Token::builder()
			.access_token("access-secret")
			.refresh_token("refresh-secret")
			.build()
			.expect("Token fixture should build.");
		let rendered = format!("{token:?}");

		assert!(!rendered.contains("access-secret"));
		assert!(!rendered.contains("refresh-secret"));
	}
}
