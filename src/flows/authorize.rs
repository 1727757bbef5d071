//! Authorization URL construction and authorization-code exchange.
//!
//! [`MarketClient::start_authorization`] produces the URL the end-user must visit plus an
//! opaque `state` value; the redirect handler then calls [`MarketClient::exchange_session`]
//! with the returned `state` and `code`. [`MarketClient::exchange_code`] is available for
//! hosts that manage `state` themselves.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	auth::Token,
	error::AuthError,
	flows::MarketClient,
	http::HttpTransport,
	oauth::TokenFacade,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

const STATE_LEN: usize = 32;

/// Authorization Code handshake metadata returned by [`MarketClient::start_authorization`].
#[derive(Clone, Debug)]
pub struct AuthorizationSession {
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	/// Redirect URI supplied when constructing the authorize URL.
	pub redirect_uri: Url,
	/// Fully-formed authorize URL that callers should send end-users to.
	pub authorize_url: Url,
}
impl AuthorizationSession {
	/// Validates the returned `state` parameter after the authorization redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state { Ok(()) } else { Err(AuthError::StateMismatch.into()) }
	}
}

impl<T> MarketClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Starts an authorization handshake using the configured redirect URI.
	pub fn start_authorization(&self) -> Result<AuthorizationSession> {
		let redirect_uri = self.config.require_redirect_uri()?.clone();

		Ok(self.start_authorization_with(redirect_uri))
	}

	/// Starts an authorization handshake that redirects to `redirect_uri`.
	pub fn start_authorization_with(&self, redirect_uri: Url) -> AuthorizationSession {
		let state = random_state();
		let authorize_url = self.authorize_url(&redirect_uri, &state);

		AuthorizationSession { state, redirect_uri, authorize_url }
	}

	/// Validates `returned_state` against the session, then exchanges `code`.
	pub async fn exchange_session(
		&self,
		session: AuthorizationSession,
		returned_state: &str,
		code: &str,
	) -> Result<Token> {
		if let Err(err) = session.validate_state(returned_state) {
			obs::log_flow_failure(FlowKind::AuthorizationCode, "exchange_session", &err);

			return Err(err);
		}

		self.exchange_code(code, &session.redirect_uri).await
	}

	/// Exchanges an authorization code for a token pair and stores it.
	///
	/// The returned token is also installed in the client's store, replacing any previous one.
	pub async fn exchange_code(&self, code: &str, redirect_uri: &Url) -> Result<Token> {
		const KIND: FlowKind = FlowKind::AuthorizationCode;

		let span = FlowSpan::new(KIND, "exchange_code");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let facade = TokenFacade::from_config(&self.config, self.transport.as_ref())?;
				let token = facade.exchange_code(code, redirect_uri).await?;

				self.store.replace(token.clone());

				Ok(token)
			})
			.await;

		obs::finish_flow(KIND, "exchange_code", &result);

		result
	}

	fn authorize_url(&self, redirect_uri: &Url, state: &str) -> Url {
		let mut url = self.config.authorization_endpoint.clone();

		url.query_pairs_mut()
			.append_pair("response_type", "code")
			.append_pair("client_id", &self.config.client_id)
			.append_pair("redirect_uri", redirect_uri.as_str())
			.append_pair("state", state);

		url
	}
}

fn random_state() -> String {
	rand::rng().sample_iter(Alphanumeric).take(STATE_LEN).map(char::from).collect()
}
