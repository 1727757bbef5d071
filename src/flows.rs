//! Client handle plus the token lifecycle flows (authorization code, refresh).

pub mod authorize;
pub mod refresh;

pub use authorize::*;
pub use refresh::*;

// self
use crate::{
	_prelude::*,
	auth::Token,
	config::ClientConfig,
	ext::{BearerSigner, RefreshHook, RefreshHooks, RequestSigner},
	http::HttpTransport,
	store::TokenStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestMarketClient = MarketClient<ReqwestTransport>;

/// OAuth-authenticated marketplace API client.
///
/// The client owns its configuration, the HTTP transport, and the in-memory token store, so
/// the dispatcher, the refresh flow, and the endpoint façade all see one consistent token.
/// Clones share the store and transport; a refresh performed through any clone is visible to
/// all of them.
pub struct MarketClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Settings read once at construction time.
	pub config: Arc<ClientConfig>,
	/// Transport used for API calls and token-endpoint grants.
	pub transport: Arc<T>,
	/// Token store holding the current access/refresh pair.
	pub store: Arc<TokenStore>,
	/// Signer attaching the access token to authenticated requests.
	pub signer: Arc<dyn RequestSigner>,
	/// Subscribers notified after each successful refresh.
	pub refresh_hooks: RefreshHooks,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
}
impl<T> MarketClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_transport(config: ClientConfig, transport: impl Into<Arc<T>>) -> Self {
		Self {
			config: Arc::new(config),
			transport: transport.into(),
			store: Default::default(),
			signer: Arc::new(BearerSigner),
			refresh_hooks: Default::default(),
			refresh_metrics: Default::default(),
		}
	}

	/// Seeds the token store, e.g. with a token restored by the host application.
	pub fn with_token(self, token: Token) -> Self {
		self.store.replace(token);

		self
	}

	/// Registers a hook notified after every successful refresh.
	pub fn with_refresh_hook(mut self, hook: impl RefreshHook + 'static) -> Self {
		self.refresh_hooks.push(Arc::new(hook));

		self
	}

	/// Replaces the request signer (defaults to [`BearerSigner`]).
	pub fn with_signer(mut self, signer: impl RequestSigner + 'static) -> Self {
		self.signer = Arc::new(signer);

		self
	}

	/// Returns a copy of the current token, if one has been issued.
	pub fn token(&self) -> Option<Token> {
		self.store.snapshot()
	}

	/// Replaces the current token.
	pub fn set_token(&self, token: Token) {
		self.store.replace(token);
	}

	/// Drops the current token; authenticated calls fail until a new one is issued.
	pub fn clear_token(&self) -> Option<Token> {
		self.store.clear()
	}
}
#[cfg(feature = "reqwest")]
impl MarketClient<ReqwestTransport> {
	/// Creates a client with its own reqwest transport.
	pub fn new(config: ClientConfig) -> Result<Self> {
		Ok(Self::with_transport(config, ReqwestTransport::new()?))
	}
}
impl<T> Clone for MarketClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			transport: self.transport.clone(),
			store: self.store.clone(),
			signer: self.signer.clone(),
			refresh_hooks: self.refresh_hooks.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
		}
	}
}
impl<T> Debug for MarketClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MarketClient")
			.field("config", &self.config)
			.field("token_set", &self.store.access_token().is_some())
			.field("refresh_hooks", &self.refresh_hooks.len())
			.finish()
	}
}
