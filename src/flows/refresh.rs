//! Refresh token orchestration with a per-client singleflight guard.
//!
//! Every refresh holds the store's refresh guard across the token-endpoint round trip.
//! [`MarketClient::refresh_if_stale`] re-reads the store after acquiring the guard and skips
//! the network when the access token it saw rejected has already been replaced, so callers
//! racing on the same expired token produce a single `grant_type=refresh_token` request.
//! Successful refreshes replace the access token, keep the refresh token unless the provider
//! rotated it, and notify the registered [`RefreshHook`](crate::ext::RefreshHook)s. Failed
//! refreshes leave the stale token in place.

mod counters;

pub use counters::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{Token, TokenSecret},
	error::AuthError,
	flows::MarketClient,
	http::HttpTransport,
	oauth::TokenFacade,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::CompareAndSwapOutcome,
};

impl<T> MarketClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Unconditionally redeems the stored refresh token for a new access token.
	pub async fn refresh(&self) -> Result<Token> {
		self.refresh_with_guard(None, "refresh").await
	}

	/// Refreshes only if the stored access token still equals `observed`.
	///
	/// Returns the stored token untouched when another caller already rotated it.
	pub async fn refresh_if_stale(&self, observed: &TokenSecret) -> Result<Token> {
		self.refresh_with_guard(Some(observed), "refresh_if_stale").await
	}

	async fn refresh_with_guard(
		&self,
		observed: Option<&TokenSecret>,
		stage: &'static str,
	) -> Result<Token> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, stage);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let result = span
			.instrument(async move {
				let _singleflight = self.store.lock_refresh().await;
				let current = self.store.snapshot().ok_or(AuthError::MissingAccessToken)?;

				if observed.is_some_and(|seen| *seen != current.access_token) {
					self.refresh_metrics.record_coalesced();

					return Ok(current);
				}

				let refresh_token =
					current.refresh_token.clone().ok_or(AuthError::MissingRefreshToken)?;
				let facade = TokenFacade::from_config(&self.config, self.transport.as_ref())?;
				let refreshed = facade
					.refresh_token(&refresh_token, self.config.redirect_uri.as_ref())
					.await?;

				match self.store.compare_and_rotate(&current.access_token, refreshed) {
					(CompareAndSwapOutcome::Updated, Some(rotated)) => {
						self.refresh_hooks.publish(&rotated);

						Ok(rotated)
					},
					// The host replaced the token while the refresh was in flight; theirs wins.
					(CompareAndSwapOutcome::AccessMismatch, _) =>
						self.store.snapshot().ok_or(Error::from(AuthError::MissingAccessToken)),
					_ => Err(Error::from(AuthError::MissingAccessToken)),
				}
			})
			.await;

		match &result {
			Ok(_) => self.refresh_metrics.record_success(),
			Err(_) => self.refresh_metrics.record_failure(),
		}

		obs::finish_flow(KIND, stage, &result);

		result
	}
}
