//! In-memory token store owned by a single client instance.
//!
//! Reads take a cheap snapshot under a [`RwLock`]. Refreshes additionally hold an async
//! refresh guard across the token-endpoint round trip, so concurrent callers that all saw the
//! same expired token trigger exactly one refresh; the rest observe the rotated token through
//! [`TokenStore::compare_and_rotate`] and skip the network.

// self
use crate::{
	_prelude::*,
	auth::{Token, TokenSecret},
};

/// Result of a [`TokenStore::compare_and_rotate`] attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareAndSwapOutcome {
	/// The stored access token matched the expected value and the token was rotated.
	Updated,
	/// Another caller replaced the access token first; nothing was written.
	AccessMismatch,
	/// No token is stored.
	Missing,
}

/// Current token plus the guard serializing refreshes.
#[derive(Default)]
pub struct TokenStore {
	current: RwLock<Option<Token>>,
	refresh_guard: AsyncMutex<()>,
}
impl TokenStore {
	/// Creates a store seeded with `token`.
	pub fn with_token(token: Token) -> Self {
		Self { current: RwLock::new(Some(token)), refresh_guard: AsyncMutex::new(()) }
	}

	/// Returns a copy of the stored token, if any.
	pub fn snapshot(&self) -> Option<Token> {
		self.current.read().clone()
	}

	/// Returns the stored access token, if any.
	pub fn access_token(&self) -> Option<TokenSecret> {
		self.current.read().as_ref().map(|token| token.access_token.clone())
	}

	/// Replaces the stored token unconditionally.
	pub fn replace(&self, token: Token) {
		*self.current.write() = Some(token);
	}

	/// Removes and returns the stored token.
	pub fn clear(&self) -> Option<Token> {
		self.current.write().take()
	}

	/// Folds `refreshed` into the stored token if its access token still equals `expected`.
	///
	/// On [`CompareAndSwapOutcome::Updated`] the rotated token (see [`Token::rotate`]) is
	/// returned alongside the outcome.
	pub fn compare_and_rotate(
		&self,
		expected: &TokenSecret,
		refreshed: Token,
	) -> (CompareAndSwapOutcome, Option<Token>) {
		let mut guard = self.current.write();

		match guard.as_ref() {
			Some(current) if current.access_token == *expected => {
				let rotated = current.rotate(refreshed);

				*guard = Some(rotated.clone());

				(CompareAndSwapOutcome::Updated, Some(rotated))
			},
			Some(_) => (CompareAndSwapOutcome::AccessMismatch, None),
			None => (CompareAndSwapOutcome::Missing, None),
		}
	}

	/// Waits for exclusive access to the refresh critical section.
	pub(crate) async fn lock_refresh(&self) -> async_lock::MutexGuard<'_, ()> {
		self.refresh_guard.lock().await
	}
}
impl Debug for TokenStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenStore").field("current", &*self.current.read()).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn token(access: &str, refresh: Option<&str>) -> Token {
		let mut builder = Token::builder().access_token(access);

		if let Some(refresh) = refresh {
			builder = builder.refresh_token(refresh);
		}

		builder.build().expect("Token fixture should build.")
	}

	#[test]
	fn compare_and_rotate_updates_matching_token() {
		let store = TokenStore::with_token(token("access-1", Some("refresh-1")));
		let (outcome, rotated) =
			store.compare_and_rotate(&TokenSecret::new("access-1"), token("access-2", None));

		assert_eq!(outcome, CompareAndSwapOutcome::Updated);
		assert_eq!(rotated.map(|t| t.access_token), Some(TokenSecret::new("access-2")));

		let stored = store.snapshot().expect("Store should keep the rotated token.");

		assert_eq!(stored.access_token.expose(), "access-2");
		assert_eq!(stored.refresh_token.as_ref().map(TokenSecret::expose), Some("refresh-1"));
	}

	#[test]
	fn compare_and_rotate_skips_when_another_caller_won() {
		let store = TokenStore::with_token(token("access-rotated", Some("refresh-1")));
		let (outcome, rotated) =
			store.compare_and_rotate(&TokenSecret::new("access-stale"), token("access-3", None));

		assert_eq!(outcome, CompareAndSwapOutcome::AccessMismatch);
		assert!(rotated.is_none());
		assert_eq!(
			store.access_token().map(|s| s.expose().to_owned()),
			Some("access-rotated".into())
		);
	}

	#[test]
	fn compare_and_rotate_reports_missing_token() {
		let store = TokenStore::default();
		let (outcome, _) =
			store.compare_and_rotate(&TokenSecret::new("any"), token("access", None));

		assert_eq!(outcome, CompareAndSwapOutcome::Missing);
		assert!(store.snapshot().is_none());
	}

	#[test]
	fn clear_empties_the_store() {
		let store = TokenStore::default();

		store.replace(token("access", None));

		assert!(store.clear().is_some());
		assert!(store.access_token().is_none());
	}

	#[tokio::test]
	async fn refresh_guard_is_exclusive() {
		let store = TokenStore::default();
		let guard = store.lock_refresh().await;

		assert!(store.refresh_guard.try_lock().is_none());

		drop(guard);

		assert!(store.refresh_guard.try_lock().is_some());
	}
}
