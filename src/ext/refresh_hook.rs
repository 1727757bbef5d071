//! Subscribers notified whenever the client obtains a refreshed token.

// self
use crate::{_prelude::*, auth::Token};

/// Receives every token produced by a successful refresh.
///
/// Hooks run synchronously on the refreshing task, after the store has been updated and
/// before the original request is retried, so they should hand off slow work (persistence,
/// UI updates) instead of performing it inline.
pub trait RefreshHook
where
	Self: Send + Sync,
{
	/// Called with the rotated token now held by the client.
	fn on_refresh(&self, token: &Token);
}
impl<F> RefreshHook for F
where
	F: Send + Sync + Fn(&Token),
{
	fn on_refresh(&self, token: &Token) {
		self(token)
	}
}

/// Ordered list of registered [`RefreshHook`]s.
#[derive(Clone, Default)]
pub struct RefreshHooks(Vec<Arc<dyn RefreshHook>>);
impl RefreshHooks {
	/// Appends a hook; hooks run in registration order.
	pub fn push(&mut self, hook: Arc<dyn RefreshHook>) {
		self.0.push(hook);
	}

	/// Returns the number of registered hooks.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no hook is registered.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Notifies every hook about `token`.
	pub fn publish(&self, token: &Token) {
		for hook in &self.0 {
			hook.on_refresh(token);
		}
	}
}
impl Debug for RefreshHooks {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("RefreshHooks").field(&self.0.len()).finish()
	}
}
