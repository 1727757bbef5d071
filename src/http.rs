//! Transport primitives shared by the API dispatcher and the token endpoint.
//!
//! [`HttpTransport`] is the client's only dependency on an HTTP stack. API calls hand it a
//! fully-built [`HttpRequest`]; token exchanges reach it through [`TransportHandle`], an
//! `oauth2` [`AsyncHttpClient`] adapter that records the response status in a
//! [`ResponseMetadataSlot`] so token-endpoint failures can be classified with it.

// std
use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Executes a single HTTP request and yields the raw response.
///
/// Implementations return `Ok` for every response that reached the client, whatever its
/// status; only network and IO failures surface as [`TransportError`]. Status interpretation
/// belongs to the caller. Implementations must be `Send + Sync + 'static` so one transport
/// can be shared by a client behind an [`Arc`].
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves once the full response body is available.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Captures metadata from the most recent HTTP response for downstream error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the endpoint, if a response arrived.
	pub status: Option<u16>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// `oauth2` [`AsyncHttpClient`] backed by an [`HttpTransport`].
///
/// Created per token request; the slot is cleared before dispatch and filled once a response
/// status is known.
pub struct TransportHandle<'t, T>
where
	T: ?Sized + HttpTransport,
{
	transport: &'t T,
	slot: ResponseMetadataSlot,
}
impl<'t, T> TransportHandle<'t, T>
where
	T: ?Sized + HttpTransport,
{
	/// Wraps `transport`, recording response metadata into `slot`.
	pub fn new(transport: &'t T, slot: ResponseMetadataSlot) -> Self {
		Self { transport, slot }
	}
}
impl<'c, T> AsyncHttpClient<'c> for TransportHandle<'_, T>
where
	T: ?Sized + HttpTransport,
{
	type Error = HttpClientError<TransportError>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.slot.take();

			let response = self
				.transport
				.execute(request)
				.await
				.map_err(|err| HttpClientError::Reqwest(Box::new(err)))?;

			self.slot.store(ResponseMetadata { status: Some(response.status().as_u16()) });

			Ok(response)
		})
	}
}

/// Thin wrapper around [`ReqwestClient`] implementing [`HttpTransport`].
///
/// Token requests should not follow redirects; configure any custom client passed to
/// [`ReqwestTransport::with_client`] accordingly.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport with redirects disabled.
	pub fn new() -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(crate::error::ConfigError::http_client_build)?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let request = reqwest::Request::try_from(request).map_err(TransportError::from)?;
			let response = client.execute(request).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut converted = HttpResponse::new(response.bytes().await?.to_vec());

			*converted.status_mut() = status;
			*converted.headers_mut() = headers;

			Ok(converted)
		})
	}
}
