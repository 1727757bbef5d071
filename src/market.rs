//! Endpoint façade: one method per marketplace API call.
//!
//! Every call is an authenticated GET dispatched through [`MarketClient::send`], which re-sends
//! the request once after the dispatcher refreshed an expired token. Failures are logged at this
//! boundary and returned; `result.ok()` collapses them into `None` for callers that only care
//! whether a payload arrived.

// crates.io
use serde::de::DeserializeOwned;
use time::Date;
// self
use crate::{
	_prelude::*,
	dispatch::{ApiPayload, Attempt, Dispatch, RequestSpec},
	flows::MarketClient,
	http::HttpTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Untyped JSON object returned by the endpoint wrappers.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Filters accepted by [`MarketClient::statement`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatementQuery {
	/// Page number, starting at 1.
	pub page: Option<u32>,
	/// Earliest transaction date to include.
	pub from_date: Option<Date>,
	/// Latest transaction date to include.
	pub to_date: Option<Date>,
	/// Transaction type filter (sent as `type`).
	pub kind: Option<String>,
	/// Marketplace site filter.
	pub site: Option<String>,
}
impl StatementQuery {
	fn apply(&self, spec: RequestSpec) -> RequestSpec {
		spec.param_opt("page", self.page.map(|page| page.to_string()))
			.param_opt("from_date", self.from_date.map(|date| date.to_string()))
			.param_opt("to_date", self.to_date.map(|date| date.to_string()))
			.param_opt("type", self.kind.clone())
			.param_opt("site", self.site.clone())
	}
}

impl<T> MarketClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Public profile of `username`.
	pub async fn user(&self, username: &str) -> Result<JsonMap> {
		self.market_get("user", [format!("user:{username}")], &[]).await
	}

	/// Username of the authenticated account.
	pub async fn username(&self) -> Result<JsonMap> {
		self.market_get("username", ["private", "user", "username"], &[]).await
	}

	/// Email address of the authenticated account.
	pub async fn email(&self) -> Result<JsonMap> {
		self.market_get("email", ["private", "user", "email"], &[]).await
	}

	/// Badges earned by `username`.
	pub async fn badges(&self, username: &str) -> Result<JsonMap> {
		self.market_get("badges", [format!("user-badges:{username}")], &[]).await
	}

	/// Item counts per marketplace site for `username`.
	pub async fn items_by_site(&self, username: &str) -> Result<JsonMap> {
		self.market_get("items_by_site", [format!("user-items-by-site:{username}")], &[]).await
	}

	/// Newest items `username` published on `site`.
	pub async fn new_files_from_user(&self, username: &str, site: &str) -> Result<JsonMap> {
		let segment = format!("new-files-from-user:{username},{site}");

		self.market_get("new_files_from_user", [segment], &[]).await
	}

	/// Account details (balance, country, ...) of the authenticated user.
	pub async fn account(&self) -> Result<JsonMap> {
		self.market_get("account", ["private", "user", "account"], &[]).await
	}

	/// Monthly earnings and sales of the authenticated author.
	pub async fn earnings_and_sales_by_month(&self) -> Result<JsonMap> {
		self.market_get(
			"earnings_and_sales_by_month",
			["private", "user", "earnings-and-sales-by-month"],
			&[],
		)
		.await
	}

	/// Account statement, filtered by `query`.
	pub async fn statement(&self, query: &StatementQuery) -> Result<JsonMap> {
		let spec = query.apply(self.market_spec(["user", "statement"])?);

		self.call("statement", spec).await
	}

	/// Most recent sales of the authenticated author.
	///
	/// The API answers with a JSON array rather than an object.
	pub async fn recent_sales(&self, page: Option<u32>) -> Result<serde_json::Value> {
		let spec = self
			.market_spec(["author", "sales"])?
			.param_opt("page", page.map(|page| page.to_string()));

		self.call("recent_sales", spec).await
	}

	/// Download link for an item bought with `purchase_code`.
	pub async fn download_purchase(&self, purchase_code: &str) -> Result<JsonMap> {
		let params = [("purchase_code", purchase_code)];

		self.market_get("download_purchase", ["buyer", "download"], &params).await
	}

	/// Sale details for a buyer's purchase `code`.
	pub async fn verify_purchase(&self, code: &str) -> Result<JsonMap> {
		self.market_get("verify_purchase", ["author", "sale"], &[("code", code)]).await
	}

	/// Recent activity of the authenticated user.
	pub async fn activities(&self) -> Result<JsonMap> {
		self.market_get("activities", ["user", "activities"], &[]).await
	}

	/// Calls an endpoint without a dedicated wrapper.
	///
	/// `path` is split on `/` and each piece is percent-encoded as its own segment.
	pub async fn get_json<R>(&self, path: &str, params: &[(&str, &str)]) -> Result<R>
	where
		R: DeserializeOwned,
	{
		let segments = path.split('/').filter(|segment| !segment.is_empty());
		let spec = params
			.iter()
			.fold(RequestSpec::get(self.config.endpoint(segments)?), |spec, (key, value)| {
				spec.param(*key, *value)
			});

		self.call("get_json", spec).await
	}

	/// Dispatches `spec`, re-sending it once if the first attempt refreshed the token.
	pub async fn send(&self, spec: &RequestSpec) -> Result<ApiPayload> {
		match self.dispatch_attempt(spec, Attempt::First).await? {
			Dispatch::Completed(payload) => Ok(payload),
			Dispatch::Refreshed => match self.dispatch_attempt(spec, Attempt::Retry).await? {
				Dispatch::Completed(payload) => Ok(payload),
				Dispatch::Refreshed => Err(Error::TokenExpired),
			},
		}
	}

	async fn call<R>(&self, stage: &'static str, spec: RequestSpec) -> Result<R>
	where
		R: DeserializeOwned,
	{
		const KIND: FlowKind = FlowKind::ApiCall;

		let span = FlowSpan::new(KIND, stage);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(async { self.send(&spec).await?.decode::<R>() }).await;

		obs::finish_flow(KIND, stage, &result);

		result
	}

	async fn market_get<const N: usize, S>(
		&self,
		stage: &'static str,
		segments: [S; N],
		params: &[(&str, &str)],
	) -> Result<JsonMap>
	where
		S: AsRef<str>,
	{
		let spec = params
			.iter()
			.fold(self.market_spec(segments)?, |spec, (key, value)| spec.param(*key, *value));

		self.call(stage, spec).await
	}

	fn market_spec<I, S>(&self, segments: I) -> Result<RequestSpec>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let segments = std::iter::once(String::from("market"))
			.chain(segments.into_iter().map(|segment| segment.as_ref().to_owned()));

		Ok(RequestSpec::get(self.config.endpoint(segments)?))
	}
}
