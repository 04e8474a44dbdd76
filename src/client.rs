//! Typed JSON helper for the remote calendar API.
//!
//! [`ApiClient`] resolves request paths against [`ApiConfig::base_uri`], asks its
//! [`TokenProvider`] for a token on every call, and maps JSON payloads to and from typed values.
//! Non-2xx responses surface as [`Error::RequestFailed`] without the body being decoded.

// self
use crate::{
	_prelude::*,
	config::ApiConfig,
	error::ConfigError,
	http::{ApiMethod, ApiRequest, ApiResponse, ApiTransport},
	obs::{self, OpKind, OpOutcome, OpSpan},
	token::TokenProvider,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// [`ApiClient`] specialized for the reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestApiClient<P> = ApiClient<ReqwestTransport, P>;

/// OData collection envelope (`{"value": [...]}`) returned by list endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ODataCollection<T> {
	/// Items of the collection, in server order.
	pub value: Vec<T>,
}

/// Authenticated JSON client bound to one API root.
pub struct ApiClient<T, P>
where
	T: ?Sized + ApiTransport,
	P: ?Sized + TokenProvider,
{
	/// Transport executing the HTTP exchanges.
	pub transport: Arc<T>,
	/// Provider consulted for a bearer token before every request.
	pub tokens: Arc<P>,
	/// Validated API settings.
	pub config: ApiConfig,
}
#[cfg(feature = "reqwest")]
impl<P> ApiClient<ReqwestTransport, P>
where
	P: ?Sized + TokenProvider,
{
	/// Creates a client backed by a reqwest transport built from `config`.
	pub fn new(config: ApiConfig, tokens: impl Into<Arc<P>>) -> Result<Self> {
		let transport = ReqwestTransport::from_config(&config)?;

		Ok(Self::with_transport(config, transport, tokens))
	}
}
impl<T, P> ApiClient<T, P>
where
	T: ?Sized + ApiTransport,
	P: ?Sized + TokenProvider,
{
	/// Creates a client around a caller-provided transport.
	pub fn with_transport(
		config: ApiConfig,
		transport: impl Into<Arc<T>>,
		tokens: impl Into<Arc<P>>,
	) -> Self {
		Self { transport: transport.into(), tokens: tokens.into(), config }
	}

	/// Returns `path` untouched when it is already an `http://` or `https://` URI, otherwise
	/// appends it to the API root.
	pub fn build_uri(&self, path: &str) -> String {
		if path.starts_with("http://") || path.starts_with("https://") {
			path.to_owned()
		} else {
			format!("{}{path}", self.config.base_uri.as_str())
		}
	}

	/// GETs `path` and decodes the body as `R`.
	pub async fn get_item<R>(&self, path: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.call("get_item", ApiMethod::GET, path, None::<&()>, decode).await
	}

	/// GETs `path` and returns the `value` array of the OData envelope.
	pub async fn get_items<R>(&self, path: &str) -> Result<Vec<R>>
	where
		R: DeserializeOwned,
	{
		let collection: ODataCollection<R> =
			self.call("get_items", ApiMethod::GET, path, None::<&()>, decode).await?;

		Ok(collection.value)
	}

	/// POSTs `item` to `path` and decodes the response as the same type.
	pub async fn post_item<I>(&self, path: &str, item: &I) -> Result<I>
	where
		I: Serialize + DeserializeOwned,
	{
		self.call("post_item", ApiMethod::POST, path, Some(item), decode).await
	}

	/// POSTs an untyped JSON payload to `path`.
	pub async fn post_dynamic<R>(&self, path: &str, body: &serde_json::Value) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.call("post_dynamic", ApiMethod::POST, path, Some(body), decode).await
	}

	/// PATCHes `item` onto `path` and decodes the updated resource.
	pub async fn patch_item<I>(&self, path: &str, item: &I) -> Result<I>
	where
		I: Serialize + DeserializeOwned,
	{
		let method = ApiMethod::custom("PATCH")?;

		self.call("patch_item", method, path, Some(item), decode).await
	}

	/// DELETEs `path`; only the status is checked.
	pub async fn delete(&self, path: &str) -> Result<()> {
		self.call("delete", ApiMethod::DELETE, path, None::<&()>, |_| Ok(())).await
	}

	/// Sends an arbitrary request and decodes the response as `R`.
	///
	/// A body that serializes to JSON `null` is omitted.
	pub async fn send<B, R>(&self, method: ApiMethod, path: &str, body: Option<&B>) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.call("send", method, path, body, decode).await
	}

	/// Same as [`ApiClient::send`], with the method given by its token.
	pub async fn send_named<B, R>(&self, method: &str, path: &str, body: Option<&B>) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		let method = ApiMethod::custom(method)?;

		self.call("send", method, path, body, decode).await
	}

	async fn call<B, R, F>(
		&self,
		stage: &'static str,
		method: ApiMethod,
		path: &str,
		body: Option<&B>,
		read: F,
	) -> Result<R>
	where
		B: ?Sized + Serialize,
		F: FnOnce(ApiResponse) -> Result<R>,
	{
		const KIND: OpKind = OpKind::ApiRequest;

		let span = OpSpan::new(KIND, stage);

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let uri = self.resolve(path)?;
				let body = encode(body)?;
				let bearer = self.tokens.access_token().await?;
				let request = ApiRequest { method: method.clone(), uri: uri.clone(), bearer, body };
				let response = self.transport.execute(request).await?;

				obs::record_api_status(response.status);

				if !response.is_success() {
					return Err(Error::RequestFailed { method, uri, status: response.status });
				}

				read(response)
			})
			.await;

		if let Err(e) = &result {
			obs::trace_failure(KIND, e);
		}

		obs::record_op_outcome(KIND, OpOutcome::of(&result));

		result
	}

	fn resolve(&self, path: &str) -> Result<Url> {
		let value = self.build_uri(path);

		Url::parse(&value)
			.map_err(|source| ConfigError::InvalidRequestUri { value, source }.into())
	}
}
impl<T, P> Clone for ApiClient<T, P>
where
	T: ?Sized + ApiTransport,
	P: ?Sized + TokenProvider,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			tokens: self.tokens.clone(),
			config: self.config.clone(),
		}
	}
}
impl<T, P> Debug for ApiClient<T, P>
where
	T: ?Sized + ApiTransport,
	P: ?Sized + TokenProvider,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient").field("config", &self.config).finish_non_exhaustive()
	}
}

fn encode<B>(body: Option<&B>) -> Result<Option<Vec<u8>>>
where
	B: ?Sized + Serialize,
{
	let Some(body) = body else {
		return Ok(None);
	};
	let value = serde_json::to_value(body).map_err(Error::Encode)?;

	if value.is_null() {
		return Ok(None);
	}

	serde_json::to_vec(&value).map(Some).map_err(Error::Encode)
}

fn decode<R>(response: ApiResponse) -> Result<R>
where
	R: DeserializeOwned,
{
	let body: &[u8] =
		if response.body.iter().all(u8::is_ascii_whitespace) { b"null" } else { &response.body };
	let mut deserializer = serde_json::Deserializer::from_slice(body);
	let value = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| Error::Format {
		path: e.path().to_string(),
		source: e.into_inner(),
	})?;

	// Anything after the first value makes the whole body malformed.
	deserializer.end().map_err(|source| Error::Format { path: ".".into(), source })?;

	Ok(value)
}
