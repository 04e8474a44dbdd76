//! Transport primitives for authenticated JSON calls.
//!
//! [`ApiTransport`] is the crate's only dependency on an HTTP stack. The API helper hands it a
//! fully resolved [`ApiRequest`] (method token, absolute URI, bearer token, optional JSON
//! payload) and gets back the raw [`ApiResponse`]; status checks and JSON decoding stay in
//! [`crate::client`]. The default `reqwest` feature provides [`ReqwestTransport`].

// std
use std::borrow::Cow;
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")]
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderValue};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, TransportError},
};
#[cfg(feature = "reqwest")] use crate::config::ApiConfig;

/// Boxed future returned by [`ApiTransport::execute`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<ApiResponse>> + 'a + Send>>;

/// Executes one HTTP exchange.
///
/// Implementations must attach `request.bearer` as an `Authorization: Bearer` credential, send
/// `request.body` (when present) as `application/json`, and return every response, successful or
/// not, as an [`ApiResponse`]. Only failures that prevent a response (DNS, TCP, TLS, I/O) are
/// errors.
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and returns the raw response.
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// HTTP method token.
///
/// Standard verbs are available as constants; anything else (for example `PATCH`) is built from
/// its token with [`ApiMethod::custom`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ApiMethod(Cow<'static, str>);
impl ApiMethod {
	/// `DELETE`.
	pub const DELETE: Self = Self(Cow::Borrowed("DELETE"));
	/// `GET`.
	pub const GET: Self = Self(Cow::Borrowed("GET"));
	/// `POST`.
	pub const POST: Self = Self(Cow::Borrowed("POST"));

	/// Builds a method from an arbitrary token, validated against the RFC 9110 token grammar.
	pub fn custom(token: impl Into<String>) -> Result<Self, ConfigError> {
		let token = token.into();

		if token.is_empty() || !token.bytes().all(is_tchar) {
			return Err(ConfigError::InvalidMethod { token });
		}

		Ok(Self(Cow::Owned(token)))
	}

	/// Returns the method token.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for ApiMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Fully resolved outbound request.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// Method token.
	pub method: ApiMethod,
	/// Absolute request URI.
	pub uri: Url,
	/// Access token attached as the bearer credential.
	pub bearer: TokenSecret,
	/// JSON payload, when the call carries one.
	pub body: Option<Vec<u8>>,
}

/// Raw response returned by a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(&self.body)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Clones share the underlying connection pool.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client honoring the timeout and user agent in `config`.
	pub fn from_config(config: &ApiConfig) -> Result<Self, ConfigError> {
		let mut builder = ReqwestClient::builder();

		if let Some(timeout) = config.timeout {
			builder = builder.timeout(timeout);
		}
		if let Some(user_agent) = config.user_agent.as_deref() {
			builder = builder.user_agent(user_agent);
		}

		Ok(Self(builder.build()?))
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
impl ApiTransport for ReqwestTransport {
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let ApiRequest { method, uri, bearer, body } = request;
			let method = reqwest::Method::from_bytes(method.as_str().as_bytes())
				.map_err(|_| ConfigError::InvalidMethod { token: method.to_string() })?;
			let mut credential = HeaderValue::from_str(&bearer.bearer()).map_err(|_| {
				Error::TokenUnavailable {
					reason: "token contains characters not allowed in a header".into(),
				}
			})?;

			credential.set_sensitive(true);

			let mut builder = client
				.request(method, uri)
				.header(AUTHORIZATION, credential)
				.header(ACCEPT, "application/json");

			if let Some(payload) = body {
				builder = builder.header(CONTENT_TYPE, "application/json").body(payload);
			}

			let response = builder.send().await.map_err(map_reqwest_error)?;
			let status = response.status().as_u16();
			let body = response.bytes().await.map_err(map_reqwest_error)?.to_vec();

			Ok(ApiResponse { status, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}

	TransportError::from(err).into()
}

// RFC 9110 `tchar`.
fn is_tchar(byte: u8) -> bool {
	byte.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&byte)
}
