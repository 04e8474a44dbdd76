//! Validated configuration for the API helper.

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, error::ConfigError};

/// Root of the Outlook REST API for the signed-in user.
pub const OUTLOOK_API_BASE: &str = "https://outlook.office365.com/api/beta/Me/";

/// Settings shared by every request the API helper sends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
	/// Absolute root that relative request paths are appended to; always ends with `/`.
	pub base_uri: Url,
	/// Whole-request timeout applied by the transport.
	pub timeout: Option<StdDuration>,
	/// `User-Agent` header sent with every request.
	pub user_agent: Option<String>,
}
impl ApiConfig {
	/// Creates a builder seeded with [`OUTLOOK_API_BASE`].
	pub fn builder() -> ApiConfigBuilder {
		ApiConfigBuilder::default()
	}
}

/// Builder for [`ApiConfig`] values.
#[derive(Clone, Debug)]
pub struct ApiConfigBuilder {
	/// Raw base URI; a trailing `/` is appended when missing.
	pub base_uri: String,
	/// Accept `http://` base URIs (local mocks, proxies).
	pub allow_insecure_http: bool,
	/// Whole-request timeout.
	pub timeout: Option<Duration>,
	/// `User-Agent` header value.
	pub user_agent: Option<String>,
}
impl Default for ApiConfigBuilder {
	fn default() -> Self {
		Self {
			base_uri: OUTLOOK_API_BASE.into(),
			allow_insecure_http: false,
			timeout: None,
			user_agent: None,
		}
	}
}
impl ApiConfigBuilder {
	/// Overrides the API root.
	pub fn base_uri(mut self, base_uri: impl Into<String>) -> Self {
		self.base_uri = base_uri.into();

		self
	}

	/// Allows or forbids a plain-HTTP API root.
	pub fn allow_insecure_http(mut self, allow: bool) -> Self {
		self.allow_insecure_http = allow;

		self
	}

	/// Sets the whole-request timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Sets the `User-Agent` header value.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());

		self
	}

	/// Consumes the builder and validates the resulting config.
	pub fn build(self) -> Result<ApiConfig, ConfigError> {
		let mut raw = self.base_uri;

		if !raw.ends_with('/') {
			raw.push('/');
		}

		let base_uri = Url::parse(&raw)
			.map_err(|source| ConfigError::UnparsableBaseUri { value: raw.clone(), source })?;

		validate_base(&raw, &base_uri, self.allow_insecure_http)?;

		let timeout = self
			.timeout
			.map(|value| StdDuration::try_from(value).map_err(|_| ConfigError::NegativeTimeout))
			.transpose()?;

		Ok(ApiConfig { base_uri, timeout, user_agent: self.user_agent })
	}
}

fn validate_base(raw: &str, url: &Url, allow_insecure_http: bool) -> Result<(), ConfigError> {
	match url.scheme() {
		"https" => {},
		"http" if allow_insecure_http => {},
		"http" => return Err(ConfigError::InsecureBaseUri { value: raw.into() }),
		_ =>
			return Err(ConfigError::InvalidBaseUri {
				value: raw.into(),
				reason: "must use the http or https scheme",
			}),
	}

	if url.query().is_some() || url.fragment().is_some() {
		return Err(ConfigError::InvalidBaseUri {
			value: raw.into(),
			reason: "must not carry a query or fragment",
		});
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn default_targets_outlook_beta() {
		let config = ApiConfig::builder().build().expect("Default config should be valid.");

		assert_eq!(config.base_uri.as_str(), OUTLOOK_API_BASE);
		assert_eq!(config.timeout, None);
	}

	#[test]
	fn trailing_slash_is_appended() {
		let config = ApiConfig::builder()
			.base_uri("https://outlook.office.com/api/v2.0/me")
			.build()
			.expect("Base without trailing slash should be normalized.");

		assert_eq!(config.base_uri.as_str(), "https://outlook.office.com/api/v2.0/me/");
	}

	#[test]
	fn plain_http_requires_opt_in() {
		let err = ApiConfig::builder()
			.base_uri("http://127.0.0.1:8080/api/")
			.build()
			.expect_err("Plain HTTP must be rejected by default.");

		assert!(matches!(err, ConfigError::InsecureBaseUri { .. }));

		ApiConfig::builder()
			.base_uri("http://127.0.0.1:8080/api/")
			.allow_insecure_http(true)
			.build()
			.expect("Plain HTTP should be accepted after opting in.");
	}

	#[test]
	fn rejects_unusable_roots() {
		assert!(matches!(
			ApiConfig::builder().base_uri("not a uri").build(),
			Err(ConfigError::UnparsableBaseUri { .. })
		));
		assert!(matches!(
			ApiConfig::builder().base_uri("ftp://example.com/").build(),
			Err(ConfigError::InvalidBaseUri { .. })
		));
		assert!(matches!(
			ApiConfig::builder().base_uri("https://example.com/api?x=1").build(),
			Err(ConfigError::InvalidBaseUri { .. })
		));
	}

	#[test]
	fn timeout_must_not_be_negative() {
		assert!(matches!(
			ApiConfig::builder().timeout(Duration::seconds(-1)).build(),
			Err(ConfigError::NegativeTimeout)
		));

		let config = ApiConfig::builder()
			.timeout(Duration::seconds(30))
			.user_agent("calendar-web-app/1.0")
			.build()
			.expect("Positive timeout should be accepted.");

		assert_eq!(config.timeout, Some(StdDuration::from_secs(30)));
		assert_eq!(config.user_agent.as_deref(), Some("calendar-web-app/1.0"));
	}
}
