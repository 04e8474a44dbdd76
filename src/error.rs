//! Crate-level error types shared by the token cache, session stores, and the API helper.

// self
use crate::{_prelude::*, http::ApiMethod};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Session store or token blob failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::session::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Remote API answered with a non-success status.
	#[error("{method} {uri} failed with HTTP status {status}.")]
	RequestFailed {
		/// Method token of the failed request.
		method: ApiMethod,
		/// Absolute URI of the failed request.
		uri: Url,
		/// HTTP status code returned by the remote API.
		status: u16,
	},
	/// Response body does not match the requested type.
	#[error("Response body does not match the expected shape at `{path}`.")]
	Format {
		/// JSON path of the mismatch; `.` for the document root.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: serde_json::Error,
	},
	/// Request body could not be serialized to JSON.
	#[error("Request body could not be serialized.")]
	Encode(#[source] serde_json::Error),
	/// Token provider could not hand out an access token.
	#[error("Access token is unavailable: {reason}.")]
	TokenUnavailable {
		/// Provider-supplied reason string.
		reason: String,
	},
}
impl Error {
	/// Returns the HTTP status carried by [`Error::RequestFailed`].
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::RequestFailed { status, .. } => Some(*status),
			_ => None,
		}
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URI cannot be parsed.
	#[error("Base URI `{value}` cannot be parsed.")]
	UnparsableBaseUri {
		/// Raw base URI.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URI parsed but cannot serve as a request root.
	#[error("Base URI `{value}` {reason}.")]
	InvalidBaseUri {
		/// Raw base URI.
		value: String,
		/// Which rule the URI broke.
		reason: &'static str,
	},
	/// Base URI uses plain HTTP without opting in.
	#[error("Base URI must use HTTPS: {value}.")]
	InsecureBaseUri {
		/// Raw base URI.
		value: String,
	},
	/// Resolved request URI cannot be parsed.
	#[error("Request URI `{value}` cannot be parsed.")]
	InvalidRequestUri {
		/// Resolved URI text.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Method token contains characters outside the HTTP token grammar.
	#[error("`{token}` is not a valid HTTP method token.")]
	InvalidMethod {
		/// Rejected method token.
		token: String,
	},
	/// Timeout is negative.
	#[error("Request timeout must not be negative.")]
	NegativeTimeout,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the remote API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn request_failed_exposes_status() {
		let uri = Url::parse("https://outlook.office365.com/api/beta/Me/events")
			.expect("Fixture URI should parse.");
		let err = Error::RequestFailed { method: ApiMethod::POST, uri, status: 400 };

		assert_eq!(err.status(), Some(400));
		assert_eq!(
			err.to_string(),
			"POST https://outlook.office365.com/api/beta/Me/events failed with HTTP status 400."
		);
		assert_eq!(Error::TokenUnavailable { reason: "missing".into() }.status(), None);
	}

	#[test]
	fn transport_io_error_keeps_source() {
		let err: Error = TransportError::from(std::io::Error::other("socket closed")).into();
		let source = StdError::source(&err).expect("Transport error should expose its source.");

		assert!(source.to_string().contains("socket closed"));
	}
}
