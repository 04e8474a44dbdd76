//! Session-backed token cache and typed JSON REST helper for Outlook/Office 365 calendar apps.
//!
//! The crate pairs a per-user [`cache::SessionTokenCache`], kept in sync with a server-side
//! [`session::SessionStore`] through explicit before/after access hooks, with an
//! [`client::ApiClient`] that resolves request paths against a fixed API root, attaches a fresh
//! bearer token to every call, and maps JSON bodies to typed values.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod session;
pub mod token;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{ClientId, UserId},
		cache::{SessionLock, SessionTokenCache, TokenCacheItem, TokenCacheKey},
		client::{ApiClient, ReqwestApiClient},
		config::ApiConfig,
		session::{MemorySessionStore, SessionStore},
		token::StaticTokenProvider,
	};

	/// Authority used by cache fixtures.
	pub const TEST_AUTHORITY: &str = "https://login.microsoftonline.com/common";
	/// Resource used by cache fixtures.
	pub const TEST_RESOURCE: &str = "https://outlook.office365.com/";

	/// Builds an API client rooted at `base_uri` that sends `token` on every request.
	///
	/// Plain HTTP is allowed so the client can talk to `httpmock` servers.
	pub fn test_api_client(base_uri: &str, token: &str) -> ReqwestApiClient<StaticTokenProvider> {
		let config = ApiConfig::builder()
			.base_uri(base_uri)
			.allow_insecure_http(true)
			.build()
			.expect("Failed to build API config for tests.");

		ApiClient::new(config, StaticTokenProvider::new(token))
			.expect("Failed to build reqwest API client for tests.")
	}

	/// Constructs a session token cache for `user` backed by a fresh in-memory store and a
	/// private lock.
	pub fn build_session_cache(user: &str) -> (Arc<SessionTokenCache>, Arc<MemorySessionStore>) {
		let store_backend = Arc::new(MemorySessionStore::default());
		let store: Arc<dyn SessionStore> = store_backend.clone();
		let user_id = UserId::new(user).expect("Failed to build user identifier for tests.");
		let cache = SessionTokenCache::new(user_id, store, SessionLock::new())
			.expect("Failed to load session token cache for tests.");

		(Arc::new(cache), store_backend)
	}

	/// Cache key for the Outlook resource tied to `user`.
	pub fn test_cache_key(user: &str) -> TokenCacheKey {
		let client_id =
			ClientId::new("calendar-web-app").expect("Failed to build client identifier.");
		let user_id = UserId::new(user).expect("Failed to build user identifier for tests.");

		TokenCacheKey::new(TEST_AUTHORITY, client_id, TEST_RESOURCE).for_user(user_id)
	}

	/// Builds a cache entry for `key` that expires `expires_in` from now.
	pub fn test_cache_item(key: TokenCacheKey, access: &str, expires_in: Duration) -> TokenCacheItem {
		TokenCacheItem::builder(key)
			.access_token(access)
			.refresh_token(format!("{access}-refresh"))
			.expires_in(expires_in)
			.build()
			.expect("Token cache item fixture should build successfully.")
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use serde_json;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
