//! Access-token providers consulted by the API helper before every request.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	cache::{AccessArgs, SessionTokenCache, TokenCacheKey},
	obs::{self, OpKind, OpOutcome, OpSpan},
};

/// Boxed future returned by [`TokenProvider::access_token`].
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<TokenSecret>> + 'a + Send>>;

/// Source of bearer tokens for outbound API calls.
///
/// The API helper calls [`TokenProvider::access_token`] once per request and never caches the
/// result; caching belongs to the provider.
pub trait TokenProvider
where
	Self: Send + Sync,
{
	/// Returns a token valid for the remote API.
	fn access_token(&self) -> TokenFuture<'_>;
}

/// Hands out the same token on every call.
#[derive(Clone, Debug)]
pub struct StaticTokenProvider(TokenSecret);
impl StaticTokenProvider {
	/// Wraps a fixed token value.
	pub fn new(token: impl Into<String>) -> Self {
		Self(TokenSecret::new(token))
	}
}
impl TokenProvider for StaticTokenProvider {
	fn access_token(&self) -> TokenFuture<'_> {
		let token = self.0.clone();

		Box::pin(async move { Ok(token) })
	}
}

/// Reads the access token for one cache key out of a [`SessionTokenCache`].
///
/// Every lookup runs inside a full access window, so the cache is reloaded from the session
/// before the read. Entries that expire within the skew are evicted during the window and
/// `after_access` flushes the eviction. Minting new tokens is left to the identity provider that
/// populated the cache.
#[derive(Clone, Debug)]
pub struct SessionCacheTokenProvider {
	cache: Arc<SessionTokenCache>,
	key: TokenCacheKey,
	expiry_skew: Duration,
}
impl SessionCacheTokenProvider {
	const DEFAULT_EXPIRY_SKEW: Duration = Duration::minutes(5);

	/// Creates a provider for `key` with the default five-minute expiry skew.
	pub fn new(cache: Arc<SessionTokenCache>, key: TokenCacheKey) -> Self {
		Self { cache, key, expiry_skew: Self::DEFAULT_EXPIRY_SKEW }
	}

	/// Overrides the expiry skew; negative values are treated as zero.
	pub fn with_expiry_skew(mut self, skew: Duration) -> Self {
		self.expiry_skew = if skew.is_negative() { Duration::ZERO } else { skew };

		self
	}

	/// Cache key the provider reads.
	pub fn key(&self) -> &TokenCacheKey {
		&self.key
	}

	/// Looks up the token as of `now`.
	pub fn lookup_at(&self, now: OffsetDateTime) -> Result<TokenSecret> {
		let args = AccessArgs::for_key(&self.key);

		self.cache.access(&args, |view| match view.find(&self.key) {
			Some(item) if !item.expires_within(now, self.expiry_skew) => Ok(item.access_token),
			Some(_) => {
				view.remove(&self.key);

				Err(Error::TokenUnavailable {
					reason: format!("cached token for {} has expired", self.key.resource),
				})
			},
			None => Err(Error::TokenUnavailable {
				reason: format!("no cached token for {}", self.key.resource),
			}),
		})?
	}
}
impl TokenProvider for SessionCacheTokenProvider {
	fn access_token(&self) -> TokenFuture<'_> {
		const KIND: OpKind = OpKind::TokenAcquire;

		let span = OpSpan::new(KIND, "session_cache");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		Box::pin(span.instrument(async move {
			let result = self.lookup_at(OffsetDateTime::now_utc());

			if let Err(e) = &result {
				obs::trace_failure(KIND, e);
			}

			obs::record_op_outcome(KIND, OpOutcome::of(&result));

			result
		}))
	}
}
