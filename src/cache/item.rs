//! Token cache entries, their lookup keys, and the entry builder.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, TokenSecret, UserId},
};

/// Identifies one cached token: who issued it, for which app and resource, and for whom.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenCacheKey {
	/// Authority (issuer) URI that minted the token.
	pub authority: String,
	/// Application the token was issued to.
	pub client_id: ClientId,
	/// Resource (audience) the token grants access to.
	pub resource: String,
	/// Signed-in user, when the token is user-bound.
	pub user_id: Option<UserId>,
}
impl TokenCacheKey {
	/// Creates an app-only key; attach a user with [`TokenCacheKey::for_user`].
	pub fn new(
		authority: impl Into<String>,
		client_id: ClientId,
		resource: impl Into<String>,
	) -> Self {
		Self { authority: authority.into(), client_id, resource: resource.into(), user_id: None }
	}

	/// Binds the key to a user identity.
	pub fn for_user(mut self, user_id: UserId) -> Self {
		self.user_id = Some(user_id);

		self
	}
}

/// Errors produced by [`TokenCacheItemBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenCacheItemBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
}

/// Cached token material for one [`TokenCacheKey`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCacheItem {
	/// Lookup key of the entry.
	pub key: TokenCacheKey,
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret, if the identity provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Instant after which the access token is no longer accepted.
	pub expires_at: OffsetDateTime,
}
impl TokenCacheItem {
	/// Returns a builder for the provided key.
	pub fn builder(key: TokenCacheKey) -> TokenCacheItemBuilder {
		TokenCacheItemBuilder::new(key)
	}

	/// Returns `true` if the access token has expired at `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Returns `true` if the access token expires within `skew` of `instant`.
	pub fn expires_within(&self, instant: OffsetDateTime, skew: Duration) -> bool {
		self.is_expired_at(instant + skew)
	}
}

/// Builder for [`TokenCacheItem`].
#[derive(Clone, Debug)]
pub struct TokenCacheItemBuilder {
	key: TokenCacheKey,
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl TokenCacheItemBuilder {
	fn new(key: TokenCacheKey) -> Self {
		Self {
			key,
			access_token: None,
			refresh_token: None,
			issued_at: None,
			expires_at: None,
			expires_in: None,
		}
	}

	/// Sets the instant `expires_in` is measured from (defaults to now).
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant; wins over [`TokenCacheItemBuilder::expires_in`].
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Consumes the builder and produces a [`TokenCacheItem`].
	pub fn build(self) -> Result<TokenCacheItem, TokenCacheItemBuilderError> {
		let access_token =
			self.access_token.ok_or(TokenCacheItemBuilderError::MissingAccessToken)?;
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) => self.issued_at.unwrap_or_else(OffsetDateTime::now_utc) + delta,
			(None, None) => return Err(TokenCacheItemBuilderError::MissingExpiry),
		};

		Ok(TokenCacheItem {
			key: self.key,
			access_token,
			refresh_token: self.refresh_token,
			expires_at,
		})
	}
}
