//! Identities a token cache is partitioned by.

// self
use crate::{_prelude::*, session::TOKEN_CACHE_SUFFIX};

/// Error returned when an identity value cannot key the cache.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// The value was empty or whitespace only.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (user, client).
		kind: &'static str,
	},
}

/// Object identifier of a signed-in user.
///
/// Every user owns exactly one session slot, named by [`UserId::token_cache_key`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);
impl UserId {
	/// Wraps a user object identifier, rejecting blank values.
	pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
		require_present("User", value.into()).map(Self)
	}

	/// Raw identifier.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Session slot holding this user's token cache (`<userId>_TokenCache`).
	pub fn token_cache_key(&self) -> String {
		format!("{}{TOKEN_CACHE_SUFFIX}", self.0)
	}
}
impl TryFrom<String> for UserId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl From<UserId> for String {
	fn from(value: UserId) -> Self {
		value.0
	}
}
impl Debug for UserId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "User({})", self.0)
	}
}
impl Display for UserId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Application (client) identifier registered with the identity provider.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientId(String);
impl ClientId {
	/// Wraps an application identifier, rejecting blank values.
	pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
		require_present("Client", value.into()).map(Self)
	}

	/// Raw identifier.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl TryFrom<String> for ClientId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl From<ClientId> for String {
	fn from(value: ClientId) -> Self {
		value.0
	}
}
impl Debug for ClientId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Client({})", self.0)
	}
}
impl Display for ClientId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

// A blank identity would route every anonymous caller into one shared slot.
fn require_present(kind: &'static str, value: String) -> Result<String, IdentifierError> {
	if value.trim().is_empty() {
		return Err(IdentifierError::Empty { kind });
	}

	Ok(value)
}
