//! Signed-in [`Session`]s, carried by clients as JWT [`Token`]s.

#[cfg(doc)]
use common::DateTime;
use common::DateTimeOf;
use derive_more::{AsRef, Display, FromStr};
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::domain::User;
use crate::domain::user;

/// Session of a signed-in [`User`], encoded as the claims of a [`Token`].
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Session {
    /// ID of the [`User`] this [`Session`] belongs to.
    pub user_id: user::Id,

    /// [`DateTime`] after which the [`Token`] of this [`Session`] is
    /// rejected.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,
}

/// Signed JWT representation of a [`Session`], stored in the session
/// cookie.
#[derive(AsRef, Clone, Debug, Display, FromStr)]
#[as_ref(str)]
pub struct Token(String);

impl Token {
    /// Wraps the provided `token` without verifying its signature.
    ///
    /// # Safety
    ///
    /// The provided `token` must be freshly signed by this service.
    #[expect(unsafe_code, reason = "signature is checked on use")]
    #[must_use]
    pub const unsafe fn new_unchecked(token: String) -> Self {
        Self(token)
    }
}

/// Marker of a [`Session`] expiration moment.
#[derive(Clone, Copy, Debug)]
pub enum Expiration {}

/// [`DateTime`] of a [`Session`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Session, Expiration)>;
